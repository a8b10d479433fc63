//! # Takt Configuration System
//!
//! Layered configuration for the takt workspace.
//!
//! ## Layers
//! 1. Built-in defaults (mirroring the core's own defaults)
//! 2. `config/takt.yaml`, if present
//! 3. `TAKT_*` environment variables, nested keys separated by `__`
//!    (`TAKT_CORE__TIMERS__POOL_CAPACITY=8`)
//!
//! Every loaded configuration is validated before it is returned.

#![warn(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

mod core;
mod error;
mod simulator;
mod telemetry;
mod validation;

pub use self::core::{CoreConfig, EventBusConfig, TimerConfig};
pub use error::ConfigError;
pub use simulator::SimulatorConfig;
pub use telemetry::TelemetryConfig;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/takt.yaml";

const ENV_PREFIX: &str = "TAKT_";

/// Top-level configuration container for all takt components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate, Default)]
pub struct TaktConfig {
    /// Bus and timer pool sizing.
    #[serde(default)]
    #[validate(nested)]
    pub core: CoreConfig,

    /// Log filtering.
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetryConfig,

    /// Scenario runner parameters.
    #[serde(default)]
    #[validate(nested)]
    pub simulator: SimulatorConfig,
}

impl TaktConfig {
    /// Loads defaults, then [`DEFAULT_CONFIG_PATH`] when it exists, then the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(TaktConfig::default()));

        if Path::new(DEFAULT_CONFIG_PATH).exists() {
            figment = figment.merge(Yaml::file(DEFAULT_CONFIG_PATH));
        }

        Self::extract(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Loads defaults, then the file at `path`, then the environment.
    ///
    /// Unlike [`load`](Self::load), a missing file is an error.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(PathBuf::from(path)));
        }

        Self::extract(
            Figment::from(Serialized::defaults(TaktConfig::default()))
                .merge(Yaml::file(path))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Parses a YAML document on top of the defaults, ignoring the environment.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        Self::extract(Figment::from(Serialized::defaults(TaktConfig::default())).merge(Yaml::string(yaml)))
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment
            .extract()
            .map_err(ConfigError::from)
            .and_then(|config: Self| {
                config.validate()?;
                Ok(config)
            })
    }

    /// Renders the configuration as YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self).map_err(ConfigError::from)
    }
}
