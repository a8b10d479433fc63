//! ## takt-telemetry::logging
//! **`tracing` subscriber setup**
//!
//! The core only emits `tracing` events; binaries call [`EventLogger::init`] once
//! to print them. `RUST_LOG` overrides the configured default directive.

use tracing::info_span;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{fmt, EnvFilter};

pub type InitError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone, Debug)]
pub struct EventLogger;

impl EventLogger {
    /// Installs a global `fmt` subscriber filtered by `RUST_LOG`, falling back
    /// to `default_directive` (for example `"info"` or `"takt_core=debug"`).
    ///
    /// Fails if a global subscriber is already set.
    pub fn init(default_directive: &str) -> Result<(), InitError> {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)),
            )
            .with_target(true)
            .with_span_events(FmtSpan::ENTER)
            .try_init()
    }

    /// Emits a milestone of a running scenario at info level.
    #[inline]
    pub fn log_event(event_type: &str, detail: &str) {
        let span = info_span!("takt_event", event_type = event_type);
        let _entered = span.enter();
        tracing::info!(detail, "Scenario event");
    }
}
