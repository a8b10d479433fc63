use thiserror::Error;

use takt_config::ConfigError;
use takt_simulator::SimulationError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("Trace hash mismatch: expected {expected}, got {actual}")]
    HashMismatch { expected: String, actual: String },
}
