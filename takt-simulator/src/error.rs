use thiserror::Error;

use takt_core::StateMachineError;

#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("State machine error: {0}")]
    Machine(#[from] StateMachineError),

    #[error("Unknown scenario: {0}")]
    UnknownScenario(String),
}
