//! Simulator configuration.

use serde::{Deserialize, Serialize};
use validator::{self, Validate};

use crate::validation;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SimulatorConfig {
    /// Ticks to advance the virtual clock by.
    #[serde(default = "default_ticks")]
    #[validate(range(min = 1, max = 100_000_000))]
    pub ticks: u32,

    /// Seed for deterministic simulation.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Scenario to run when none is given on the command line.
    #[serde(default = "default_scenario")]
    #[validate(custom(function = validation::validate_scenario))]
    pub scenario: String,
}

fn default_ticks() -> u32 {
    10_000
}

fn default_seed() -> u64 {
    42
}

fn default_scenario() -> String {
    "ping-pong".into()
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            ticks: default_ticks(),
            seed: default_seed(),
            scenario: default_scenario(),
        }
    }
}
