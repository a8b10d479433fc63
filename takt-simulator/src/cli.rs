//! Command-line arguments for running a simulation.
//!
//! Shared with the `takt` binary, which embeds them as its `simulate`
//! subcommand.

use std::path::PathBuf;

use clap::Args;

use crate::scenario::Scenario;

#[derive(Args, Debug, Clone)]
pub struct SimulateArgs {
    /// Seed for the simulation (defaults to the configured seed)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Number of ticks to advance (defaults to the configured count)
    #[arg(long)]
    pub ticks: Option<u32>,

    /// Scenario to run (defaults to the configured scenario)
    #[arg(long, value_enum)]
    pub scenario: Option<Scenario>,

    /// Configuration file (defaults to config/takt.yaml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Fail unless the trace hash equals this value
    #[arg(long)]
    pub validate_hash: Option<String>,

    /// Print Prometheus metrics after the run
    #[arg(long, default_value_t = false)]
    pub metrics: bool,
}
