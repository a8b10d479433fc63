//! ## takt-cli
//! **Command-line front end**
//!
//! - `takt simulate` runs a scripted state machine on a virtual tick counter and
//!   prints the trace hash.
//! - `takt config` prints the effective layered configuration.

use clap::Parser;

mod commands;
mod error;

use commands::Cli;
use error::CliError;

fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    commands::run_command(cli)
}
