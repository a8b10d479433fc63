use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use tracing::info;

use takt_config::TaktConfig;
use takt_simulator::cli::SimulateArgs;
use takt_simulator::{Scenario, SimulationReport, Simulator};
use takt_telemetry::logging::EventLogger;
use takt_telemetry::metrics::MetricsRecorder;

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(name = "takt", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scripted state machine against a virtual tick counter
    Simulate(SimulateArgs),
    /// Print the effective configuration as YAML
    Config(ConfigArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Configuration file to load instead of config/takt.yaml
    #[arg(long)]
    pub path: Option<PathBuf>,
}

pub fn run_command(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Simulate(args) => {
            let config = load_config(args.config.as_deref())?;
            init_logging(&config)?;
            let report = run_simulation(&args, &config)?;
            println!("{}", report.hash);
            Ok(())
        }
        Commands::Config(args) => {
            let config = load_config(args.path.as_deref())?;
            print!("{}", config.to_yaml()?);
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<TaktConfig, CliError> {
    let config = match path {
        Some(path) => TaktConfig::load_from_path(path)?,
        None => TaktConfig::load()?,
    };
    Ok(config)
}

fn init_logging(config: &TaktConfig) -> Result<(), CliError> {
    EventLogger::init(&config.telemetry.log_level).map_err(|err| CliError::Logging(err.to_string()))
}

/// Runs the scenario selected by `args`, falling back to `config` for anything
/// not given on the command line.
pub fn run_simulation(args: &SimulateArgs, config: &TaktConfig) -> Result<SimulationReport, CliError> {
    let seed = args.seed.unwrap_or(config.simulator.seed);
    let ticks = args.ticks.unwrap_or(config.simulator.ticks);
    let scenario = match args.scenario {
        Some(scenario) => scenario,
        None => config.simulator.scenario.parse::<Scenario>()?,
    };

    let metrics = MetricsRecorder::new()?;
    let mut simulator = Simulator::new(seed, config.core.machine_config()).with_metrics(metrics.clone());
    let report = simulator.run(scenario, ticks)?;

    EventLogger::log_event(
        "simulation",
        &format!(
            "{} seed={} ticks={} transitions={} deliveries={}",
            scenario, seed, ticks, report.transitions, report.deliveries
        ),
    );
    info!(hash = %report.hash, "simulation complete");

    if args.metrics {
        print!("{}", metrics.gather_metrics()?);
    }

    if let Some(expected) = &args.validate_hash {
        if !expected.eq_ignore_ascii_case(&report.hash) {
            return Err(CliError::HashMismatch {
                expected: expected.clone(),
                actual: report.hash,
            });
        }
    }

    Ok(report)
}
