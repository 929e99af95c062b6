//! DAO CLI - Scenario runner for the contribution-weighted governance engine
//!
//! This CLI lets operators and developers:
//! - Replay scripted contribution, proposal, vote and payout sequences
//! - Check that each step succeeds or fails with the expected error
//! - Export the resulting state as a JSON snapshot and resume from one
//! - Inspect the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod output;
mod script;

use config::CliConfig;
use dao_runtime::DaoSnapshot;
use error::CliResult;
use script::{ScenarioRunner, Script};

/// DAO CLI application
#[derive(Parser)]
#[command(name = "dao")]
#[command(about = "DAO - contribution-weighted governance scenario runner", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "DAO_CONFIG")]
    config: Option<String>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    output: output::OutputFormat,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run a scenario script against a fresh DAO
    #[command(alias = "run")]
    Simulate {
        /// Path to the TOML script
        script: PathBuf,

        /// Write the final state snapshot to this file
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Start from a previously written snapshot instead of a fresh DAO
        #[arg(long)]
        restore: Option<PathBuf>,
    },

    /// Show configuration
    Config,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().without_time())
        .init();

    // Load config
    let config = CliConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Simulate {
            script,
            snapshot,
            restore,
        } => {
            let script = Script::load(&script)?;
            let start = chrono::Utc::now();
            let runner = match restore {
                Some(path) => {
                    let snapshot = DaoSnapshot::from_json(&std::fs::read_to_string(&path)?)?;
                    tracing::info!(path = %path.display(), "Restoring from snapshot");
                    ScenarioRunner::restore(snapshot, start)?
                }
                None => ScenarioRunner::new(&config, start)?,
            };
            let report = runner.run(&script)?;
            output::print_report(&report, cli.output)?;

            if let Some(path) = snapshot {
                let json = runner.dao().snapshot()?.to_json()?;
                std::fs::write(&path, json)?;
                tracing::info!(path = %path.display(), "Snapshot written");
            }
            Ok(())
        }
        Commands::Config => match cli.output {
            output::OutputFormat::Text => {
                print!("{}", config.to_toml()?);
                Ok(())
            }
            output::OutputFormat::Json => output::print_json(&config),
        },
    }
}
