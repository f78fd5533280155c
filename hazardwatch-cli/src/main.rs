//! Hazardwatch CLI.
//!
//! Terminal frontend for the hazardwatch engine: one-shot zone checks
//! and a live watch mode that drives the engine from a position stream.

mod commands;
mod error;

use clap::{Parser, Subcommand};

use commands::{check, watch};
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "hazardwatch", version, about = "Geofence-driven danger mode engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Evaluate a single position against a zone snapshot
    Check(check::CheckArgs),

    /// Stream positions from stdin and report danger transitions
    Watch(watch::WatchArgs),
}

fn main() {
    let cli = Cli::parse();

    let _logging_guard = match hazardwatch::logging::init(
        hazardwatch::logging::DEFAULT_LOG_DIR,
        hazardwatch::logging::DEFAULT_LOG_FILE,
    ) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: file logging disabled: {}", e);
            None
        }
    };

    let result = match cli.command {
        Commands::Check(args) => check::run(args),
        Commands::Watch(args) => run_watch(args),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run_watch(args: watch::WatchArgs) -> Result<(), CliError> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(watch::run(args))
}
