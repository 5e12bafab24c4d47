//! Command-line interface.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

pub use output::{output, CommandOutput};

/// Deterministic five-phase pipeline engine for CSV analysis.
#[derive(Parser, Debug)]
#[command(name = "datamill", version, about)]
pub struct Cli {
    /// Emit machine-readable JSON instead of human output
    #[arg(long, global = true)]
    pub json: bool,

    /// Load configuration from a specific file instead of .datamill/
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scaffold .datamill/config.yaml and the data/plots/reports directories
    Init(commands::init::InitArgs),
    /// Execute the standard five-phase pipeline
    Run(commands::run::RunArgs),
    /// Inspect and validate the phase plan
    Plan(commands::plan::PlanArgs),
    /// Inspect persisted sessions
    Session(commands::session::SessionArgs),
}

/// Report a fatal error and exit non-zero.
pub fn handle_error(err: anyhow::Error, json_mode: bool) {
    if json_mode {
        let value = serde_json::json!({"error": err.to_string()});
        eprintln!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
    } else {
        eprintln!("Error: {err:#}");
    }
    std::process::exit(1);
}
