//! Datamill CLI entry point.

use clap::Parser;

use datamill::cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Init(args) => datamill::cli::commands::init::execute(args, cli.json).await,
        Commands::Run(args) => {
            datamill::cli::commands::run::execute(args, cli.json, config_path).await
        }
        Commands::Plan(args) => datamill::cli::commands::plan::execute(args, cli.json),
        Commands::Session(args) => {
            datamill::cli::commands::session::execute(args, cli.json, config_path).await
        }
    };

    if let Err(err) = result {
        datamill::cli::handle_error(err, cli.json);
    }
}
