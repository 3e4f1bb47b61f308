mod cli;
mod commands;
mod config;
mod error;
mod logging;

use crate::cli::{Cli, Commands};
use crate::error::Result;
use clap::Parser;
use tracing::{debug, error, info};

fn main() {
    if let Err(e) = run_app() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run_app() -> Result<()> {
    let cli = Cli::parse();
    logging::setup_logging(cli.verbose, cli.quiet, cli.log_file.clone())?;

    info!("Elemol CLI v{} starting up.", env!("CARGO_PKG_VERSION"));
    debug!("Full CLI arguments parsed: {:?}", &cli);

    let run_config = config::load(cli.config.as_deref())?;

    let command_result = match cli.command {
        Commands::Convert(args) => commands::convert::run(args, &run_config),
        Commands::Info(args) => commands::info::run(args, &run_config),
        Commands::Align(args) => commands::align::run(args, &run_config),
    };

    if let Err(e) = &command_result {
        error!("Command failed: {e}");
    }
    command_result
}
