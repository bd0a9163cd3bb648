//! `relay` command line entry point.
mod cli;
mod commands;
mod config;
mod logging;
mod prompt;

use clap::Parser;
use relay_logging::relay_error;

fn main() {
    let cli = cli::Cli::parse();
    logging::initialize(cli.log, cli.verbose);

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(err) => {
            relay_error!("Failed to start async runtime: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = runtime.block_on(commands::dispatch(cli)) {
        relay_error!("{:#}", err);
        std::process::exit(1);
    }
}
