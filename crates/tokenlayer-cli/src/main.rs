//! `tokenlayer`: resolve layered design-token files from the command line.
//!
//! ```text
//! tokenlayer resolve defaults.yaml rose-pine.yaml --vars globals.css --format css
//! tokenlayer check defaults.yaml rose-pine.yaml --vars globals.css
//! ```
//!
//! Logging goes to stderr. `RUST_LOG` takes precedence over `-v`.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli::run(&cli) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
