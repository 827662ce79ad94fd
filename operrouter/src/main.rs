//! # OperRouter CLI Entry Point
//!
//! The main executable of the OperRouter SDK. This file drives the application lifecycle:
//!
//! 1. **Initialization**: Parses command-line arguments using [`cli::Cli`] and installs the
//!    log subscriber (`RUST_LOG`, `warn` by default, written to stderr).
//! 2. **Connection**: Builds the client of the selected transport via `operrouter_sdk::connect`.
//! 3. **Execution**: Runs the command through the `OperRouterClient` contract.
//! 4. **Presentation**: Prints the response record as JSON, or the transport error to stderr.
//!
//! Exit codes: `0` when the core accepted the call, `1` on transport failure, `2` when the
//! core declined the call (`success == false`).
mod cli;
mod commands;
mod formatter;

use clap::Parser;
use cli::Cli;
use formatter::FormattedString;
use operrouter_sdk::connect;
use std::process;
use tracing_subscriber::EnvFilter;

const EXIT_TRANSPORT_ERROR: i32 = 1;
const EXIT_DECLINED: i32 = 2;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Cli::parse();
    let config = args.transport_config();

    tracing::debug!(?config, "connecting");

    let client = match connect(&config).await {
        Ok(client) => client,
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(EXIT_TRANSPORT_ERROR);
        }
    };

    match commands::run(client.as_ref(), args.command).await {
        Ok(outcome) => {
            println!("{}", FormattedString::from(outcome.body));
            if !outcome.success {
                process::exit(EXIT_DECLINED);
            }
        }
        Err(err) => {
            eprintln!("{}", FormattedString::from(err));
            process::exit(EXIT_TRANSPORT_ERROR);
        }
    }
}
