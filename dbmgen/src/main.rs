//! dbmgen binary.
//!
//! Parses arguments, initializes logging and owns the connection registry
//! for the lifetime of the run. Every connection is closed before exit.
//!
//! # Exit Status
//! - 0: model created, or already up to date
//! - 2: missing input, connection, query, empty catalog or provenance errors
//! - 1: artifact I/O and other internal errors

use clap::Parser;
use dbmgen::{Cli, run};
use dbmgen_core::ConnectionRegistry;
use dbmgen_core::adapters::default_connector;
use dbmgen_core::logging::init_logging;
use std::error::Error;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.global.verbose, cli.global.quiet) {
        eprintln!("{}", e);
        return ExitCode::from(e.exit_code());
    }

    let registry = ConnectionRegistry::new(default_connector());
    let result = run(cli.command, &registry).await;
    registry.shutdown().await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.source() {
                Some(source) => tracing::error!("{}: {}", e, source),
                None => tracing::error!("{}", e),
            }
            ExitCode::from(e.exit_code())
        }
    }
}
