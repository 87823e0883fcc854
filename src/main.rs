//! Mann - command-line entry point
//!
//! Loads the layered configuration, then logs the message given on the command
//! line through every configured channel.

use anyhow::Result;
use clap::Parser;
use mann::{cli::Cli, config::Config, Dispatcher};
use std::process::ExitCode;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            init_tracing("warn");
            error!("Failed to load configuration: {}", err);
            return Ok(ExitCode::FAILURE);
        }
    };

    init_tracing(&config.log_level);
    debug!(
        console = config.console,
        raise_on_failure = config.raise_on_failure,
        "Configuration loaded"
    );

    let mut dispatcher = Dispatcher::new(config)?;
    match dispatcher.log(&cli.message(), cli.error) {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            error!(channel = %err.channel(), "Notification failed: {}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Diagnostics go to stderr so they never mix with console notifications.
fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
