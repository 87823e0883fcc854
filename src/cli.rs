//! Command-Line Interface (CLI) argument parsing.
//!
//! This module defines the command-line arguments for the `mann` binary using
//! the `clap` crate. Flags that mirror configuration keys are merged on top of
//! the TOML file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Log a message and fan it out to every configured notification channel.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print the message to standard output.
    #[arg(long)]
    pub console: bool,

    /// Mark the message as an error.
    #[arg(short, long)]
    pub error: bool,

    /// Exit with a failure status if any channel fails.
    #[arg(long)]
    pub raise_on_failure: bool,

    /// Diagnostics level (e.g. "debug", "warn").
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// The message to send. Words are joined with a single space.
    #[arg(required = true)]
    pub message: Vec<String>,
}

impl Cli {
    pub fn message(&self) -> String {
        self.message.join(" ")
    }
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        // Boolean flags only ever switch a setting on; absence leaves the
        // file or environment value in place.
        if self.console {
            dict.insert("console".into(), Value::from(true));
        }

        if self.raise_on_failure {
            dict.insert("raiseOnFailure".into(), Value::from(true));
        }

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
