//! Mann - a multi-sink logger and notifier
//!
//! A single `log` call fans a message out to the console, rotating log files,
//! email, Slack and Trello. Every channel is configured independently, opens
//! its resources lazily, and reports its own failures through the next most
//! reliable channel instead of to the caller.

pub mod cli;
pub mod config;
pub mod core;
pub mod dispatcher;
pub mod error;
pub mod formatting;
pub mod notification;

// Re-export core types for convenience
pub use crate::core::{Channel, Severity, Sink};
pub use config::Config;
pub use dispatcher::Dispatcher;
pub use error::{ConfigError, NotifyError};
