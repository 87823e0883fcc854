//! Error types shared by the dispatcher and its sinks.

use crate::core::Channel;
use thiserror::Error;

/// A failure raised by a sink while delivering a message.
///
/// The `Display` form is the plain-text description forwarded through the
/// fallback chain.
#[derive(Error, Debug)]
pub enum NotifyError {
    /// A remote session could not be established.
    #[error("{channel} connection failed: {reason}")]
    Connection { channel: Channel, reason: String },

    /// A send, post or create call failed after a session existed.
    #[error("{channel} transmission failed: {reason}")]
    Transmission { channel: Channel, reason: String },

    /// A local log file could not be opened or written.
    #[error("failed to write log file '{target}': {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },
}

impl NotifyError {
    pub fn connection(channel: Channel, reason: impl Into<String>) -> Self {
        Self::Connection {
            channel,
            reason: reason.into(),
        }
    }

    pub fn transmission(channel: Channel, reason: impl Into<String>) -> Self {
        Self::Transmission {
            channel,
            reason: reason.into(),
        }
    }

    /// The channel that produced this failure.
    pub fn channel(&self) -> Channel {
        match self {
            Self::Connection { channel, .. } | Self::Transmission { channel, .. } => *channel,
            Self::Write { .. } => Channel::File,
        }
    }
}

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("invalid {channel} configuration: {reason}")]
    Invalid { channel: Channel, reason: String },

    #[error("invalid `{key}` setting: {reason}")]
    Setting { key: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(channel: Channel, reason: impl Into<String>) -> Self {
        Self::Invalid {
            channel,
            reason: reason.into(),
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}
