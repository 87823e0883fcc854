//! Core domain types and the sink contract for Mann
//!
//! This module defines the fixed set of notification channels and the trait
//! every sink implements so the dispatcher can drive them uniformly.

use crate::error::NotifyError;
use std::fmt;

/// A notification channel, declared in dispatch order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Console,
    File,
    Email,
    Chat,
    TaskBoard,
}

impl Channel {
    /// Every channel, in the order the dispatcher invokes them.
    pub const ALL: [Channel; 5] = [
        Channel::Console,
        Channel::File,
        Channel::Email,
        Channel::Chat,
        Channel::TaskBoard,
    ];

    /// The configuration key naming this channel.
    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Console => "console",
            Channel::File => "file",
            Channel::Email => "email",
            Channel::Chat => "slack",
            Channel::TaskBoard => "trello",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a message, derived from its error flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Info,
    Error,
}

impl Severity {
    pub fn from_error_flag(is_error: bool) -> Self {
        if is_error {
            Severity::Error
        } else {
            Severity::Info
        }
    }

    /// The level name written into log file records.
    pub fn label(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Error => "ERROR",
        }
    }
}

/// Delivers messages to a single output destination.
pub trait Sink: Send {
    /// The channel this sink serves. Used for logging and fallback reports.
    fn channel(&self) -> Channel;

    /// Emits a message to the destination.
    ///
    /// # Arguments
    /// * `message` - The opaque payload to deliver
    /// * `is_error` - Whether the message has error severity
    ///
    /// # Returns
    /// * `Ok(())` if the message was delivered
    /// * `Err` describing why the destination could not be reached or written
    fn emit(&mut self, message: &str, is_error: bool) -> Result<(), NotifyError>;
}
