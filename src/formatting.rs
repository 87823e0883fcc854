// src/formatting.rs

use crate::core::Severity;
use chrono::{DateTime, Local};

/// The marker prepended to error messages on the console and in email subjects.
pub const ERROR_PREFIX: &str = "[ERROR] ";

/// A trait for turning a message into a single log file record.
pub trait RecordFormatter: Send + Sync {
    fn format_record(&self, severity: Severity, message: &str) -> String;
}

/// Produces `timestamp - LEVEL - message` records stamped with local time.
pub struct TimestampFormatter;

impl TimestampFormatter {
    fn format_at(&self, at: DateTime<Local>, severity: Severity, message: &str) -> String {
        format!(
            "{} - {} - {}",
            at.format("%Y-%m-%d %H:%M:%S,%3f"),
            severity.label(),
            message
        )
    }
}

impl RecordFormatter for TimestampFormatter {
    fn format_record(&self, severity: Severity, message: &str) -> String {
        self.format_at(Local::now(), severity, message)
    }
}

/// Formats a console line: errors are prefixed, everything else is verbatim.
pub fn console_line(message: &str, is_error: bool) -> String {
    if is_error {
        format!("{}{}", ERROR_PREFIX, message)
    } else {
        message.to_string()
    }
}

/// Formats an email subject, marking errors.
pub fn email_subject(subject: &str, is_error: bool) -> String {
    console_line(subject, is_error)
}

/// Builds a task card title from an optional prefix and the message.
pub fn card_title(prefix: Option<&str>, message: &str) -> String {
    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => format!("{}: {}", prefix, message),
        None => message.to_string(),
    }
}

/// Builds a task card description from the message and an optional trailer.
pub fn card_description(message: &str, trailer: Option<&str>) -> String {
    match trailer.filter(|t| !t.is_empty()) {
        Some(trailer) => format!("{}\n\n{}", message, trailer),
        None => message.to_string(),
    }
}
