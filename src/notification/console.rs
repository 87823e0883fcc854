//! A sink that prints messages to standard output.
//!
//! The console is the terminal fallback of the chain, so it never reports its
//! own failures anywhere.

use crate::core::{Channel, Sink};
use crate::error::NotifyError;
use crate::formatting::console_line;
use std::io::{self, Write};
use tracing::trace;

pub struct ConsoleSink {
    out: Box<dyn Write + Send>,
}

impl ConsoleSink {
    /// Creates a console sink writing to standard output.
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(io::stdout()))
    }

    /// Creates a console sink writing to an arbitrary stream.
    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self { out }
    }

    /// Writes one line, swallowing any I/O failure.
    pub fn write_line(&mut self, message: &str, is_error: bool) {
        let line = console_line(message, is_error);
        let result = writeln!(self.out, "{}", line).and_then(|_| self.out.flush());
        if let Err(e) = result {
            trace!(error = %e, "Console write failed; dropping line");
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::stdout()
    }
}

impl Sink for ConsoleSink {
    fn channel(&self) -> Channel {
        Channel::Console
    }

    fn emit(&mut self, message: &str, is_error: bool) -> Result<(), NotifyError> {
        self.write_line(message, is_error);
        Ok(())
    }
}
