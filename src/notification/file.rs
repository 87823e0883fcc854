//! FileSink - writes messages to rotating log files, one per severity.

use crate::config::FileConfig;
use crate::core::{Channel, Severity, Sink};
use crate::error::NotifyError;
use crate::formatting::{RecordFormatter, TimestampFormatter};
use crate::notification::rotating::RotatingFileWriter;
use std::io;
use std::path::Path;
use tracing::{debug, instrument};

/// Sink that appends formatted records to the informational or error log.
///
/// Writers are opened on first use and kept for the sink's lifetime. When only
/// one of the two targets is configured, it receives both severities.
pub struct FileSink {
    config: FileConfig,
    formatter: Box<dyn RecordFormatter>,
    info: Option<RotatingFileWriter>,
    error: Option<RotatingFileWriter>,
}

impl FileSink {
    pub fn new(config: FileConfig) -> Self {
        Self::with_formatter(config, Box::new(TimestampFormatter))
    }

    pub fn with_formatter(config: FileConfig, formatter: Box<dyn RecordFormatter>) -> Self {
        Self {
            config,
            formatter,
            info: None,
            error: None,
        }
    }

    /// Picks the writer a message of the given severity lands in.
    fn route(&self, severity: Severity) -> Severity {
        match severity {
            Severity::Error if self.config.error.is_none() => Severity::Info,
            Severity::Info if self.config.info.is_none() => Severity::Error,
            other => other,
        }
    }

    fn target_name(&self, severity: Severity) -> String {
        let path = match severity {
            Severity::Info => self.config.info.as_deref(),
            Severity::Error => self.config.error.as_deref(),
        };
        path.map(|p| p.display().to_string())
            .unwrap_or_else(|| format!("<{} log>", severity.label().to_lowercase()))
    }
}

fn ensure_writer(
    slot: &mut Option<RotatingFileWriter>,
    path: Option<&Path>,
) -> Result<(), NotifyError> {
    if slot.is_some() {
        return Ok(());
    }
    if let Some(path) = path {
        let writer = RotatingFileWriter::open(path).map_err(|source| NotifyError::Write {
            target: path.display().to_string(),
            source,
        })?;
        debug!(path = %path.display(), "Opened rotating log file");
        *slot = Some(writer);
    }
    Ok(())
}

impl Sink for FileSink {
    fn channel(&self) -> Channel {
        Channel::File
    }

    #[instrument(name = "file_sink_emit", skip(self, message))]
    fn emit(&mut self, message: &str, is_error: bool) -> Result<(), NotifyError> {
        let severity = Severity::from_error_flag(is_error);
        let target = self.route(severity);

        // Both configured writers are opened on first use; only a failure of
        // the routed one fails this message.
        let info_opened = ensure_writer(&mut self.info, self.config.info.as_deref());
        let error_opened = ensure_writer(&mut self.error, self.config.error.as_deref());
        match target {
            Severity::Info => info_opened?,
            Severity::Error => error_opened?,
        }

        let record = self.formatter.format_record(severity, message);
        let target_name = self.target_name(target);
        let slot = match target {
            Severity::Info => &mut self.info,
            Severity::Error => &mut self.error,
        };
        let writer = slot.as_mut().ok_or_else(|| NotifyError::Write {
            target: target_name.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "no log file configured"),
        })?;
        writer
            .write_record(&record)
            .map_err(|source| NotifyError::Write {
                target: target_name,
                source,
            })
    }
}
