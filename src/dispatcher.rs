//! The dispatcher fans a single message out to every enabled channel.
//!
//! Channels are invoked sequentially in [`Channel::ALL`] order. A failing
//! channel never interrupts the others: its description is written to the
//! file sink as an error, or to the console when the file sink is missing or
//! fails itself. The console is the end of the chain and swallows its own
//! failures, so a failure report can never loop.

use crate::config::Config;
use crate::core::{Channel, Sink};
use crate::error::{ConfigError, NotifyError};
use crate::notification::{
    ChatConnector, ChatSink, ConsoleSink, EmailSink, FileSink, MailConnector, TaskBoardConnector,
    TaskBoardSink,
};
use std::io::Write;
use std::time::Duration;
use tracing::{debug, instrument, trace, warn};

/// Routes messages to the configured sinks.
///
/// Construction performs no I/O; sessions and files are opened by each sink on
/// first use and cached for the dispatcher's lifetime. A dispatcher is meant to
/// be driven from one thread at a time.
pub struct Dispatcher {
    enabled: Vec<Channel>,
    raise_on_failure: bool,
    console: ConsoleSink,
    file: Option<FileSink>,
    email: Option<EmailSink>,
    chat: Option<ChatSink>,
    task_board: Option<TaskBoardSink>,
}

impl Dispatcher {
    /// Validates the configuration and prepares one sink per enabled channel.
    pub fn new(config: Config) -> Result<Self, ConfigError> {
        config.validate()?;

        let enabled: Vec<Channel> = Channel::ALL
            .into_iter()
            .filter(|channel| config.is_enabled(*channel))
            .collect();
        debug!(channels = ?enabled, "Dispatcher configured");

        let timeout = Duration::from_secs(config.timeout_seconds);
        Ok(Self {
            enabled,
            raise_on_failure: config.raise_on_failure,
            console: ConsoleSink::stdout(),
            file: config.file.filter(|f| !f.is_empty()).map(FileSink::new),
            email: config.email.filter(|e| !e.is_empty()).map(EmailSink::new),
            chat: config
                .slack
                .filter(|s| !s.is_empty())
                .map(|slack| ChatSink::new(slack, timeout)),
            task_board: config
                .trello
                .filter(|t| !t.is_empty())
                .map(|trello| TaskBoardSink::new(trello, timeout)),
        })
    }

    /// Redirects console output, including fallback reports.
    pub fn with_console_writer(mut self, out: Box<dyn Write + Send>) -> Self {
        self.console = ConsoleSink::with_writer(out);
        self
    }

    /// Replaces the SMTP connector. Has no effect when email is disabled.
    pub fn with_mail_connector(mut self, connector: impl MailConnector + 'static) -> Self {
        if let Some(email) = self.email.as_mut() {
            email.set_connector(Box::new(connector));
        }
        self
    }

    /// Replaces the Slack connector. Has no effect when Slack is disabled.
    pub fn with_chat_connector(mut self, connector: impl ChatConnector + 'static) -> Self {
        if let Some(chat) = self.chat.as_mut() {
            chat.set_connector(Box::new(connector));
        }
        self
    }

    /// Replaces the Trello connector. Has no effect when Trello is disabled.
    pub fn with_task_board_connector(
        mut self,
        connector: impl TaskBoardConnector + 'static,
    ) -> Self {
        if let Some(task_board) = self.task_board.as_mut() {
            task_board.set_connector(Box::new(connector));
        }
        self
    }

    /// The enabled channels, in dispatch order.
    pub fn enabled_channels(&self) -> &[Channel] {
        &self.enabled
    }

    pub fn is_enabled(&self, channel: Channel) -> bool {
        self.enabled.contains(&channel)
    }

    /// Sends `message` to every enabled channel.
    ///
    /// Failures are reported through the fallback chain and otherwise
    /// swallowed. With `raiseOnFailure` set, the first failure is returned once
    /// every channel has been tried. An empty message is not dispatched.
    #[instrument(skip(self, message))]
    pub fn log(&mut self, message: &str, is_error: bool) -> Result<(), NotifyError> {
        if message.is_empty() {
            trace!("Ignoring empty message");
            return Ok(());
        }

        let mut first_failure = None;
        for channel in self.enabled.clone() {
            if let Err(e) = self.emit_to(channel, message, is_error) {
                warn!(channel = %channel, error = %e, "Channel failed, reporting through fallback");
                self.report_failure(&e);
                if first_failure.is_none() {
                    first_failure = Some(e);
                }
            }
        }

        match first_failure {
            Some(e) if self.raise_on_failure => Err(e),
            _ => Ok(()),
        }
    }

    fn sink_mut(&mut self, channel: Channel) -> Option<&mut dyn Sink> {
        match channel {
            Channel::Console => Some(&mut self.console as &mut dyn Sink),
            Channel::File => self.file.as_mut().map(|s| s as &mut dyn Sink),
            Channel::Email => self.email.as_mut().map(|s| s as &mut dyn Sink),
            Channel::Chat => self.chat.as_mut().map(|s| s as &mut dyn Sink),
            Channel::TaskBoard => self.task_board.as_mut().map(|s| s as &mut dyn Sink),
        }
    }

    fn emit_to(&mut self, channel: Channel, message: &str, is_error: bool) -> Result<(), NotifyError> {
        match self.sink_mut(channel) {
            Some(sink) => sink.emit(message, is_error),
            None => Ok(()),
        }
    }

    /// Remote failures go to the file sink; file failures go to the console.
    fn report_failure(&mut self, failure: &NotifyError) {
        let description = failure.to_string();

        if failure.channel() != Channel::File {
            if let Some(file) = self.file.as_mut() {
                match file.emit(&description, true) {
                    Ok(()) => return,
                    Err(file_err) => {
                        warn!(error = %file_err, "File fallback failed, using console");
                        self.console.write_line(&description, true);
                        self.console.write_line(&file_err.to_string(), true);
                        return;
                    }
                }
            }
        }

        self.console.write_line(&description, true);
    }
}
