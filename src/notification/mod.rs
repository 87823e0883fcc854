//! Notification sinks.
//!
//! Each sink delivers a message to one destination and reports failures as a
//! [`NotifyError`](crate::error::NotifyError) instead of panicking or logging
//! them itself; routing those failures is the dispatcher's job.
pub mod console;
pub mod email;
pub mod file;
pub mod rotating;
pub mod slack;
pub mod trello;

pub use console::ConsoleSink;
pub use email::{EmailSink, MailConnector, MailError, MailTransport, SmtpConnector};
pub use file::FileSink;
pub use rotating::RotatingFileWriter;
pub use slack::{ChatApi, ChatConnector, ChatSink, SlackConnector};
pub use trello::{TaskBoardApi, TaskBoardConnector, TaskBoardSink, TrelloConnector};
