//! Integration tests for failure containment and the fallback chain.

#[path = "../helpers/mod.rs"]
mod helpers;

use helpers::fakes::{FakeChat, FakeMail};
use helpers::SharedBuffer;
use mann::config::{EmailConfig, FileConfig, SlackConfig};
use mann::{Channel, Config, Dispatcher, NotifyError};
use std::fs;
use tempfile::tempdir;

fn email_config() -> EmailConfig {
    EmailConfig::new("smtp.invalid", "mann@example.com", "ops@example.com")
}

#[test]
fn test_file_write_failure_is_reported_on_console() {
    let dir = tempdir().unwrap();
    let out = SharedBuffer::default();
    let mut dispatcher = Dispatcher::new(Config {
        file: Some(FileConfig {
            info: Some(dir.path().join("missing").join("info.log")),
            error: None,
        }),
        ..Default::default()
    })
    .unwrap()
    .with_console_writer(Box::new(out.clone()));

    let result = dispatcher.log("A", false);

    assert!(result.is_ok(), "failures are silent by default");
    let lines = out.lines();
    assert_eq!(lines.len(), 1);
    assert!(lines[0].starts_with("[ERROR] failed to write log file"));
    assert!(lines[0].contains("info.log"));
}

#[test]
fn test_remote_failure_is_reported_to_error_log() {
    let dir = tempdir().unwrap();
    let out = SharedBuffer::default();
    let mut dispatcher = Dispatcher::new(Config {
        file: Some(FileConfig {
            info: Some(dir.path().join("info.log")),
            error: Some(dir.path().join("error.log")),
        }),
        email: Some(email_config()),
        ..Default::default()
    })
    .unwrap()
    .with_console_writer(Box::new(out.clone()))
    .with_mail_connector(FakeMail::unreachable());

    dispatcher.log("A", false).unwrap();

    let info = fs::read_to_string(dir.path().join("info.log")).unwrap();
    let error = fs::read_to_string(dir.path().join("error.log")).unwrap();
    assert!(info.contains(" - INFO - A"));
    assert!(!info.contains("email"));
    assert!(error.contains(" - ERROR - email connection failed"));
    assert!(error.contains("failed to lookup address information"));
    assert_eq!(out.contents(), "", "the console is not needed while the file sink works");
}

#[test]
fn test_remote_failure_falls_through_broken_file_to_console() {
    let dir = tempdir().unwrap();
    let out = SharedBuffer::default();
    let mut dispatcher = Dispatcher::new(Config {
        file: Some(FileConfig {
            info: None,
            error: Some(dir.path().join("missing").join("error.log")),
        }),
        email: Some(email_config()),
        ..Default::default()
    })
    .unwrap()
    .with_console_writer(Box::new(out.clone()))
    .with_mail_connector(FakeMail::unreachable());

    dispatcher.log("A", false).unwrap();

    let console = out.contents();
    // The file sink's own failure for "A", then the email failure and the
    // file failure hit while reporting it.
    assert!(console.contains("[ERROR] email connection failed"));
    assert!(console.contains("[ERROR] failed to write log file"));
    assert_eq!(out.lines().len(), 3);
}

#[test]
fn test_failing_channel_does_not_stop_later_channels() {
    let chat = FakeChat::default();
    let out = SharedBuffer::default();
    let mut dispatcher = Dispatcher::new(Config {
        console: true,
        email: Some(email_config()),
        slack: Some(SlackConfig::new("xoxb-test", "#room")),
        ..Default::default()
    })
    .unwrap()
    .with_console_writer(Box::new(out.clone()))
    .with_mail_connector(FakeMail::unreachable())
    .with_chat_connector(chat.clone());

    dispatcher.log("Y", false).unwrap();

    assert_eq!(chat.posts(), vec![("#room".to_string(), "Y".to_string())]);
    let lines = out.lines();
    assert_eq!(lines[0], "Y");
    assert!(lines[1].starts_with("[ERROR] email connection failed"));
}

#[test]
fn test_raise_on_failure_returns_first_failure() {
    let dir = tempdir().unwrap();
    let chat = FakeChat {
        fail_posts: true,
        ..Default::default()
    };
    let mut dispatcher = Dispatcher::new(Config {
        file: Some(FileConfig {
            info: None,
            error: Some(dir.path().join("error.log")),
        }),
        email: Some(email_config()),
        slack: Some(SlackConfig::new("xoxb-test", "#room")),
        raise_on_failure: true,
        ..Default::default()
    })
    .unwrap()
    .with_console_writer(Box::new(SharedBuffer::default()))
    .with_mail_connector(FakeMail::unreachable())
    .with_chat_connector(chat);

    let err = dispatcher.log("Y", false).unwrap_err();

    assert!(matches!(err, NotifyError::Connection { channel: Channel::Email, .. }));
    // Both failures were reported before the first one was returned.
    let error = fs::read_to_string(dir.path().join("error.log")).unwrap();
    assert!(error.contains("email connection failed"));
    assert!(error.contains("slack transmission failed: invalid_auth"));
}

#[test]
fn test_send_failure_is_a_transmission_error() {
    let mail = FakeMail {
        send_error: Some(mann::notification::MailError::SendFailed(
            "554 relay denied".to_string(),
        )),
        ..Default::default()
    };
    let mut dispatcher = Dispatcher::new(Config {
        email: Some(email_config()),
        raise_on_failure: true,
        ..Default::default()
    })
    .unwrap()
    .with_console_writer(Box::new(SharedBuffer::default()))
    .with_mail_connector(mail.clone());

    let err = dispatcher.log("X", false).unwrap_err();

    assert!(matches!(err, NotifyError::Transmission { .. }));
    assert!(err.to_string().contains("554 relay denied"));
    assert_eq!(mail.calls.lock().unwrap().closes, 1, "session closed after a failed send");
}
