//! Integration tests for severity-separated, rotating file output.

use mann::config::FileConfig;
use mann::{Config, Dispatcher};
use std::fs;
use tempfile::tempdir;

#[test]
fn test_info_and_error_logs_are_separated() {
    let dir = tempdir().unwrap();
    let info_log = dir.path().join("info.log");
    let error_log = dir.path().join("error.log");
    let mut dispatcher = Dispatcher::new(Config {
        file: Some(FileConfig {
            info: Some(info_log.clone()),
            error: Some(error_log.clone()),
        }),
        ..Default::default()
    })
    .unwrap();

    dispatcher.log("Fendouille", false).unwrap();
    dispatcher.log("Loola", true).unwrap();

    let info = fs::read_to_string(&info_log).unwrap();
    let error = fs::read_to_string(&error_log).unwrap();
    assert!(info.contains("Fendouille"));
    assert!(!info.contains("Loola"));
    assert!(error.contains("Loola"));
    assert!(!error.contains("Fendouille"));
}

#[test]
fn test_records_are_timestamped() {
    let dir = tempdir().unwrap();
    let info_log = dir.path().join("info.log");
    let mut dispatcher = Dispatcher::new(Config {
        file: Some(FileConfig {
            info: Some(info_log.clone()),
            error: None,
        }),
        ..Default::default()
    })
    .unwrap();

    dispatcher.log("A", false).unwrap();

    let info = fs::read_to_string(&info_log).unwrap();
    let line = info.lines().next().unwrap();
    let (timestamp, rest) = line.split_once(" - ").unwrap();
    assert_eq!(rest, "INFO - A");
    assert!(
        chrono::NaiveDateTime::parse_from_str(timestamp, "%Y-%m-%d %H:%M:%S,%3f").is_ok(),
        "unexpected timestamp {:?}",
        timestamp
    );
}

#[test]
fn test_existing_log_is_appended_to() {
    let dir = tempdir().unwrap();
    let info_log = dir.path().join("info.log");
    fs::write(&info_log, "archived line\n").unwrap();
    let mut dispatcher = Dispatcher::new(Config {
        file: Some(FileConfig {
            info: Some(info_log.clone()),
            error: None,
        }),
        ..Default::default()
    })
    .unwrap();

    dispatcher.log("B", false).unwrap();

    let info = fs::read_to_string(&info_log).unwrap();
    assert!(info.starts_with("archived line\n"));
    assert!(info.trim_end().ends_with(" - INFO - B"));
}

#[test]
fn test_log_rotates_past_two_thousand_bytes() {
    let dir = tempdir().unwrap();
    let info_log = dir.path().join("info.log");
    let mut dispatcher = Dispatcher::new(Config {
        file: Some(FileConfig {
            info: Some(info_log.clone()),
            error: None,
        }),
        ..Default::default()
    })
    .unwrap();

    // Roughly 130 bytes per record once the timestamp and level are added.
    let message = "x".repeat(100);
    for _ in 0..40 {
        dispatcher.log(&message, false).unwrap();
    }

    let rotated = dir.path().join("info.log.1");
    assert!(rotated.exists(), "expected a rotated generation");
    assert!(fs::metadata(&info_log).unwrap().len() < 2000);
    assert!(fs::metadata(&rotated).unwrap().len() < 2000);
    assert!(dir.path().join("info.log.2").exists());
}
