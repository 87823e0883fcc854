//! Configuration management for Mann
//!
//! This module defines the main `Config` struct and one optional sub-struct per
//! notification channel. It uses the `figment` crate to load configuration from
//! a TOML file and merge it with environment variables and command-line flags.
//! A channel whose section is absent or empty is disabled.

use crate::cli::Cli;
use crate::core::Channel;
use crate::error::ConfigError;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The main configuration struct for the dispatcher.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// Print messages to standard output.
    #[serde(default)]
    pub console: bool,
    /// Log messages to rotating files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileConfig>,
    /// Send messages by email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailConfig>,
    /// Post messages to a Slack channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slack: Option<SlackConfig>,
    /// Turn messages into Trello cards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trello: Option<TrelloConfig>,
    /// Return the first channel failure to the caller after fallback reporting.
    #[serde(
        rename = "raiseOnFailure",
        alias = "raise_on_failure",
        alias = "raiseonfailure",
        default,
        skip_serializing_if = "is_false"
    )]
    pub raise_on_failure: bool,
    /// The diagnostics level used by the binary.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Timeout for HTTP requests made by remote sinks, in seconds.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Log file targets, one per severity.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct FileConfig {
    /// Path of the informational log.
    #[serde(default, alias = "debug", skip_serializing_if = "Option::is_none")]
    pub info: Option<PathBuf>,
    /// Path of the error log.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<PathBuf>,
}

impl FileConfig {
    pub fn is_empty(&self) -> bool {
        self.info.is_none() && self.error.is_none()
    }
}

/// SMTP settings for email notifications.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct EmailConfig {
    #[serde(default)]
    pub server: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// Display name combined with `from` in the `From` header.
    #[serde(rename = "sendername", alias = "sender_name", default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub from: String,
    #[serde(alias = "recipient", default)]
    pub to: String,
    /// Credentials are only used when `user` is set.
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Subject line; prefixed with `[ERROR] ` for error messages.
    #[serde(default = "default_subject")]
    pub subject: String,
}

/// Slack Web API settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct SlackConfig {
    /// Bot or user OAuth token.
    #[serde(default)]
    pub key: String,
    #[serde(default = "default_slack_channel")]
    pub channel: String,
    #[serde(default = "default_slack_api_url")]
    pub api_url: String,
}

/// Trello REST API settings.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct TrelloConfig {
    #[serde(default)]
    pub key: String,
    #[serde(default)]
    pub token: String,
    /// Identifier of the list new cards are created on.
    #[serde(default)]
    pub list: String,
    /// Optional prefix for card titles.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional paragraph appended to card descriptions.
    #[serde(default)]
    pub desc: Option<String>,
    #[serde(default = "default_trello_api_url")]
    pub api_url: String,
}

// Keeps the flag out of the serialized defaults so any accepted spelling of
// the key can be merged on top without clashing.
fn is_false(value: &bool) -> bool {
    !*value
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_smtp_port() -> u16 {
    25
}

fn default_subject() -> String {
    "Notification".to_string()
}

fn default_slack_channel() -> String {
    "#general".to_string()
}

fn default_slack_api_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_trello_api_url() -> String {
    "https://api.trello.com/1".to_string()
}

impl Config {
    /// Loads the configuration by layering defaults, the TOML file named on the
    /// command line, `MANN_` environment variables and the command-line flags.
    ///
    /// Nested keys are separated by `__` in environment variables,
    /// e.g. `MANN_EMAIL__PASSWORD`.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = &cli.config {
            figment = figment.merge(Toml::file(path));
        }
        let config: Config = figment
            .merge(Env::prefixed("MANN_").split("__"))
            .merge(cli.clone())
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Whether the given channel has a non-empty configuration.
    pub fn is_enabled(&self, channel: Channel) -> bool {
        match channel {
            Channel::Console => self.console,
            Channel::File => self.file.as_ref().is_some_and(|f| !f.is_empty()),
            Channel::Email => self.email.as_ref().is_some_and(|e| !e.is_empty()),
            Channel::Chat => self.slack.as_ref().is_some_and(|s| !s.is_empty()),
            Channel::TaskBoard => self.trello.as_ref().is_some_and(|t| !t.is_empty()),
        }
    }

    /// Checks that every enabled channel carries the settings it needs.
    /// Empty sections leave their channel disabled and are not checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Setting {
                key: "timeout_seconds",
                reason: "must be non-zero".to_string(),
            });
        }
        if let Some(email) = self.email.as_ref().filter(|e| !e.is_empty()) {
            require(Channel::Email, "server", &email.server)?;
            require(Channel::Email, "from", &email.from)?;
            require(Channel::Email, "to", &email.to)?;
            if email.port == 0 {
                return Err(ConfigError::invalid(Channel::Email, "port must be non-zero"));
            }
        }
        if let Some(slack) = self.slack.as_ref().filter(|s| !s.is_empty()) {
            require(Channel::Chat, "key", &slack.key)?;
            require(Channel::Chat, "channel", &slack.channel)?;
        }
        if let Some(trello) = self.trello.as_ref().filter(|t| !t.is_empty()) {
            require(Channel::TaskBoard, "key", &trello.key)?;
            require(Channel::TaskBoard, "token", &trello.token)?;
            require(Channel::TaskBoard, "list", &trello.list)?;
        }
        Ok(())
    }
}

fn require(channel: Channel, field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::invalid(channel, format!("`{}` is required", field)))
    } else {
        Ok(())
    }
}

// Provide a default implementation for tests and easy setup.
impl Default for Config {
    fn default() -> Self {
        Self {
            console: false,
            file: None,
            email: None,
            slack: None,
            trello: None,
            raise_on_failure: false,
            log_level: default_log_level(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl EmailConfig {
    /// True when none of the user-supplied settings are present.
    pub fn is_empty(&self) -> bool {
        self.server.is_empty()
            && self.from.is_empty()
            && self.to.is_empty()
            && self.sender_name.is_none()
            && self.user.is_none()
            && self.password.is_none()
    }

    /// A minimal email section with default port and subject.
    pub fn new(server: impl Into<String>, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            port: default_smtp_port(),
            sender_name: None,
            from: from.into(),
            to: to.into(),
            user: None,
            password: None,
            subject: default_subject(),
        }
    }
}

impl SlackConfig {
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }

    pub fn new(key: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            channel: channel.into(),
            api_url: default_slack_api_url(),
        }
    }
}

impl TrelloConfig {
    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
            && self.token.is_empty()
            && self.list.is_empty()
            && self.name.is_none()
            && self.desc.is_none()
    }

    pub fn new(key: impl Into<String>, token: impl Into<String>, list: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            token: token.into(),
            list: list.into(),
            name: None,
            desc: None,
            api_url: default_trello_api_url(),
        }
    }
}
