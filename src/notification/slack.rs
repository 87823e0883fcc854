//! A client for posting notifications to Slack.

use crate::config::SlackConfig;
use crate::core::{Channel, Sink};
use crate::error::NotifyError;
use anyhow::Context;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// A trait for chat sessions that can post a message to a channel.
pub trait ChatApi: Send {
    fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()>;
}

/// Opens authenticated chat sessions.
pub trait ChatConnector: Send {
    fn open(&self, key: &str) -> anyhow::Result<Box<dyn ChatApi>>;
}

/// Opens sessions against the Slack Web API.
#[derive(Debug, Clone)]
pub struct SlackConnector {
    api_url: String,
    timeout: Duration,
}

impl SlackConnector {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            timeout,
        }
    }
}

impl ChatConnector for SlackConnector {
    fn open(&self, key: &str) -> anyhow::Result<Box<dyn ChatApi>> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", key))
            .context("Slack API key is not a valid header value")?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()
            .context("Failed to build Slack HTTP client")?;
        Ok(Box::new(SlackClient {
            client,
            api_url: self.api_url.trim_end_matches('/').to_string(),
        }))
    }
}

/// The body Slack returns for every Web API call.
#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

/// An authenticated Slack Web API session.
pub struct SlackClient {
    client: Client,
    api_url: String,
}

impl ChatApi for SlackClient {
    fn post_message(&self, channel: &str, text: &str) -> anyhow::Result<()> {
        let url = format!("{}/chat.postMessage", self.api_url);
        let payload = json!({ "channel": channel, "text": text });

        let res = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .context("HTTP request to Slack failed")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            error!(status = %status, body = %body, "Failed to send Slack notification");
            anyhow::bail!("Slack returned status {}, body: {}", status, body);
        }

        let body: SlackResponse = res.json().context("Unexpected response from Slack")?;
        if !body.ok {
            let reason = body.error.unwrap_or_else(|| "unknown_error".to_string());
            error!(channel, reason = %reason, "Slack rejected the message");
            anyhow::bail!("Slack rejected the message: {}", reason);
        }
        Ok(())
    }
}

/// Sink that posts each message verbatim to a Slack channel.
pub struct ChatSink {
    config: SlackConfig,
    connector: Box<dyn ChatConnector>,
    session: Option<Box<dyn ChatApi>>,
}

impl ChatSink {
    pub fn new(config: SlackConfig, timeout: Duration) -> Self {
        let connector = SlackConnector::new(config.api_url.clone(), timeout);
        Self::with_connector(config, Box::new(connector))
    }

    pub fn with_connector(config: SlackConfig, connector: Box<dyn ChatConnector>) -> Self {
        Self {
            config,
            connector,
            session: None,
        }
    }

    pub fn set_connector(&mut self, connector: Box<dyn ChatConnector>) {
        self.connector = connector;
        self.session = None;
    }

    fn session(&mut self) -> Result<&dyn ChatApi, NotifyError> {
        if self.session.is_none() {
            let session = self
                .connector
                .open(&self.config.key)
                .map_err(|e| NotifyError::connection(Channel::Chat, format!("{:#}", e)))?;
            debug!("Opened Slack session");
            self.session = Some(session);
        }
        self.session
            .as_deref()
            .ok_or_else(|| NotifyError::connection(Channel::Chat, "no Slack session"))
    }
}

impl Sink for ChatSink {
    fn channel(&self) -> Channel {
        Channel::Chat
    }

    // Severity is not encoded in chat messages.
    #[instrument(name = "chat_sink_emit", skip(self, message, _is_error))]
    fn emit(&mut self, message: &str, _is_error: bool) -> Result<(), NotifyError> {
        let channel = self.config.channel.clone();
        self.session()?
            .post_message(&channel, message)
            .map_err(|e| NotifyError::transmission(Channel::Chat, format!("{:#}", e)))?;
        info!(channel = %channel, "Successfully posted message to Slack.");
        Ok(())
    }
}
