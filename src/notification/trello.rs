//! Turns notifications into Trello cards.

use crate::config::TrelloConfig;
use crate::core::{Channel, Sink};
use crate::error::NotifyError;
use crate::formatting::{card_description, card_title};
use anyhow::Context;
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error, info, instrument};

/// A trait for task-board sessions that can create cards.
pub trait TaskBoardApi: Send {
    /// Creates a card and returns its identifier.
    fn create_card(&self, title: &str, list_id: &str, description: &str) -> anyhow::Result<String>;
}

/// Opens task-board sessions keyed by an API key and token.
pub trait TaskBoardConnector: Send {
    fn open(&self, key: &str, token: &str) -> anyhow::Result<Box<dyn TaskBoardApi>>;
}

/// Opens sessions against the Trello REST API.
#[derive(Debug, Clone)]
pub struct TrelloConnector {
    api_url: String,
    timeout: Duration,
}

impl TrelloConnector {
    pub fn new(api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            timeout,
        }
    }
}

impl TaskBoardConnector for TrelloConnector {
    fn open(&self, key: &str, token: &str) -> anyhow::Result<Box<dyn TaskBoardApi>> {
        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .context("Failed to build Trello HTTP client")?;
        Ok(Box::new(TrelloClient {
            client,
            api_url: self.api_url.trim_end_matches('/').to_string(),
            key: key.to_string(),
            token: token.to_string(),
        }))
    }
}

#[derive(Debug, Deserialize)]
struct CreatedCard {
    id: String,
}

/// An authenticated Trello session.
pub struct TrelloClient {
    client: Client,
    api_url: String,
    key: String,
    token: String,
}

impl TaskBoardApi for TrelloClient {
    fn create_card(&self, title: &str, list_id: &str, description: &str) -> anyhow::Result<String> {
        let url = format!("{}/cards", self.api_url);
        let res = self
            .client
            .post(&url)
            .query(&[
                ("key", self.key.as_str()),
                ("token", self.token.as_str()),
                ("idList", list_id),
                ("name", title),
                ("desc", description),
            ])
            .send()
            .context("HTTP request to Trello failed")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().unwrap_or_default();
            error!(status = %status, body = %body, "Failed to create Trello card");
            anyhow::bail!("Trello returned status {}, body: {}", status, body);
        }

        let card: CreatedCard = res.json().context("Unexpected response from Trello")?;
        Ok(card.id)
    }
}

/// Sink that creates one card per message.
pub struct TaskBoardSink {
    config: TrelloConfig,
    connector: Box<dyn TaskBoardConnector>,
    session: Option<Box<dyn TaskBoardApi>>,
}

impl TaskBoardSink {
    pub fn new(config: TrelloConfig, timeout: Duration) -> Self {
        let connector = TrelloConnector::new(config.api_url.clone(), timeout);
        Self::with_connector(config, Box::new(connector))
    }

    pub fn with_connector(config: TrelloConfig, connector: Box<dyn TaskBoardConnector>) -> Self {
        Self {
            config,
            connector,
            session: None,
        }
    }

    pub fn set_connector(&mut self, connector: Box<dyn TaskBoardConnector>) {
        self.connector = connector;
        self.session = None;
    }

    fn session(&mut self) -> Result<&dyn TaskBoardApi, NotifyError> {
        if self.session.is_none() {
            let session = self
                .connector
                .open(&self.config.key, &self.config.token)
                .map_err(|e| NotifyError::connection(Channel::TaskBoard, format!("{:#}", e)))?;
            debug!("Opened Trello session");
            self.session = Some(session);
        }
        self.session
            .as_deref()
            .ok_or_else(|| NotifyError::connection(Channel::TaskBoard, "no Trello session"))
    }
}

impl Sink for TaskBoardSink {
    fn channel(&self) -> Channel {
        Channel::TaskBoard
    }

    #[instrument(name = "task_board_sink_emit", skip(self, message, _is_error))]
    fn emit(&mut self, message: &str, _is_error: bool) -> Result<(), NotifyError> {
        let title = card_title(self.config.name.as_deref(), message);
        let description = card_description(message, self.config.desc.as_deref());
        let list = self.config.list.clone();

        let card_id = self
            .session()?
            .create_card(&title, &list, &description)
            .map_err(|e| NotifyError::transmission(Channel::TaskBoard, format!("{:#}", e)))?;
        info!(card = %card_id, list = %list, "Created Trello card");
        Ok(())
    }
}
