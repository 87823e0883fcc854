//! Email notifications over SMTP.
//!
//! The sink talks to a [`MailConnector`] / [`MailTransport`] pair so the
//! transport can be replaced in tests. [`SmtpConnector`] is the `lettre`
//! backed implementation used by default.

use crate::config::EmailConfig;
use crate::core::{Channel, Sink};
use crate::error::NotifyError;
use crate::formatting::email_subject;
use lettre::address::{Address, Envelope};
use lettre::message::{header::ContentType, Mailbox, Message};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{SmtpTransport, Transport};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Failures reported by a mail transport.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MailError {
    #[error("mail server unreachable: {0}")]
    Unreachable(String),

    #[error("authentication failed: {0}")]
    AuthFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),
}

impl From<MailError> for NotifyError {
    fn from(err: MailError) -> Self {
        match err {
            MailError::Unreachable(_) | MailError::AuthFailed(_) => {
                NotifyError::connection(Channel::Email, err.to_string())
            }
            MailError::SendFailed(_) => NotifyError::transmission(Channel::Email, err.to_string()),
        }
    }
}

/// An open session with a mail server.
pub trait MailTransport: Send {
    fn authenticate(&mut self, user: &str, password: &str) -> Result<(), MailError>;

    /// Sends an already formatted message to the given recipients.
    fn send(&mut self, from: &str, to: &[String], raw_message: &[u8]) -> Result<(), MailError>;

    fn close(&mut self);
}

/// Opens sessions with a mail server.
pub trait MailConnector: Send {
    fn connect(&self, server: &str, port: u16) -> Result<Box<dyn MailTransport>, MailError>;
}

/// Connects to SMTP servers with `lettre`.
///
/// Port 465 uses implicit TLS; every other port upgrades with STARTTLS when
/// the server offers it.
#[derive(Debug, Default, Clone)]
pub struct SmtpConnector;

impl MailConnector for SmtpConnector {
    fn connect(&self, server: &str, port: u16) -> Result<Box<dyn MailTransport>, MailError> {
        let session = SmtpSession {
            server: server.to_string(),
            port,
            transport: build_transport(server, port, None)?,
            authenticated_as: None,
        };
        verify(&session.transport).map_err(MailError::Unreachable)?;
        debug!(server, port, "Connected to SMTP server");
        Ok(Box::new(session))
    }
}

fn build_transport(
    server: &str,
    port: u16,
    credentials: Option<Credentials>,
) -> Result<SmtpTransport, MailError> {
    let parameters = TlsParameters::new(server.to_string())
        .map_err(|e| MailError::Unreachable(e.to_string()))?;
    let tls = if port == 465 {
        Tls::Wrapper(parameters)
    } else {
        Tls::Opportunistic(parameters)
    };
    let mut builder = SmtpTransport::builder_dangerous(server).port(port).tls(tls);
    if let Some(credentials) = credentials {
        builder = builder.credentials(credentials);
    }
    Ok(builder.build())
}

fn verify(transport: &SmtpTransport) -> Result<(), String> {
    match transport.test_connection() {
        Ok(true) => Ok(()),
        Ok(false) => Err("server did not accept the connection".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

struct SmtpSession {
    server: String,
    port: u16,
    transport: SmtpTransport,
    authenticated_as: Option<String>,
}

impl MailTransport for SmtpSession {
    fn authenticate(&mut self, user: &str, password: &str) -> Result<(), MailError> {
        if self.authenticated_as.as_deref() == Some(user) {
            return Ok(());
        }
        let credentials = Credentials::new(user.to_string(), password.to_string());
        let transport = build_transport(&self.server, self.port, Some(credentials))?;
        verify(&transport).map_err(MailError::AuthFailed)?;
        self.transport = transport;
        self.authenticated_as = Some(user.to_string());
        Ok(())
    }

    fn send(&mut self, from: &str, to: &[String], raw_message: &[u8]) -> Result<(), MailError> {
        let from: Address = from
            .parse()
            .map_err(|e| MailError::SendFailed(format!("invalid sender '{}': {}", from, e)))?;
        let recipients = to
            .iter()
            .map(|addr| {
                addr.parse::<Address>().map_err(|e| {
                    MailError::SendFailed(format!("invalid recipient '{}': {}", addr, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let envelope = Envelope::new(Some(from), recipients)
            .map_err(|e| MailError::SendFailed(e.to_string()))?;
        self.transport
            .send_raw(&envelope, raw_message)
            .map_err(|e| MailError::SendFailed(e.to_string()))?;
        Ok(())
    }

    // Without connection pooling every send opens and quits its own SMTP
    // connection, so there is nothing left open here.
    fn close(&mut self) {
        debug!(server = %self.server, "SMTP session closed");
    }
}

/// Builds the RFC 5322 message for a notification.
pub fn compose_message(
    config: &EmailConfig,
    message: &str,
    is_error: bool,
) -> Result<Vec<u8>, NotifyError> {
    let from_address: Address = config
        .from
        .parse()
        .map_err(|e| invalid("sender address", e))?;
    let display_name = config.sender_name.clone().filter(|n| !n.trim().is_empty());
    let from = Mailbox::new(display_name, from_address);
    let to: Mailbox = config
        .to
        .parse()
        .map_err(|e| invalid("recipient address", e))?;

    let email = Message::builder()
        .from(from)
        .to(to)
        .subject(email_subject(&config.subject, is_error))
        .header(ContentType::TEXT_PLAIN)
        .body(message.to_string())
        .map_err(|e| invalid("message", e))?;
    Ok(email.formatted())
}

fn invalid(what: &str, err: impl std::fmt::Display) -> NotifyError {
    NotifyError::transmission(Channel::Email, format!("invalid {}: {}", what, err))
}

/// Sink that emails each message to a single recipient.
pub struct EmailSink {
    config: EmailConfig,
    connector: Box<dyn MailConnector>,
    session: Option<Box<dyn MailTransport>>,
}

impl EmailSink {
    pub fn new(config: EmailConfig) -> Self {
        Self::with_connector(config, Box::new(SmtpConnector))
    }

    pub fn with_connector(config: EmailConfig, connector: Box<dyn MailConnector>) -> Self {
        Self {
            config,
            connector,
            session: None,
        }
    }

    pub fn set_connector(&mut self, connector: Box<dyn MailConnector>) {
        self.connector = connector;
        self.session = None;
    }

    fn session(&mut self) -> Result<&mut Box<dyn MailTransport>, NotifyError> {
        if self.session.is_none() {
            let session = self
                .connector
                .connect(&self.config.server, self.config.port)
                .map_err(|e| {
                    warn!(server = %self.config.server, error = %e, "SMTP connection failed");
                    NotifyError::connection(Channel::Email, e.to_string())
                })?;
            self.session = Some(session);
        }
        self.session
            .as_mut()
            .ok_or_else(|| NotifyError::connection(Channel::Email, "no SMTP session"))
    }

    fn recipient(&self) -> String {
        self.config
            .to
            .parse::<Mailbox>()
            .map(|mailbox| mailbox.email.to_string())
            .unwrap_or_else(|_| self.config.to.clone())
    }
}

impl Sink for EmailSink {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    #[instrument(name = "email_sink_emit", skip(self, message))]
    fn emit(&mut self, message: &str, is_error: bool) -> Result<(), NotifyError> {
        let raw = compose_message(&self.config, message, is_error)?;
        let from = self.config.from.clone();
        let to = vec![self.recipient()];
        let credentials = self
            .config
            .user
            .clone()
            .filter(|u| !u.is_empty())
            .map(|user| (user, self.config.password.clone().unwrap_or_default()));

        let session = self.session()?;
        let result = match &credentials {
            Some((user, password)) => session.authenticate(user, password),
            None => Ok(()),
        }
        .and_then(|_| session.send(&from, &to, &raw));
        session.close();

        result?;
        info!(to = %to[0], "Email sent");
        Ok(())
    }
}
