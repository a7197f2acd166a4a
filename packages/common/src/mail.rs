use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use thiserror::Error;
use tracing::info;

use crate::config::{MailConfig, MailTransport, SmtpConfig};

/// A file attached to an outgoing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailAttachment {
    pub filename: String,
    pub content_type: String,
    pub content: Vec<u8>,
}

/// An outgoing email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    /// Plain-text body.
    pub body: String,
    pub attachments: Vec<MailAttachment>,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport is not configured")]
    Unconfigured,
    #[error("invalid mail configuration: {0}")]
    Config(String),
    #[error("message could not be built: {0}")]
    Message(String),
    #[error("mail transport failed: {0}")]
    Transport(String),
}

/// Outbound mail transport. Delivery is best-effort.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> Result<(), MailError>;
}

/// Mailer used when no transport is configured. Every send fails with
/// [`MailError::Unconfigured`].
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredMailer;

#[async_trait]
impl Mailer for UnconfiguredMailer {
    async fn send(&self, _message: MailMessage) -> Result<(), MailError> {
        Err(MailError::Unconfigured)
    }
}

/// Delivers through an SMTP relay.
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(from: &str, config: &SmtpConfig) -> Result<Self, MailError> {
        let host = config
            .host
            .clone()
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| MailError::Config("mail.smtp.host is not set".into()))?;
        let from: Mailbox = from
            .parse()
            .map_err(|e| MailError::Config(format!("mail.from: {e}")))?;

        let params =
            TlsParameters::new(host.clone()).map_err(|e| MailError::Config(e.to_string()))?;
        let tls = if config.secure {
            Tls::Wrapper(params)
        } else {
            Tls::Opportunistic(params)
        };

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host)
            .port(config.port)
            .tls(tls)
            .timeout(Some(Duration::from_secs(config.timeout_secs)));
        if let (Some(user), Some(password)) = (&config.user, &config.password) {
            builder = builder.credentials(Credentials::new(user.clone(), password.clone()));
        }

        Ok(Self {
            from,
            transport: builder.build(),
        })
    }

    fn build(&self, message: MailMessage) -> Result<Message, MailError> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| MailError::Message(format!("recipient: {e}")))?;

        let mut parts = MultiPart::mixed().singlepart(SinglePart::plain(message.body));
        for attachment in message.attachments {
            let content_type = ContentType::parse(&attachment.content_type)
                .map_err(|e| MailError::Message(format!("attachment type: {e}")))?;
            parts = parts.singlepart(
                Attachment::new(attachment.filename).body(attachment.content, content_type),
            );
        }

        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(message.subject)
            .multipart(parts)
            .map_err(|e| MailError::Message(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        let to = message.to.clone();
        let email = self.build(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;
        info!(to = %to, "Mail delivered to relay");
        Ok(())
    }
}

/// Development mailer: accepts every message and writes a log line instead
/// of delivering it. Only selected by `transport = "log"`.
#[derive(Debug, Clone)]
pub struct LogMailer {
    from: String,
}

impl LogMailer {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        info!(
            from = %self.from,
            to = %message.to,
            subject = %message.subject,
            attachments = message.attachments.len(),
            "Mail accepted (log transport, not delivered)"
        );
        Ok(())
    }
}

/// Build the mailer selected by configuration.
pub fn from_config(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    if !config.enabled {
        return Ok(Arc::new(UnconfiguredMailer));
    }
    Ok(match config.transport {
        MailTransport::Smtp => Arc::new(SmtpMailer::new(&config.from, &config.smtp)?),
        MailTransport::Log => Arc::new(LogMailer::new(config.from.clone())),
    })
}
