use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpConfig;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),
    #[error("failed to build message: {0}")]
    Message(#[from] lettre::error::Error),
    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),
}

/// Delivers a quota warning to an administrator.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Where the warning is sent from, for the progress line
    fn sender(&self) -> &str;

    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError>;
}

/// Sends warnings through an SMTP relay over implicit TLS.
pub struct SmtpNotifier {
    address: String,
    from: Mailbox,
    to: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from: Mailbox = config.address.parse()?;
        let to: Mailbox = config.recipient.parse()?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)?
            .credentials(Credentials::new(
                config.address.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            address: config.address.clone(),
            from,
            to,
            transport,
        })
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    fn sender(&self) -> &str {
        &self.address
    }

    async fn notify(&self, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())?;

        self.transport.send(message).await?;
        tracing::info!(to = %self.to, "sent quota warning");
        Ok(())
    }
}
