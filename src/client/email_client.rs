use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use secrecy::{ExposeSecret, Secret};

use crate::settings::EmailSettings;

/// Errors that can occur while delivering an email
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("Invalid email address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("Failed to build email: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    #[error("Email transport unavailable: {0}")]
    Unavailable(String),

    #[error("No sender address is configured")]
    MissingSender,
}

pub type DeliveryResult<T> = Result<T, DeliveryError>;

/// An outgoing HTML email
#[derive(Debug, Clone, PartialEq)]
pub struct Email {
    pub recipients: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

/// Outbound email transport
/// NOTE: Implemented by the SMTP client and by test doubles
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver a single email
    async fn send(&self, email: &Email) -> DeliveryResult<()>;

    /// Check that the transport is reachable and accepts our credentials
    async fn verify(&self) -> DeliveryResult<()>;
}

/// SMTP account used to authenticate with the mail relay
#[derive(Debug, Clone)]
pub struct SmtpCredentials {
    pub username: String,
    pub password: Secret<String>,
}

/// Email client sending through an SMTP relay over implicit TLS
#[derive(Clone)]
pub struct SmtpEmailClient {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Option<Mailbox>,
}

impl SmtpEmailClient {
    /// Build a pooled transport for the relay.
    /// Certificates are always validated, there is no way to opt out.
    /// Without a sender every delivery fails with [`DeliveryError::MissingSender`].
    ///
    /// NOTE: The connection pool spawns a tokio task, so this must be called inside a tokio runtime
    pub fn new(
        host: &str,
        port: u16,
        credentials: SmtpCredentials,
        sender: Option<Mailbox>,
        timeout: Duration,
    ) -> DeliveryResult<Self> {
        let credentials = Credentials::new(
            credentials.username,
            credentials.password.expose_secret().clone(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::relay(host)?
            .port(port)
            .credentials(credentials)
            .timeout(Some(timeout))
            .build();

        Ok(Self { transport, sender })
    }

    /// Build the client from the email settings.
    /// An unusable sender address is logged, the client is still created so the service can run.
    pub fn from_settings(settings: &EmailSettings) -> DeliveryResult<Self> {
        let sender = settings
            .sender()
            .map_err(|e| tracing::error!("Confirmation emails cannot be sent: {:?}", e))
            .ok();
        let (host, port) = settings.smtp_addr();

        Self::new(host, port, settings.credentials(), sender, settings.timeout())
    }

    fn build_message(&self, email: &Email) -> DeliveryResult<Message> {
        let sender = self.sender.clone().ok_or(DeliveryError::MissingSender)?;
        let mut builder = Message::builder()
            .from(sender)
            .subject(email.subject.as_str())
            .header(ContentType::TEXT_HTML);

        for recipient in &email.recipients {
            let address: Address = recipient.parse()?;
            builder = builder.to(Mailbox::new(None, address));
        }

        Ok(builder.body(email.html_body.clone())?)
    }
}

#[async_trait::async_trait]
impl EmailSender for SmtpEmailClient {
    #[tracing::instrument(name = "Send an email via SMTP", skip(self, email), fields(subject = %email.subject))]
    async fn send(&self, email: &Email) -> DeliveryResult<()> {
        let message = self.build_message(email)?;
        let response = self.transport.send(message).await?;

        tracing::debug!("SMTP relay accepted message with code {}", response.code());
        Ok(())
    }

    #[tracing::instrument(name = "Verify SMTP transport", skip(self))]
    async fn verify(&self) -> DeliveryResult<()> {
        if self.transport.test_connection().await? {
            Ok(())
        } else {
            Err(DeliveryError::Unavailable(
                "SMTP relay did not accept the connection check".into(),
            ))
        }
    }
}
