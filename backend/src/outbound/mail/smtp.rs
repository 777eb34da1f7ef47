//! Lettre-backed SMTP adapter for the `MailTransport` port.
//!
//! Builds HTML messages from rendered templates and hands them to a pooled
//! async SMTP transport with a bounded send timeout.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::ports::{EmailMessage, MailTransport, NotificationDeliveryError};

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SmtpSecurity {
    /// Implicit TLS, usually port 465.
    Tls,
    /// Upgrade a plaintext session with STARTTLS, usually port 587.
    #[default]
    StartTls,
    /// No encryption. Only for local relays such as Mailpit.
    None,
}

/// Error returned for unrecognised [`SmtpSecurity`] names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown SMTP security mode: {0} (expected tls, starttls or none)")]
pub struct UnknownSmtpSecurity(pub String);

impl FromStr for SmtpSecurity {
    type Err = UnknownSmtpSecurity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tls" => Ok(Self::Tls),
            "starttls" => Ok(Self::StartTls),
            "none" => Ok(Self::None),
            _ => Err(UnknownSmtpSecurity(s.to_owned())),
        }
    }
}

/// Connection settings for [`SmtpMailer`].
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub security: SmtpSecurity,
    pub username: String,
    pub password: Zeroizing<String>,
    /// Sender, for example `BookHive <orders@bookhive.example>`.
    pub from: String,
    pub timeout: Duration,
}

/// Construction failures for [`SmtpMailer`].
#[derive(Debug, thiserror::Error)]
pub enum SmtpMailerError {
    #[error("invalid sender address: {0}")]
    Sender(#[from] lettre::address::AddressError),
    #[error("invalid SMTP relay: {0}")]
    Relay(#[from] lettre::transport::smtp::Error),
}

/// SMTP mail transport.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    /// Build the transport. No connection is opened until the first send.
    ///
    /// # Errors
    ///
    /// Returns an error when the sender address does not parse or the relay
    /// host cannot be used for TLS.
    pub fn new(settings: SmtpSettings) -> Result<Self, SmtpMailerError> {
        let from: Mailbox = settings.from.parse()?;
        let builder = match settings.security {
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?,
            SmtpSecurity::StartTls => {
                AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?
            }
            SmtpSecurity::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&settings.host)
            }
        };
        let credentials = Credentials::new(settings.username, settings.password.to_string());
        let transport = builder
            .port(settings.port)
            .credentials(credentials)
            .timeout(Some(settings.timeout))
            .build();
        Ok(Self { transport, from })
    }
}

fn build_message(
    from: &Mailbox,
    message: EmailMessage,
) -> Result<Message, NotificationDeliveryError> {
    let to: Mailbox = message
        .to
        .parse()
        .map_err(|err: lettre::address::AddressError| {
            NotificationDeliveryError::invalid_message(format!("recipient: {err}"))
        })?;
    Message::builder()
        .from(from.clone())
        .to(to)
        .subject(message.subject)
        .header(ContentType::TEXT_HTML)
        .body(message.html)
        .map_err(|err| NotificationDeliveryError::invalid_message(err.to_string()))
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationDeliveryError> {
        let email = build_message(&self.from, message)?;
        let response = self
            .transport
            .send(email)
            .await
            .map_err(|err| NotificationDeliveryError::transport(err.to_string()))?;
        debug!(code = %response.code(), "email accepted by relay");
        Ok(())
    }
}
