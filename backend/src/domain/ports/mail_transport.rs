//! Port for outbound transactional email.

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Failures delivering a notification. Never surfaced to API callers.
    pub enum NotificationDeliveryError {
        /// The message could not be assembled (bad address, header).
        InvalidMessage { message: String } =>
            "notification could not be built: {message}",
        /// The transport failed or timed out.
        Transport { message: String } =>
            "notification transport failed: {message}",
    }
}

/// Rendered email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// HTML body.
    pub html: String,
}

/// Sends rendered emails.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MailTransport: Send + Sync {
    /// Deliver one message.
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationDeliveryError>;
}

/// Fixture transport that accepts and discards every message.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureMailTransport;

#[async_trait]
impl MailTransport for FixtureMailTransport {
    async fn send(&self, _message: EmailMessage) -> Result<(), NotificationDeliveryError> {
        Ok(())
    }
}
