//! Notification fan-out for fulfillment events.
//!
//! Two channels: transactional email, gated per order by its notification
//! preferences, and real-time pushes, which are unconditional and dropped
//! when the recipient is offline. Callers log delivery failures and carry on;
//! a failed email never unwinds the state change that triggered it.

mod templates;

use std::sync::Arc;

use serde_json::Value;

use super::ports::{EmailMessage, MailTransport, NotificationDeliveryError, PushChannel, PushMessage};
use super::{BookId, Order, TrackingUpdate, UserId, UserProfile};

pub use templates::LineItem;

/// Whether an email left the building.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the mail transport.
    Sent,
    /// The order's preferences opt out of this email.
    OptedOut,
}

/// Sends order emails and user pushes. Built once at startup and shared.
#[derive(Clone)]
pub struct NotificationDispatcher {
    mail: Arc<dyn MailTransport>,
    push: Arc<dyn PushChannel>,
}

impl NotificationDispatcher {
    pub fn new(mail: Arc<dyn MailTransport>, push: Arc<dyn PushChannel>) -> Self {
        Self { mail, push }
    }

    /// Send the order confirmation if the order opted in.
    pub async fn send_order_confirmation(
        &self,
        order: &Order,
        recipient: &UserProfile,
        items: &[LineItem],
    ) -> Result<Delivery, NotificationDeliveryError> {
        if !order.notification_preferences().order_confirmation {
            return Ok(Delivery::OptedOut);
        }
        let (subject, html) = templates::order_confirmation(order, recipient, items);
        self.deliver(recipient, subject, html).await
    }

    /// Send a shipping update if the order opted in.
    pub async fn send_shipping_update(
        &self,
        order: &Order,
        recipient: &UserProfile,
        update: &TrackingUpdate,
    ) -> Result<Delivery, NotificationDeliveryError> {
        if !order.notification_preferences().shipping_updates {
            return Ok(Delivery::OptedOut);
        }
        let (subject, html) = templates::shipping_update(order, recipient, update);
        self.deliver(recipient, subject, html).await
    }

    /// Send the delivery confirmation if the order opted in.
    pub async fn send_delivery_confirmation(
        &self,
        order: &Order,
        recipient: &UserProfile,
        items: &[LineItem],
    ) -> Result<Delivery, NotificationDeliveryError> {
        if !order.notification_preferences().delivery_confirmation {
            return Ok(Delivery::OptedOut);
        }
        let (subject, html) = templates::delivery_confirmation(order, recipient, items);
        self.deliver(recipient, subject, html).await
    }

    /// Push an event to the user's live connection, if any.
    pub fn push_to_user(&self, user_id: &UserId, event: &str, payload: Value) -> bool {
        let delivered = self.push.push(user_id, PushMessage::new(event, payload));
        if !delivered {
            tracing::debug!(%user_id, event, "push dropped; user offline");
        }
        delivered
    }

    async fn deliver(
        &self,
        recipient: &UserProfile,
        subject: String,
        html: String,
    ) -> Result<Delivery, NotificationDeliveryError> {
        self.mail
            .send(EmailMessage {
                to: recipient.email.clone(),
                subject,
                html,
            })
            .await?;
        Ok(Delivery::Sent)
    }
}

/// Pair each order item with a display title, falling back to a placeholder
/// for books that have since been deleted.
pub fn line_items(order: &Order, titles: &[(BookId, String)]) -> Vec<LineItem> {
    order
        .items()
        .iter()
        .map(|item| LineItem {
            title: titles
                .iter()
                .find(|(id, _)| *id == item.book_id)
                .map_or_else(|| "Unknown book".to_owned(), |(_, title)| title.clone()),
            price: item.price_at_purchase,
        })
        .collect()
}

#[cfg(test)]
#[path = "notification_tests.rs"]
mod tests;
