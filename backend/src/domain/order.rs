//! Cart order aggregate.
//!
//! An order is a snapshot taken when the buyer checks out: item prices and
//! the shipping address are copied in and never re-read from live records.
//! The total is computed once, at creation. Every later mutation goes
//! through a method here so the status DAG and the payment invariants hold.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, Money, OrderId, Tracking, UserId};

/// Order lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses directly reachable from `self`.
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Confirmed, Self::Cancelled],
            Self::Confirmed => &[Self::Shipped, Self::Cancelled],
            Self::Shipped => &[Self::Delivered],
            Self::Delivered | Self::Cancelled => &[],
        }
    }

    /// Whether `next` is an adjacent successor.
    pub fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(OrderError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Payment instrument chosen at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Card,
    Upi,
    Netbanking,
    Wallet,
}

impl PaymentMethod {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Card => "card",
            Self::Upi => "upi",
            Self::Netbanking => "netbanking",
            Self::Wallet => "wallet",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = OrderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "card" => Ok(Self::Card),
            "upi" => Ok(Self::Upi),
            "netbanking" => Ok(Self::Netbanking),
            "wallet" => Ok(Self::Wallet),
            other => Err(OrderError::UnknownPaymentMethod(other.to_owned())),
        }
    }
}

/// One purchased book with its price frozen at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub book_id: BookId,
    pub seller_id: UserId,
    pub price_at_purchase: Money,
}

/// Denormalised copy of the delivery address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone_number: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Per-order email opt-ins. Everything defaults to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPreferences {
    pub order_confirmation: bool,
    pub shipping_updates: bool,
    pub delivery_confirmation: bool,
}

impl Default for NotificationPreferences {
    fn default() -> Self {
        Self {
            order_confirmation: true,
            shipping_updates: true,
            delivery_confirmation: true,
        }
    }
}

/// Rule violations raised by the order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("an order needs at least one item")]
    NoItems,
    #[error("order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("unknown order status: {0}")]
    UnknownStatus(String),
    #[error("unknown payment method: {0}")]
    UnknownPaymentMethod(String),
    #[error("order total exceeds the representable amount")]
    TotalOverflow,
    #[error("a payment is already recorded for this order")]
    AlreadyPaid,
}

/// Input for placing an order.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub buyer_id: UserId,
    pub items: Vec<OrderItem>,
    pub shipping_address: ShippingAddress,
    pub gateway_order_id: String,
    pub payment_method: PaymentMethod,
}

/// Stored order fields, used by persistence adapters to rebuild an aggregate.
#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: OrderId,
    pub buyer_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub status: OrderStatus,
    pub shipping_address: ShippingAddress,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub tracking: Option<Tracking>,
    pub notification_preferences: NotificationPreferences,
    pub revision: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Sum of item prices.
///
/// # Errors
/// [`OrderError::TotalOverflow`] when the sum does not fit in [`Money`].
pub fn order_total(items: &[OrderItem]) -> Result<Money, OrderError> {
    Money::checked_sum(items.iter().map(|item| item.price_at_purchase))
        .ok_or(OrderError::TotalOverflow)
}

/// Multi-item purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    id: OrderId,
    buyer_id: UserId,
    items: Vec<OrderItem>,
    total_amount: Money,
    status: OrderStatus,
    shipping_address: ShippingAddress,
    gateway_order_id: String,
    gateway_payment_id: Option<String>,
    payment_method: PaymentMethod,
    tracking: Option<Tracking>,
    notification_preferences: NotificationPreferences,
    revision: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Order {
    /// Place a pending order. New orders start at revision 1.
    pub fn place(draft: NewOrder, now: DateTime<Utc>) -> Result<Self, OrderError> {
        if draft.items.is_empty() {
            return Err(OrderError::NoItems);
        }
        let total_amount = order_total(&draft.items)?;
        Ok(Self {
            id: OrderId::random(),
            buyer_id: draft.buyer_id,
            total_amount,
            items: draft.items,
            status: OrderStatus::Pending,
            shipping_address: draft.shipping_address,
            gateway_order_id: draft.gateway_order_id,
            gateway_payment_id: None,
            payment_method: draft.payment_method,
            tracking: None,
            notification_preferences: NotificationPreferences::default(),
            revision: 1,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild an order from storage.
    pub fn restore(record: OrderRecord) -> Self {
        let OrderRecord {
            id,
            buyer_id,
            items,
            total_amount,
            status,
            shipping_address,
            gateway_order_id,
            gateway_payment_id,
            payment_method,
            tracking,
            notification_preferences,
            revision,
            created_at,
            updated_at,
        } = record;
        Self {
            id,
            buyer_id,
            items,
            total_amount,
            status,
            shipping_address,
            gateway_order_id,
            gateway_payment_id,
            payment_method,
            tracking,
            notification_preferences,
            revision,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> OrderId {
        self.id
    }

    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn total_amount(&self) -> Money {
        self.total_amount
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn shipping_address(&self) -> &ShippingAddress {
        &self.shipping_address
    }

    pub fn gateway_order_id(&self) -> &str {
        &self.gateway_order_id
    }

    pub fn gateway_payment_id(&self) -> Option<&str> {
        self.gateway_payment_id.as_deref()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        self.payment_method
    }

    pub fn tracking(&self) -> Option<&Tracking> {
        self.tracking.as_ref()
    }

    pub fn notification_preferences(&self) -> NotificationPreferences {
        self.notification_preferences
    }

    pub fn revision(&self) -> u32 {
        self.revision
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `user` placed this order.
    pub fn is_owned_by(&self, user: UserId) -> bool {
        self.buyer_id == user
    }

    /// Move along the status DAG.
    pub fn transition_to(&mut self, next: OrderStatus) -> Result<(), OrderError> {
        if !self.status.can_transition_to(next) {
            return Err(OrderError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// Whether a verified gateway payment has been recorded.
    pub fn is_paid(&self) -> bool {
        self.gateway_payment_id.is_some()
    }

    /// Record a verified gateway payment.
    ///
    /// A pending order moves to `confirmed`. An order already moved past
    /// `pending` by hand keeps its status and only gains the payment id.
    pub fn confirm_payment(&mut self, payment_id: impl Into<String>) -> Result<(), OrderError> {
        if self.is_paid() {
            return Err(OrderError::AlreadyPaid);
        }
        match self.status {
            OrderStatus::Pending => self.transition_to(OrderStatus::Confirmed)?,
            OrderStatus::Cancelled => {
                return Err(OrderError::InvalidTransition {
                    from: OrderStatus::Cancelled,
                    to: OrderStatus::Confirmed,
                });
            }
            OrderStatus::Confirmed | OrderStatus::Shipped | OrderStatus::Delivered => {}
        }
        self.gateway_payment_id = Some(payment_id.into());
        Ok(())
    }

    /// Replace the email opt-ins.
    pub fn set_notification_preferences(&mut self, preferences: NotificationPreferences) {
        self.notification_preferences = preferences;
    }

    pub(crate) fn tracking_mut(&mut self) -> &mut Option<Tracking> {
        &mut self.tracking
    }

    /// Stamp the modification time. Called before every write.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    /// Advance the optimistic-concurrency revision, returning the revision
    /// the store must still hold for the write to succeed.
    pub fn bump_revision(&mut self) -> u32 {
        let expected = self.revision;
        self.revision = expected.saturating_add(1);
        expected
    }
}

#[cfg(test)]
#[path = "order_tests.rs"]
mod tests;
