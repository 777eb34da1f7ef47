//! Single-book checkout record.
//!
//! Transactions predate cart orders and remain for one-click purchases. Their
//! payment status is a tiny state machine: `Pending` settles exactly once, to
//! either `Completed` or `Failed`, and never moves again.
//!
//! A completed transaction can then be handed to a courier. The shipment is
//! booked once; after that its status only moves forward through
//! `Processing`, `Shipped` and `Delivered`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, Money, TransactionId, UserId};

/// Payment outcome for a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Completed => "Completed",
            Self::Failed => "Failed",
        }
    }

    /// Terminal statuses accept no further transitions.
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Completed" => Ok(Self::Completed),
            "Failed" => Ok(Self::Failed),
            other => Err(TransactionError::UnknownStatus(other.to_owned())),
        }
    }
}

/// Courier progress for a single-book shipment. Variants are declared in
/// delivery order.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum ShipmentStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
}

impl ShipmentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "Processing",
            Self::Shipped => "Shipped",
            Self::Delivered => "Delivered",
        }
    }
}

impl FromStr for ShipmentStatus {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            other => Err(TransactionError::UnknownShipmentStatus(other.to_owned())),
        }
    }
}

/// Delivery details captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetails {
    pub address: Option<String>,
    pub tracking_id: Option<String>,
    pub carrier: Option<String>,
    pub status: ShipmentStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
    #[error("transaction already settled as {0}")]
    AlreadySettled(PaymentStatus),
    #[error("unknown payment status: {0}")]
    UnknownStatus(String),
    #[error("unknown shipment status: {0}")]
    UnknownShipmentStatus(String),
    #[error("only paid transactions can be shipped; payment is {0}")]
    NotPaid(PaymentStatus),
    #[error("shipment already booked under {0}")]
    AlreadyShipped(String),
    #[error("no shipment has been booked yet")]
    NotShipped,
}

/// Stored transaction fields.
#[derive(Debug, Clone)]
pub struct TransactionRecord {
    pub id: TransactionId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub book_id: BookId,
    pub amount_paid: Money,
    pub payment_status: PaymentStatus,
    pub gateway_order_id: String,
    pub gateway_payment_id: Option<String>,
    pub shipping_details: ShippingDetails,
    pub created_at: DateTime<Utc>,
}

/// Legacy one-book payment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    id: TransactionId,
    buyer_id: UserId,
    seller_id: UserId,
    book_id: BookId,
    amount_paid: Money,
    payment_status: PaymentStatus,
    gateway_order_id: String,
    gateway_payment_id: Option<String>,
    shipping_details: ShippingDetails,
    created_at: DateTime<Utc>,
}

impl Transaction {
    /// Open a pending transaction for a freshly created gateway order.
    pub fn open(
        buyer_id: UserId,
        seller_id: UserId,
        book_id: BookId,
        amount_paid: Money,
        gateway_order_id: impl Into<String>,
        shipping_details: ShippingDetails,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: TransactionId::random(),
            buyer_id,
            seller_id,
            book_id,
            amount_paid,
            payment_status: PaymentStatus::Pending,
            gateway_order_id: gateway_order_id.into(),
            gateway_payment_id: None,
            shipping_details,
            created_at: now,
        }
    }

    pub fn restore(record: TransactionRecord) -> Self {
        let TransactionRecord {
            id,
            buyer_id,
            seller_id,
            book_id,
            amount_paid,
            payment_status,
            gateway_order_id,
            gateway_payment_id,
            shipping_details,
            created_at,
        } = record;
        Self {
            id,
            buyer_id,
            seller_id,
            book_id,
            amount_paid,
            payment_status,
            gateway_order_id,
            gateway_payment_id,
            shipping_details,
            created_at,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn amount_paid(&self) -> Money {
        self.amount_paid
    }

    pub fn payment_status(&self) -> PaymentStatus {
        self.payment_status
    }

    pub fn gateway_order_id(&self) -> &str {
        &self.gateway_order_id
    }

    pub fn gateway_payment_id(&self) -> Option<&str> {
        self.gateway_payment_id.as_deref()
    }

    pub fn shipping_details(&self) -> &ShippingDetails {
        &self.shipping_details
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Settle as paid.
    pub fn complete(&mut self, payment_id: impl Into<String>) -> Result<(), TransactionError> {
        self.settle(PaymentStatus::Completed)?;
        self.gateway_payment_id = Some(payment_id.into());
        Ok(())
    }

    /// Settle as abandoned.
    pub fn fail(&mut self) -> Result<(), TransactionError> {
        self.settle(PaymentStatus::Failed)
    }

    /// Whether `user` bought or sold the book.
    pub fn involves(&self, user: UserId) -> bool {
        self.buyer_id == user || self.seller_id == user
    }

    /// Attach the courier booking. Only a completed payment can ship, and
    /// only once.
    pub fn record_shipment(
        &mut self,
        tracking_id: impl Into<String>,
        carrier: Option<String>,
    ) -> Result<(), TransactionError> {
        if self.payment_status != PaymentStatus::Completed {
            return Err(TransactionError::NotPaid(self.payment_status));
        }
        if let Some(existing) = &self.shipping_details.tracking_id {
            return Err(TransactionError::AlreadyShipped(existing.clone()));
        }
        self.shipping_details.tracking_id = Some(tracking_id.into());
        self.shipping_details.carrier = carrier;
        self.shipping_details.status = ShipmentStatus::Processing;
        Ok(())
    }

    /// Move the shipment status forward. Returns whether anything changed;
    /// an equal or earlier status is ignored.
    pub fn advance_shipment(&mut self, next: ShipmentStatus) -> Result<bool, TransactionError> {
        if self.shipping_details.tracking_id.is_none() {
            return Err(TransactionError::NotShipped);
        }
        if next <= self.shipping_details.status {
            return Ok(false);
        }
        self.shipping_details.status = next;
        Ok(true)
    }

    fn settle(&mut self, outcome: PaymentStatus) -> Result<(), TransactionError> {
        if self.payment_status.is_terminal() {
            return Err(TransactionError::AlreadySettled(self.payment_status));
        }
        self.payment_status = outcome;
        Ok(())
    }
}
