//! Driving port for the cart order lifecycle.
//!
//! HTTP handlers call this port for every order mutation. Implementations
//! coordinate the cart, address book, payment gateway and notification
//! dispatcher while keeping the order's status DAG and payment invariants.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    AddressId, Error, Money, NotificationPreferences, Order, OrderId, OrderStatus, PaymentMethod,
    TrackingUpdate, UserId,
};

/// Request to turn the buyer's cart into a pending order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub buyer_id: UserId,
    pub address_id: AddressId,
    pub payment_method: PaymentMethod,
}

/// Gateway handle returned to the client so it can open the payment UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSession {
    /// Gateway order identifier.
    pub order_id: String,
    /// Amount in minor units.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
}

/// Signed payment callback forwarded by the client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyPaymentRequest {
    pub caller: UserId,
    pub gateway_order_id: String,
    pub gateway_payment_id: String,
    pub signature: String,
}

/// Carrier update for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateTrackingRequest {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub update: TrackingUpdate,
}

/// Explicit status move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateStatusRequest {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub status: OrderStatus,
}

/// Replacement email opt-ins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateNotificationsRequest {
    pub order_id: OrderId,
    pub buyer_id: UserId,
    pub preferences: NotificationPreferences,
}

/// Driving port for order mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderCommand: Send + Sync {
    /// Snapshot the cart, open a gateway order and persist a pending order.
    ///
    /// # Errors
    ///
    /// - `not_found` when the address is missing or belongs to someone else.
    /// - `empty_cart` when the cart has no items.
    /// - `upstream_gateway` when the processor refuses or is unreachable.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<PaymentSession, Error>;

    /// Check the payment signature and confirm the order exactly once.
    ///
    /// Repeating a successful verification returns the stored order without
    /// clearing the cart or sending email again.
    ///
    /// # Errors
    ///
    /// - `payment_signature` on mismatch; nothing is read or written.
    /// - `not_found` when no order of the caller matches the gateway id.
    /// - `invalid_transition` when the order was cancelled before payment.
    async fn verify_payment(&self, request: VerifyPaymentRequest) -> Result<Order, Error>;

    /// Append a shipment event and refresh the tracking summary.
    async fn update_tracking(&self, request: UpdateTrackingRequest) -> Result<Order, Error>;

    /// Move the order along its status DAG.
    ///
    /// # Errors
    ///
    /// - `invalid_transition` for any move that is not an adjacent successor.
    async fn update_status(&self, request: UpdateStatusRequest) -> Result<Order, Error>;

    /// Overwrite the order's email opt-ins.
    async fn update_notification_preferences(
        &self,
        request: UpdateNotificationsRequest,
    ) -> Result<Order, Error>;
}

/// Fixture command that opens sessions but knows no stored orders.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureOrderCommand;

#[async_trait]
impl OrderCommand for FixtureOrderCommand {
    async fn create_order(&self, _request: CreateOrderRequest) -> Result<PaymentSession, Error> {
        Ok(PaymentSession {
            order_id: "order_fixture".to_owned(),
            amount: Money::ZERO,
            currency: crate::domain::CURRENCY.to_owned(),
        })
    }

    async fn verify_payment(&self, _request: VerifyPaymentRequest) -> Result<Order, Error> {
        Err(Error::not_found("order not found"))
    }

    async fn update_tracking(&self, _request: UpdateTrackingRequest) -> Result<Order, Error> {
        Err(Error::not_found("order not found"))
    }

    async fn update_status(&self, _request: UpdateStatusRequest) -> Result<Order, Error> {
        Err(Error::not_found("order not found"))
    }

    async fn update_notification_preferences(
        &self,
        _request: UpdateNotificationsRequest,
    ) -> Result<Order, Error> {
        Err(Error::not_found("order not found"))
    }
}
