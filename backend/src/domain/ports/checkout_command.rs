//! Driving port for legacy single-book checkout and its courier shipping.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{BookId, Error, Money, Transaction, TransactionId, UserId};

use super::{
    CourierOption, ServiceabilityQuery, ShipmentDestination, ShipmentTrack, VerifyPaymentRequest,
};

/// Request to buy one book directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutRequest {
    pub buyer_id: UserId,
    pub book_id: BookId,
    /// Free-form delivery address.
    pub address: Option<String>,
}

/// Everything a client needs to open the gateway's payment UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    /// Public gateway key id.
    pub key: String,
    /// Amount in minor units.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
    /// Gateway order identifier.
    pub order_id: String,
}

/// Buyer abandoning a pending checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbandonCheckoutRequest {
    pub buyer_id: UserId,
    pub gateway_order_id: String,
}

/// Hand a paid transaction to the courier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShipRequest {
    pub caller: UserId,
    pub transaction_id: TransactionId,
    pub destination: ShipmentDestination,
}

/// Look up a shipment's progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackShipmentRequest {
    pub caller: UserId,
    pub transaction_id: TransactionId,
}

/// Carrier tracking alongside the transaction it updated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentProgress {
    pub transaction: Transaction,
    pub tracking: ShipmentTrack,
}

/// Driving port for single-book purchases.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CheckoutCommand: Send + Sync {
    /// Open a gateway order for the book's price and record a pending
    /// transaction.
    async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession, Error>;

    /// Verify the payment signature and complete the transaction once.
    async fn verify(&self, request: VerifyPaymentRequest) -> Result<Transaction, Error>;

    /// Mark a pending transaction as failed.
    async fn abandon(&self, request: AbandonCheckoutRequest) -> Result<Transaction, Error>;

    /// Couriers able to serve a route, cheapest first, then fastest.
    async fn shipping_options(
        &self,
        query: ServiceabilityQuery,
    ) -> Result<Vec<CourierOption>, Error>;

    /// Book a courier for a completed transaction. Booking twice returns the
    /// stored shipment without calling the carrier again.
    async fn ship(&self, request: ShipRequest) -> Result<Transaction, Error>;

    /// Fetch carrier tracking and move the stored shipment status forward.
    async fn track_shipment(
        &self,
        request: TrackShipmentRequest,
    ) -> Result<ShipmentProgress, Error>;
}

/// Fixture command that refuses every book.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCheckoutCommand;

#[async_trait]
impl CheckoutCommand for FixtureCheckoutCommand {
    async fn checkout(&self, _request: CheckoutRequest) -> Result<CheckoutSession, Error> {
        Err(Error::not_found("book not found"))
    }

    async fn verify(&self, _request: VerifyPaymentRequest) -> Result<Transaction, Error> {
        Err(Error::not_found("transaction not found"))
    }

    async fn abandon(&self, _request: AbandonCheckoutRequest) -> Result<Transaction, Error> {
        Err(Error::not_found("transaction not found"))
    }

    async fn shipping_options(
        &self,
        _query: ServiceabilityQuery,
    ) -> Result<Vec<CourierOption>, Error> {
        Ok(Vec::new())
    }

    async fn ship(&self, _request: ShipRequest) -> Result<Transaction, Error> {
        Err(Error::not_found("transaction not found"))
    }

    async fn track_shipment(
        &self,
        _request: TrackShipmentRequest,
    ) -> Result<ShipmentProgress, Error> {
        Err(Error::not_found("transaction not found"))
    }
}
