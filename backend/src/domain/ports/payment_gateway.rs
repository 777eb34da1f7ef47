//! Port for the external payment processor.
//!
//! Opening a gateway order reserves an amount the client then pays through the
//! processor's own UI. The processor later signs the resulting payment, which
//! the [`PaymentVerifier`](crate::domain::PaymentVerifier) checks.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::Money;

use super::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// The request never produced a response (DNS, TLS, timeout).
        Transport { message: String } =>
            "payment gateway unreachable: {message}",
        /// The processor answered with a non-success status.
        Rejected { status: u16, message: String } =>
            "payment gateway rejected request ({status}): {message}",
        /// The processor's response could not be decoded.
        Decode { message: String } =>
            "payment gateway response invalid: {message}",
    }
}

/// Parameters for a new gateway order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayOrderRequest {
    /// Amount in minor units.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
    /// Merchant-side reference echoed back in gateway reports.
    pub receipt: String,
}

/// Order handle issued by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayOrder {
    /// Gateway order identifier, later used to correlate payment callbacks.
    pub id: String,
    /// Amount in minor units, as confirmed by the gateway.
    pub amount: Money,
    /// ISO currency code.
    pub currency: String,
}

/// Opens payment orders with the processor.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an order for `request.amount`.
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError>;

    /// Public key identifier handed to checkout clients.
    fn public_key_id(&self) -> String;
}

/// Fixture gateway that echoes the request under a receipt-derived id.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixturePaymentGateway;

#[async_trait]
impl PaymentGateway for FixturePaymentGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        Ok(GatewayOrder {
            id: format!("gw_{}", request.receipt),
            amount: request.amount,
            currency: request.currency,
        })
    }

    fn public_key_id(&self) -> String {
        "rzp_test_fixture".to_owned()
    }
}
