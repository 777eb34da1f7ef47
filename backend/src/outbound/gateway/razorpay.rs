//! Reqwest-backed Razorpay order adapter.
//!
//! Owns transport details only: basic-auth credentials, the request timeout,
//! HTTP error mapping and JSON decoding into domain gateway orders.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::{CreateOrderDto, ErrorEnvelopeDto, OrderDto};
use crate::domain::ports::{GatewayOrder, GatewayOrderRequest, PaymentGateway, PaymentGatewayError};

const DEFAULT_BASE_URL: &str = "https://api.razorpay.com/v1/";
const USER_AGENT: &str = "bookhive-marketplace/0.1";

/// API key pair issued by Razorpay.
pub struct RazorpayCredentials {
    pub key_id: String,
    pub key_secret: Zeroizing<String>,
}

/// Razorpay adapter creating orders against one API base URL.
pub struct RazorpayGateway {
    client: Client,
    orders_url: Url,
    credentials: RazorpayCredentials,
}

impl RazorpayGateway {
    /// Build an adapter against the production API.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        credentials: RazorpayCredentials,
        timeout: Duration,
    ) -> Result<Self, RazorpayError> {
        let base = Url::parse(DEFAULT_BASE_URL).map_err(RazorpayError::Url)?;
        Self::with_base_url(base, credentials, timeout)
    }

    /// Build an adapter against `base_url`, for example a sandbox or stub.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be built or the URL cannot
    /// take an `orders` path segment.
    pub fn with_base_url(
        base_url: Url,
        credentials: RazorpayCredentials,
        timeout: Duration,
    ) -> Result<Self, RazorpayError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(RazorpayError::Client)?;
        let orders_url = base_url.join("orders").map_err(RazorpayError::Url)?;
        Ok(Self {
            client,
            orders_url,
            credentials,
        })
    }
}

/// Construction failures for [`RazorpayGateway`].
#[derive(Debug, thiserror::Error)]
pub enum RazorpayError {
    #[error("invalid Razorpay URL: {0}")]
    Url(url::ParseError),
    #[error("failed to build HTTP client: {0}")]
    Client(reqwest::Error),
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        let payload = CreateOrderDto {
            amount: request.amount.minor_units(),
            currency: &request.currency,
            receipt: &request.receipt,
        };
        let response = self
            .client
            .post(self.orders_url.clone())
            .basic_auth(
                &self.credentials.key_id,
                Some(self.credentials.key_secret.as_str()),
            )
            .json(&payload)
            .send()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        let order = parse_order(body.as_ref())?;
        debug!(
            gateway_order_id = %order.id,
            receipt = %request.receipt,
            "gateway order created"
        );
        Ok(order)
    }

    fn public_key_id(&self) -> String {
        self.credentials.key_id.clone()
    }
}

fn parse_order(body: &[u8]) -> Result<GatewayOrder, PaymentGatewayError> {
    let decoded: OrderDto = serde_json::from_slice(body).map_err(|error| {
        PaymentGatewayError::decode(format!("invalid Razorpay order payload: {error}"))
    })?;
    decoded.into_domain().map_err(PaymentGatewayError::decode)
}

fn map_status_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let message = serde_json::from_slice::<ErrorEnvelopeDto>(body)
        .ok()
        .and_then(|envelope| {
            let code = envelope.error.code.unwrap_or_default();
            envelope
                .error
                .description
                .map(|description| format!("{code}: {description}"))
        })
        .unwrap_or_else(|| format!("status {}", status.as_u16()));
    PaymentGatewayError::rejected(status.as_u16(), message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Money;
    use rstest::rstest;

    #[rstest]
    fn parses_order_response() {
        let body = br#"{
            "id": "order_9A33XWu170gUtm",
            "entity": "order",
            "amount": 35000,
            "currency": "INR",
            "receipt": "order_rcpt_1",
            "status": "created"
        }"#;

        let order = parse_order(body).expect("order should decode");
        assert_eq!(order.id, "order_9A33XWu170gUtm");
        assert_eq!(order.amount, Money::from_major(350));
        assert_eq!(order.currency, "INR");
    }

    #[rstest]
    #[case::negative_amount(br#"{"id":"order_1","amount":-1,"currency":"INR"}"#.as_slice())]
    #[case::missing_id(br#"{"amount":100,"currency":"INR"}"#.as_slice())]
    #[case::not_json(b"<html>".as_slice())]
    fn rejects_unusable_order_payloads(#[case] body: &[u8]) {
        let error = parse_order(body).expect_err("payload should be rejected");
        assert!(matches!(error, PaymentGatewayError::Decode { .. }));
    }

    #[rstest]
    fn status_errors_carry_gateway_description() {
        let body = br#"{"error":{"code":"BAD_REQUEST_ERROR","description":"amount too low"}}"#;
        let error = map_status_error(StatusCode::BAD_REQUEST, body);
        assert_eq!(
            error,
            PaymentGatewayError::rejected(400_u16, "BAD_REQUEST_ERROR: amount too low")
        );
    }

    #[rstest]
    fn status_errors_without_body_report_the_status() {
        let error = map_status_error(StatusCode::BAD_GATEWAY, b"");
        assert_eq!(error, PaymentGatewayError::rejected(502_u16, "status 502"));
    }

    #[rstest]
    fn base_url_keeps_version_prefix() {
        let credentials = RazorpayCredentials {
            key_id: "rzp_test_key".to_owned(),
            key_secret: Zeroizing::new("secret".to_owned()),
        };
        let base = Url::parse("http://127.0.0.1:9/v1/").expect("url");
        let gateway = RazorpayGateway::with_base_url(base, credentials, Duration::from_secs(1))
            .expect("gateway builds");
        assert_eq!(gateway.orders_url.as_str(), "http://127.0.0.1:9/v1/orders");
        assert_eq!(gateway.public_key_id(), "rzp_test_key");
    }
}
