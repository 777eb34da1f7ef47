//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror the JSON each domain type serialises to and register
//! it under the domain type's name.

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    #[schema(rename = "unauthorized")]
    Unauthorized,
    #[schema(rename = "forbidden")]
    Forbidden,
    #[schema(rename = "not_found")]
    NotFound,
    #[schema(rename = "conflict")]
    Conflict,
    #[schema(rename = "bad_gateway")]
    BadGateway,
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
///
/// `reason` names the business rule that rejected the request
/// (`self_trade`, `empty_cart`, `payment_signature`, `invalid_transition`,
/// ...). Clients should branch on it rather than on `message`.
#[derive(ToSchema)]
#[schema(as = crate::domain::Error)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ErrorSchema {
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    #[schema(example = "invalid_transition")]
    reason: String,
    #[schema(example = "order cannot move from shipped to pending")]
    message: String,
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    trace_id: Option<String>,
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::DealView`].
#[derive(ToSchema)]
#[schema(as = crate::domain::DealView)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct DealSchema {
    #[schema(format = "uuid")]
    id: String,
    #[schema(format = "uuid")]
    book_id: String,
    #[schema(format = "uuid")]
    buyer_id: String,
    #[schema(format = "uuid")]
    seller_id: String,
    #[schema(example = "Pending")]
    status: String,
    #[schema(example = "pickup")]
    method: String,
    #[schema(format = "date-time")]
    scheduled_time: Option<String>,
    rating: Option<serde_json::Value>,
    book: Option<serde_json::Value>,
    buyer: Option<serde_json::Value>,
    seller: Option<serde_json::Value>,
    #[schema(format = "date-time")]
    created_at: String,
    #[schema(format = "date-time")]
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::Order`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Order)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct OrderSchema {
    #[schema(format = "uuid")]
    id: String,
    #[schema(format = "uuid")]
    buyer_id: String,
    items: Vec<serde_json::Value>,
    /// Total in paise.
    #[schema(example = 35000)]
    total_amount: i64,
    #[schema(example = "confirmed")]
    status: String,
    shipping_address: serde_json::Value,
    gateway_order_id: String,
    gateway_payment_id: Option<String>,
    #[schema(example = "upi")]
    payment_method: String,
    tracking: Option<serde_json::Value>,
    notification_preferences: serde_json::Value,
    revision: u32,
    #[schema(format = "date-time")]
    created_at: String,
    #[schema(format = "date-time")]
    updated_at: String,
}

/// OpenAPI schema for [`crate::domain::Transaction`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Transaction)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct TransactionSchema {
    #[schema(format = "uuid")]
    id: String,
    #[schema(format = "uuid")]
    buyer_id: String,
    #[schema(format = "uuid")]
    seller_id: String,
    #[schema(format = "uuid")]
    book_id: String,
    amount_paid: i64,
    #[schema(example = "Completed")]
    payment_status: String,
    gateway_order_id: String,
    gateway_payment_id: Option<String>,
    shipping_details: serde_json::Value,
    #[schema(format = "date-time")]
    created_at: String,
}

/// OpenAPI schema for [`crate::domain::ports::PaymentSession`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::PaymentSession)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PaymentSessionSchema {
    #[schema(example = "order_Nf3k2Yz1")]
    order_id: String,
    /// Amount in paise.
    #[schema(example = 35000)]
    amount: i64,
    #[schema(example = "INR")]
    currency: String,
}

/// OpenAPI schema for [`crate::domain::ports::CheckoutSession`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::CheckoutSession)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct CheckoutSessionSchema {
    /// Public gateway key for the client widget.
    #[schema(example = "rzp_test_abc123")]
    key: String,
    #[schema(example = 29900)]
    amount: i64,
    #[schema(example = "INR")]
    currency: String,
    #[schema(example = "order_Nf3k2Yz1")]
    order_id: String,
}

/// OpenAPI schema for [`crate::domain::ports::CourierOption`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::CourierOption)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct CourierOptionSchema {
    #[schema(example = "Delhivery Surface")]
    courier_name: String,
    /// Quoted price in paise.
    #[schema(example = 8550)]
    rate: i64,
    #[schema(example = 4)]
    estimated_delivery_days: Option<u32>,
}

/// OpenAPI schema for [`crate::domain::ports::ShipmentProgress`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ports::ShipmentProgress)]
#[schema(rename_all = "camelCase")]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct ShipmentProgressSchema {
    transaction: TransactionSchema,
    /// Carrier status text, lifecycle status and scan history.
    tracking: serde_json::Value,
}
