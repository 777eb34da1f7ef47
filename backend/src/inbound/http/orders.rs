//! Order HTTP handlers.
//!
//! ```text
//! POST /api/v1/orders/create
//! POST /api/v1/orders/verify
//! GET  /api/v1/orders
//! GET  /api/v1/orders/{id}
//! PUT  /api/v1/orders/{id}/tracking
//! PUT  /api/v1/orders/{id}/status
//! PUT  /api/v1/orders/{id}/notifications
//! ```
//!
//! Orders belong to their buyer; every `{id}` route answers 404 for orders
//! owned by someone else.

use actix_web::{get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{
    CreateOrderRequest, PaymentSession, UpdateNotificationsRequest, UpdateStatusRequest,
    UpdateTrackingRequest, VerifyPaymentRequest,
};
use crate::domain::{
    Error, NotificationPreferences, Order, OrderId, OrderStatus, PaymentMethod, TrackingStatus,
    TrackingUpdate, UserId,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::{ErrorSchema, OrderSchema, PaymentSessionSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_enum, parse_id, parse_optional_rfc3339_timestamp,
    require_text,
};

const PAYMENT_METHODS: &[&str] = &["card", "upi", "netbanking", "wallet"];
const ORDER_STATUSES: &[&str] = &["pending", "confirmed", "shipped", "delivered", "cancelled"];
const TRACKING_STATUSES: &[&str] = &[
    "pending",
    "picked_up",
    "in_transit",
    "out_for_delivery",
    "delivered",
];

/// Request payload for turning the caller's cart into an order.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    #[schema(format = "uuid")]
    pub address_id: Option<String>,
    #[schema(example = "upi")]
    pub payment_method: Option<String>,
}

/// Signed payment callback relayed by the client.
///
/// The gateway's own field names are accepted as aliases.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentBody {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: Option<String>,
    #[serde(alias = "razorpay_payment_id")]
    pub payment_id: Option<String>,
    #[serde(alias = "razorpay_signature")]
    pub signature: Option<String>,
}

/// Carrier update for an order's shipment.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackingBody {
    pub carrier: Option<String>,
    pub tracking_number: Option<String>,
    #[schema(example = "in_transit")]
    pub status: Option<String>,
    pub location: Option<String>,
    #[schema(format = "date-time")]
    pub estimated_delivery: Option<String>,
}

/// Requested order status.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct StatusBody {
    #[schema(example = "shipped")]
    pub status: Option<String>,
}

/// Email opt-ins. All three flags are required.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsBody {
    pub order_confirmation: Option<bool>,
    pub shipping_updates: Option<bool>,
    pub delivery_confirmation: Option<bool>,
}

fn order_id(path: web::Path<String>) -> ApiResult<OrderId> {
    parse_id(&path.into_inner(), FieldName::new("id"))
}

fn parse_create_order(body: CreateOrderBody, buyer_id: UserId) -> ApiResult<CreateOrderRequest> {
    let address_id = require_text(body.address_id, FieldName::new("addressId"))?;
    let method = require_text(body.payment_method, FieldName::new("paymentMethod"))?;
    Ok(CreateOrderRequest {
        buyer_id,
        address_id: parse_id(&address_id, FieldName::new("addressId"))?,
        payment_method: parse_enum::<PaymentMethod>(
            &method,
            FieldName::new("paymentMethod"),
            PAYMENT_METHODS,
        )?,
    })
}

pub(crate) fn parse_verify(body: VerifyPaymentBody, caller: UserId) -> ApiResult<VerifyPaymentRequest> {
    Ok(VerifyPaymentRequest {
        caller,
        gateway_order_id: require_text(body.order_id, FieldName::new("orderId"))?,
        gateway_payment_id: require_text(body.payment_id, FieldName::new("paymentId"))?,
        signature: require_text(body.signature, FieldName::new("signature"))?,
    })
}

fn parse_tracking(body: TrackingBody) -> ApiResult<TrackingUpdate> {
    let status = require_text(body.status, FieldName::new("status"))?;
    Ok(TrackingUpdate {
        carrier: require_text(body.carrier, FieldName::new("carrier"))?,
        tracking_number: require_text(body.tracking_number, FieldName::new("trackingNumber"))?,
        status: parse_enum::<TrackingStatus>(
            &status,
            FieldName::new("status"),
            TRACKING_STATUSES,
        )?,
        location: require_text(body.location, FieldName::new("location"))?,
        estimated_delivery: parse_optional_rfc3339_timestamp(
            body.estimated_delivery.as_deref(),
            FieldName::new("estimatedDelivery"),
        )?,
    })
}

fn parse_preferences(body: &NotificationsBody) -> Result<NotificationPreferences, Error> {
    let flag = |value: Option<bool>, name: &'static str| {
        value.ok_or_else(|| missing_field_error(FieldName::new(name)))
    };
    Ok(NotificationPreferences {
        order_confirmation: flag(body.order_confirmation, "orderConfirmation")?,
        shipping_updates: flag(body.shipping_updates, "shippingUpdates")?,
        delivery_confirmation: flag(body.delivery_confirmation, "deliveryConfirmation")?,
    })
}

/// Snapshot the caller's cart into a pending order and open a gateway order
/// for its total.
#[utoipa::path(
    post,
    path = "/api/v1/orders/create",
    request_body = CreateOrderBody,
    responses(
        (status = 200, description = "Gateway order opened", body = PaymentSessionSchema),
        (status = 400, description = "Invalid request or empty cart", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Address not found", body = ErrorSchema),
        (status = 502, description = "Payment gateway failure", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "createOrder",
    security(("BearerToken" = []))
)]
#[post("/orders/create")]
pub async fn create_order(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreateOrderBody>,
) -> ApiResult<web::Json<PaymentSession>> {
    let request = parse_create_order(payload.into_inner(), user.id())?;
    let session = state.orders.create_order(request).await?;
    Ok(web::Json(session))
}

/// Confirm an order after a signed payment callback.
///
/// A signature mismatch never touches the order. Replaying a verified
/// callback returns the confirmed order unchanged.
#[utoipa::path(
    post,
    path = "/api/v1/orders/verify",
    request_body = VerifyPaymentBody,
    responses(
        (status = 200, description = "Order confirmed", body = OrderSchema),
        (status = 400, description = "Signature mismatch", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "verifyOrderPayment",
    security(("BearerToken" = []))
)]
#[post("/orders/verify")]
pub async fn verify_payment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<VerifyPaymentBody>,
) -> ApiResult<web::Json<Order>> {
    let request = parse_verify(payload.into_inner(), user.id())?;
    let order = state.orders.verify_payment(request).await?;
    Ok(web::Json(order))
}

/// The caller's orders, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/orders",
    responses(
        (status = 200, description = "Orders", body = [OrderSchema]),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "listOrders",
    security(("BearerToken" = []))
)]
#[get("/orders")]
pub async fn list_orders(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<Order>>> {
    let orders = state.orders_query.list_for_buyer(user.id()).await?;
    Ok(web::Json(orders))
}

#[utoipa::path(
    get,
    path = "/api/v1/orders/{id}",
    params(("id" = String, Path, format = "uuid", description = "Order id")),
    responses(
        (status = 200, description = "Order", body = OrderSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "getOrder",
    security(("BearerToken" = []))
)]
#[get("/orders/{id}")]
pub async fn get_order(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<Order>> {
    let order = state
        .orders_query
        .get_order(order_id(path)?, user.id())
        .await?;
    Ok(web::Json(order))
}

/// Append a carrier update to the shipment history.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/tracking",
    params(("id" = String, Path, format = "uuid", description = "Order id")),
    request_body = TrackingBody,
    responses(
        (status = 200, description = "Order with updated tracking", body = OrderSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema),
        (status = 409, description = "Concurrent update", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "updateOrderTracking",
    security(("BearerToken" = []))
)]
#[put("/orders/{id}/tracking")]
pub async fn update_tracking(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<TrackingBody>,
) -> ApiResult<web::Json<Order>> {
    let order_id = order_id(path)?;
    let update = parse_tracking(payload.into_inner())?;
    let order = state
        .orders
        .update_tracking(UpdateTrackingRequest {
            order_id,
            buyer_id: user.id(),
            update,
        })
        .await?;
    Ok(web::Json(order))
}

/// Move an order to an adjacent status.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/status",
    params(("id" = String, Path, format = "uuid", description = "Order id")),
    request_body = StatusBody,
    responses(
        (status = 200, description = "Order with new status", body = OrderSchema),
        (status = 400, description = "Transition not permitted", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema),
        (status = 409, description = "Concurrent update", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "updateOrderStatus",
    security(("BearerToken" = []))
)]
#[put("/orders/{id}/status")]
pub async fn update_status(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<StatusBody>,
) -> ApiResult<web::Json<Order>> {
    let order_id = order_id(path)?;
    let raw = require_text(payload.into_inner().status, FieldName::new("status"))?;
    let status = parse_enum::<OrderStatus>(&raw, FieldName::new("status"), ORDER_STATUSES)?;
    let order = state
        .orders
        .update_status(UpdateStatusRequest {
            order_id,
            buyer_id: user.id(),
            status,
        })
        .await?;
    Ok(web::Json(order))
}

/// Replace the order's email opt-ins.
#[utoipa::path(
    put,
    path = "/api/v1/orders/{id}/notifications",
    params(("id" = String, Path, format = "uuid", description = "Order id")),
    request_body = NotificationsBody,
    responses(
        (status = 200, description = "Order with new preferences", body = OrderSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Order not found", body = ErrorSchema)
    ),
    tags = ["orders"],
    operation_id = "updateOrderNotifications",
    security(("BearerToken" = []))
)]
#[put("/orders/{id}/notifications")]
pub async fn update_notifications(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<NotificationsBody>,
) -> ApiResult<web::Json<Order>> {
    let order_id = order_id(path)?;
    let preferences = parse_preferences(&payload)?;
    let order = state
        .orders
        .update_notification_preferences(UpdateNotificationsRequest {
            order_id,
            buyer_id: user.id(),
            preferences,
        })
        .await?;
    Ok(web::Json(order))
}

#[cfg(test)]
#[path = "orders_tests.rs"]
mod tests;
