//! Legacy single-book checkout handlers.
//!
//! ```text
//! POST /api/v1/payments/checkout
//! POST /api/v1/payments/verify
//! POST /api/v1/payments/fail
//! ```

use actix_web::{post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Transaction;
use crate::domain::ports::{AbandonCheckoutRequest, CheckoutRequest, CheckoutSession};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::orders::{VerifyPaymentBody, parse_verify};
use crate::inbound::http::schemas::{CheckoutSessionSchema, ErrorSchema, TransactionSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_id, require_text};

/// Request payload for buying one book outright.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutBody {
    #[schema(format = "uuid")]
    pub book_id: Option<String>,
    /// Free-form delivery address.
    pub address: Option<String>,
}

/// Gateway order the buyer walked away from.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbandonBody {
    #[serde(alias = "razorpay_order_id")]
    pub order_id: Option<String>,
}

/// Open a gateway order for one book's current price.
#[utoipa::path(
    post,
    path = "/api/v1/payments/checkout",
    request_body = CheckoutBody,
    responses(
        (status = 200, description = "Gateway order opened", body = CheckoutSessionSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Buyer is the seller", body = ErrorSchema),
        (status = 404, description = "Book not found", body = ErrorSchema),
        (status = 502, description = "Payment gateway failure", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "checkoutBook",
    security(("BearerToken" = []))
)]
#[post("/payments/checkout")]
pub async fn checkout(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CheckoutBody>,
) -> ApiResult<web::Json<CheckoutSession>> {
    let CheckoutBody { book_id, address } = payload.into_inner();
    let book_id = require_text(book_id, FieldName::new("bookId"))?;
    let session = state
        .checkout
        .checkout(CheckoutRequest {
            buyer_id: user.id(),
            book_id: parse_id(&book_id, FieldName::new("bookId"))?,
            address: address.filter(|value| !value.trim().is_empty()),
        })
        .await?;
    Ok(web::Json(session))
}

/// Settle a pending transaction from a signed payment callback.
#[utoipa::path(
    post,
    path = "/api/v1/payments/verify",
    request_body = VerifyPaymentBody,
    responses(
        (status = 200, description = "Transaction completed", body = TransactionSchema),
        (status = 400, description = "Signature mismatch or transaction already failed", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Transaction not found", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "verifyBookPayment",
    security(("BearerToken" = []))
)]
#[post("/payments/verify")]
pub async fn verify(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<VerifyPaymentBody>,
) -> ApiResult<web::Json<Transaction>> {
    let request = parse_verify(payload.into_inner(), user.id())?;
    let transaction = state.checkout.verify(request).await?;
    Ok(web::Json(transaction))
}

/// Mark a pending transaction as failed.
#[utoipa::path(
    post,
    path = "/api/v1/payments/fail",
    request_body = AbandonBody,
    responses(
        (status = 200, description = "Transaction failed", body = TransactionSchema),
        (status = 400, description = "Transaction already settled", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Transaction not found", body = ErrorSchema)
    ),
    tags = ["payments"],
    operation_id = "abandonBookPayment",
    security(("BearerToken" = []))
)]
#[post("/payments/fail")]
pub async fn abandon(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<AbandonBody>,
) -> ApiResult<web::Json<Transaction>> {
    let gateway_order_id =
        require_text(payload.into_inner().order_id, FieldName::new("orderId"))?;
    let transaction = state
        .checkout
        .abandon(AbandonCheckoutRequest {
            buyer_id: user.id(),
            gateway_order_id,
        })
        .await?;
    Ok(web::Json(transaction))
}
