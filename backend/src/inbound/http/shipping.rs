//! Courier handlers for paid single-book purchases.
//!
//! ```text
//! POST /api/v1/shipping/optimize
//! POST /api/v1/shipping/create-order
//! GET  /api/v1/shipping/track/{transactionId}
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Transaction;
use crate::domain::ports::{
    CourierOption, ServiceabilityQuery, ShipRequest, ShipmentDestination, ShipmentProgress,
    TrackShipmentRequest,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::{
    CourierOptionSchema, ErrorSchema, ShipmentProgressSchema, TransactionSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_id, require_positive, require_text,
};

/// Route and parcel weight to quote couriers for.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OptimizeBody {
    #[serde(alias = "pickup_postcode")]
    #[schema(example = "110001")]
    pub pickup_postcode: Option<String>,
    #[serde(alias = "delivery_postcode")]
    #[schema(example = "560001")]
    pub delivery_postcode: Option<String>,
    /// Parcel weight in kilograms.
    #[schema(example = 0.5)]
    pub weight: Option<f64>,
}

/// Delivery address for a courier booking.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ShippingDetailsBody {
    pub address: Option<String>,
    pub city: Option<String>,
    pub pincode: Option<String>,
    pub state: Option<String>,
    pub phone: Option<String>,
}

/// Paid transaction to hand to the courier.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentBody {
    #[schema(format = "uuid")]
    pub transaction_id: Option<String>,
    pub shipping_details: Option<ShippingDetailsBody>,
}

fn parse_destination(details: Option<ShippingDetailsBody>) -> ApiResult<ShipmentDestination> {
    let ShippingDetailsBody {
        address,
        city,
        pincode,
        state,
        phone,
    } = details.ok_or_else(|| missing_field_error(FieldName::new("shippingDetails")))?;
    Ok(ShipmentDestination {
        address: require_text(address, FieldName::new("shippingDetails.address"))?,
        city: require_text(city, FieldName::new("shippingDetails.city"))?,
        pincode: require_text(pincode, FieldName::new("shippingDetails.pincode"))?,
        state: require_text(state, FieldName::new("shippingDetails.state"))?,
        phone: require_text(phone, FieldName::new("shippingDetails.phone"))?,
    })
}

/// Couriers able to serve a route, cheapest first.
#[utoipa::path(
    post,
    path = "/api/v1/shipping/optimize",
    request_body = OptimizeBody,
    responses(
        (status = 200, description = "Ranked courier options", body = [CourierOptionSchema]),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 502, description = "Shipping carrier failure", body = ErrorSchema)
    ),
    tags = ["shipping"],
    operation_id = "optimizeShipping",
    security(("BearerToken" = []))
)]
#[post("/shipping/optimize")]
pub async fn optimize(
    state: web::Data<HttpState>,
    _user: AuthenticatedUser,
    payload: web::Json<OptimizeBody>,
) -> ApiResult<web::Json<Vec<CourierOption>>> {
    let OptimizeBody {
        pickup_postcode,
        delivery_postcode,
        weight,
    } = payload.into_inner();
    let query = ServiceabilityQuery {
        pickup_postcode: require_text(pickup_postcode, FieldName::new("pickupPostcode"))?,
        delivery_postcode: require_text(delivery_postcode, FieldName::new("deliveryPostcode"))?,
        weight_kg: require_positive(weight, FieldName::new("weight"))?,
    };
    let options = state.checkout.shipping_options(query).await?;
    Ok(web::Json(options))
}

/// Book a courier for a paid transaction.
#[utoipa::path(
    post,
    path = "/api/v1/shipping/create-order",
    request_body = CreateShipmentBody,
    responses(
        (status = 200, description = "Shipment booked", body = TransactionSchema),
        (status = 400, description = "Invalid request or transaction not paid", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Transaction not found", body = ErrorSchema),
        (status = 502, description = "Shipping carrier failure", body = ErrorSchema)
    ),
    tags = ["shipping"],
    operation_id = "createShipment",
    security(("BearerToken" = []))
)]
#[post("/shipping/create-order")]
pub async fn create_shipment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreateShipmentBody>,
) -> ApiResult<web::Json<Transaction>> {
    let CreateShipmentBody {
        transaction_id,
        shipping_details,
    } = payload.into_inner();
    let raw_id = require_text(transaction_id, FieldName::new("transactionId"))?;
    let request = ShipRequest {
        caller: user.id(),
        transaction_id: parse_id(&raw_id, FieldName::new("transactionId"))?,
        destination: parse_destination(shipping_details)?,
    };
    let transaction = state.checkout.ship(request).await?;
    Ok(web::Json(transaction))
}

/// Carrier progress for a booked shipment.
#[utoipa::path(
    get,
    path = "/api/v1/shipping/track/{transactionId}",
    params(("transactionId" = String, Path, format = "uuid", description = "Transaction id")),
    responses(
        (status = 200, description = "Shipment progress", body = ShipmentProgressSchema),
        (status = 400, description = "Invalid id or shipment not booked", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Transaction not found", body = ErrorSchema),
        (status = 502, description = "Shipping carrier failure", body = ErrorSchema)
    ),
    tags = ["shipping"],
    operation_id = "trackShipment",
    security(("BearerToken" = []))
)]
#[get("/shipping/track/{transaction_id}")]
pub async fn track(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<ShipmentProgress>> {
    let transaction_id = parse_id(&path.into_inner(), FieldName::new("transactionId"))?;
    let progress = state
        .checkout
        .track_shipment(TrackShipmentRequest {
            caller: user.id(),
            transaction_id,
        })
        .await?;
    Ok(web::Json(progress))
}
