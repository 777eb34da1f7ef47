//! Meet-up deal HTTP handlers.
//!
//! ```text
//! POST  /api/v1/deals
//! GET   /api/v1/deals/seller
//! GET   /api/v1/deals/buyer
//! GET   /api/v1/deals/sold-count
//! GET   /api/v1/deals/{id}
//! PATCH /api/v1/deals/{id}/complete
//! POST  /api/v1/deals/{id}/rate
//! ```
//!
//! `{id}` only matches UUIDs, so the fixed segments above never collide with
//! it.

use actix_web::{HttpResponse, get, patch, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::ports::{CreateDealRequest, RateDealRequest};
use crate::domain::{DealId, DealView, HandoffMethod, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::auth::AuthenticatedUser;
use crate::inbound::http::schemas::{DealSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, missing_field_error, parse_enum, parse_id, parse_optional_rfc3339_timestamp,
    require_text,
};

/// Request payload for opening a deal.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateDealBody {
    #[schema(format = "uuid")]
    pub book_id: Option<String>,
    /// `pickup` or `courier`.
    #[schema(example = "pickup")]
    pub method: Option<String>,
    /// Proposed meet-up time.
    #[serde(alias = "time")]
    #[schema(format = "date-time")]
    pub scheduled_time: Option<String>,
}

/// Request payload for rating a deal.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RateDealBody {
    #[schema(minimum = 1, maximum = 5)]
    pub stars: Option<i64>,
    pub comment: Option<String>,
}

/// Number of deals the caller has closed as seller.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SoldCountBody {
    pub count: u64,
}

fn parse_create_deal(body: CreateDealBody, buyer_id: UserId) -> ApiResult<CreateDealRequest> {
    let book_id = require_text(body.book_id, FieldName::new("bookId"))?;
    let method = require_text(body.method, FieldName::new("method"))?;
    Ok(CreateDealRequest {
        book_id: parse_id(&book_id, FieldName::new("bookId"))?,
        buyer_id,
        method: parse_enum::<HandoffMethod>(
            &method,
            FieldName::new("method"),
            &["pickup", "courier"],
        )?,
        scheduled_time: parse_optional_rfc3339_timestamp(
            body.scheduled_time.as_deref(),
            FieldName::new("scheduledTime"),
        )?,
    })
}

/// Open a deal for a book, or fetch the caller's existing one.
///
/// Responds `201 Created` for a new deal and `200 OK` when the caller
/// already negotiates for this book. The seller is notified only on
/// creation.
#[utoipa::path(
    post,
    path = "/api/v1/deals",
    request_body = CreateDealBody,
    responses(
        (status = 201, description = "Deal created", body = DealSchema),
        (status = 200, description = "Existing deal returned", body = DealSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Buyer is the seller", body = ErrorSchema),
        (status = 404, description = "Book not found", body = ErrorSchema)
    ),
    tags = ["deals"],
    operation_id = "createDeal",
    security(("BearerToken" = []))
)]
#[post("/deals")]
pub async fn create_deal(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreateDealBody>,
) -> ApiResult<HttpResponse> {
    let request = parse_create_deal(payload.into_inner(), user.id())?;
    let response = state.deals.create_deal(request).await?;
    let mut builder = if response.created {
        HttpResponse::Created()
    } else {
        HttpResponse::Ok()
    };
    Ok(builder.json(response.deal))
}

/// Deals on the caller's listings, buyers expanded.
#[utoipa::path(
    get,
    path = "/api/v1/deals/seller",
    responses(
        (status = 200, description = "Deals as seller", body = [DealSchema]),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["deals"],
    operation_id = "listSellerDeals",
    security(("BearerToken" = []))
)]
#[get("/deals/seller")]
pub async fn list_seller_deals(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<DealView>>> {
    let deals = state.deals_query.list_for_seller(user.id()).await?;
    Ok(web::Json(deals))
}

/// Deals the caller opened as buyer, sellers expanded. Deals whose book has
/// been removed are left out.
#[utoipa::path(
    get,
    path = "/api/v1/deals/buyer",
    responses(
        (status = 200, description = "Deals as buyer", body = [DealSchema]),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["deals"],
    operation_id = "listBuyerDeals",
    security(("BearerToken" = []))
)]
#[get("/deals/buyer")]
pub async fn list_buyer_deals(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<Vec<DealView>>> {
    let deals = state.deals_query.list_for_buyer(user.id()).await?;
    Ok(web::Json(deals))
}

#[utoipa::path(
    get,
    path = "/api/v1/deals/sold-count",
    responses(
        (status = 200, description = "Completed deals as seller", body = SoldCountBody),
        (status = 401, description = "Unauthorized", body = ErrorSchema)
    ),
    tags = ["deals"],
    operation_id = "soldCount",
    security(("BearerToken" = []))
)]
#[get("/deals/sold-count")]
pub async fn sold_count(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<SoldCountBody>> {
    let count = state.deals_query.sold_count(user.id()).await?;
    Ok(web::Json(SoldCountBody { count }))
}

/// Fetch one deal the caller takes part in.
#[utoipa::path(
    get,
    path = "/api/v1/deals/{id}",
    params(("id" = String, Path, format = "uuid", description = "Deal id")),
    responses(
        (status = 200, description = "Deal", body = DealSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 404, description = "Deal not found", body = ErrorSchema)
    ),
    tags = ["deals"],
    operation_id = "getDeal",
    security(("BearerToken" = []))
)]
#[get("/deals/{id:[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}}")]
pub async fn get_deal(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<DealView>> {
    let deal_id: DealId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let deal = state.deals_query.get_deal(deal_id, user.id()).await?;
    Ok(web::Json(deal))
}

/// Close a deal and delete its chat thread. Repeating the call is harmless.
#[utoipa::path(
    patch,
    path = "/api/v1/deals/{id}/complete",
    params(("id" = String, Path, format = "uuid", description = "Deal id")),
    responses(
        (status = 200, description = "Deal completed", body = DealSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Caller is not a participant", body = ErrorSchema),
        (status = 404, description = "Deal not found", body = ErrorSchema)
    ),
    tags = ["deals"],
    operation_id = "completeDeal",
    security(("BearerToken" = []))
)]
#[patch("/deals/{id}/complete")]
pub async fn complete_deal(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
) -> ApiResult<web::Json<DealView>> {
    let deal_id: DealId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let deal = state.deals.complete_deal(deal_id, user.id()).await?;
    Ok(web::Json(deal))
}

/// Rate a completed deal. A later rating replaces the earlier one.
#[utoipa::path(
    post,
    path = "/api/v1/deals/{id}/rate",
    params(("id" = String, Path, format = "uuid", description = "Deal id")),
    request_body = RateDealBody,
    responses(
        (status = 200, description = "Rating saved", body = DealSchema),
        (status = 400, description = "Stars out of range or deal not completed", body = ErrorSchema),
        (status = 401, description = "Unauthorized", body = ErrorSchema),
        (status = 403, description = "Caller is not a participant", body = ErrorSchema),
        (status = 404, description = "Deal not found", body = ErrorSchema)
    ),
    tags = ["deals"],
    operation_id = "rateDeal",
    security(("BearerToken" = []))
)]
#[post("/deals/{id}/rate")]
pub async fn rate_deal(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<String>,
    payload: web::Json<RateDealBody>,
) -> ApiResult<web::Json<DealView>> {
    let deal_id: DealId = parse_id(&path.into_inner(), FieldName::new("id"))?;
    let RateDealBody { stars, comment } = payload.into_inner();
    let stars = stars.ok_or_else(|| missing_field_error(FieldName::new("stars")))?;
    let deal = state
        .deals
        .rate_deal(RateDealRequest {
            deal_id,
            rater_id: user.id(),
            stars,
            comment,
        })
        .await?;
    Ok(web::Json(deal))
}

#[cfg(test)]
#[path = "deals_tests.rs"]
mod tests;
