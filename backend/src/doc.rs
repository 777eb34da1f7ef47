//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every marketplace endpoint, the schema wrappers from
//! [`crate::inbound::http::schemas`] and the bearer-token security scheme.
//! Swagger UI serves it at `/docs` in debug builds.

use crate::inbound::http::deals::{CreateDealBody, RateDealBody, SoldCountBody};
use crate::inbound::http::orders::{
    CreateOrderBody, NotificationsBody, StatusBody, TrackingBody, VerifyPaymentBody,
};
use crate::inbound::http::payments::{AbandonBody, CheckoutBody};
use crate::inbound::http::schemas::{
    CheckoutSessionSchema, CourierOptionSchema, DealSchema, ErrorCodeSchema, ErrorSchema,
    OrderSchema, PaymentSessionSchema, ShipmentProgressSchema, TransactionSchema,
};
use crate::inbound::http::shipping::{CreateShipmentBody, OptimizeBody, ShippingDetailsBody};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the bearer token security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "BearerToken",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .description(Some("HS256 token whose `sub` claim is the user id."))
                    .build(),
            ),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "BookHive marketplace API",
        description = "Deals, orders, payments and tracking for the second-hand book marketplace."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("BearerToken" = [])),
    paths(
        crate::inbound::http::deals::create_deal,
        crate::inbound::http::deals::list_seller_deals,
        crate::inbound::http::deals::list_buyer_deals,
        crate::inbound::http::deals::sold_count,
        crate::inbound::http::deals::get_deal,
        crate::inbound::http::deals::complete_deal,
        crate::inbound::http::deals::rate_deal,
        crate::inbound::http::orders::create_order,
        crate::inbound::http::orders::verify_payment,
        crate::inbound::http::orders::list_orders,
        crate::inbound::http::orders::get_order,
        crate::inbound::http::orders::update_tracking,
        crate::inbound::http::orders::update_status,
        crate::inbound::http::orders::update_notifications,
        crate::inbound::http::payments::checkout,
        crate::inbound::http::payments::verify,
        crate::inbound::http::payments::abandon,
        crate::inbound::http::shipping::optimize,
        crate::inbound::http::shipping::create_shipment,
        crate::inbound::http::shipping::track,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        DealSchema,
        OrderSchema,
        TransactionSchema,
        PaymentSessionSchema,
        CheckoutSessionSchema,
        CourierOptionSchema,
        ShipmentProgressSchema,
        CreateDealBody,
        RateDealBody,
        SoldCountBody,
        CreateOrderBody,
        VerifyPaymentBody,
        TrackingBody,
        StatusBody,
        NotificationsBody,
        CheckoutBody,
        AbandonBody,
        OptimizeBody,
        ShippingDetailsBody,
        CreateShipmentBody,
    )),
    tags(
        (name = "deals", description = "Meet-up and courier hand-offs between buyer and seller"),
        (name = "orders", description = "Multi-item cart orders, payment and tracking"),
        (name = "payments", description = "Single-book checkout"),
        (name = "shipping", description = "Courier quotes, bookings and tracking for single-book purchases"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
