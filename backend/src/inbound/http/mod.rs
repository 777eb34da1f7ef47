//! HTTP inbound adapter exposing REST endpoints.

pub mod auth;
pub mod deals;
pub mod error;
pub mod health;
pub mod orders;
pub mod payments;
pub mod schemas;
pub mod shipping;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod validation;

use actix_web::web;
use tracing::debug;

use crate::domain::Error;

pub use error::ApiResult;

/// Turn malformed JSON bodies into `invalid_request` domain errors so every
/// 400 shares the same payload shape.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "rejected request body");
        Error::invalid_request(format!("malformed request body: {err}")).into()
    })
}

/// Register every `/api/v1` endpoint on `cfg`.
///
/// # Examples
/// ```no_run
/// use actix_web::{App, web};
/// use marketplace::inbound::http::configure;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure));
/// ```
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(deals::create_deal)
        .service(deals::list_seller_deals)
        .service(deals::list_buyer_deals)
        .service(deals::sold_count)
        .service(deals::get_deal)
        .service(deals::complete_deal)
        .service(deals::rate_deal)
        .service(orders::create_order)
        .service(orders::verify_payment)
        .service(orders::list_orders)
        .service(orders::get_order)
        .service(orders::update_tracking)
        .service(orders::update_status)
        .service(orders::update_notifications)
        .service(payments::checkout)
        .service(payments::verify)
        .service(payments::abandon)
        .service(shipping::optimize)
        .service(shipping::create_shipment)
        .service(shipping::track);
}
