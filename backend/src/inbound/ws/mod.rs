//! WebSocket inbound adapter for real-time pushes and presence.
//!
//! Responsibilities:
//! - validate upgrade requests (origin allow-list, bearer token)
//! - hand the upgraded connection to a per-user session task
//! - keep WebSocket-specific concerns at the edge of the system

use std::sync::Arc;

use actix_web::web::{self, Payload};
use actix_web::{
    HttpRequest, HttpResponse, get,
    http::header::{HeaderValue, ORIGIN},
};
use serde::Deserialize;
use tracing::{error, warn};
use url::Url;

mod session;

pub mod messages;
pub mod state;

use state::{AllowedOrigins, WsState};

/// Query string carried by the upgrade request.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    token: Option<String>,
}

/// Handle WebSocket upgrade for the `/ws` endpoint.
#[get("/ws")]
pub async fn ws_entry(
    state: web::Data<WsState>,
    req: HttpRequest,
    query: web::Query<ConnectQuery>,
    stream: Payload,
) -> actix_web::Result<HttpResponse> {
    let mut origin_iter = req.headers().get_all(ORIGIN);
    let origin_header = origin_iter.next().ok_or_else(|| {
        error!("Missing Origin header on WebSocket upgrade");
        actix_web::error::ErrorForbidden("Origin not allowed")
    })?;
    if origin_iter.next().is_some() {
        error!("Multiple Origin headers on WebSocket upgrade");
        return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
    }

    validate_origin(&state.origins, origin_header)?;

    let token = query.into_inner().token.unwrap_or_default();
    let user = state.tokens.verify(&token).map_err(|err| {
        warn!(reason = ?err.reason(), "Rejected WS upgrade with invalid token");
        actix_web::error::ErrorUnauthorized("Authentication required")
    })?;

    let (response, session, messages) = actix_ws::handle(&req, stream).map_err(|error| {
        error!(error = %error, "WebSocket upgrade failed");
        actix_web::error::ErrorInternalServerError("WebSocket upgrade failed")
    })?;

    actix_web::rt::spawn(session::handle_ws_session(
        Arc::clone(&state.registry),
        user,
        session,
        messages,
    ));

    Ok(response)
}

fn validate_origin(
    allowed: &AllowedOrigins,
    origin_header: &HeaderValue,
) -> actix_web::Result<()> {
    let origin_value = match origin_header.to_str() {
        Ok(value) => value,
        Err(error) => {
            error!(error = %error, "Failed to parse Origin header as string");
            return Err(actix_web::error::ErrorBadRequest("Invalid Origin header"));
        }
    };

    let origin = Url::parse(origin_value).map_err(|error| {
        error!(error = %error, "Failed to parse Origin header as URL");
        actix_web::error::ErrorBadRequest("Invalid Origin header")
    })?;

    if allowed.allows(&origin) {
        Ok(())
    } else {
        warn!(
            origin = origin_value,
            "Rejected WS upgrade due to disallowed Origin"
        );
        Err(actix_web::error::ErrorForbidden("Origin not allowed"))
    }
}
