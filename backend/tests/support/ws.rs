//! WebSocket-focused test helpers.
//!
//! Integration tests under `backend/tests/` compile as separate crates, so
//! the socket setup lives here instead of being copied between suites.

use std::sync::Arc;

use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use zeroize::Zeroizing;

use marketplace::domain::UserId;
use marketplace::inbound::http::auth::TokenVerifier;
use marketplace::inbound::ws::state::{AllowedOrigins, WsState};
use marketplace::outbound::push::PushRegistry;

const SECRET: &[u8] = b"websocket-test-secret-32-bytes!!";

/// Origins accepted by [`ws_state`].
pub const ALLOWED: [&str; 2] = ["https://bookhive.example", "http://localhost:3000"];

/// Build a `WsState` over `registry` that trusts [`ALLOWED`].
pub fn ws_state(registry: Arc<PushRegistry>) -> WsState {
    let origins: Vec<String> = ALLOWED.iter().map(|origin| (*origin).to_owned()).collect();
    WsState::new(
        registry,
        TokenVerifier::new(&Zeroizing::new(SECRET.to_vec())),
        AllowedOrigins::parse(&origins).expect("fixture origins"),
    )
}

/// Signed bearer token for `user`, as the login service would issue it.
pub fn token_for(user: UserId) -> String {
    encode(
        &Header::default(),
        &json!({"sub": user.to_string(), "exp": 4_102_444_800_u64}),
        &EncodingKey::from_secret(SECRET),
    )
    .expect("token encodes")
}
