//! Test helpers for inbound HTTP components.

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::http::header;
use actix_web::{App, web};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;
use zeroize::Zeroizing;

use super::auth::TokenVerifier;
use super::state::HttpState;
use crate::domain::UserId;

/// Signing secret shared by test tokens and [`verifier`].
pub const TEST_JWT_SECRET: &[u8] = b"test-signing-secret-of-32-bytes!";

/// Far-future expiry (2100-01-01) for test tokens.
const TEST_TOKEN_EXPIRY: u64 = 4_102_444_800;

/// Verifier accepting tokens minted by [`token_for`].
pub fn verifier() -> TokenVerifier {
    TokenVerifier::new(&Zeroizing::new(TEST_JWT_SECRET.to_vec()))
}

/// Mint a valid HS256 token for `user`.
pub fn token_for(user: UserId) -> String {
    let claims = json!({"sub": user.to_string(), "exp": TEST_TOKEN_EXPIRY});
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET),
    )
    .expect("test token encodes")
}

/// `Authorization` header carrying a token for `user`.
pub fn bearer(user: UserId) -> (header::HeaderName, String) {
    (header::AUTHORIZATION, format!("Bearer {}", token_for(user)))
}

/// App serving the `/api/v1` surface over `state`, accepting tokens from
/// [`token_for`].
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(web::Data::new(verifier()))
        .service(web::scope("/api/v1").configure(super::configure))
}
