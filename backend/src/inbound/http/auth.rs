//! Bearer-token authentication for HTTP handlers.
//!
//! Keep the HTTP modules focused on request/response mapping by concentrating
//! credential checks and user identity derivation here. Tokens are HS256 JWTs
//! whose `sub` claim is the caller's user id; issuing them is the identity
//! service's job.

use std::future::{Ready, ready};
use std::sync::Arc;

use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, dev::Payload, web};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::Deserialize;
use tracing::debug;
use zeroize::Zeroizing;

use crate::domain::{Error, UserId};

const BEARER_PREFIX: &str = "Bearer ";

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
}

/// Validates bearer tokens against the shared signing secret.
#[derive(Clone)]
pub struct TokenVerifier {
    key: Arc<DecodingKey>,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier for HS256 tokens signed with `secret`.
    pub fn new(secret: &Zeroizing<Vec<u8>>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            key: Arc::new(DecodingKey::from_secret(secret)),
            validation,
        }
    }

    /// Resolve the user id carried by `token`.
    ///
    /// Expired, tampered or malformed tokens and non-UUID subjects all map to
    /// `401 Unauthorized`.
    pub fn verify(&self, token: &str) -> Result<UserId, Error> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            debug!(error = %err, "bearer token rejected");
            Error::unauthorized("invalid or expired token")
        })?;
        data.claims
            .sub
            .parse()
            .map_err(|_| Error::unauthorized("token subject is not a user id"))
    }
}

/// Caller identity extracted from the `Authorization` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser(pub UserId);

impl AuthenticatedUser {
    /// Authenticated user id.
    pub fn id(self) -> UserId {
        self.0
    }
}

fn bearer_token(req: &HttpRequest) -> Result<&str, Error> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(BEARER_PREFIX))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::unauthorized("missing bearer token"))
}

impl FromRequest for AuthenticatedUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let result = req
            .app_data::<web::Data<TokenVerifier>>()
            .ok_or_else(|| Error::internal("token verifier not configured"))
            .and_then(|verifier| {
                let token = bearer_token(req)?;
                verifier.verify(token).map(Self)
            });
        ready(result)
    }
}
