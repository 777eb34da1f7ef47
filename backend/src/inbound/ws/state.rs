//! Shared WebSocket adapter state.

use std::sync::Arc;

use url::Url;

use crate::inbound::http::auth::TokenVerifier;
use crate::outbound::push::PushRegistry;

/// Origins allowed to open a WebSocket, compared by scheme, host and port.
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins(Vec<Url>);

impl AllowedOrigins {
    /// Parse a configured allow-list such as `["https://bookhive.example"]`.
    ///
    /// # Errors
    /// Returns the first entry that is not an absolute URL.
    pub fn parse(origins: &[String]) -> Result<Self, url::ParseError> {
        origins
            .iter()
            .map(|raw| Url::parse(raw.trim()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn allows(&self, origin: &Url) -> bool {
        self.0.iter().any(|allowed| {
            allowed.scheme() == origin.scheme()
                && allowed.host_str() == origin.host_str()
                && allowed.port_or_known_default() == origin.port_or_known_default()
        })
    }
}

/// Dependency bundle for the WebSocket entry point and sessions.
#[derive(Clone)]
pub struct WsState {
    pub registry: Arc<PushRegistry>,
    pub tokens: TokenVerifier,
    pub origins: AllowedOrigins,
}

impl WsState {
    pub fn new(registry: Arc<PushRegistry>, tokens: TokenVerifier, origins: AllowedOrigins) -> Self {
        Self {
            registry,
            tokens,
            origins,
        }
    }
}
