//! HTTP server configuration object and helpers.

use std::net::SocketAddr;
use std::sync::Arc;

use marketplace::domain::PaymentSecret;
use marketplace::domain::ports::MailTransport;
use marketplace::inbound::http::auth::TokenVerifier;
use marketplace::inbound::ws::state::AllowedOrigins;
use marketplace::outbound::gateway::{RazorpayError, RazorpayGateway};
use marketplace::outbound::mail::{SmtpMailer, SmtpMailerError, SmtpSettings};
use marketplace::outbound::persistence::DbPool;
use marketplace::outbound::shipping::{ShiprocketCarrier, ShiprocketError};
use url::Url;

use super::secrets::Secrets;
use super::settings::{MarketplaceSettings, SettingsError};

/// Failures while turning settings and secrets into adapters.
#[derive(Debug, thiserror::Error)]
pub enum ServerConfigError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("invalid gateway base URL: {0}")]
    GatewayUrl(url::ParseError),
    #[error(transparent)]
    Gateway(#[from] RazorpayError),
    #[error("invalid shipping carrier base URL: {0}")]
    CarrierUrl(url::ParseError),
    #[error(transparent)]
    Carrier(#[from] ShiprocketError),
    #[error(transparent)]
    Mailer(#[from] SmtpMailerError),
    #[error("invalid allowed origin: {0}")]
    Origins(url::ParseError),
}

/// Everything the server needs besides the readiness state.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) gateway: Arc<RazorpayGateway>,
    pub(crate) carrier: Arc<ShiprocketCarrier>,
    pub(crate) mailer: Arc<dyn MailTransport>,
    pub(crate) payment_secret: PaymentSecret,
    pub(crate) tokens: TokenVerifier,
    pub(crate) origins: AllowedOrigins,
}

impl ServerConfig {
    /// Build outbound adapters from loaded settings and credentials.
    ///
    /// # Errors
    /// Returns [`ServerConfigError`] when a setting is malformed or an
    /// adapter cannot be constructed.
    pub fn new(
        settings: &MarketplaceSettings,
        secrets: Secrets,
        db_pool: DbPool,
    ) -> Result<Self, ServerConfigError> {
        let Secrets {
            razorpay,
            smtp_username,
            smtp_password,
            jwt_secret,
            shiprocket_token,
        } = secrets;

        // The gateway signs callbacks with the same key secret used for API auth.
        let payment_secret = PaymentSecret::new(razorpay.key_secret.as_bytes());
        let gateway = match settings.razorpay_base_url() {
            Some(base) => {
                let base = Url::parse(base).map_err(ServerConfigError::GatewayUrl)?;
                RazorpayGateway::with_base_url(base, razorpay, settings.gateway_timeout())?
            }
            None => RazorpayGateway::new(razorpay, settings.gateway_timeout())?,
        };
        let carrier = match settings.shiprocket_base_url() {
            Some(base) => {
                let base = Url::parse(base).map_err(ServerConfigError::CarrierUrl)?;
                ShiprocketCarrier::with_base_url(
                    base,
                    shiprocket_token,
                    settings.shipping_timeout(),
                )?
            }
            None => ShiprocketCarrier::new(shiprocket_token, settings.shipping_timeout())?,
        };
        let mailer = SmtpMailer::new(SmtpSettings {
            host: settings.smtp_host().to_owned(),
            port: settings.smtp_port(),
            security: settings.smtp_security()?,
            username: smtp_username,
            password: smtp_password,
            from: settings.mail_from().to_owned(),
            timeout: settings.mail_timeout(),
        })?;
        let origins = AllowedOrigins::parse(&settings.allowed_origins())
            .map_err(ServerConfigError::Origins)?;

        Ok(Self {
            bind_addr: settings.bind_addr()?,
            db_pool,
            gateway: Arc::new(gateway),
            carrier: Arc::new(carrier),
            mailer: Arc::new(mailer),
            payment_secret,
            tokens: TokenVerifier::new(&jwt_secret),
            origins,
        })
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
