//! Non-secret service settings loaded via OrthoConfig.
//!
//! Every field is optional on the wire; accessors apply defaults so a local
//! run only needs `MARKETPLACE_DATABASE_URL`. Credentials never live here;
//! see [`super::secrets`].

use std::net::SocketAddr;
use std::time::Duration;

use marketplace::outbound::mail::{SmtpSecurity, UnknownSmtpSecurity};
use ortho_config::OrthoConfig;
use serde::Deserialize;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ALLOWED_ORIGINS: &str = "http://localhost:3000";
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SMTP_HOST: &str = "localhost";
const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_MAIL_FROM: &str = "BookHive <no-reply@bookhive.example>";
const DEFAULT_MAIL_TIMEOUT_SECS: u64 = 10;
const DEFAULT_SHIPPING_TIMEOUT_SECS: u64 = 15;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("MARKETPLACE_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    #[error("invalid bind address {value}: {source}")]
    BindAddress {
        value: String,
        source: std::net::AddrParseError,
    },
    #[error(transparent)]
    SmtpSecurity(#[from] UnknownSmtpSecurity),
}

/// Service settings read from `MARKETPLACE_*` variables, config files and
/// the command line.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MARKETPLACE")]
pub struct MarketplaceSettings {
    /// Interface to bind, defaults to all interfaces.
    pub host: Option<String>,
    pub port: Option<u16>,
    /// Postgres connection string. Required.
    pub database_url: Option<String>,
    pub db_max_connections: Option<u32>,
    /// Comma-separated origins allowed to open the WebSocket.
    pub allowed_origins: Option<String>,
    /// Gateway API base, for example a sandbox or local stub.
    pub razorpay_base_url: Option<String>,
    pub gateway_timeout_secs: Option<u64>,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    /// `tls`, `starttls` or `none`.
    pub smtp_security: Option<String>,
    pub mail_from: Option<String>,
    pub mail_timeout_secs: Option<u64>,
    /// Courier aggregator API base, for example a local stub.
    pub shiprocket_base_url: Option<String>,
    pub shipping_timeout_secs: Option<u64>,
}

impl MarketplaceSettings {
    /// Socket address the HTTP server binds to.
    ///
    /// # Errors
    /// Returns [`SettingsError::BindAddress`] when host and port do not form
    /// a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let host = self.host.as_deref().unwrap_or(DEFAULT_HOST);
        let port = self.port.unwrap_or(DEFAULT_PORT);
        let value = if host.contains(':') {
            format!("[{host}]:{port}")
        } else {
            format!("{host}:{port}")
        };
        value
            .parse()
            .map_err(|source| SettingsError::BindAddress { value, source })
    }

    /// # Errors
    /// Returns [`SettingsError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Configured origin list with blanks dropped.
    pub fn allowed_origins(&self) -> Vec<String> {
        self.allowed_origins
            .as_deref()
            .unwrap_or(DEFAULT_ALLOWED_ORIGINS)
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_owned)
            .collect()
    }

    pub fn razorpay_base_url(&self) -> Option<&str> {
        self.razorpay_base_url.as_deref()
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs.unwrap_or(DEFAULT_GATEWAY_TIMEOUT_SECS))
    }

    pub fn smtp_host(&self) -> &str {
        self.smtp_host.as_deref().unwrap_or(DEFAULT_SMTP_HOST)
    }

    pub fn smtp_port(&self) -> u16 {
        self.smtp_port.unwrap_or(DEFAULT_SMTP_PORT)
    }

    /// # Errors
    /// Returns [`SettingsError::SmtpSecurity`] for unknown mode names.
    pub fn smtp_security(&self) -> Result<SmtpSecurity, SettingsError> {
        self.smtp_security
            .as_deref()
            .map_or(Ok(SmtpSecurity::default()), str::parse)
            .map_err(SettingsError::from)
    }

    pub fn mail_from(&self) -> &str {
        self.mail_from.as_deref().unwrap_or(DEFAULT_MAIL_FROM)
    }

    pub fn mail_timeout(&self) -> Duration {
        Duration::from_secs(self.mail_timeout_secs.unwrap_or(DEFAULT_MAIL_TIMEOUT_SECS))
    }

    pub fn shiprocket_base_url(&self) -> Option<&str> {
        self.shiprocket_base_url.as_deref()
    }

    pub fn shipping_timeout(&self) -> Duration {
        Duration::from_secs(
            self.shipping_timeout_secs
                .unwrap_or(DEFAULT_SHIPPING_TIMEOUT_SECS),
        )
    }
}
