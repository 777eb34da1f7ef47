//! Credential loading from the process environment.
//!
//! Secrets stay out of OrthoConfig so they never land in config files or
//! `--help` output. Every value is required; startup fails fast on the first
//! missing or blank variable.

use mockable::Env;
use zeroize::Zeroizing;

use marketplace::outbound::gateway::RazorpayCredentials;

const RAZORPAY_KEY_ID_ENV: &str = "RAZORPAY_KEY_ID";
const RAZORPAY_KEY_SECRET_ENV: &str = "RAZORPAY_KEY_SECRET";
const SMTP_USERNAME_ENV: &str = "SMTP_USERNAME";
const SMTP_PASSWORD_ENV: &str = "SMTP_PASSWORD";
const JWT_SECRET_ENV: &str = "JWT_SECRET";
const SHIPROCKET_TOKEN_ENV: &str = "SHIPROCKET_TOKEN";
const JWT_SECRET_MIN_LEN: usize = 32;
const JWT_SECRET_EXPECTED: &str = "at least 32 bytes";

/// Credentials resolved at startup.
pub struct Secrets {
    pub razorpay: RazorpayCredentials,
    pub smtp_username: String,
    pub smtp_password: Zeroizing<String>,
    /// HS256 signing secret shared with the identity service.
    pub jwt_secret: Zeroizing<Vec<u8>>,
    /// Bearer token for the courier aggregator.
    pub shiprocket_token: Zeroizing<String>,
}

/// Errors raised while resolving credentials.
#[derive(thiserror::Error, Debug)]
pub enum SecretsError {
    /// A required environment variable is missing or blank.
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    /// A variable is present but unusable. The value is never echoed.
    #[error("invalid value for {name}; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        expected: &'static str,
    },
}

impl Secrets {
    /// Resolve every credential from `env`.
    ///
    /// # Errors
    /// Returns [`SecretsError::MissingEnv`] for absent or blank variables and
    /// [`SecretsError::InvalidEnv`] when `JWT_SECRET` is too short.
    pub fn from_env<E: Env>(env: &E) -> Result<Self, SecretsError> {
        let key_id = required(env, RAZORPAY_KEY_ID_ENV)?;
        let key_secret = required(env, RAZORPAY_KEY_SECRET_ENV)?;
        let smtp_username = required(env, SMTP_USERNAME_ENV)?;
        let smtp_password = required(env, SMTP_PASSWORD_ENV)?;
        let jwt_secret = required(env, JWT_SECRET_ENV)?;
        let shiprocket_token = required(env, SHIPROCKET_TOKEN_ENV)?;
        if jwt_secret.len() < JWT_SECRET_MIN_LEN {
            return Err(SecretsError::InvalidEnv {
                name: JWT_SECRET_ENV,
                expected: JWT_SECRET_EXPECTED,
            });
        }

        Ok(Self {
            razorpay: RazorpayCredentials {
                key_id: key_id.as_str().to_owned(),
                key_secret,
            },
            smtp_username: smtp_username.as_str().to_owned(),
            smtp_password,
            jwt_secret: Zeroizing::new(jwt_secret.as_bytes().to_vec()),
            shiprocket_token,
        })
    }
}

fn required<E: Env>(env: &E, name: &'static str) -> Result<Zeroizing<String>, SecretsError> {
    env.string(name)
        .map(Zeroizing::new)
        .filter(|value| !value.trim().is_empty())
        .ok_or(SecretsError::MissingEnv { name })
}
