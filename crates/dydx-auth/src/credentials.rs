//! API key credentials for private REST endpoints.

use std::env;

use crate::{AuthError, Result};

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "DYDX_API_KEY";
/// Environment variable holding the base64 encoded API secret.
pub const API_SECRET_ENV: &str = "DYDX_API_SECRET";
/// Environment variable holding the API passphrase.
pub const API_PASSPHRASE_ENV: &str = "DYDX_API_PASSPHRASE";

/// API key, passphrase and secret issued by the exchange.
///
/// All three fields are checked for presence when the value is built, so a
/// held `ApiKeyCredentials` is always complete.
#[derive(Clone)]
pub struct ApiKeyCredentials {
    api_key: String,
    passphrase: String,
    /// Base64 encoded HMAC key material.
    secret: String,
}

impl ApiKeyCredentials {
    /// Create credentials, rejecting any empty field.
    pub fn new(
        api_key: impl Into<String>,
        passphrase: impl Into<String>,
        secret: impl Into<String>,
    ) -> Result<Self> {
        let credentials = Self {
            api_key: api_key.into(),
            passphrase: passphrase.into(),
            secret: secret.into(),
        };

        if credentials.api_key.trim().is_empty() {
            return Err(AuthError::MissingCredential("api_key"));
        }
        if credentials.passphrase.trim().is_empty() {
            return Err(AuthError::MissingCredential("passphrase"));
        }
        if credentials.secret.trim().is_empty() {
            return Err(AuthError::MissingCredential("secret"));
        }

        Ok(credentials)
    }

    /// Load from environment variables (a `.env` file is honoured).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let api_key = env::var(API_KEY_ENV).map_err(|_| AuthError::MissingCredential("api_key"))?;
        let passphrase = env::var(API_PASSPHRASE_ENV)
            .map_err(|_| AuthError::MissingCredential("passphrase"))?;
        let secret =
            env::var(API_SECRET_ENV).map_err(|_| AuthError::MissingCredential("secret"))?;

        Self::new(api_key, passphrase, secret)
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for ApiKeyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyCredentials")
            .field("api_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("secret", &"[REDACTED]")
            .finish()
    }
}
