//! HMAC-SHA256 signing of private REST requests.
//!
//! The signed message is `timestamp + METHOD + path + canonical_body`, keyed
//! with the base64 decoded API secret. The digest is returned URL-safe base64
//! encoded, which is what the exchange's official clients send.

use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, KeyInit, Mac};
use sha2::Sha256;
use tracing::debug;

use crate::canonical::canonicalize_body;
use crate::credentials::ApiKeyCredentials;
use crate::{AuthError, Result};

/// Header carrying the request signature.
pub const SIGNATURE_HEADER: &str = "SIGNATURE";
/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "API-KEY";
/// Header carrying the RFC 3339 signing timestamp.
pub const TIMESTAMP_HEADER: &str = "TIMESTAMP";
/// Header carrying the API passphrase.
pub const PASSPHRASE_HEADER: &str = "PASSPHRASE";

/// Source of the signing timestamp.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock stopped at one instant, for reproducible signatures in tests and tooling.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Headers attached to one authenticated request.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestSignatureHeaders {
    pub signature: String,
    pub api_key: String,
    pub timestamp: String,
    pub passphrase: String,
}

impl RequestSignatureHeaders {
    /// Header name/value pairs, with `prefix` prepended to every name
    /// (the production API expects `DYDX-`).
    pub fn header_pairs(&self, prefix: &str) -> [(String, &str); 4] {
        [
            (format!("{}{}", prefix, SIGNATURE_HEADER), self.signature.as_str()),
            (format!("{}{}", prefix, API_KEY_HEADER), self.api_key.as_str()),
            (format!("{}{}", prefix, TIMESTAMP_HEADER), self.timestamp.as_str()),
            (format!("{}{}", prefix, PASSPHRASE_HEADER), self.passphrase.as_str()),
        ]
    }
}

impl std::fmt::Debug for RequestSignatureHeaders {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestSignatureHeaders")
            .field("signature", &self.signature)
            .field("api_key", &"[REDACTED]")
            .field("timestamp", &self.timestamp)
            .field("passphrase", &"[REDACTED]")
            .finish()
    }
}

/// Signs private REST requests with one set of API credentials.
///
/// Holds only immutable state, so a single instance can be shared across
/// threads and several instances (one per account) can coexist.
#[derive(Clone)]
pub struct RequestAuthenticator<C = SystemClock> {
    api_key: String,
    passphrase: String,
    /// Decoded HMAC key.
    key: Vec<u8>,
    clock: C,
}

impl RequestAuthenticator<SystemClock> {
    /// Create an authenticator stamping requests with the wall clock.
    pub fn new(credentials: &ApiKeyCredentials) -> Result<Self> {
        Self::with_clock(credentials, SystemClock)
    }
}

impl<C: Clock> RequestAuthenticator<C> {
    /// Create an authenticator with a custom timestamp source.
    ///
    /// The secret is decoded here so a malformed secret fails at startup
    /// rather than on the first request.
    pub fn with_clock(credentials: &ApiKeyCredentials, clock: C) -> Result<Self> {
        let key = decode_secret(credentials.secret())?;

        Ok(Self {
            api_key: credentials.api_key().to_string(),
            passphrase: credentials.passphrase().to_string(),
            key,
            clock,
        })
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Compute the request signature.
    ///
    /// `path` must be the path actually sent, query string included. An
    /// empty `body` is treated the same as no body.
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        timestamp: &str,
        body: Option<&[u8]>,
    ) -> Result<String> {
        let canonical_body = match body {
            Some(bytes) if !bytes.is_empty() => canonicalize_body(bytes)?,
            _ => String::new(),
        };

        let message = format!(
            "{}{}{}{}",
            timestamp,
            method.to_uppercase(),
            path,
            canonical_body
        );

        let mut mac = Hmac::<Sha256>::new_from_slice(&self.key).map_err(|e| {
            AuthError::InvalidCredentials(format!("Failed to create HMAC: {}", e))
        })?;
        mac.update(message.as_bytes());
        let digest = mac.finalize();

        debug!(
            method = %method.to_uppercase(),
            path = %path,
            body_len = canonical_body.len(),
            "Signed request"
        );

        Ok(base64::engine::general_purpose::URL_SAFE.encode(digest.into_bytes()))
    }

    /// Sign a request stamped with the current time and return its header set.
    pub fn build_headers(
        &self,
        method: &str,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<RequestSignatureHeaders> {
        let timestamp = self
            .clock
            .now()
            .to_rfc3339_opts(SecondsFormat::Millis, true);
        let signature = self.sign(method, path, &timestamp, body)?;

        Ok(RequestSignatureHeaders {
            signature,
            api_key: self.api_key.clone(),
            timestamp,
            passphrase: self.passphrase.clone(),
        })
    }
}

/// Decode the API secret.
///
/// The exchange issues URL-safe base64 secrets; standard base64 and unpadded
/// URL-safe forms are accepted as well.
fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let key = base64::engine::general_purpose::URL_SAFE
        .decode(secret)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(secret))
        .or_else(|_| base64::engine::general_purpose::STANDARD.decode(secret))
        .map_err(|e| AuthError::InvalidCredentials(format!("Invalid API secret encoding: {}", e)))?;

    if key.is_empty() {
        return Err(AuthError::InvalidCredentials(
            "API secret decodes to an empty key".to_string(),
        ));
    }

    Ok(key)
}

impl<C> std::fmt::Debug for RequestAuthenticator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestAuthenticator")
            .field("api_key", &"[REDACTED]")
            .field("passphrase", &"[REDACTED]")
            .field("key", &"[REDACTED]")
            .finish()
    }
}
