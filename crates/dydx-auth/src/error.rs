//! Error types for request authentication.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// A credential field was absent or empty when the credentials were loaded.
    #[error("Missing API credential: {0}")]
    MissingCredential(&'static str),

    /// The API secret could not be turned into an HMAC key.
    #[error("Invalid API credentials: {0}")]
    InvalidCredentials(String),

    /// The request body is not a JSON object.
    #[error("Unserializable request payload: {0}")]
    UnserializablePayload(String),
}

impl AuthError {
    /// Configuration defects surface before any request is attempted.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingCredential(_))
    }

    /// An undecodable secret is fatal and must be fixed at startup.
    pub fn is_credential(&self) -> bool {
        matches!(self, Self::InvalidCredentials(_))
    }

    /// Input defects the caller must fix before resending.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnserializablePayload(_))
    }
}

pub type Result<T> = std::result::Result<T, AuthError>;
