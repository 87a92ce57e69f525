//! Error types for the dYdX v3 client core.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown market: {0}")]
    UnknownMarket(String),

    #[error("Unknown network id: {0}")]
    UnknownNetwork(u64),

    #[error("Unknown asset: {0}")]
    UnknownAsset(String),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("Amount {amount} is not a multiple of the quantum size 1e-{resolution} of {asset}")]
    NotAMultipleOfQuantum {
        amount: Decimal,
        asset: String,
        resolution: u32,
    },

    #[error("Invalid decimal literal for {field}: {value:?}")]
    InvalidDecimalLiteral { field: &'static str, value: String },

    #[error("Quantum amount out of range: {message}")]
    QuantumOutOfRange { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Authentication error: {0}")]
    Auth(#[from] dydx_auth::AuthError),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("API error: {message}")]
    Api { message: String, status: Option<u16> },
}

/// Coarse classification used by callers to decide what to do with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Code or configuration defect (unknown market, missing credential).
    Configuration,
    /// Caller input defect; fix the input, do not resend it unchanged.
    Validation,
    /// The API secret cannot be used.
    Credential,
    /// Network or server side failure.
    Transport,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownMarket(_)
            | Error::UnknownNetwork(_)
            | Error::UnknownAsset(_)
            | Error::Config { .. }
            | Error::ConfigFile(_) => ErrorKind::Configuration,
            Error::NotAMultipleOfQuantum { .. }
            | Error::InvalidDecimalLiteral { .. }
            | Error::QuantumOutOfRange { .. }
            | Error::InvalidRequest { .. }
            // Responses decode through reqwest, so this is always a local serialization failure.
            | Error::Json(_) => ErrorKind::Validation,
            Error::Auth(inner) if inner.is_credential() => ErrorKind::Credential,
            Error::Auth(inner) if inner.is_configuration() => ErrorKind::Configuration,
            Error::Auth(_) => ErrorKind::Validation,
            Error::Http(_) | Error::Api { .. } => ErrorKind::Transport,
        }
    }

    /// Only transport failures may be retried, and never by this crate.
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::Api {
                status: Some(status),
                ..
            } => *status == 429 || *status >= 500,
            _ => self.kind() == ErrorKind::Transport,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
