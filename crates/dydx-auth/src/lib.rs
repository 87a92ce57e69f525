//! Authentication for private dYdX v3 REST calls.
//!
//! API key credentials, canonical JSON bodies, and the HMAC-SHA256 request
//! signature carried in the `SIGNATURE`/`API-KEY`/`TIMESTAMP`/`PASSPHRASE`
//! headers.

pub mod canonical;
pub mod credentials;
pub mod error;
pub mod request_signer;

pub use canonical::{canonicalize_body, strip_nulls};
pub use credentials::ApiKeyCredentials;
pub use error::{AuthError, Result};
pub use request_signer::{
    Clock, FixedClock, RequestAuthenticator, RequestSignatureHeaders, SystemClock,
    API_KEY_HEADER, PASSPHRASE_HEADER, SIGNATURE_HEADER, TIMESTAMP_HEADER,
};
