//! dYdX v3: StarkEx order signing and private API authentication
//!
//! This is the root crate that provides benchmark and integration-test access
//! to the workspace crates. For actual functionality, use them directly:
//!
//! - `dydx-core`: asset registry, quantum conversion, order payloads, private REST client
//! - `dydx-auth`: API key credentials, canonical JSON, HMAC request signing
//! - `order-signer`: command-line front end

// Re-export for benchmarks
pub use dydx_auth as auth;
pub use dydx_core as core;
