//! Order nonce derivation.
//!
//! The nonce is `SHA-256(client_id) mod 2^32`: reproducible for a retried
//! order with the same client id, and distinct across client ids except with
//! probability ~2^-32 per pair.

use sha2::{Digest, Sha256};

/// Nonces are 32-bit values at the settlement layer.
pub const NONCE_UPPER_BOUND_EXCLUSIVE: u64 = 1 << 32;

/// Derive the order nonce from the caller's client order id.
pub fn nonce_from_client_id(client_id: &str) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(client_id.as_bytes());
    let digest = hasher.finalize();

    // Reducing the 256-bit big-endian digest mod 2^32 keeps its last four bytes.
    let tail = &digest[digest.len() - 4..];
    u32::from_be_bytes([tail[0], tail[1], tail[2], tail[3]])
}
