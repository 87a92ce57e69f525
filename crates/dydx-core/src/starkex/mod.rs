//! StarkEx order signature payloads.
//!
//! Converts a human-readable order into the integer fields the settlement
//! layer verifies. Signing the payload with the trader's STARK key happens
//! outside this crate, behind [`SettlementSigner`].
//!
//! # Architecture
//!
//! ```text
//! OrderSigningRequest
//!       │
//!       ▼
//! OrderSignaturePayloadBuilder ── AssetRegistry
//!       │        │
//!       │        └── QuantumConverter, nonce_from_client_id
//!       ▼
//! OrderSignaturePayload ── SettlementSigner ──► signature
//!                                                  │
//!                                                  ▼
//!                                           CreateOrderBody
//! ```
//!
//! # Example
//!
//! ```ignore
//! use dydx_core::starkex::OrderSignaturePayloadBuilder;
//! use dydx_core::types::{OrderSide, OrderSigningRequest};
//!
//! let builder = OrderSignaturePayloadBuilder::default();
//! let payload = builder.build(&OrderSigningRequest {
//!     network_id: 1,
//!     market: "ETH-USD".to_string(),
//!     side: OrderSide::Buy,
//!     position_id: "12345".to_string(),
//!     size: "1".to_string(),
//!     price: "100".to_string(),
//!     limit_fee: "0.01".to_string(),
//!     client_id: "my-order-1".to_string(),
//!     expiration_epoch_seconds: 1_700_000_000,
//! })?;
//! ```

pub mod builder;
pub mod nonce;
pub mod payload;
pub mod quantum;

pub use builder::{
    OrderSignaturePayloadBuilder, LIMIT_FEE_DECIMALS, ONE_HOUR_IN_SECONDS,
    ORDER_SIGNATURE_EXPIRATION_BUFFER_HOURS,
};
pub use nonce::{nonce_from_client_id, NONCE_UPPER_BOUND_EXCLUSIVE};
pub use payload::{OrderSignaturePayload, SettlementSigner, ORDER_TYPE_LIMIT_WITH_FEES};
pub use quantum::QuantumConverter;
