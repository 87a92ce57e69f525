//! The StarkEx order payload handed to the trader's STARK key.

use serde::{Deserialize, Serialize};

use crate::Result;

/// Order type of every limit order signed at the settlement layer.
pub const ORDER_TYPE_LIMIT_WITH_FEES: &str = "LIMIT_ORDER_WITH_FEES";

/// Integer fields of one order, as verified by the settlement layer.
///
/// Field names and wire types are fixed by the settlement protocol:
/// `is_buying_synthetic`, `position_id` and `nonce` travel as strings, the
/// quantum amounts and `expiration_epoch_hours` as integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSignaturePayload {
    pub order_type: String,
    pub asset_id_synthetic: String,
    pub asset_id_collateral: String,
    pub asset_id_fee: String,
    pub quantums_amount_synthetic: u64,
    pub quantums_amount_collateral: u64,
    pub quantums_amount_fee: u64,
    /// `"true"` or `"false"`.
    pub is_buying_synthetic: String,
    pub position_id: String,
    pub nonce: String,
    pub expiration_epoch_hours: u64,
}

impl OrderSignaturePayload {
    pub fn is_buying_synthetic(&self) -> bool {
        self.is_buying_synthetic == "true"
    }

    /// Canonical JSON of the payload: sorted keys, no whitespace.
    pub fn to_canonical_json(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(dydx_auth::canonicalize_body(&bytes)?)
    }
}

/// The settlement-layer signing primitive (the trader's STARK private key).
///
/// Implemented outside this crate; the returned signature string goes into
/// the `signature` field of the order submission body.
pub trait SettlementSigner: Send + Sync {
    fn sign_order(&self, payload: &OrderSignaturePayload) -> Result<String>;
}
