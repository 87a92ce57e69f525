//! Builds the StarkEx payload for a limit order.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::debug;

use super::nonce::nonce_from_client_id;
use super::payload::{OrderSignaturePayload, SettlementSigner, ORDER_TYPE_LIMIT_WITH_FEES};
use super::quantum::QuantumConverter;
use crate::types::asset::AssetRegistry;
use crate::types::order::{CreateOrderBody, OrderSigningRequest, OrderType, TimeInForce};
use crate::{Error, Result};

pub const ONE_HOUR_IN_SECONDS: u64 = 60 * 60;

/// Hours added to the signed expiration.
///
/// An order may leave the book quickly, but its signature has to remain
/// valid until the settlement layer processes it.
pub const ORDER_SIGNATURE_EXPIRATION_BUFFER_HOURS: u64 = 24 * 7;

/// The exchange honours the limit fee to six decimal places.
pub const LIMIT_FEE_DECIMALS: u32 = 6;

/// Turns order requests into settlement-layer payloads.
///
/// Pure and deterministic for a given registry: the same request always
/// yields the same payload, so re-signing a retried order is safe.
#[derive(Debug, Clone, Default)]
pub struct OrderSignaturePayloadBuilder {
    registry: AssetRegistry,
}

impl OrderSignaturePayloadBuilder {
    pub fn new(registry: AssetRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &AssetRegistry {
        &self.registry
    }

    /// Build the payload for `request`.
    pub fn build(&self, request: &OrderSigningRequest) -> Result<OrderSignaturePayload> {
        let synthetic_asset = self.registry.synthetic_asset_for(&request.market)?;
        let synthetic_asset_id = self.registry.synthetic_asset_id_for(synthetic_asset)?;
        let collateral_asset = self.registry.collateral_asset();
        let collateral_asset_id = self.registry.collateral_asset_id_for(request.network_id)?;

        if request.client_id.is_empty() {
            return Err(Error::InvalidRequest {
                message: "client_id must not be empty".to_string(),
            });
        }

        let price = parse_decimal("price", &request.price)?;
        let size = parse_decimal("size", &request.size)?;
        let limit_fee = parse_decimal("limit_fee", &request.limit_fee)?;
        if limit_fee.is_sign_negative() && !limit_fee.is_zero() {
            return Err(Error::InvalidRequest {
                message: format!("limit_fee must not be negative, got {}", limit_fee),
            });
        }

        let converter = QuantumConverter::new(&self.registry);

        // The price has to sit on the synthetic asset's quantum grid.
        let quantums_amount_synthetic = converter.to_quantum_exact(price, synthetic_asset)?;

        let notional = price
            .checked_mul(size)
            .ok_or_else(|| Error::QuantumOutOfRange {
                message: format!("notional {} * {} overflows", price, size),
            })?;

        let is_buying_synthetic = request.side.is_buy();
        let quantums_amount_collateral = if is_buying_synthetic {
            converter.to_quantum_round_up(notional, collateral_asset)?
        } else {
            converter.to_quantum_round_down(notional, collateral_asset)?
        };

        let quantums_amount_fee = fee_quantums(quantums_amount_collateral, limit_fee)?;

        let payload = OrderSignaturePayload {
            order_type: ORDER_TYPE_LIMIT_WITH_FEES.to_string(),
            asset_id_synthetic: synthetic_asset_id.to_string(),
            asset_id_collateral: collateral_asset_id.to_string(),
            // Fees can only be paid in the collateral asset.
            asset_id_fee: collateral_asset_id.to_string(),
            quantums_amount_synthetic,
            quantums_amount_collateral,
            quantums_amount_fee,
            is_buying_synthetic: is_buying_synthetic.to_string(),
            position_id: request.position_id.clone(),
            nonce: nonce_from_client_id(&request.client_id).to_string(),
            expiration_epoch_hours: expiration_epoch_hours(request.expiration_epoch_seconds),
        };

        debug!(
            market = %request.market,
            side = %request.side,
            client_id = %request.client_id,
            quantums_collateral = payload.quantums_amount_collateral,
            quantums_fee = payload.quantums_amount_fee,
            "Built order signature payload"
        );

        Ok(payload)
    }

    /// Build the payload, have `signer` sign it, and return the submission body.
    pub fn build_signed_order(
        &self,
        request: &OrderSigningRequest,
        signer: &dyn SettlementSigner,
        order_type: OrderType,
        time_in_force: TimeInForce,
        post_only: bool,
    ) -> Result<CreateOrderBody> {
        let payload = self.build(request)?;
        let signature = signer.sign_order(&payload)?;
        CreateOrderBody::from_signing_request(
            request,
            order_type,
            time_in_force,
            post_only,
            signature,
        )
    }
}

/// Parse a decimal literal, rejecting any literal that does not fit exactly.
///
/// `Decimal` holds at most 28 significant digits and rounds longer literals,
/// so the parsed value is compared digit for digit with the input.
fn parse_decimal(field: &'static str, value: &str) -> Result<Decimal> {
    let invalid = || Error::InvalidDecimalLiteral {
        field,
        value: value.to_string(),
    };

    let trimmed = value.trim();
    let parsed = Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| invalid())?;

    let expected = significant_digits(trimmed).ok_or_else(invalid)?;
    if significant_digits(&parsed.normalize().to_string()) != Some(expected) {
        return Err(invalid());
    }

    Ok(parsed)
}

/// `literal` as (negative, significant digits, exponent), so that equal
/// values compare equal whatever their notation: `1.50` and `15e-1` both
/// give `(false, "15", -1)`.
fn significant_digits(literal: &str) -> Option<(bool, String, i64)> {
    let (negative, unsigned) = match literal.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, literal.strip_prefix('+').unwrap_or(literal)),
    };

    let (mantissa, mut exponent) = match unsigned.find(|c| c == 'e' || c == 'E') {
        Some(at) => (&unsigned[..at], unsigned[at + 1..].parse::<i64>().ok()?),
        None => (unsigned, 0),
    };

    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    let frac_digits: String = frac_part.chars().filter(|c| *c != '_').collect();
    let digits: String = int_part
        .chars()
        .filter(|c| *c != '_')
        .chain(frac_digits.chars())
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    exponent -= i64::try_from(frac_digits.len()).ok()?;
    let without_trailing = digits.trim_end_matches('0');
    exponent += i64::try_from(digits.len() - without_trailing.len()).ok()?;
    let significant = without_trailing.trim_start_matches('0');

    if significant.is_empty() {
        return Some((false, String::new(), 0));
    }
    Some((negative, significant.to_string(), exponent))
}

/// Fee cap in collateral quantums: the limit fee is truncated to
/// [`LIMIT_FEE_DECIMALS`] places and the product always rounds up.
fn fee_quantums(quantums_amount_collateral: u64, limit_fee: Decimal) -> Result<u64> {
    let limit_fee = limit_fee.round_dp_with_strategy(LIMIT_FEE_DECIMALS, RoundingStrategy::ToZero);

    Decimal::from(quantums_amount_collateral)
        .checked_mul(limit_fee)
        .map(|fee| fee.ceil())
        .and_then(|fee| fee.to_u64())
        .ok_or_else(|| Error::QuantumOutOfRange {
            message: format!(
                "fee {} * {} does not fit in 64 bits",
                quantums_amount_collateral, limit_fee
            ),
        })
}

fn expiration_epoch_hours(expiration_epoch_seconds: u64) -> u64 {
    expiration_epoch_seconds.div_ceil(ONE_HOUR_IN_SECONDS) + ORDER_SIGNATURE_EXPIRATION_BUFFER_HOURS
}
