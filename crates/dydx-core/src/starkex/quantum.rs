//! Conversion between human-readable amounts and integer quantums.
//!
//! `quantums = amount * 10^resolution(asset)`, computed in decimal arithmetic.
//! Rounding direction is chosen by the caller: collateral debited from a
//! buyer rounds up, collateral credited to a seller rounds down, and prices
//! must convert exactly.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::types::asset::{AssetRegistry, MAX_RESOLUTION};
use crate::{Error, Result};

/// Converts amounts of registered assets to and from quantums.
#[derive(Debug, Clone, Copy)]
pub struct QuantumConverter<'a> {
    registry: &'a AssetRegistry,
}

impl<'a> QuantumConverter<'a> {
    pub fn new(registry: &'a AssetRegistry) -> Self {
        Self { registry }
    }

    /// Convert `amount`, failing unless it lands exactly on a quantum.
    pub fn to_quantum_exact(&self, amount: Decimal, asset: &str) -> Result<u64> {
        let resolution = self.registry.resolution_of(asset)?;
        let scaled = scale_up(amount, resolution)?;

        if !scaled.fract().is_zero() {
            return Err(Error::NotAMultipleOfQuantum {
                amount,
                asset: asset.to_string(),
                resolution,
            });
        }

        to_quantums(scaled, asset)
    }

    /// Convert `amount`, rounding any fractional quantum up.
    pub fn to_quantum_round_up(&self, amount: Decimal, asset: &str) -> Result<u64> {
        let resolution = self.registry.resolution_of(asset)?;
        to_quantums(scale_up(amount, resolution)?.ceil(), asset)
    }

    /// Convert `amount`, dropping any fractional quantum.
    pub fn to_quantum_round_down(&self, amount: Decimal, asset: &str) -> Result<u64> {
        let resolution = self.registry.resolution_of(asset)?;
        to_quantums(scale_up(amount, resolution)?.floor(), asset)
    }

    /// Human-readable amount of `quantums` units of `asset`.
    pub fn from_quantums(&self, quantums: u64, asset: &str) -> Result<Decimal> {
        let resolution = self.registry.resolution_of(asset)?;
        Decimal::try_from_i128_with_scale(i128::from(quantums), resolution).map_err(|e| {
            Error::QuantumOutOfRange {
                message: format!("{} quantums of {}: {}", quantums, asset, e),
            }
        })
    }
}

/// `amount * 10^resolution`, without rounding.
fn scale_up(amount: Decimal, resolution: u32) -> Result<Decimal> {
    if resolution > MAX_RESOLUTION {
        return Err(Error::QuantumOutOfRange {
            message: format!("resolution 1e{} is not supported", resolution),
        });
    }

    let factor = Decimal::try_from_i128_with_scale(10_i128.pow(resolution), 0).map_err(|e| {
        Error::QuantumOutOfRange {
            message: format!("resolution 1e{}: {}", resolution, e),
        }
    })?;

    amount
        .checked_mul(factor)
        .ok_or_else(|| Error::QuantumOutOfRange {
            message: format!("{} * 1e{} overflows", amount, resolution),
        })
}

fn to_quantums(value: Decimal, asset: &str) -> Result<u64> {
    value.to_u64().ok_or_else(|| Error::QuantumOutOfRange {
        message: format!("{} quantums of {} is not a non-negative 64-bit integer", value, asset),
    })
}
