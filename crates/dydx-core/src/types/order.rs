//! Order types for signing and submission.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::{Error, Result};

/// Side of the order (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

impl OrderSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, OrderSide::Buy)
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "BUY" => Ok(OrderSide::Buy),
            "SELL" => Ok(OrderSide::Sell),
            other => Err(Error::InvalidRequest {
                message: format!("order side must be BUY or SELL, got {:?}", other),
            }),
        }
    }
}

/// Type of order accepted by `POST /v3/orders`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    #[default]
    Limit,
    Market,
    StopLimit,
    TrailingStop,
    TakeProfit,
}

/// How long an order rests on the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeInForce {
    /// Good-til-time: rests until its expiration.
    #[default]
    Gtt,
    /// Fill-or-kill.
    Fok,
    /// Immediate-or-cancel.
    Ioc,
}

/// Human-readable order fields to be turned into a StarkEx payload.
///
/// Amounts stay strings until the payload builder parses them, so no
/// precision is lost before quantum conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSigningRequest {
    pub network_id: u64,
    pub market: String,
    pub side: OrderSide,
    pub position_id: String,
    /// Size in the synthetic asset, e.g. `"0.5"`.
    pub size: String,
    /// Price in collateral per synthetic unit, e.g. `"1850.5"`.
    pub price: String,
    /// Maximum fee as a fraction, e.g. `"0.0015"` for 0.15%.
    pub limit_fee: String,
    pub client_id: String,
    pub expiration_epoch_seconds: u64,
}

/// JSON body of `POST /v3/orders`.
///
/// Absent optional fields serialize as `null`; request signing strips them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderBody {
    pub market: String,
    pub side: OrderSide,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    pub time_in_force: TimeInForce,
    pub post_only: bool,
    pub size: String,
    pub price: String,
    pub limit_fee: String,
    /// ISO 8601 expiration.
    pub expiration: String,
    pub client_id: String,
    pub cancel_id: Option<String>,
    pub trigger_price: Option<String>,
    pub trailing_percent: Option<String>,
    /// Settlement-layer signature over the order payload.
    pub signature: String,
}

impl CreateOrderBody {
    /// Build the submission body for an order whose payload has been signed.
    pub fn from_signing_request(
        request: &OrderSigningRequest,
        order_type: OrderType,
        time_in_force: TimeInForce,
        post_only: bool,
        signature: impl Into<String>,
    ) -> Result<Self> {
        let seconds = i64::try_from(request.expiration_epoch_seconds).map_err(|_| {
            Error::InvalidRequest {
                message: format!(
                    "expiration {} is out of range",
                    request.expiration_epoch_seconds
                ),
            }
        })?;
        let expiration = DateTime::from_timestamp(seconds, 0).ok_or_else(|| {
            Error::InvalidRequest {
                message: format!("expiration {} is out of range", seconds),
            }
        })?;

        Ok(Self {
            market: request.market.clone(),
            side: request.side,
            order_type,
            time_in_force,
            post_only,
            size: request.size.clone(),
            price: request.price.clone(),
            limit_fee: request.limit_fee.clone(),
            expiration: expiration.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            client_id: request.client_id.clone(),
            cancel_id: None,
            trigger_price: None,
            trailing_percent: None,
            signature: signature.into(),
        })
    }

    /// Replace an existing order atomically.
    pub fn with_cancel_id(mut self, cancel_id: impl Into<String>) -> Self {
        self.cancel_id = Some(cancel_id.into());
        self
    }
}
