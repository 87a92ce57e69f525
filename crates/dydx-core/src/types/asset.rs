//! Asset tables for the StarkEx settlement layer.
//!
//! A market symbol (`ETH-USD`) maps to its synthetic asset (`ETH`); every
//! asset has a resolution, the power of ten that turns a human amount into an
//! integer quantum count; and every asset has a settlement-layer asset id.
//! The collateral asset id differs per Ethereum network.

use std::collections::HashMap;

use crate::{Error, Result};

/// Collateral asset for every market.
pub const COLLATERAL_ASSET: &str = "USDC";
/// Resolution exponent of the collateral asset.
pub const COLLATERAL_ASSET_RESOLUTION: u32 = 6;

/// Ethereum mainnet.
pub const NETWORK_ID_MAINNET: u64 = 1;
/// Ropsten testnet.
pub const NETWORK_ID_ROPSTEN: u64 = 3;

/// Largest resolution exponent `rust_decimal` can scale by.
pub const MAX_RESOLUTION: u32 = 28;

const COLLATERAL_ASSET_IDS: &[(u64, &str)] = &[
    (
        NETWORK_ID_MAINNET,
        "0x02893294412a4c8f915f75892b395ebbf6859ec246ec365c3b1f56f47c3a0a5d",
    ),
    (
        NETWORK_ID_ROPSTEN,
        "0x02c04d8b650f44092278a7cb1e1028c82025dff622db96c934b611b84cc8de5a",
    ),
];

/// (synthetic asset, resolution exponent, asset id)
///
/// Asset ids are the ASCII bytes of `"<ASSET>-<resolution>"`, zero padded to 15 bytes.
const SYNTHETIC_ASSETS: &[(&str, u32, &str)] = &[
    ("BTC", 10, "0x4254432d3130000000000000000000"),
    ("ETH", 9, "0x4554482d3900000000000000000000"),
    ("LINK", 7, "0x4c494e4b2d37000000000000000000"),
    ("AAVE", 8, "0x414156452d38000000000000000000"),
    ("UNI", 7, "0x554e492d3700000000000000000000"),
    ("SUSHI", 7, "0x53555348492d370000000000000000"),
    ("SOL", 7, "0x534f4c2d3700000000000000000000"),
    ("YFI", 10, "0x5946492d3130000000000000000000"),
    ("1INCH", 7, "0x31494e43482d370000000000000000"),
    ("AVAX", 7, "0x415641582d37000000000000000000"),
    ("SNX", 7, "0x534e582d3700000000000000000000"),
    ("CRV", 6, "0x4352562d3600000000000000000000"),
    ("UMA", 7, "0x554d412d3700000000000000000000"),
    ("DOT", 7, "0x444f542d3700000000000000000000"),
    ("DOGE", 5, "0x444f47452d35000000000000000000"),
    ("MATIC", 6, "0x4d415449432d360000000000000000"),
    ("MKR", 9, "0x4d4b522d3900000000000000000000"),
    ("FIL", 7, "0x46494c2d3700000000000000000000"),
    ("ADA", 6, "0x4144412d3600000000000000000000"),
    ("ATOM", 7, "0x41544f4d2d37000000000000000000"),
    ("COMP", 8, "0x434f4d502d38000000000000000000"),
    ("BCH", 8, "0x4243482d3800000000000000000000"),
    ("LTC", 8, "0x4c54432d3800000000000000000000"),
    ("EOS", 6, "0x454f532d3600000000000000000000"),
    ("ALGO", 6, "0x414c474f2d36000000000000000000"),
    ("ZRX", 6, "0x5a52582d3600000000000000000000"),
    ("XMR", 8, "0x584d522d3800000000000000000000"),
    ("ZEC", 8, "0x5a45432d3800000000000000000000"),
];

/// Immutable lookup tables for markets and assets.
///
/// Built once, either from the built-in tables via [`AssetRegistry::default`]
/// or through [`AssetRegistryBuilder`], which checks that every market's
/// synthetic asset has a resolution and an asset id.
#[derive(Debug, Clone)]
pub struct AssetRegistry {
    collateral_asset: String,
    synthetic_by_market: HashMap<String, String>,
    resolutions: HashMap<String, u32>,
    synthetic_asset_ids: HashMap<String, String>,
    collateral_asset_ids: HashMap<u64, String>,
}

impl AssetRegistry {
    /// Start an empty registry.
    pub fn builder() -> AssetRegistryBuilder {
        AssetRegistryBuilder::default()
    }

    /// Start from the built-in tables, e.g. to register an extra market.
    pub fn to_builder(&self) -> AssetRegistryBuilder {
        AssetRegistryBuilder {
            collateral: Some((
                self.collateral_asset.clone(),
                self.resolutions
                    .get(&self.collateral_asset)
                    .copied()
                    .unwrap_or(COLLATERAL_ASSET_RESOLUTION),
            )),
            synthetic_by_market: self.synthetic_by_market.clone(),
            resolutions: self.resolutions.clone(),
            synthetic_asset_ids: self.synthetic_asset_ids.clone(),
            collateral_asset_ids: self.collateral_asset_ids.clone(),
        }
    }

    /// Synthetic asset traded in `market`.
    pub fn synthetic_asset_for(&self, market: &str) -> Result<&str> {
        self.synthetic_by_market
            .get(market)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownMarket(market.to_string()))
    }

    /// Settlement-layer asset id of a synthetic asset.
    pub fn synthetic_asset_id_for(&self, asset: &str) -> Result<&str> {
        self.synthetic_asset_ids
            .get(asset)
            .map(String::as_str)
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }

    /// Collateral asset id on `network_id`.
    pub fn collateral_asset_id_for(&self, network_id: u64) -> Result<&str> {
        self.collateral_asset_ids
            .get(&network_id)
            .map(String::as_str)
            .ok_or(Error::UnknownNetwork(network_id))
    }

    /// Resolution exponent of `asset`.
    pub fn resolution_of(&self, asset: &str) -> Result<u32> {
        self.resolutions
            .get(asset)
            .copied()
            .ok_or_else(|| Error::UnknownAsset(asset.to_string()))
    }

    pub fn collateral_asset(&self) -> &str {
        &self.collateral_asset
    }

    /// Supported market symbols, sorted.
    pub fn markets(&self) -> Vec<&str> {
        let mut markets: Vec<&str> = self.synthetic_by_market.keys().map(String::as_str).collect();
        markets.sort_unstable();
        markets
    }

    /// Supported network ids, sorted.
    pub fn network_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.collateral_asset_ids.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

impl Default for AssetRegistry {
    fn default() -> Self {
        let mut resolutions: HashMap<String, u32> = SYNTHETIC_ASSETS
            .iter()
            .map(|(asset, resolution, _)| (asset.to_string(), *resolution))
            .collect();
        resolutions.insert(COLLATERAL_ASSET.to_string(), COLLATERAL_ASSET_RESOLUTION);

        Self {
            collateral_asset: COLLATERAL_ASSET.to_string(),
            synthetic_by_market: SYNTHETIC_ASSETS
                .iter()
                .map(|(asset, _, _)| (format!("{}-USD", asset), asset.to_string()))
                .collect(),
            resolutions,
            synthetic_asset_ids: SYNTHETIC_ASSETS
                .iter()
                .map(|(asset, _, id)| (asset.to_string(), id.to_string()))
                .collect(),
            collateral_asset_ids: COLLATERAL_ASSET_IDS
                .iter()
                .map(|(network_id, id)| (*network_id, id.to_string()))
                .collect(),
        }
    }
}

/// Builder for an [`AssetRegistry`].
#[derive(Debug, Clone, Default)]
pub struct AssetRegistryBuilder {
    collateral: Option<(String, u32)>,
    synthetic_by_market: HashMap<String, String>,
    resolutions: HashMap<String, u32>,
    synthetic_asset_ids: HashMap<String, String>,
    collateral_asset_ids: HashMap<u64, String>,
}

impl AssetRegistryBuilder {
    /// Set the collateral asset and its resolution.
    pub fn collateral(mut self, asset: impl Into<String>, resolution: u32) -> Self {
        let asset = asset.into();
        self.resolutions.insert(asset.clone(), resolution);
        self.collateral = Some((asset, resolution));
        self
    }

    /// Register the collateral asset id used on `network_id`.
    pub fn network(mut self, network_id: u64, collateral_asset_id: impl Into<String>) -> Self {
        self.collateral_asset_ids
            .insert(network_id, collateral_asset_id.into());
        self
    }

    /// Register a synthetic asset.
    pub fn synthetic(
        mut self,
        asset: impl Into<String>,
        resolution: u32,
        asset_id: impl Into<String>,
    ) -> Self {
        let asset = asset.into();
        self.resolutions.insert(asset.clone(), resolution);
        self.synthetic_asset_ids.insert(asset, asset_id.into());
        self
    }

    /// Register a market trading `synthetic_asset`.
    pub fn market(mut self, market: impl Into<String>, synthetic_asset: impl Into<String>) -> Self {
        self.synthetic_by_market
            .insert(market.into(), synthetic_asset.into());
        self
    }

    /// Validate and freeze the tables.
    pub fn build(self) -> Result<AssetRegistry> {
        let (collateral_asset, _) = self.collateral.ok_or_else(|| Error::Config {
            message: "asset registry has no collateral asset".to_string(),
        })?;

        for (market, asset) in &self.synthetic_by_market {
            if !self.resolutions.contains_key(asset) {
                return Err(Error::Config {
                    message: format!("market {} references asset {} with no resolution", market, asset),
                });
            }
            if !self.synthetic_asset_ids.contains_key(asset) {
                return Err(Error::Config {
                    message: format!("market {} references asset {} with no asset id", market, asset),
                });
            }
        }

        for (asset, resolution) in &self.resolutions {
            if *resolution > MAX_RESOLUTION {
                return Err(Error::Config {
                    message: format!(
                        "resolution 1e{} of {} exceeds the supported maximum 1e{}",
                        resolution, asset, MAX_RESOLUTION
                    ),
                });
            }
        }

        let ids = self
            .synthetic_asset_ids
            .iter()
            .map(|(asset, id)| (asset.clone(), id))
            .chain(
                self.collateral_asset_ids
                    .iter()
                    .map(|(network_id, id)| (format!("network {}", network_id), id)),
            );
        for (owner, id) in ids {
            validate_asset_id(&owner, id)?;
        }

        Ok(AssetRegistry {
            collateral_asset,
            synthetic_by_market: self.synthetic_by_market,
            resolutions: self.resolutions,
            synthetic_asset_ids: self.synthetic_asset_ids,
            collateral_asset_ids: self.collateral_asset_ids,
        })
    }
}

/// Asset ids are `0x`-prefixed hex field elements.
fn validate_asset_id(owner: &str, id: &str) -> Result<()> {
    let digits = id.strip_prefix("0x").ok_or_else(|| Error::Config {
        message: format!("asset id of {} must start with 0x: {}", owner, id),
    })?;

    // hex::decode needs an even number of digits
    let padded = if digits.len() % 2 == 1 {
        format!("0{}", digits)
    } else {
        digits.to_string()
    };

    hex::decode(&padded).map_err(|e| Error::Config {
        message: format!("asset id of {} is not valid hex ({}): {}", owner, e, id),
    })?;

    Ok(())
}
