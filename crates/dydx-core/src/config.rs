//! Configuration management for the dYdX v3 client.

use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::path::Path;

/// Production REST host.
pub const DEFAULT_HOST: &str = "https://api.dydx.exchange";
/// Header name prefix expected by the production API.
pub const DEFAULT_HEADER_PREFIX: &str = "DYDX-";
const DEFAULT_NETWORK_ID: u64 = 1;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    /// Ethereum network id; selects the collateral asset id.
    pub network_id: u64,
    /// Prepended to the `SIGNATURE`/`API-KEY`/`TIMESTAMP`/`PASSPHRASE` header names.
    pub header_prefix: String,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            network_id: DEFAULT_NETWORK_ID,
            header_prefix: DEFAULT_HEADER_PREFIX.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ApiConfig {
    /// Reject values no request could succeed with.
    pub fn validate(&self) -> Result<()> {
        if !(self.host.starts_with("http://") || self.host.starts_with("https://")) {
            return Err(Error::Config {
                message: format!("API host must be an http(s) URL, got {:?}", self.host),
            });
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config {
                message: "API timeout must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let network_id = match env::var("DYDX_NETWORK_ID") {
            Ok(raw) => raw.parse().map_err(|_| Error::Config {
                message: format!("DYDX_NETWORK_ID must be an integer, got {:?}", raw),
            })?,
            Err(_) => DEFAULT_NETWORK_ID,
        };

        let config = Self {
            api: ApiConfig {
                host: env::var("DYDX_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
                network_id,
                header_prefix: env::var("DYDX_HEADER_PREFIX")
                    .unwrap_or_else(|_| DEFAULT_HEADER_PREFIX.to_string()),
                timeout_secs: env::var("DYDX_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            },
        };

        config.api.validate()?;
        Ok(config)
    }

    /// Load configuration from a file, with `DYDX__API__*` environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("api.host", DEFAULT_HOST)?
            .set_default("api.network_id", DEFAULT_NETWORK_ID)?
            .set_default("api.header_prefix", DEFAULT_HEADER_PREFIX)?
            .set_default("api.timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .add_source(config::File::from(path.as_ref()))
            .add_source(config::Environment::with_prefix("DYDX").separator("__"))
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.api.validate()?;
        Ok(config)
    }

    /// Load configuration for testing (with defaults).
    #[cfg(test)]
    pub fn test_config() -> Self {
        Self {
            api: ApiConfig {
                host: "http://localhost:8080".to_string(),
                ..ApiConfig::default()
            },
        }
    }
}
