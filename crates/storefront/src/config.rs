//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `OLIVO_DATA_DIR` - Directory for file-backed storage (default: .olivo)
//! - `OLIVO_SHIPPING_COST` - Default shipping cost per order (default: 10.00)
//! - `OLIVO_PAGE_SIZE` - Products per catalog page (default: 12)
//! - `OLIVO_MAX_ORDERS` - Cap on stored orders (default: 1000)

use std::path::PathBuf;
use std::str::FromStr;

use olivo_market_core::Price;
use olivo_market_core::query::DEFAULT_PAGE_SIZE;
use thiserror::Error;

use crate::orders::DEFAULT_MAX_ORDERS;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Where the file blob store keeps its data
    pub data_dir: PathBuf,
    /// Shipping cost applied when checkout does not override it
    pub shipping_cost: Price,
    /// Products per page in catalog listings
    pub page_size: usize,
    /// Orders kept before the oldest are dropped
    pub max_orders: usize,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".olivo"),
            shipping_cost: Price::from_cents(1000),
            page_size: DEFAULT_PAGE_SIZE,
            max_orders: DEFAULT_MAX_ORDERS,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if a variable is set but cannot
    /// be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        Ok(Self {
            data_dir: lookup("OLIVO_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            shipping_cost: parse_or(&lookup, "OLIVO_SHIPPING_COST", defaults.shipping_cost)?,
            page_size: positive(parse_or(&lookup, "OLIVO_PAGE_SIZE", defaults.page_size)?, "OLIVO_PAGE_SIZE")?,
            max_orders: positive(parse_or(&lookup, "OLIVO_MAX_ORDERS", defaults.max_orders)?, "OLIVO_MAX_ORDERS")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
    }
}

fn positive(value: usize, key: &str) -> Result<usize, ConfigError> {
    if value == 0 {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(value)
}
