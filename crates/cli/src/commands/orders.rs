//! Maintenance of the file-backed local order history.
//!
//! # Environment Variables
//!
//! - `OLIVO_DATA_DIR` - Storage directory (default: .olivo)
//! - `OLIVO_MAX_ORDERS` - Cap on stored orders (default: 1000)
//! - `OLIVO_SHIPPING_COST` - Default shipping cost (default: 10.00)

use std::sync::Arc;

use chrono::Utc;
use olivo_market_core::NormalizeContext;
use olivo_market_storefront::orders::OrderStore;
use olivo_market_storefront::{ConfigError, FileBlobStore, SharedBlobStore, StoreError, StorefrontConfig};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum OrdersError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Cannot encode statistics: {0}")]
    Encode(#[from] serde_json::Error),
}

fn open(ctx: &NormalizeContext) -> Result<OrderStore, OrdersError> {
    let config = StorefrontConfig::from_env()?;
    info!(data_dir = %config.data_dir.display(), "Opening order history");
    let blobs: SharedBlobStore = Arc::new(FileBlobStore::open(&config.data_dir).map_err(StoreError::from)?);
    Ok(OrderStore::load(blobs, ctx, config.max_orders, config.shipping_cost)?)
}

/// Drop duplicate and invalid orders.
///
/// # Errors
///
/// Returns `OrdersError` if configuration is invalid or storage fails.
pub fn cleanup() -> Result<(), OrdersError> {
    let mut orders = open(&NormalizeContext::at(Utc::now()))?;
    let report = orders.cleanup()?;
    #[allow(clippy::print_stdout)]
    {
        println!("{} orders before, {} after, {} removed", report.before, report.after, report.removed());
    }
    Ok(())
}

/// Print per-status counts and sales figures.
///
/// # Errors
///
/// Returns `OrdersError` if configuration is invalid or storage fails.
pub fn stats() -> Result<(), OrdersError> {
    let orders = open(&NormalizeContext::at(Utc::now()))?;
    let encoded = serde_json::to_string_pretty(&orders.stats())?;
    #[allow(clippy::print_stdout)]
    {
        println!("{encoded}");
    }
    Ok(())
}

/// Add the demo orders that are missing.
///
/// # Errors
///
/// Returns `OrdersError` if configuration is invalid or storage fails.
pub fn restore_demo() -> Result<(), OrdersError> {
    let ctx = NormalizeContext::at(Utc::now());
    let mut orders = open(&ctx)?;
    let added = orders.restore_demo_orders(&ctx)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{added} demo orders restored, {} total", orders.len());
    }
    Ok(())
}
