//! One shopper session's stores, wired together.
//!
//! Every store is created once when the session opens and handed the same
//! blob store; nothing here is process-global.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use olivo_market_core::{NormalizeContext, Order, Page, Product, ProductQuery};
use tracing::info;

use crate::cart::Cart;
use crate::categories::CategoryStore;
use crate::checkout::{CheckoutDetails, checkout};
use crate::config::StorefrontConfig;
use crate::error::StoreError;
use crate::orders::OrderStore;
use crate::products::ProductStore;
use crate::storage::{FileBlobStore, SharedBlobStore};

/// The stores of an open session.
#[derive(Debug)]
pub struct Storefront {
    pub config: StorefrontConfig,
    pub products: ProductStore,
    pub categories: CategoryStore,
    pub orders: OrderStore,
    pub cart: Cart,
}

impl Storefront {
    /// Load every store from `blobs`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the blob store fails.
    pub fn open(
        config: StorefrontConfig,
        blobs: SharedBlobStore,
        now: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let ctx = NormalizeContext::at(now);
        let products = ProductStore::load(blobs.clone(), &ctx)?;
        let categories = CategoryStore::load(blobs.clone(), &ctx)?;
        let orders = OrderStore::load(blobs.clone(), &ctx, config.max_orders, config.shipping_cost)?;
        let cart = Cart::load(blobs)?;
        info!(
            products = products.len(),
            categories = categories.all().len(),
            orders = orders.len(),
            "Storefront session opened"
        );
        Ok(Self {
            config,
            products,
            categories,
            orders,
            cart,
        })
    }

    /// Open a session backed by files under `config.data_dir`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the directory cannot be used.
    pub fn open_in_data_dir(config: StorefrontConfig, now: DateTime<Utc>) -> Result<Self, StoreError> {
        let blobs: SharedBlobStore = Arc::new(FileBlobStore::open(&config.data_dir)?);
        Self::open(config, blobs, now)
    }

    /// Catalog page using the configured page size.
    #[must_use]
    pub fn browse(&self, query: ProductQuery) -> Page<&Product> {
        self.products.query(&query.page_size(self.config.page_size))
    }

    /// Place an order for the current cart.
    ///
    /// # Errors
    ///
    /// See [`checkout`].
    pub fn checkout(&mut self, details: CheckoutDetails, now: DateTime<Utc>) -> Result<Order, StoreError> {
        checkout(&mut self.cart, &mut self.orders, &mut self.products, details, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use olivo_market_core::ProductId;

    #[test]
    fn test_file_backed_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let now = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap();
        let config = StorefrontConfig {
            data_dir: dir.path().to_path_buf(),
            ..StorefrontConfig::default()
        };

        let mut session = Storefront::open_in_data_dir(config.clone(), now).unwrap();
        let maltin = session.products.get_by_id(&ProductId::new("1")).unwrap().clone();
        session.cart.add(&maltin, 3).unwrap();
        let order = session.checkout(CheckoutDetails::default(), now).unwrap();
        assert_eq!(session.browse(ProductQuery::default()).items.len(), 12);

        let reopened = Storefront::open_in_data_dir(config, now).unwrap();
        assert_eq!(reopened.orders.get_by_id(&order.id), Some(&order));
        assert!(reopened.cart.is_empty());
        assert_eq!(
            reopened.products.get_by_id(&maltin.id).unwrap().order_clicks,
            1
        );
    }
}
