//! OlivoMarket storefront session state.
//!
//! Client-side stores for the catalog, categories, order history and cart,
//! each mirrored to a persistent key-value [`storage::BlobStore`]:
//!
//! - [`record_store`] - Generic load-or-seed store shared by all record kinds
//! - [`products`] / [`metrics`] - Catalog plus view and order-intent counters
//! - [`categories`] - Categories with derived product counts
//! - [`orders`] - Order history, cleanup and statistics
//! - [`cart`] / [`checkout`] - Cart and order placement
//! - [`sync`] - Refreshing local stores from the remote catalog
//! - [`session`] - All of the above wired together for one session
//!
//! # Known limitation
//!
//! Two sessions sharing one blob store do not see each other's changes; the
//! last one to persist wins.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod categories;
pub mod checkout;
pub mod config;
pub mod error;
pub mod metrics;
pub mod orders;
pub mod products;
pub mod record_store;
pub mod seed;
pub mod session;
pub mod storage;
pub mod sync;

pub use config::{ConfigError, StorefrontConfig};
pub use error::{StorageError, StoreError};
pub use session::Storefront;
pub use storage::{BlobStore, FileBlobStore, MemoryBlobStore, SharedBlobStore};
