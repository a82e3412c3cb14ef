//! Business logic services for the catalog.
//!
//! # Services
//!
//! - `catalog` - [`CatalogService`], the [`olivo_market_core::CatalogApi`] implementation
//! - `bulk` - Idempotent bulk reconciliation
//! - `seed` - Base categories for a fresh catalog

pub mod bulk;
pub mod catalog;
pub mod seed;

pub use bulk::reconcile;
pub use catalog::CatalogService;
pub use seed::BASE_CATEGORIES;
