//! Integration tests for OlivoMarket.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p olivo-market-integration-tests
//!
//! # Include the PostgreSQL-backed tests
//! OLIVO_TEST_DATABASE_URL=postgres://localhost/olivo_test \
//!     cargo test -p olivo-market-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `bulk_reconciliation` - Idempotent bulk import into the canonical catalog
//! - `catalog_rules` - Slugs, conflicts and guarded deletes
//! - `storefront_session` - Local stores, metrics, checkout and refresh
//! - `postgres_catalog` - The catalog against a real database (ignored by default)

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, TimeZone, Utc};
use olivo_market_admin::{CatalogService, MemoryCatalogRepository};
use olivo_market_core::{Caller, NormalizeContext};

/// Bulk limit used by test services.
pub const TEST_BULK_LIMIT: usize = 500;

/// Fixed clock for reproducible stores.
#[must_use]
pub fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

#[must_use]
pub fn ctx() -> NormalizeContext {
    NormalizeContext::at(now())
}

#[must_use]
pub fn admin() -> Caller {
    Caller::admin("integration-tests")
}

/// A catalog service over an empty in-memory repository.
#[must_use]
pub fn memory_catalog() -> CatalogService<MemoryCatalogRepository> {
    CatalogService::new(MemoryCatalogRepository::new(), TEST_BULK_LIMIT)
}
