//! OlivoMarket admin catalog.
//!
//! The canonical, server-side product and category catalog. Storefront
//! sessions and the operator CLI talk to it through
//! [`olivo_market_core::CatalogApi`], implemented here by
//! [`services::CatalogService`].
//!
//! # Modules
//!
//! - [`config`] - Environment-based configuration
//! - [`db`] - Repository abstraction with in-memory and `PostgreSQL` backends
//! - [`services`] - Catalog operations, bulk reconciliation and seeding
//! - [`error`] - Mapping repository failures onto the catalog error taxonomy

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod services;

pub use config::AdminConfig;
pub use db::{CatalogRepository, MemoryCatalogRepository, PgCatalogRepository, RepositoryError};
pub use services::CatalogService;
