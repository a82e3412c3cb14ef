//! OlivoMarket Core - Shared types and record logic.
//!
//! This crate provides the pieces shared by every OlivoMarket component:
//! - `storefront` - Client-side catalog, cart and order record stores
//! - `admin` - Server-side canonical catalog and bulk reconciliation
//! - `cli` - Operator tooling (imports, migrations, maintenance)
//!
//! # Architecture
//!
//! The core crate contains only types, pure functions and traits - no I/O, no
//! database access, no HTTP clients. Anything that needs the clock takes it as
//! an argument.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, slugs, emails and statuses
//! - [`models`] - Product, category and order records
//! - [`normalize`] - Loose-record normalizer for persisted and imported data
//! - [`query`] - Filter/sort/paginate views over a record collection
//! - [`import`] - CSV/JSON bulk file parsing
//! - [`catalog`] - Remote catalog contract and caller capability

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod import;
pub mod models;
pub mod normalize;
pub mod query;
pub mod types;

pub use catalog::{BulkItem, BulkReport, CatalogApi, CatalogError, Caller};
pub use import::{ImportBatch, ImportError, ImportRow};
pub use models::*;
pub use normalize::{NormalizeContext, ParseResult};
pub use query::{Page, ProductQuery, Sort, SortDirection, SortField};
pub use types::*;
