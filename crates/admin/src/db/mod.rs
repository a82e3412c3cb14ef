//! Catalog persistence.
//!
//! # Tables (schema `catalog`)
//!
//! - `product` - Products; `slug` unique
//! - `category` - Categories; `slug` and `lower(name)` unique
//! - `product_category` - Product to category associations
//!
//! # Migrations
//!
//! Migrations are stored in `crates/admin/migrations/` and run via:
//! ```bash
//! om-cli migrate
//! ```
//!
//! [`MemoryCatalogRepository`] implements the same contract without a
//! database and backs tests and local tooling.

pub mod memory;
pub mod postgres;

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use olivo_market_core::{Category, CategoryId, CategoryWithCount, Product, ProductId, Slug};
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use memory::MemoryCatalogRepository;
pub use postgres::PgCatalogRepository;

/// Embedded catalog migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate slug).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Slugs and lowercased names of every stored product.
///
/// Loaded once per bulk submission and extended as records are created, so
/// duplicates within the same batch are caught too.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductIdentities {
    slugs: HashSet<String>,
    names: HashSet<String>,
}

impl ProductIdentities {
    #[must_use]
    pub fn contains(&self, slug: &Slug, name: &str) -> bool {
        self.slugs.contains(slug.as_str()) || self.names.contains(&name.trim().to_lowercase())
    }

    pub fn insert(&mut self, slug: &Slug, name: &str) {
        self.slugs.insert(slug.as_str().to_owned());
        self.names.insert(name.trim().to_lowercase());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slugs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slugs.is_empty()
    }
}

impl<'a> FromIterator<(&'a Slug, &'a str)> for ProductIdentities {
    fn from_iter<I: IntoIterator<Item = (&'a Slug, &'a str)>>(iter: I) -> Self {
        let mut identities = Self::default();
        for (slug, name) in iter {
            identities.insert(slug, name);
        }
        identities
    }
}

/// Storage operations behind the catalog service.
///
/// Products are written without their category names; associations are
/// managed with [`link_category`](Self::link_category) and
/// [`clear_categories`](Self::clear_categories), and reads fill
/// `Product::categories` from them.
pub trait CatalogRepository: Send + Sync {
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, RepositoryError>> + Send;

    fn find_product(
        &self,
        id: &ProductId,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    fn find_product_by_slug(
        &self,
        slug: &Slug,
    ) -> impl Future<Output = Result<Option<Product>, RepositoryError>> + Send;

    fn product_identities(&self) -> impl Future<Output = Result<ProductIdentities, RepositoryError>> + Send;

    /// Fails with `Conflict` when the slug or id is taken.
    fn insert_product(&self, product: &Product) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Overwrite every stored field. Fails with `NotFound` for unknown ids.
    fn update_product(&self, product: &Product) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Returns whether a product was removed. Its associations go with it.
    fn delete_product(&self, id: &ProductId) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    fn list_categories(&self) -> impl Future<Output = Result<Vec<CategoryWithCount>, RepositoryError>> + Send;

    fn find_category(
        &self,
        id: &CategoryId,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Case-insensitive.
    fn find_category_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    fn find_category_by_slug(
        &self,
        slug: &Slug,
    ) -> impl Future<Output = Result<Option<Category>, RepositoryError>> + Send;

    /// Fails with `Conflict` when the name (any case) or slug is taken.
    fn insert_category(&self, category: &Category) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn update_category(&self, category: &Category) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Returns whether a category was removed. Fails with `Conflict` while
    /// products reference it.
    fn delete_category(&self, id: &CategoryId) -> impl Future<Output = Result<bool, RepositoryError>> + Send;

    /// Associate a product with a category. Linking twice is a no-op.
    fn link_category(
        &self,
        product_id: &ProductId,
        category_id: &CategoryId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn clear_categories(&self, product_id: &ProductId) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn count_products_in_category(
        &self,
        id: &CategoryId,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Pool size
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply pending catalog migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the history diverges.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}
