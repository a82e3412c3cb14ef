//! Base catalog seed.

use olivo_market_core::{CatalogError, Caller, Category};
use tracing::info;

use super::CatalogService;
use crate::db::CatalogRepository;

/// Categories every fresh catalog starts with.
pub const BASE_CATEGORIES: [&str; 9] = [
    "Abarrotes",
    "Congelados",
    "Panadería",
    "Quesos",
    "Bebidas",
    "Agua",
    "Hielo",
    "Café",
    "Postres",
];

impl<R: CatalogRepository> CatalogService<R> {
    /// Create whichever base categories are missing. Safe to run repeatedly.
    ///
    /// # Errors
    ///
    /// See [`CatalogService::sync_categories`].
    pub async fn seed_catalog(&self, caller: &Caller) -> Result<Vec<Category>, CatalogError> {
        let names: Vec<String> = BASE_CATEGORIES.iter().map(|n| (*n).to_owned()).collect();
        let created = self.sync_categories(caller, &names).await?;
        info!(created = created.len(), "Catalog seeded");
        Ok(created)
    }
}
