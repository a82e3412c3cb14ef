//! Reconciling local stores with the remote catalog.
//!
//! A bulk submission runs to completion on the server. Afterwards the local
//! stores re-fetch the authoritative collections instead of merging the
//! submitted batch into their own snapshot.

use olivo_market_core::{BulkItem, BulkReport, CatalogApi, Caller};
use tracing::{info, instrument};

use crate::categories::CategoryStore;
use crate::error::StoreError;
use crate::products::ProductStore;

/// Replace the local catalog with the remote one. Returns the product count.
///
/// # Errors
///
/// - `StoreError::Remote` if the catalog cannot be listed
/// - `StoreError::Storage` if persisting fails
#[instrument(skip_all)]
pub async fn refresh_products<A: CatalogApi>(
    api: &A,
    products: &mut ProductStore,
) -> Result<usize, StoreError> {
    let remote = api.list_products().await?;
    let count = remote.len();
    products.replace_all(remote)?;
    Ok(count)
}

/// Replace the local categories with the remote ones. Returns the count.
///
/// # Errors
///
/// - `StoreError::Remote` if the categories cannot be listed
/// - `StoreError::Storage` if persisting fails
#[instrument(skip_all)]
pub async fn refresh_categories<A: CatalogApi>(
    api: &A,
    categories: &mut CategoryStore,
) -> Result<usize, StoreError> {
    let remote: Vec<_> = api
        .list_categories()
        .await?
        .into_iter()
        .map(|c| c.category)
        .collect();
    let count = remote.len();
    categories.replace_all(remote)?;
    Ok(count)
}

/// Submit a bulk batch and refresh both local stores from the result.
///
/// Per-record failures are reported in the returned summary; only a rejected
/// request (malformed or unauthorized) is an error.
///
/// # Errors
///
/// - `StoreError::Remote` if the request is rejected or a refresh fails
/// - `StoreError::Storage` if persisting fails
#[instrument(skip_all, fields(batch = items.len()))]
pub async fn submit_bulk<A: CatalogApi>(
    api: &A,
    caller: &Caller,
    items: Vec<BulkItem>,
    products: &mut ProductStore,
    categories: &mut CategoryStore,
) -> Result<BulkReport, StoreError> {
    let report = api.bulk_create(caller, items).await?;
    refresh_products(api, products).await?;
    refresh_categories(api, categories).await?;
    info!(
        created = report.created,
        skipped = report.skipped,
        errors = report.errors.len(),
        "Bulk upload finished"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use chrono::{NaiveDate, TimeZone, Utc};
    use olivo_market_core::{
        CatalogError, Category, CategoryDraft, CategoryId, CategoryPatch, CategoryWithCount, NormalizeContext, Product,
        ProductDraft, ProductId, ProductPatch, Slug,
    };

    /// Remote that serves a fixed catalog and refuses every mutation.
    struct ReadOnlyCatalog {
        products: Vec<Product>,
        categories: Vec<CategoryWithCount>,
    }

    impl ReadOnlyCatalog {
        fn new() -> Self {
            let product = Product::from_draft(
                ProductId::new("srv-1"),
                Slug::from_name("Tequeños").unwrap(),
                NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                ProductDraft::new("Tequeños", "8".parse().unwrap()).with_category("Congelados"),
            );
            let category = Category::from_draft(
                CategoryId::new("srv-c1"),
                Slug::from_name("Congelados").unwrap(),
                CategoryDraft::named("Congelados"),
            );
            Self {
                products: vec![product],
                categories: vec![CategoryWithCount {
                    category,
                    products_count: 1,
                }],
            }
        }
    }

    impl CatalogApi for ReadOnlyCatalog {
        async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
            Ok(self.products.clone())
        }

        async fn create_product(&self, _: &Caller, _: ProductDraft) -> Result<Product, CatalogError> {
            Err(CatalogError::Unauthorized)
        }

        async fn update_product(&self, _: &Caller, _: &ProductId, _: ProductPatch) -> Result<(), CatalogError> {
            Err(CatalogError::Unauthorized)
        }

        async fn delete_product(&self, _: &Caller, _: &ProductId) -> Result<(), CatalogError> {
            Err(CatalogError::Unauthorized)
        }

        async fn bulk_create(&self, _: &Caller, _: Vec<BulkItem>) -> Result<BulkReport, CatalogError> {
            Err(CatalogError::Unauthorized)
        }

        async fn list_categories(&self) -> Result<Vec<CategoryWithCount>, CatalogError> {
            Ok(self.categories.clone())
        }

        async fn create_category(&self, _: &Caller, _: CategoryDraft) -> Result<Category, CatalogError> {
            Err(CatalogError::Unauthorized)
        }

        async fn update_category(&self, _: &Caller, _: &CategoryId, _: CategoryPatch) -> Result<(), CatalogError> {
            Err(CatalogError::Unauthorized)
        }

        async fn delete_category(&self, _: &Caller, _: &CategoryId) -> Result<(), CatalogError> {
            Err(CatalogError::Unauthorized)
        }
    }

    fn stores() -> (ProductStore, CategoryStore) {
        let ctx = NormalizeContext::at(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap());
        let blobs = MemoryBlobStore::shared();
        (
            ProductStore::load(blobs.clone(), &ctx).unwrap(),
            CategoryStore::load(blobs, &ctx).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_refresh_replaces_local_snapshot() {
        let (mut products, mut categories) = stores();
        let remote = ReadOnlyCatalog::new();
        assert_eq!(refresh_products(&remote, &mut products).await.unwrap(), 1);
        assert_eq!(refresh_categories(&remote, &mut categories).await.unwrap(), 1);
        assert!(products.get_by_slug("tequenos").is_some());
        assert_eq!(categories.with_counts(&products)[0].products_count, 1);
    }

    #[tokio::test]
    async fn test_rejected_bulk_leaves_stores_alone() {
        let (mut products, mut categories) = stores();
        let result = submit_bulk(
            &ReadOnlyCatalog::new(),
            &Caller::shopper("ana"),
            vec![BulkItem::default()],
            &mut products,
            &mut categories,
        )
        .await;
        assert!(matches!(
            result,
            Err(StoreError::Remote(CatalogError::Unauthorized))
        ));
        assert_eq!(products.len(), 12);
        assert_eq!(categories.all().len(), 10);
    }
}
