//! Product record store.

use chrono::NaiveDate;
use olivo_market_core::normalize::{NormalizeContext, ParseResult, normalize_product};
use olivo_market_core::query::{Page, ProductQuery};
use olivo_market_core::{Product, ProductDraft, ProductId, ProductPatch, Slug};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::StoreError;
use crate::record_store::{RecordKind, RecordStore, VersionPolicy};
use crate::seed;
use crate::storage::SharedBlobStore;

/// Storage description for products.
#[derive(Debug)]
pub struct ProductKind;

impl RecordKind for ProductKind {
    type Record = Product;

    const LABEL: &'static str = "products";
    const STORAGE_KEY: &'static str = "products";
    const VERSION_KEY: &'static str = "products_version";
    const SCHEMA_VERSION: &'static str = "5";
    const POLICY: VersionPolicy = VersionPolicy::Reseed;

    fn seed(ctx: &NormalizeContext) -> Vec<Product> {
        seed::products(ctx)
    }

    fn normalize(raw: &Value, _position: usize, ctx: &NormalizeContext) -> ParseResult<Product> {
        normalize_product(raw, ctx)
    }

    fn id(record: &Product) -> &str {
        record.id.as_str()
    }

    fn unique_key(record: &Product) -> Option<&str> {
        Some(record.slug.as_str())
    }
}

/// The session's product catalog.
#[derive(Debug)]
pub struct ProductStore {
    pub(crate) records: RecordStore<ProductKind>,
}

impl ProductStore {
    /// Load products from `blobs`, seeding the default catalog if needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the blob store fails.
    pub fn load(blobs: SharedBlobStore, ctx: &NormalizeContext) -> Result<Self, StoreError> {
        Ok(Self {
            records: RecordStore::load(blobs, ctx)?,
        })
    }

    #[must_use]
    pub fn all(&self) -> &[Product] {
        self.records.records()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get_by_id(&self, id: &ProductId) -> Option<&Product> {
        self.records.get(id.as_str())
    }

    #[must_use]
    pub fn get_by_slug(&self, slug: &str) -> Option<&Product> {
        self.all().iter().find(|p| p.slug.as_str() == slug)
    }

    /// Featured products, in catalog order.
    #[must_use]
    pub fn featured(&self) -> Vec<&Product> {
        self.all().iter().filter(|p| p.featured).collect()
    }

    /// Filtered, sorted and paginated view of the catalog.
    #[must_use]
    pub fn query(&self, query: &ProductQuery) -> Page<&Product> {
        query.run(self.all())
    }

    /// Number of products listing `category` (exact name).
    #[must_use]
    pub fn count_in_category(&self, category: &str) -> u64 {
        self.all().iter().filter(|p| p.in_category(category)).count() as u64
    }

    /// Create a product with a fresh id and a unique slug.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if the name is blank or no slug can be derived
    /// - `StoreError::Conflict` if the slug is already taken
    /// - `StoreError::Storage` if persisting fails
    pub fn create(&mut self, draft: ProductDraft, today: NaiveDate) -> Result<Product, StoreError> {
        if draft.name.trim().is_empty() {
            return Err(StoreError::Validation("product name is required".to_owned()));
        }
        let slug = resolve_slug(draft.slug.as_deref(), &draft.name)?;
        if self.slug_taken(&slug, None) {
            return Err(StoreError::Conflict(format!("slug {slug} is already in use")));
        }

        let id = loop {
            let candidate = ProductId::generate();
            if !self.records.contains(candidate.as_str()) {
                break candidate;
            }
        };

        let product = Product::from_draft(id, slug, today, draft);
        self.records.push(product.clone())?;
        info!(product_id = %product.id, slug = %product.slug, "Product created");
        Ok(product)
    }

    /// Merge `patch` into the product with `id`.
    ///
    /// When the name changes and no explicit slug is given, the slug is
    /// regenerated from the new name. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if the new name is blank
    /// - `StoreError::Conflict` if the new slug belongs to another product
    /// - `StoreError::Storage` if persisting fails
    pub fn update(&mut self, id: &ProductId, patch: ProductPatch) -> Result<(), StoreError> {
        let Some(current) = self.get_by_id(id) else {
            debug!(product_id = %id, "Update of unknown product ignored");
            return Ok(());
        };

        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(StoreError::Validation("product name is required".to_owned()));
        }
        let renamed = patch
            .name
            .as_deref()
            .filter(|name| name.trim() != current.name);
        let explicit = patch.slug.as_deref().filter(|s| !s.trim().is_empty());
        let new_slug = match (explicit, renamed) {
            (Some(explicit), _) => Some(resolve_slug(Some(explicit), &current.name)?),
            (None, Some(name)) => Some(resolve_slug(None, name)?),
            (None, None) => None,
        };
        if let Some(slug) = &new_slug
            && self.slug_taken(slug, Some(id))
        {
            return Err(StoreError::Conflict(format!("slug {slug} is already in use")));
        }

        self.records.modify(id.as_str(), |product| {
            patch.merge_into(product);
            if let Some(slug) = new_slug {
                product.slug = slug;
            }
            Ok(())
        })?;
        debug!(product_id = %id, "Product updated");
        Ok(())
    }

    /// Remove the product with `id`. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn delete(&mut self, id: &ProductId) -> Result<(), StoreError> {
        if self.records.remove(id.as_str())? {
            info!(product_id = %id, "Product deleted");
        } else {
            debug!(product_id = %id, "Delete of unknown product ignored");
        }
        Ok(())
    }

    /// Replace category `from` with `to` in every product listing it,
    /// persisting once. Returns how many products changed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn rename_category(&mut self, from: &str, to: &str) -> Result<usize, StoreError> {
        if from == to {
            return Ok(0);
        }
        let ids: Vec<String> = self
            .all()
            .iter()
            .filter(|p| p.in_category(from))
            .map(|p| p.id.as_str().to_owned())
            .collect();
        let ids: Vec<&str> = ids.iter().map(String::as_str).collect();
        let touched = self.records.modify_each(&ids, |product| {
            product.categories.remove(from);
            product.categories.insert(to.to_owned());
        })?;
        debug!(from, to, products = touched, "Category renamed on products");
        Ok(touched)
    }

    /// Swap in an authoritative collection, e.g. after a remote bulk upload.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn replace_all(&mut self, products: Vec<Product>) -> Result<(), StoreError> {
        info!(count = products.len(), "Replacing product catalog");
        self.records.replace_all(products)
    }

    fn slug_taken(&self, slug: &Slug, except: Option<&ProductId>) -> bool {
        self.all()
            .iter()
            .any(|p| p.slug == *slug && Some(&p.id) != except)
    }
}

fn resolve_slug(explicit: Option<&str>, name: &str) -> Result<Slug, StoreError> {
    let source = explicit.filter(|s| !s.trim().is_empty()).unwrap_or(name);
    Slug::from_name(source).map_err(|e| StoreError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{BlobStore, MemoryBlobStore};
    use chrono::{TimeZone, Utc};
    use olivo_market_core::Price;
    use olivo_market_core::query::{Sort, SortField};

    fn ctx() -> NormalizeContext {
        NormalizeContext::at(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap())
    }

    fn store() -> ProductStore {
        ProductStore::load(MemoryBlobStore::shared(), &ctx()).unwrap()
    }

    fn queso() -> ProductDraft {
        ProductDraft::new("Queso Llanero", "6.2".parse().unwrap())
            .with_stock(25)
            .with_category("Quesos")
    }

    #[test]
    fn test_load_seeds_catalog() {
        let store = store();
        assert_eq!(store.len(), 12);
        assert!(store.get_by_slug("harina-pan-amarilla-1kg").is_some());
        assert_eq!(store.count_in_category("Quesos"), 2);
        assert_eq!(store.featured().len(), 5);
    }

    #[test]
    fn test_create_queso_llanero() {
        let mut store = store();
        let product = store.create(queso(), ctx().today()).unwrap();
        assert_eq!(product.slug.as_str(), "queso-llanero");
        assert_eq!(product.view_count, 0);
        assert_eq!(product.order_clicks, 0);
        assert_eq!(product.id.as_str().len(), 9);
        assert_eq!(store.get_by_id(&product.id), Some(&product));
    }

    #[test]
    fn test_create_duplicate_slug_conflicts() {
        let mut store = store();
        store.create(queso(), ctx().today()).unwrap();
        let err = store.create(queso(), ctx().today()).unwrap_err();
        assert!(err.is_conflict());
        let err = store
            .create(
                ProductDraft::new("Otro", Price::ZERO).with_slug("Queso LLANERO"),
                ctx().today(),
            )
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_create_requires_name() {
        let mut store = store();
        assert!(matches!(
            store.create(ProductDraft::new("  ", Price::ZERO), ctx().today()),
            Err(StoreError::Validation(_))
        ));
    }

    #[test]
    fn test_rename_regenerates_slug() {
        let mut store = store();
        let product = store.create(queso(), ctx().today()).unwrap();
        store
            .update(
                &product.id,
                ProductPatch {
                    name: Some("Queso de Mano".into()),
                    ..ProductPatch::default()
                },
            )
            .unwrap();
        let updated = store.get_by_id(&product.id).unwrap();
        assert_eq!(updated.slug.as_str(), "queso-de-mano");

        store
            .update(
                &product.id,
                ProductPatch {
                    name: Some("Queso Telita".into()),
                    slug: Some("telita".into()),
                    ..ProductPatch::default()
                },
            )
            .unwrap();
        assert_eq!(store.get_by_id(&product.id).unwrap().slug.as_str(), "telita");
    }

    #[test]
    fn test_rename_into_existing_slug_conflicts() {
        let mut store = store();
        let product = store.create(queso(), ctx().today()).unwrap();
        let err = store
            .update(
                &product.id,
                ProductPatch {
                    name: Some("Pan Andino Dulce Unidad".into()),
                    ..ProductPatch::default()
                },
            )
            .unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(store.get_by_id(&product.id).unwrap().name, "Queso Llanero");
    }

    #[test]
    fn test_unknown_ids_are_noops() {
        let mut store = store();
        let missing = ProductId::new("nope");
        store.update(&missing, ProductPatch::default()).unwrap();
        store.delete(&missing).unwrap();
        assert_eq!(store.len(), 12);
    }

    #[test]
    fn test_mutations_survive_reload() {
        let blobs = MemoryBlobStore::shared();
        let mut store = ProductStore::load(blobs.clone(), &ctx()).unwrap();
        let product = store.create(queso(), ctx().today()).unwrap();
        store.delete(&ProductId::new("1")).unwrap();

        let reloaded = ProductStore::load(blobs.clone(), &ctx()).unwrap();
        assert_eq!(reloaded.len(), 12);
        assert!(reloaded.get_by_id(&product.id).is_some());
        assert!(reloaded.get_by_id(&ProductId::new("1")).is_none());
        assert_eq!(blobs.get("products_version").unwrap().as_deref(), Some("5"));
    }

    #[test]
    fn test_stored_duplicate_slugs_dropped() {
        let blobs = MemoryBlobStore::shared();
        blobs
            .set(
                "products",
                r#"[
                    {"id":"a","name":"Malta Polar","price":1.7},
                    {"id":"b","name":"Malta Polar Lata","slug":"malta-polar","price":1.9},
                    {"id":"c","name":"Pan de Jamón","price":12}
                ]"#,
            )
            .unwrap();
        blobs.set("products_version", "5").unwrap();

        let store = ProductStore::load(blobs.clone(), &ctx()).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_by_slug("malta-polar").unwrap().id.as_str(), "a");
        assert!(store.get_by_id(&ProductId::new("b")).is_none());
        assert!(!blobs.get("products").unwrap().unwrap().contains("Malta Polar Lata"));
    }

    #[test]
    fn test_blank_slug_with_rename_uses_new_name() {
        let mut store = store();
        let product = store.create(queso(), ctx().today()).unwrap();
        store
            .update(
                &product.id,
                ProductPatch {
                    name: Some("Queso de Año".into()),
                    slug: Some("  ".into()),
                    ..ProductPatch::default()
                },
            )
            .unwrap();
        assert_eq!(store.get_by_id(&product.id).unwrap().slug.as_str(), "queso-de-ano");

        store
            .update(
                &product.id,
                ProductPatch {
                    slug: Some(String::new()),
                    stock: Some(3),
                    ..ProductPatch::default()
                },
            )
            .unwrap();
        let updated = store.get_by_id(&product.id).unwrap();
        assert_eq!(updated.slug.as_str(), "queso-de-ano");
        assert_eq!(updated.stock, 3);
    }

    #[test]
    fn test_old_schema_reseeds() {
        let blobs = MemoryBlobStore::shared();
        blobs.set("products", "[]").unwrap();
        blobs.set("products_version", "4").unwrap();
        assert_eq!(ProductStore::load(blobs, &ctx()).unwrap().len(), 12);
    }

    #[test]
    fn test_query() {
        let store = store();
        let page = store.query(
            &ProductQuery::default()
                .search("queso")
                .sorted(Sort::desc(SortField::Price)),
        );
        assert_eq!(page.total_items, 2);
        assert_eq!(page.items[0].name, "Queso Guayanés Fresco 400g");
    }
}
