//! Category record store.
//!
//! Product counts are derived from a [`ProductStore`] on demand; categories
//! never store them.

use olivo_market_core::normalize::{NormalizeContext, ParseResult, normalize_category};
use olivo_market_core::{Category, CategoryDraft, CategoryId, CategoryPatch, CategoryWithCount, Slug};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::products::ProductStore;
use crate::record_store::{RecordKind, RecordStore, VersionPolicy};
use crate::seed;
use crate::storage::SharedBlobStore;

#[derive(Debug)]
pub struct CategoryKind;

impl RecordKind for CategoryKind {
    type Record = Category;

    const LABEL: &'static str = "categories";
    const STORAGE_KEY: &'static str = "categories";
    const VERSION_KEY: &'static str = "categories_version";
    const SCHEMA_VERSION: &'static str = "1";
    const POLICY: VersionPolicy = VersionPolicy::Reseed;

    fn seed(_ctx: &NormalizeContext) -> Vec<Category> {
        seed::categories()
    }

    fn normalize(raw: &Value, _position: usize, _ctx: &NormalizeContext) -> ParseResult<Category> {
        normalize_category(raw)
    }

    fn id(record: &Category) -> &str {
        record.id.as_str()
    }
}

/// The session's category list.
#[derive(Debug)]
pub struct CategoryStore {
    records: RecordStore<CategoryKind>,
}

impl CategoryStore {
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the blob store fails.
    pub fn load(blobs: SharedBlobStore, ctx: &NormalizeContext) -> Result<Self, StoreError> {
        Ok(Self {
            records: RecordStore::load(blobs, ctx)?,
        })
    }

    #[must_use]
    pub fn all(&self) -> &[Category] {
        self.records.records()
    }

    /// Active categories only, for shopper-facing navigation.
    #[must_use]
    pub fn active(&self) -> Vec<&Category> {
        self.all().iter().filter(|c| c.is_active).collect()
    }

    #[must_use]
    pub fn get_by_id(&self, id: &CategoryId) -> Option<&Category> {
        self.records.get(id.as_str())
    }

    #[must_use]
    pub fn get_by_slug(&self, slug: &str) -> Option<&Category> {
        self.all().iter().find(|c| c.slug.as_str() == slug)
    }

    /// Case-insensitive lookup by name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Category> {
        let key = name.trim().to_lowercase();
        self.all().iter().find(|c| c.name_key() == key)
    }

    /// Every category with its current product count.
    #[must_use]
    pub fn with_counts(&self, products: &ProductStore) -> Vec<CategoryWithCount> {
        self.all()
            .iter()
            .map(|category| CategoryWithCount {
                products_count: products.count_in_category(&category.name),
                category: category.clone(),
            })
            .collect()
    }

    /// # Errors
    ///
    /// - `StoreError::Validation` if the name is blank or yields no slug
    /// - `StoreError::Conflict` if the name or slug is already used
    /// - `StoreError::Storage` if persisting fails
    pub fn create(&mut self, draft: CategoryDraft) -> Result<Category, StoreError> {
        let name = draft.name.trim();
        if name.is_empty() {
            return Err(StoreError::Validation("category name is required".to_owned()));
        }
        let slug = resolve_slug(draft.slug.as_deref(), name)?;
        self.ensure_unique(name, &slug, None)?;

        let id = loop {
            let candidate = CategoryId::generate();
            if !self.records.contains(candidate.as_str()) {
                break candidate;
            }
        };
        let category = Category::from_draft(id, slug, draft);
        self.records.push(category.clone())?;
        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// Merge `patch` into the category with `id`; unknown ids are ignored.
    ///
    /// A rename is carried over to every product in `products` that lists
    /// the old name, so the category keeps its products.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` if the new name is blank
    /// - `StoreError::Conflict` if the new name or slug belongs to another category
    /// - `StoreError::Storage` if persisting fails
    pub fn update(
        &mut self,
        id: &CategoryId,
        patch: CategoryPatch,
        products: &mut ProductStore,
    ) -> Result<(), StoreError> {
        let Some(current) = self.get_by_id(id) else {
            debug!(category_id = %id, "Update of unknown category ignored");
            return Ok(());
        };
        let name = patch.name.as_deref().map_or(current.name.as_str(), str::trim);
        if name.is_empty() {
            return Err(StoreError::Validation("category name is required".to_owned()));
        }
        let slug = match patch.slug.as_deref() {
            Some(explicit) => resolve_slug(Some(explicit), name)?,
            None if name != current.name => resolve_slug(None, name)?,
            None => current.slug.clone(),
        };
        self.ensure_unique(name, &slug, Some(id))?;
        let old_name = current.name.clone();
        let new_name = name.to_owned();

        self.records.modify(id.as_str(), |category| {
            patch.merge_into(category);
            category.slug = slug;
            Ok(())
        })?;
        if new_name != old_name {
            let moved = products.rename_category(&old_name, &new_name)?;
            info!(category_id = %id, from = %old_name, to = %new_name, products = moved, "Category renamed");
        }
        Ok(())
    }

    /// Delete the category with `id` unless products still reference it.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` while `products` lists the category
    /// - `StoreError::Storage` if persisting fails
    pub fn delete(&mut self, id: &CategoryId, products: &ProductStore) -> Result<(), StoreError> {
        let Some(category) = self.get_by_id(id) else {
            debug!(category_id = %id, "Delete of unknown category ignored");
            return Ok(());
        };
        let count = products.count_in_category(&category.name);
        if count > 0 {
            warn!(category_id = %id, products = count, "Refusing to delete category in use");
            return Err(StoreError::Conflict(format!(
                "category {} has {count} products",
                category.name
            )));
        }
        self.records.remove(id.as_str())?;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    /// Swap in an authoritative category list.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn replace_all(&mut self, categories: Vec<Category>) -> Result<(), StoreError> {
        info!(count = categories.len(), "Replacing categories");
        self.records.replace_all(categories)
    }

    fn ensure_unique(&self, name: &str, slug: &Slug, except: Option<&CategoryId>) -> Result<(), StoreError> {
        let key = name.to_lowercase();
        let clash = self
            .all()
            .iter()
            .filter(|c| Some(&c.id) != except)
            .find(|c| c.name_key() == key || c.slug == *slug);
        match clash {
            Some(existing) => Err(StoreError::Conflict(format!(
                "category with same name or slug already exists: {}",
                existing.name
            ))),
            None => Ok(()),
        }
    }
}

fn resolve_slug(explicit: Option<&str>, name: &str) -> Result<Slug, StoreError> {
    let source = explicit.filter(|s| !s.trim().is_empty()).unwrap_or(name);
    Slug::from_name(source).map_err(|e| StoreError::Validation(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use chrono::{TimeZone, Utc};

    fn ctx() -> NormalizeContext {
        NormalizeContext::at(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap())
    }

    fn stores() -> (CategoryStore, ProductStore) {
        let blobs = MemoryBlobStore::shared();
        (
            CategoryStore::load(blobs.clone(), &ctx()).unwrap(),
            ProductStore::load(blobs, &ctx()).unwrap(),
        )
    }

    #[test]
    fn test_counts() {
        let (categories, products) = stores();
        let counts = categories.with_counts(&products);
        let venezolanos = counts
            .iter()
            .find(|c| c.category.name == "venezolanos")
            .unwrap();
        assert_eq!(venezolanos.products_count, 3);
    }

    #[test]
    fn test_create_normalizes_slug() {
        let (mut categories, _) = stores();
        let category = categories
            .create(CategoryDraft {
                slug: Some("  Congelados & Más ".into()),
                ..CategoryDraft::named("Congelados")
            })
            .unwrap();
        assert_eq!(category.slug.as_str(), "congelados-mas");
        assert_eq!(category.description, "Productos de Congelados");
        assert!(categories.get_by_name("CONGELADOS").is_some());
    }

    #[test]
    fn test_duplicate_name_conflicts() {
        let (mut categories, _) = stores();
        let err = categories.create(CategoryDraft::named("quesos")).unwrap_err();
        assert!(err.is_conflict());
        let err = categories
            .create(CategoryDraft {
                slug: Some("panes".into()),
                ..CategoryDraft::named("Panadería")
            })
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_delete_blocked_while_in_use() {
        let (mut categories, products) = stores();
        let quesos = categories.get_by_name("Quesos").unwrap().id.clone();
        let err = categories.delete(&quesos, &products).unwrap_err();
        assert!(err.is_conflict());
        assert!(categories.get_by_id(&quesos).is_some());
    }

    #[test]
    fn test_delete_unused() {
        let (mut categories, products) = stores();
        let created = categories.create(CategoryDraft::named("Postres")).unwrap();
        categories.delete(&created.id, &products).unwrap();
        assert!(categories.get_by_id(&created.id).is_none());
        categories.delete(&created.id, &products).unwrap();
    }

    #[test]
    fn test_rename_regenerates_slug() {
        let (mut categories, mut products) = stores();
        let id = categories.get_by_name("Aseo").unwrap().id.clone();
        categories
            .update(
                &id,
                CategoryPatch {
                    name: Some("Aseo Hogar".into()),
                    is_active: Some(false),
                    ..CategoryPatch::default()
                },
                &mut products,
            )
            .unwrap();
        let updated = categories.get_by_id(&id).unwrap();
        assert_eq!(updated.slug.as_str(), "aseo-hogar");
        assert!(!updated.is_active);
        assert_eq!(categories.active().len(), 9);

        let err = categories
            .update(
                &id,
                CategoryPatch {
                    name: Some("Bebidas".into()),
                    ..CategoryPatch::default()
                },
                &mut products,
            )
            .unwrap_err();
        assert!(err.is_conflict());
    }

    #[test]
    fn test_rename_keeps_products_and_delete_guard() {
        let blobs = MemoryBlobStore::shared();
        let mut categories = CategoryStore::load(blobs.clone(), &ctx()).unwrap();
        let mut products = ProductStore::load(blobs.clone(), &ctx()).unwrap();
        let quesos = categories.get_by_name("Quesos").unwrap().id.clone();

        categories
            .update(
                &quesos,
                CategoryPatch {
                    name: Some("Lácteos".into()),
                    ..CategoryPatch::default()
                },
                &mut products,
            )
            .unwrap();
        assert_eq!(products.count_in_category("Quesos"), 0);
        assert_eq!(products.count_in_category("Lácteos"), 2);

        let err = categories.delete(&quesos, &products).unwrap_err();
        assert!(err.is_conflict());
        assert!(categories.get_by_id(&quesos).is_some());

        let reloaded = ProductStore::load(blobs, &ctx()).unwrap();
        assert_eq!(reloaded.count_in_category("Lácteos"), 2);
    }
}
