//! Catalog service.
//!
//! Implements [`CatalogApi`] over any [`CatalogRepository`]. Every mutation
//! checks the caller before reading or writing anything.

use chrono::Utc;
use olivo_market_core::{
    BulkItem, BulkReport, CatalogApi, CatalogError, Caller, Category, CategoryDraft, CategoryId, CategoryPatch,
    CategoryWithCount, Product, ProductDraft, ProductId, ProductPatch, Slug,
};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use super::bulk::{self, CategoryIndex, new_category_id, new_product_id};
use crate::db::CatalogRepository;

/// The canonical catalog.
#[derive(Debug)]
pub struct CatalogService<R> {
    repo: R,
    bulk_max_records: usize,
}

impl<R: CatalogRepository> CatalogService<R> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(repo: R, bulk_max_records: usize) -> Self {
        Self { repo, bulk_max_records }
    }

    #[must_use]
    pub const fn repository(&self) -> &R {
        &self.repo
    }

    /// Decode a raw bulk request body and reconcile it.
    ///
    /// # Errors
    ///
    /// - `CatalogError::Unauthorized` for non-admin callers
    /// - `CatalogError::Malformed` if the body is not an array, is empty or
    ///   is too large
    pub async fn bulk_create_json(&self, caller: &Caller, body: &Value) -> Result<BulkReport, CatalogError> {
        caller.require_admin()?;
        let items = BulkItem::batch_from_json(body)?;
        self.bulk_create(caller, items).await
    }

    /// Create every named category that does not exist yet. A name matches
    /// an existing category case-insensitively or through its slug. Returns
    /// the categories created.
    ///
    /// # Errors
    ///
    /// - `CatalogError::Unauthorized` for non-admin callers
    /// - `CatalogError::Validation` if a name yields no slug
    #[instrument(skip(self, caller, names), fields(count = names.len()))]
    pub async fn sync_categories(&self, caller: &Caller, names: &[String]) -> Result<Vec<Category>, CatalogError> {
        caller.require_admin()?;
        let mut index = CategoryIndex::load(&self.repo).await?;
        let mut created = Vec::new();
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let (category, is_new) = index.get_or_create(&self.repo, name).await?;
            if is_new {
                created.push(category);
            }
        }
        info!(created = created.len(), "Categories synced");
        Ok(created)
    }

    /// Look up, or create, every named category. Runs before the product is
    /// written so a bad category name leaves nothing behind.
    async fn resolve_categories<'a>(
        &self,
        names: impl IntoIterator<Item = &'a String>,
    ) -> Result<Vec<Category>, CatalogError> {
        let mut index = CategoryIndex::load(&self.repo).await?;
        let mut resolved = Vec::new();
        for name in names {
            if name.trim().is_empty() {
                continue;
            }
            let (category, _) = index.get_or_create(&self.repo, name).await?;
            resolved.push(category);
        }
        Ok(resolved)
    }

    async fn link_categories(&self, product_id: &ProductId, categories: &[Category]) -> Result<(), CatalogError> {
        for category in categories {
            self.repo.link_category(product_id, &category.id).await?;
        }
        Ok(())
    }

    async fn ensure_category_unique(
        &self,
        name: &str,
        slug: &Slug,
        except: Option<&CategoryId>,
    ) -> Result<(), CatalogError> {
        let by_name = self.repo.find_category_by_name(name).await?;
        let by_slug = self.repo.find_category_by_slug(slug).await?;
        match [by_name, by_slug].into_iter().flatten().find(|c| Some(&c.id) != except) {
            Some(existing) => Err(CatalogError::Conflict(format!(
                "category with same name or slug already exists: {}",
                existing.name
            ))),
            None => Ok(()),
        }
    }
}

fn required_name(name: &str, what: &str) -> Result<String, CatalogError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(CatalogError::Validation(format!("{what} name is required")));
    }
    Ok(name.to_owned())
}

fn slug_for(explicit: Option<&str>, name: &str) -> Result<Slug, CatalogError> {
    let source = explicit.filter(|s| !s.trim().is_empty()).unwrap_or(name);
    Slug::from_name(source).map_err(|e| CatalogError::Validation(e.to_string()))
}

impl<R: CatalogRepository> CatalogApi for CatalogService<R> {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.repo.list_products().await?)
    }

    #[instrument(skip(self, caller, draft), fields(name = %draft.name))]
    async fn create_product(&self, caller: &Caller, mut draft: ProductDraft) -> Result<Product, CatalogError> {
        caller.require_admin()?;
        let name = required_name(&draft.name, "product")?;
        let slug = slug_for(draft.slug.as_deref(), &name)?;
        if self.repo.find_product_by_slug(&slug).await?.is_some() {
            return Err(CatalogError::Conflict(format!("product slug already exists: {slug}")));
        }

        let categories = self.resolve_categories(&std::mem::take(&mut draft.categories)).await?;
        let id = new_product_id();
        let product = Product::from_draft(id.clone(), slug, Utc::now().date_naive(), draft);
        self.repo.insert_product(&product).await?;
        if let Err(e) = self.link_categories(&id, &categories).await {
            warn!(product_id = %id, error = %e, "Linking categories failed, removing product");
            self.repo.delete_product(&id).await?;
            return Err(e);
        }

        info!(product_id = %id, slug = %product.slug, "Product created");
        self.repo
            .find_product(&id)
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("product {id}")))
    }

    #[instrument(skip(self, caller, patch), fields(product_id = %id))]
    async fn update_product(&self, caller: &Caller, id: &ProductId, mut patch: ProductPatch) -> Result<(), CatalogError> {
        caller.require_admin()?;
        let Some(mut product) = self.repo.find_product(id).await? else {
            debug!("Update of unknown product ignored");
            return Ok(());
        };

        let renamed = patch.name.as_deref().is_some_and(|n| n.trim() != product.name);
        let explicit_slug = patch.slug.take().filter(|s| !s.trim().is_empty());
        let categories = patch.categories.take();
        patch.merge_into(&mut product);
        required_name(&product.name, "product")?;

        let slug = match explicit_slug {
            Some(explicit) => slug_for(Some(&explicit), &product.name)?,
            None if renamed => slug_for(None, &product.name)?,
            None => product.slug.clone(),
        };
        if slug != product.slug
            && let Some(other) = self.repo.find_product_by_slug(&slug).await?
            && other.id != product.id
        {
            return Err(CatalogError::Conflict(format!("product slug already exists: {slug}")));
        }
        product.slug = slug;
        let categories = match categories {
            Some(names) => Some(self.resolve_categories(&names).await?),
            None => None,
        };

        self.repo.update_product(&product).await?;
        if let Some(categories) = categories {
            self.repo.clear_categories(id).await?;
            self.link_categories(id, &categories).await?;
        }
        info!(slug = %product.slug, "Product updated");
        Ok(())
    }

    #[instrument(skip(self, caller), fields(product_id = %id))]
    async fn delete_product(&self, caller: &Caller, id: &ProductId) -> Result<(), CatalogError> {
        caller.require_admin()?;
        if self.repo.delete_product(id).await? {
            info!("Product deleted");
        } else {
            debug!("Delete of unknown product ignored");
        }
        Ok(())
    }

    #[instrument(skip(self, caller, items), fields(batch = items.len()))]
    async fn bulk_create(&self, caller: &Caller, items: Vec<BulkItem>) -> Result<BulkReport, CatalogError> {
        caller.require_admin()?;
        if items.is_empty() {
            return Err(CatalogError::Malformed("no products to import".to_owned()));
        }
        if items.len() > self.bulk_max_records {
            return Err(CatalogError::Malformed(format!(
                "batch of {} records exceeds the limit of {}",
                items.len(),
                self.bulk_max_records
            )));
        }
        Ok(bulk::reconcile(&self.repo, items, Utc::now().date_naive()).await?)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryWithCount>, CatalogError> {
        Ok(self.repo.list_categories().await?)
    }

    #[instrument(skip(self, caller, draft), fields(name = %draft.name))]
    async fn create_category(&self, caller: &Caller, mut draft: CategoryDraft) -> Result<Category, CatalogError> {
        caller.require_admin()?;
        let name = required_name(&draft.name, "category")?;
        let slug = slug_for(draft.slug.as_deref(), &name)?;
        self.ensure_category_unique(&name, &slug, None).await?;

        draft.name = name;
        let category = Category::from_draft(new_category_id(), slug, draft);
        self.repo.insert_category(&category).await?;
        info!(category_id = %category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    #[instrument(skip(self, caller, patch), fields(category_id = %id))]
    async fn update_category(&self, caller: &Caller, id: &CategoryId, mut patch: CategoryPatch) -> Result<(), CatalogError> {
        caller.require_admin()?;
        let Some(mut category) = self.repo.find_category(id).await? else {
            debug!("Update of unknown category ignored");
            return Ok(());
        };

        let renamed = patch.name.as_deref().is_some_and(|n| n.trim() != category.name);
        let explicit_slug = patch.slug.take().filter(|s| !s.trim().is_empty());
        patch.merge_into(&mut category);
        required_name(&category.name, "category")?;

        category.slug = match explicit_slug {
            Some(explicit) => slug_for(Some(&explicit), &category.name)?,
            None if renamed => slug_for(None, &category.name)?,
            None => category.slug,
        };
        self.ensure_category_unique(&category.name, &category.slug, Some(id)).await?;

        self.repo.update_category(&category).await?;
        info!(slug = %category.slug, "Category updated");
        Ok(())
    }

    #[instrument(skip(self, caller), fields(category_id = %id))]
    async fn delete_category(&self, caller: &Caller, id: &CategoryId) -> Result<(), CatalogError> {
        caller.require_admin()?;
        let Some(category) = self.repo.find_category(id).await? else {
            debug!("Delete of unknown category ignored");
            return Ok(());
        };
        let count = self.repo.count_products_in_category(id).await?;
        if count > 0 {
            warn!(products = count, "Refusing to delete category in use");
            return Err(CatalogError::Conflict(format!(
                "category {} has {count} products",
                category.name
            )));
        }
        self.repo.delete_category(id).await?;
        info!("Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryCatalogRepository;
    use olivo_market_core::Price;
    use serde_json::json;

    fn service() -> CatalogService<MemoryCatalogRepository> {
        CatalogService::new(MemoryCatalogRepository::new(), 3)
    }

    fn admin() -> Caller {
        Caller::admin("ops")
    }

    fn queso() -> ProductDraft {
        ProductDraft::new("Queso Llanero", "6.2".parse().unwrap())
            .with_stock(25)
            .with_category("Quesos")
    }

    #[tokio::test]
    async fn test_shopper_cannot_mutate() {
        let service = service();
        let shopper = Caller::shopper("ana");
        assert_eq!(
            service.create_product(&shopper, queso()).await,
            Err(CatalogError::Unauthorized)
        );
        assert_eq!(
            service.bulk_create(&shopper, vec![BulkItem::default()]).await,
            Err(CatalogError::Unauthorized)
        );
        assert_eq!(
            service.create_category(&shopper, CategoryDraft::named("Quesos")).await,
            Err(CatalogError::Unauthorized)
        );
        assert!(service.list_products().await.unwrap().is_empty());
        assert!(service.list_categories().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_product_links_categories() {
        let service = service();
        let product = service.create_product(&admin(), queso()).await.unwrap();
        assert_eq!(product.slug.as_str(), "queso-llanero");
        assert_eq!(product.view_count, 0);
        assert_eq!(product.order_clicks, 0);
        assert!(product.in_category("Quesos"));

        let categories = service.list_categories().await.unwrap();
        assert_eq!(categories.len(), 1);
        assert_eq!(categories[0].products_count, 1);

        assert!(matches!(
            service.create_product(&admin(), queso()).await,
            Err(CatalogError::Conflict(_))
        ));
        assert!(matches!(
            service
                .create_product(&admin(), ProductDraft::new("  ", Price::ZERO))
                .await,
            Err(CatalogError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_accented_category_reuses_existing() {
        let service = service();
        let cafe = service
            .create_category(&admin(), CategoryDraft::named("Cafe"))
            .await
            .unwrap();
        let product = service
            .create_product(
                &admin(),
                ProductDraft::new("Cafe Madrid", Price::from_cents(500)).with_category("Café"),
            )
            .await
            .unwrap();
        assert!(product.in_category("Cafe"));
        assert_eq!(service.list_categories().await.unwrap().len(), 1);
        assert_eq!(service.repository().count_products_in_category(&cafe.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_bad_category_leaves_no_product() {
        let service = service();
        let draft = ProductDraft::new("Cafe Madrid", Price::from_cents(500)).with_category("¡!");
        assert!(matches!(
            service.create_product(&admin(), draft).await,
            Err(CatalogError::Validation(_))
        ));
        assert!(service.list_products().await.unwrap().is_empty());

        let retry = ProductDraft::new("Cafe Madrid", Price::from_cents(500)).with_category("Café");
        let product = service.create_product(&admin(), retry).await.unwrap();
        assert_eq!(product.slug.as_str(), "cafe-madrid");

        let clash = service
            .update_product(
                &admin(),
                &product.id,
                ProductPatch {
                    stock: Some(9),
                    categories: Some(["¡!".to_owned()].into()),
                    ..ProductPatch::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(CatalogError::Validation(_))));
        let stored = service.repository().find_product(&product.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 0);
        assert!(stored.in_category("Café"));
    }

    #[tokio::test]
    async fn test_update_product() {
        let service = service();
        let product = service.create_product(&admin(), queso()).await.unwrap();
        let other = service
            .create_product(&admin(), ProductDraft::new("Queso Guayanés", Price::from_cents(700)))
            .await
            .unwrap();

        service
            .update_product(
                &admin(),
                &product.id,
                ProductPatch {
                    name: Some("Queso Llanero Duro".into()),
                    categories: Some(["Quesos".to_owned(), "venezolanos".to_owned()].into()),
                    ..ProductPatch::default()
                },
            )
            .await
            .unwrap();
        let updated = service.repository().find_product(&product.id).await.unwrap().unwrap();
        assert_eq!(updated.slug.as_str(), "queso-llanero-duro");
        assert_eq!(updated.categories.len(), 2);

        let clash = service
            .update_product(
                &admin(),
                &product.id,
                ProductPatch {
                    slug: Some(other.slug.as_str().to_owned()),
                    ..ProductPatch::default()
                },
            )
            .await;
        assert!(matches!(clash, Err(CatalogError::Conflict(_))));

        service
            .update_product(&admin(), &ProductId::new("missing"), ProductPatch::default())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_category_rules() {
        let service = service();
        let quesos = service
            .create_category(
                &admin(),
                CategoryDraft {
                    slug: Some("Quesos Frescos".into()),
                    ..CategoryDraft::named("Quesos")
                },
            )
            .await
            .unwrap();
        assert_eq!(quesos.slug.as_str(), "quesos-frescos");
        assert!(quesos.is_active);

        assert!(matches!(
            service.create_category(&admin(), CategoryDraft::named("QUESOS")).await,
            Err(CatalogError::Conflict(_))
        ));

        service.create_product(&admin(), queso()).await.unwrap();
        assert!(matches!(
            service.delete_category(&admin(), &quesos.id).await,
            Err(CatalogError::Conflict(_))
        ));
        assert!(service.repository().find_category(&quesos.id).await.unwrap().is_some());

        service
            .update_category(
                &admin(),
                &quesos.id,
                CategoryPatch {
                    is_active: Some(false),
                    ..CategoryPatch::default()
                },
            )
            .await
            .unwrap();
        let stored = service.repository().find_category(&quesos.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.slug.as_str(), "quesos-frescos");
    }

    #[tokio::test]
    async fn test_bulk_request_validation() {
        let service = service();
        assert!(matches!(
            service.bulk_create(&admin(), Vec::new()).await,
            Err(CatalogError::Malformed(_))
        ));
        assert!(matches!(
            service.bulk_create(&admin(), vec![BulkItem::default(); 4]).await,
            Err(CatalogError::Malformed(_))
        ));
        assert!(matches!(
            service.bulk_create_json(&admin(), &json!({"name": "Café"})).await,
            Err(CatalogError::Malformed(_))
        ));

        let report = service
            .bulk_create_json(
                &admin(),
                &json!([{"name": "Café", "price": 4.5}, {"name": "café", "price": "4"}]),
            )
            .await
            .unwrap();
        assert_eq!((report.created, report.skipped), (1, 1));
    }

    #[tokio::test]
    async fn test_sync_categories() {
        let service = service();
        service
            .create_category(&admin(), CategoryDraft::named("Bebidas"))
            .await
            .unwrap();
        let created = service
            .sync_categories(
                &admin(),
                &["bebidas".into(), "Agua".into(), " ".into(), "Hielo".into(), "BEBÍDAS".into()],
            )
            .await
            .unwrap();
        let names: Vec<_> = created.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Agua", "Hielo"]);
        assert!(
            service
                .sync_categories(&admin(), &["Agua".into()])
                .await
                .unwrap()
                .is_empty()
        );
    }
}
