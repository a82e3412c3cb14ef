//! In-memory catalog repository.

use std::collections::BTreeSet;

use olivo_market_core::{Category, CategoryId, CategoryWithCount, Product, ProductId, Slug};
use tokio::sync::RwLock;

use super::{CatalogRepository, ProductIdentities, RepositoryError};

#[derive(Debug, Default)]
struct State {
    /// Stored with empty `categories`; names come from `links`.
    products: Vec<Product>,
    categories: Vec<Category>,
    links: BTreeSet<(ProductId, CategoryId)>,
}

impl State {
    fn hydrate(&self, product: &Product) -> Product {
        let mut product = product.clone();
        product.categories = self
            .links
            .iter()
            .filter(|(pid, _)| *pid == product.id)
            .filter_map(|(_, cid)| self.categories.iter().find(|c| c.id == *cid))
            .map(|c| c.name.clone())
            .collect();
        product
    }

    fn count_in(&self, id: &CategoryId) -> u64 {
        self.links.iter().filter(|(_, cid)| cid == id).count() as u64
    }

    fn category_clash(&self, category: &Category) -> Option<&Category> {
        let key = category.name_key();
        self.categories
            .iter()
            .filter(|c| c.id != category.id)
            .find(|c| c.name_key() == key || c.slug == category.slug)
    }
}

/// Catalog held in process memory behind a tokio `RwLock`.
#[derive(Debug, Default)]
pub struct MemoryCatalogRepository {
    state: RwLock<State>,
}

impl MemoryCatalogRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CatalogRepository for MemoryCatalogRepository {
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.iter().map(|p| state.hydrate(p)).collect())
    }

    async fn find_product(&self, id: &ProductId) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| p.id == *id).map(|p| state.hydrate(p)))
    }

    async fn find_product_by_slug(&self, slug: &Slug) -> Result<Option<Product>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .find(|p| p.slug == *slug)
            .map(|p| state.hydrate(p)))
    }

    async fn product_identities(&self) -> Result<ProductIdentities, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .products
            .iter()
            .map(|p| (&p.slug, p.name.as_str()))
            .collect())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.products.iter().any(|p| p.id == product.id || p.slug == product.slug) {
            return Err(RepositoryError::Conflict(format!(
                "product slug already exists: {}",
                product.slug
            )));
        }
        let mut stored = product.clone();
        stored.categories.clear();
        state.products.push(stored);
        Ok(())
    }

    async fn update_product(&self, product: &Product) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state
            .products
            .iter()
            .any(|p| p.id != product.id && p.slug == product.slug)
        {
            return Err(RepositoryError::Conflict(format!(
                "product slug already exists: {}",
                product.slug
            )));
        }
        let stored = state
            .products
            .iter_mut()
            .find(|p| p.id == product.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = product.clone();
        stored.categories.clear();
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let before = state.products.len();
        state.products.retain(|p| p.id != *id);
        state.links.retain(|(pid, _)| pid != id);
        Ok(state.products.len() != before)
    }

    async fn list_categories(&self) -> Result<Vec<CategoryWithCount>, RepositoryError> {
        let state = self.state.read().await;
        let mut categories: Vec<CategoryWithCount> = state
            .categories
            .iter()
            .map(|category| CategoryWithCount {
                products_count: state.count_in(&category.id),
                category: category.clone(),
            })
            .collect();
        categories.sort_by(|a, b| a.category.name.cmp(&b.category.name));
        Ok(categories)
    }

    async fn find_category(&self, id: &CategoryId) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| c.id == *id).cloned())
    }

    async fn find_category_by_name(&self, name: &str) -> Result<Option<Category>, RepositoryError> {
        let key = name.trim().to_lowercase();
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| c.name_key() == key).cloned())
    }

    async fn find_category_by_slug(&self, slug: &Slug) -> Result<Option<Category>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.categories.iter().find(|c| c.slug == *slug).cloned())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.category_clash(category) {
            return Err(RepositoryError::Conflict(format!(
                "category with same name or slug already exists: {}",
                existing.name
            )));
        }
        if state.categories.iter().any(|c| c.id == category.id) {
            return Err(RepositoryError::Conflict(format!("category id already exists: {}", category.id)));
        }
        state.categories.push(category.clone());
        Ok(())
    }

    async fn update_category(&self, category: &Category) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.category_clash(category) {
            return Err(RepositoryError::Conflict(format!(
                "category with same name or slug already exists: {}",
                existing.name
            )));
        }
        let stored = state
            .categories
            .iter_mut()
            .find(|c| c.id == category.id)
            .ok_or(RepositoryError::NotFound)?;
        *stored = category.clone();
        Ok(())
    }

    async fn delete_category(&self, id: &CategoryId) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        if state.count_in(id) > 0 {
            return Err(RepositoryError::Conflict(format!("category {id} still has products")));
        }
        let before = state.categories.len();
        state.categories.retain(|c| c.id != *id);
        Ok(state.categories.len() != before)
    }

    async fn link_category(&self, product_id: &ProductId, category_id: &CategoryId) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        let known = state.products.iter().any(|p| p.id == *product_id)
            && state.categories.iter().any(|c| c.id == *category_id);
        if !known {
            return Err(RepositoryError::NotFound);
        }
        state.links.insert((product_id.clone(), category_id.clone()));
        Ok(())
    }

    async fn clear_categories(&self, product_id: &ProductId) -> Result<(), RepositoryError> {
        self.state.write().await.links.retain(|(pid, _)| pid != product_id);
        Ok(())
    }

    async fn count_products_in_category(&self, id: &CategoryId) -> Result<u64, RepositoryError> {
        Ok(self.state.read().await.count_in(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use olivo_market_core::{CategoryDraft, ProductDraft};

    fn product(id: &str, name: &str) -> Product {
        Product::from_draft(
            ProductId::new(id),
            Slug::from_name(name).unwrap(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
            ProductDraft::new(name, "2.5".parse().unwrap()),
        )
    }

    fn category(id: &str, name: &str) -> Category {
        Category::from_draft(
            CategoryId::new(id),
            Slug::from_name(name).unwrap(),
            CategoryDraft::named(name),
        )
    }

    #[tokio::test]
    async fn test_links_fill_category_names() {
        let repo = MemoryCatalogRepository::new();
        repo.insert_product(&product("p1", "Queso Llanero")).await.unwrap();
        repo.insert_category(&category("c1", "Quesos")).await.unwrap();
        repo.link_category(&ProductId::new("p1"), &CategoryId::new("c1")).await.unwrap();
        repo.link_category(&ProductId::new("p1"), &CategoryId::new("c1")).await.unwrap();

        let stored = repo.find_product(&ProductId::new("p1")).await.unwrap().unwrap();
        assert!(stored.in_category("Quesos"));
        assert_eq!(repo.count_products_in_category(&CategoryId::new("c1")).await.unwrap(), 1);

        let listed = repo.list_categories().await.unwrap();
        assert_eq!(listed[0].products_count, 1);
    }

    #[tokio::test]
    async fn test_unique_constraints() {
        let repo = MemoryCatalogRepository::new();
        repo.insert_product(&product("p1", "Café")).await.unwrap();
        assert!(matches!(
            repo.insert_product(&product("p2", "cafe")).await,
            Err(RepositoryError::Conflict(_))
        ));

        repo.insert_category(&category("c1", "Bebidas")).await.unwrap();
        assert!(matches!(
            repo.insert_category(&category("c2", "BEBIDAS")).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            repo.update_product(&product("p9", "Pan")).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_delete_category_guarded() {
        let repo = MemoryCatalogRepository::new();
        repo.insert_product(&product("p1", "Agua")).await.unwrap();
        repo.insert_category(&category("c1", "Agua")).await.unwrap();
        repo.link_category(&ProductId::new("p1"), &CategoryId::new("c1")).await.unwrap();

        assert!(matches!(
            repo.delete_category(&CategoryId::new("c1")).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(repo.delete_product(&ProductId::new("p1")).await.unwrap());
        assert!(repo.delete_category(&CategoryId::new("c1")).await.unwrap());
        assert!(!repo.delete_category(&CategoryId::new("c1")).await.unwrap());
    }
}
