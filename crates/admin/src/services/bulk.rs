//! Bulk reconciliation of incoming product batches.
//!
//! The existing product identities and categories are loaded once per batch
//! and kept current in memory as records are created, so the work is linear
//! in existing plus incoming records and duplicates inside the batch are
//! skipped like duplicates of stored products.

use std::collections::{BTreeSet, HashMap};

use chrono::NaiveDate;
use olivo_market_core::{
    BulkItem, BulkReport, CatalogError, Category, CategoryDraft, CategoryId, Product, ProductDraft, ProductId, Slug,
};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::db::{CatalogRepository, ProductIdentities, RepositoryError};

/// Why a single record could not be imported.
#[derive(Debug, Error)]
pub(crate) enum RecordError {
    #[error("{0}")]
    Invalid(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl From<RecordError> for CatalogError {
    fn from(err: RecordError) -> Self {
        match err {
            RecordError::Invalid(message) => Self::Validation(message),
            RecordError::Repository(e) => e.into(),
        }
    }
}

pub(crate) fn new_product_id() -> ProductId {
    ProductId::new(Uuid::new_v4().to_string())
}

pub(crate) fn new_category_id() -> CategoryId {
    CategoryId::new(Uuid::new_v4().to_string())
}

/// Categories keyed by lowercased name and by slug.
#[derive(Debug, Default)]
pub(crate) struct CategoryIndex {
    by_name: HashMap<String, Category>,
    by_slug: HashMap<Slug, Category>,
}

impl CategoryIndex {
    pub(crate) async fn load<R: CatalogRepository>(repo: &R) -> Result<Self, RepositoryError> {
        let mut index = Self::default();
        for entry in repo.list_categories().await? {
            index.remember(entry.category);
        }
        Ok(index)
    }

    fn remember(&mut self, category: Category) {
        self.by_slug.insert(category.slug.clone(), category.clone());
        self.by_name.insert(category.name_key(), category);
    }

    /// The category matching `name` in any case, or whose slug `name`
    /// normalizes to ("Café" finds "Cafe"). Created (active, slug from the
    /// name) when neither exists. The flag is true when it was just created.
    pub(crate) async fn get_or_create<R: CatalogRepository>(
        &mut self,
        repo: &R,
        name: &str,
    ) -> Result<(Category, bool), RecordError> {
        let name = name.trim();
        if let Some(existing) = self.by_name.get(&name.to_lowercase()) {
            return Ok((existing.clone(), false));
        }
        let slug = Slug::from_name(name).map_err(|e| RecordError::Invalid(format!("category {name:?}: {e}")))?;
        if let Some(existing) = self.by_slug.get(&slug) {
            debug!(name, existing = %existing.name, "Category matched by slug");
            return Ok((existing.clone(), false));
        }
        let category = Category::from_draft(new_category_id(), slug, CategoryDraft::named(name));
        repo.insert_category(&category).await?;
        debug!(category_id = %category.id, name = %category.name, "Category created");
        self.remember(category.clone());
        Ok((category, true))
    }
}

enum Outcome {
    Created,
    Skipped,
}

/// Merge `items` into the catalog.
///
/// Per-record failures are collected in the report and never stop the batch.
///
/// # Errors
///
/// Returns `RepositoryError` only if the initial catalog snapshot cannot be
/// loaded; nothing has been written in that case.
#[instrument(skip_all, fields(batch = items.len()))]
pub async fn reconcile<R: CatalogRepository>(
    repo: &R,
    items: Vec<BulkItem>,
    today: NaiveDate,
) -> Result<BulkReport, RepositoryError> {
    let mut identities = repo.product_identities().await?;
    let mut categories = CategoryIndex::load(repo).await?;
    let mut report = BulkReport::default();

    for (index, item) in items.into_iter().enumerate() {
        let position = index + 1;
        match import_one(repo, item, today, &mut identities, &mut categories, &mut report).await {
            Ok(Outcome::Created) => report.created += 1,
            Ok(Outcome::Skipped) => report.skipped += 1,
            Err(e) => {
                warn!(record = position, error = %e, "Bulk record failed");
                report.errors.push(format!("record {position}: {e}"));
            }
        }
    }

    info!(
        created = report.created,
        skipped = report.skipped,
        new_categories = report.created_categories.len(),
        errors = report.errors.len(),
        "Bulk reconciliation finished"
    );
    Ok(report)
}

async fn import_one<R: CatalogRepository>(
    repo: &R,
    item: BulkItem,
    today: NaiveDate,
    identities: &mut ProductIdentities,
    categories: &mut CategoryIndex,
    report: &mut BulkReport,
) -> Result<Outcome, RecordError> {
    let name = item
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| RecordError::Invalid("name is required".to_owned()))?
        .to_owned();
    let price = item
        .price
        .ok_or_else(|| RecordError::Invalid(format!("{name}: price is required")))?;

    let slug_source = item.slug.as_deref().filter(|s| !s.trim().is_empty()).unwrap_or(&name);
    let slug = Slug::from_name(slug_source).map_err(|e| RecordError::Invalid(format!("{name}: {e}")))?;

    if identities.contains(&slug, &name) {
        debug!(slug = %slug, "Skipping existing product");
        return Ok(Outcome::Skipped);
    }

    let draft = ProductDraft {
        name,
        price,
        image: item.image.filter(|i| !i.trim().is_empty()),
        description: item.description.unwrap_or_default().trim().to_owned(),
        stock: item.stock.unwrap_or(0),
        featured: item.featured,
        categories: BTreeSet::new(),
        ..ProductDraft::default()
    };
    let product = Product::from_draft(new_product_id(), slug, today, draft);
    repo.insert_product(&product).await?;
    identities.insert(&product.slug, &product.name);

    // The product exists from here on; category failures are reported
    // without undoing it.
    for category_name in item.categories.iter().map(|c| c.trim()).filter(|c| !c.is_empty()) {
        if let Err(e) = attach(repo, categories, &product, category_name, report).await {
            warn!(product_id = %product.id, category = category_name, error = %e, "Category link failed");
            report
                .errors
                .push(format!("{}: category {category_name}: {e}", product.name));
        }
    }
    Ok(Outcome::Created)
}

async fn attach<R: CatalogRepository>(
    repo: &R,
    categories: &mut CategoryIndex,
    product: &Product,
    name: &str,
    report: &mut BulkReport,
) -> Result<(), RecordError> {
    let (category, created) = categories.get_or_create(repo, name).await?;
    if created {
        report.created_categories.push(category.name.clone());
    }
    repo.link_category(&product.id, &category.id).await?;
    Ok(())
}
