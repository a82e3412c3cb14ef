//! Remote catalog contract.
//!
//! [`CatalogApi`] is what the storefront and operator tooling consume; the
//! admin crate provides the implementation. Mutations take a [`Caller`] and
//! fail with [`CatalogError::Unauthorized`] before touching anything when the
//! caller is not privileged.

use std::collections::BTreeSet;
use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::import::ImportRow;
use crate::normalize::{count, decimal, pick, saturate_u32, string_list, text, truthy};
use crate::models::{Category, CategoryDraft, CategoryPatch, CategoryWithCount, Product, ProductDraft, ProductPatch};
use crate::types::{CategoryId, Price, ProductId};

/// Errors surfaced by the catalog contract.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// A required field is missing or invalid.
    #[error("validation error: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate name or slug, or a blocked deletion. The UI offers a rename.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller is not privileged. Nothing was changed.
    #[error("unauthorized")]
    Unauthorized,

    /// The request as a whole is structurally invalid.
    #[error("malformed request: {0}")]
    Malformed(String),

    /// The backing store failed.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Authorization capability of whoever is calling.
///
/// Authentication happens elsewhere; this only carries its verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    name: String,
    admin: bool,
}

impl Caller {
    #[must_use]
    pub fn admin(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: true,
        }
    }

    #[must_use]
    pub fn shopper(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            admin: false,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.admin
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::Unauthorized`] for non-admin callers.
    pub fn require_admin(&self) -> Result<(), CatalogError> {
        if self.admin {
            Ok(())
        } else {
            Err(CatalogError::Unauthorized)
        }
    }
}

/// One incoming record of a bulk submission.
///
/// `name` and `price` are optional here so that a missing value becomes a
/// per-record error rather than a rejected batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkItem {
    pub name: Option<String>,
    pub price: Option<Price>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub stock: Option<u32>,
    pub categories: BTreeSet<String>,
    pub image: Option<String>,
    pub featured: bool,
}

impl BulkItem {
    /// Decode a bulk request body.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Malformed`] when the body is not an array.
    pub fn batch_from_json(body: &Value) -> Result<Vec<Self>, CatalogError> {
        let Value::Array(entries) = body else {
            return Err(CatalogError::Malformed(
                "products must be an array".to_owned(),
            ));
        };
        Ok(entries.iter().map(Self::from_value).collect())
    }

    /// Read one bulk entry field by field.
    ///
    /// Numbers may arrive as strings, categories as an array or a
    /// comma-separated string, and a field of any other shape is treated as
    /// absent. A missing or unparsable price stays `None` so the record is
    /// rejected on its own; a non-object entry yields an empty item.
    #[must_use]
    pub fn from_value(entry: &Value) -> Self {
        let Value::Object(obj) = entry else {
            return Self::default();
        };
        Self {
            name: text(obj, &["name", "nombre"]),
            price: decimal(obj, &["price", "precio"]).map(Price::clamped),
            slug: text(obj, &["slug"]),
            description: text(obj, &["description", "descripcion"]),
            stock: pick(obj, &["stock"]).and_then(count).map(saturate_u32),
            categories: pick(obj, &["categories", "categorias"])
                .map(string_list)
                .unwrap_or_default()
                .into_iter()
                .collect(),
            image: text(obj, &["image", "imagen"]),
            featured: pick(obj, &["featured", "destacado"]).is_some_and(truthy),
        }
    }
}

impl From<ImportRow> for BulkItem {
    fn from(row: ImportRow) -> Self {
        Self {
            name: Some(row.name),
            price: row.price,
            slug: Some(row.slug.into_inner()),
            description: Some(row.description),
            stock: Some(row.stock),
            categories: row.categories.into_iter().collect(),
            image: Some(row.image),
            featured: false,
        }
    }
}

/// Aggregate outcome of a bulk submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkReport {
    pub created: usize,
    pub skipped: usize,
    /// Names of categories created along the way, in creation order.
    pub created_categories: Vec<String>,
    /// One message per failed record; never aborts the batch.
    pub errors: Vec<String>,
}

impl BulkReport {
    /// Whether every record was either created or skipped.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Operations exposed by the canonical catalog.
///
/// Update and delete of an unknown id succeed without effect.
pub trait CatalogApi: Send + Sync {
    fn list_products(&self) -> impl Future<Output = Result<Vec<Product>, CatalogError>> + Send;

    fn create_product(
        &self,
        caller: &Caller,
        draft: ProductDraft,
    ) -> impl Future<Output = Result<Product, CatalogError>> + Send;

    fn update_product(
        &self,
        caller: &Caller,
        id: &ProductId,
        patch: ProductPatch,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    fn delete_product(
        &self,
        caller: &Caller,
        id: &ProductId,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    /// Merge a batch idempotently, creating missing categories.
    fn bulk_create(
        &self,
        caller: &Caller,
        items: Vec<BulkItem>,
    ) -> impl Future<Output = Result<BulkReport, CatalogError>> + Send;

    fn list_categories(
        &self,
    ) -> impl Future<Output = Result<Vec<CategoryWithCount>, CatalogError>> + Send;

    fn create_category(
        &self,
        caller: &Caller,
        draft: CategoryDraft,
    ) -> impl Future<Output = Result<Category, CatalogError>> + Send;

    fn update_category(
        &self,
        caller: &Caller,
        id: &CategoryId,
        patch: CategoryPatch,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;

    /// Fails with [`CatalogError::Conflict`] while products are attached.
    fn delete_category(
        &self,
        caller: &Caller,
        id: &CategoryId,
    ) -> impl Future<Output = Result<(), CatalogError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_require_admin() {
        assert!(Caller::admin("ops").require_admin().is_ok());
        assert_eq!(
            Caller::shopper("ana").require_admin(),
            Err(CatalogError::Unauthorized)
        );
    }

    #[test]
    fn test_batch_from_json() {
        let items = BulkItem::batch_from_json(&json!([
            { "name": "Café", "price": "4.5", "categories": ["Café"] },
            { "name": "Pan", "price": -1 },
            "basura"
        ]))
        .unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].name.as_deref(), Some("Café"));
        assert!(items[0].categories.contains("Café"));
        assert_eq!(items[1].name.as_deref(), Some("Pan"));
        assert_eq!(items[1].price, Some(Price::ZERO));
        assert_eq!(items[2], BulkItem::default());

        assert!(matches!(
            BulkItem::batch_from_json(&json!({ "name": "Café" })),
            Err(CatalogError::Malformed(_))
        ));
    }

    #[test]
    fn test_entries_decode_leniently() {
        let items = BulkItem::batch_from_json(&json!([
            { "name": "Harina PAN", "price": 3.5, "stock": "25" },
            { "name": "Malta", "price": 1.7, "categories": "Bebidas, venezolanos" },
            { "nombre": "Tequeños", "precio": "8", "stock": [1], "featured": "sí" },
            { "name": "Sin precio", "price": "gratis", "categories": 7 }
        ]))
        .unwrap();
        assert_eq!(items[0].stock, Some(25));
        assert_eq!(items[0].price, Some("3.5".parse().unwrap()));
        assert_eq!(
            items[1].categories,
            BTreeSet::from(["Bebidas".to_owned(), "venezolanos".to_owned()])
        );
        assert_eq!(items[2].name.as_deref(), Some("Tequeños"));
        assert_eq!(items[2].stock, None);
        assert!(items[2].featured);
        assert_eq!(items[3].price, None);
        assert!(items[3].categories.is_empty());
    }

    #[test]
    fn test_report_serializes_camel_case() {
        let report = BulkReport {
            created: 1,
            created_categories: vec!["Quesos".into()],
            ..BulkReport::default()
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["createdCategories"][0], "Quesos");
        assert!(report.is_clean());
    }
}
