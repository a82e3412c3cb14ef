//! Product records.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::DEFAULT_IMAGE;
use crate::types::{Price, ProductId, Slug};

/// A catalog product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Unique within a store; derived from `name` unless set explicitly.
    pub slug: Slug,
    pub price: Price,
    /// Price before discount, shown struck through when higher than `price`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_original: Option<Price>,
    /// Primary image.
    pub image: String,
    pub description: String,
    /// Category names; order is irrelevant.
    pub categories: BTreeSet<String>,
    pub stock: u32,
    pub featured: bool,
    pub created_at: NaiveDate,
    #[serde(default)]
    pub gallery: Vec<String>,
    #[serde(default)]
    pub features: Vec<String>,
    /// Detail page views.
    #[serde(default)]
    pub view_count: u64,
    /// Order intents (checkout or WhatsApp clicks).
    #[serde(default)]
    pub order_clicks: u64,
}

impl Product {
    /// Build a product from a draft with the given id, slug and creation date.
    #[must_use]
    pub fn from_draft(id: ProductId, slug: Slug, created_at: NaiveDate, draft: ProductDraft) -> Self {
        Self {
            id,
            name: draft.name.trim().to_owned(),
            slug,
            price: draft.price,
            price_original: draft.price_original,
            image: draft.image.unwrap_or_else(|| DEFAULT_IMAGE.to_owned()),
            description: draft.description,
            categories: draft.categories,
            stock: draft.stock,
            featured: draft.featured,
            created_at,
            gallery: draft.gallery,
            features: draft.features,
            view_count: 0,
            order_clicks: 0,
        }
    }

    /// Whether the product is discounted.
    #[must_use]
    pub fn has_discount(&self) -> bool {
        self.price_original.is_some_and(|original| original > self.price)
    }

    /// Whether the product belongs to the named category (exact match).
    #[must_use]
    pub fn in_category(&self, name: &str) -> bool {
        self.categories.contains(name)
    }

    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Input for creating a product. Id, creation date and metrics are assigned
/// by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductDraft {
    pub name: String,
    /// Explicit slug; derived from `name` when absent.
    pub slug: Option<String>,
    pub price: Price,
    pub price_original: Option<Price>,
    pub image: Option<String>,
    pub description: String,
    pub categories: BTreeSet<String>,
    pub stock: u32,
    pub featured: bool,
    pub gallery: Vec<String>,
    pub features: Vec<String>,
}

impl ProductDraft {
    /// Minimal draft with a name and price.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Price) -> Self {
        Self {
            name: name.into(),
            price,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    #[must_use]
    pub fn with_category(mut self, name: impl Into<String>) -> Self {
        self.categories.insert(name.into());
        self
    }

    #[must_use]
    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }
}

/// Partial update for a product. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub price: Option<Price>,
    pub price_original: Option<Option<Price>>,
    pub image: Option<String>,
    pub description: Option<String>,
    pub categories: Option<BTreeSet<String>>,
    pub stock: Option<u32>,
    pub featured: Option<bool>,
    pub gallery: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
}

impl ProductPatch {
    /// Merge every field except `slug` into `product`.
    ///
    /// The slug depends on store-wide uniqueness and is resolved by the caller.
    pub fn merge_into(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name.trim().to_owned();
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(price_original) = self.price_original {
            product.price_original = price_original;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(categories) = self.categories {
            product.categories = categories;
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(featured) = self.featured {
            product.featured = featured;
        }
        if let Some(gallery) = self.gallery {
            product.gallery = gallery;
        }
        if let Some(features) = self.features {
            product.features = features;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Product {
        let draft = ProductDraft::new("Queso Llanero", "6.2".parse().unwrap())
            .with_stock(25)
            .with_category("Quesos");
        Product::from_draft(
            ProductId::new("p1"),
            Slug::from_name("Queso Llanero").unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, 1).unwrap(),
            draft,
        )
    }

    #[test]
    fn test_from_draft_defaults() {
        let product = sample();
        assert_eq!(product.image, DEFAULT_IMAGE);
        assert_eq!(product.view_count, 0);
        assert_eq!(product.order_clicks, 0);
        assert!(product.in_category("Quesos"));
        assert!(!product.in_category("quesos"));
    }

    #[test]
    fn test_discount() {
        let mut product = sample();
        assert!(!product.has_discount());
        product.price_original = Some("6.9".parse().unwrap());
        assert!(product.has_discount());
    }

    #[test]
    fn test_patch_leaves_slug_alone() {
        let mut product = sample();
        ProductPatch {
            name: Some("Queso Guayanés".into()),
            stock: Some(3),
            ..ProductPatch::default()
        }
        .merge_into(&mut product);
        assert_eq!(product.name, "Queso Guayanés");
        assert_eq!(product.stock, 3);
        assert_eq!(product.slug.as_str(), "queso-llanero");
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("viewCount").is_some());
        assert!(json.get("orderClicks").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("priceOriginal").is_none());
    }
}
