//! Category records.

use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, Slug};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    /// Unique, compared case-insensitively.
    pub name: String,
    pub slug: Slug,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub is_active: bool,
}

impl Category {
    /// Build a category from a draft with the given id and resolved slug.
    #[must_use]
    pub fn from_draft(id: CategoryId, slug: Slug, draft: CategoryDraft) -> Self {
        let name = draft.name.trim().to_owned();
        Self {
            id,
            description: draft
                .description
                .unwrap_or_else(|| format!("Productos de {name}")),
            name,
            slug,
            image: draft.image,
            is_active: draft.is_active.unwrap_or(true),
        }
    }

    /// Case-insensitive lookup key for the name.
    #[must_use]
    pub fn name_key(&self) -> String {
        self.name.to_lowercase()
    }
}

/// A category together with the number of products associated with it.
///
/// The count is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryWithCount {
    #[serde(flatten)]
    pub category: Category,
    pub products_count: u64,
}

impl CategoryWithCount {
    /// A category with products attached cannot be deleted.
    #[must_use]
    pub const fn is_deletable(&self) -> bool {
        self.products_count == 0
    }
}

/// Input for creating a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryDraft {
    pub name: String,
    /// Explicit slug (normalized before use); derived from `name` when absent.
    pub slug: Option<String>,
    /// Defaults to `Productos de <name>`.
    pub description: Option<String>,
    pub image: Option<String>,
    /// Defaults to active.
    pub is_active: Option<bool>,
}

impl CategoryDraft {
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Partial update for a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub image: Option<Option<String>>,
    pub is_active: Option<bool>,
}

impl CategoryPatch {
    /// Merge every field except `slug` into `category`.
    pub fn merge_into(self, category: &mut Category) {
        if let Some(name) = self.name {
            category.name = name.trim().to_owned();
        }
        if let Some(description) = self.description {
            category.description = description;
        }
        if let Some(image) = self.image {
            category.image = image;
        }
        if let Some(is_active) = self.is_active {
            category.is_active = is_active;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draft_defaults() {
        let category = Category::from_draft(
            CategoryId::new("c1"),
            Slug::from_name("Víveres").unwrap(),
            CategoryDraft::named(" Víveres "),
        );
        assert_eq!(category.name, "Víveres");
        assert_eq!(category.slug.as_str(), "viveres");
        assert_eq!(category.description, "Productos de Víveres");
        assert!(category.is_active);
        assert_eq!(category.name_key(), "víveres");
    }

    #[test]
    fn test_count_flattens() {
        let category = Category::from_draft(
            CategoryId::new("c1"),
            Slug::from_name("Quesos").unwrap(),
            CategoryDraft::named("Quesos"),
        );
        let with_count = CategoryWithCount {
            category,
            products_count: 2,
        };
        assert!(!with_count.is_deletable());
        let json = serde_json::to_value(&with_count).unwrap();
        assert_eq!(json["name"], "Quesos");
        assert_eq!(json["productsCount"], 2);
    }
}
