//! Filter, sort and paginate views over a product collection.
//!
//! Everything here is recomputed per call from the current collection. The
//! views borrow from the collection, so a view never outlives the store
//! snapshot it was taken from.

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::Product;

/// Default number of products per page in the storefront grid.
pub const DEFAULT_PAGE_SIZE: usize = 12;

/// Field a product listing can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Name,
    Price,
    Stock,
    CreatedAt,
}

impl FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "name" | "nombre" => Ok(Self::Name),
            "price" | "precio" => Ok(Self::Price),
            "stock" => Ok(Self::Stock),
            "createdat" | "created_at" | "date" | "fecha" => Ok(Self::CreatedAt),
            _ => Err(format!("invalid sort field: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// One sort key and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Sort {
    #[must_use]
    pub const fn asc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Asc,
        }
    }

    #[must_use]
    pub const fn desc(field: SortField) -> Self {
        Self {
            field,
            direction: SortDirection::Desc,
        }
    }

    fn compare(self, a: &Product, b: &Product) -> Ordering {
        let ordering = match self.field {
            SortField::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
            SortField::Price => a.price.cmp(&b.price),
            SortField::Stock => a.stock.cmp(&b.stock),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Category restriction for a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Exact category name.
    Named(String),
}

impl CategoryFilter {
    /// `"all"`, `"todos"` and blank mean no restriction.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() || value.eq_ignore_ascii_case("all") || value.eq_ignore_ascii_case("todos") {
            Self::All
        } else {
            Self::Named(value.to_owned())
        }
    }

    fn matches(&self, product: &Product) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => product.in_category(name),
        }
    }
}

/// A listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductQuery {
    /// Case-insensitive substring over name and description; blank matches all.
    pub search: String,
    pub category: CategoryFilter,
    /// `None` keeps collection order.
    pub sort: Option<Sort>,
    /// 1-indexed; out-of-range values are clamped.
    pub page: usize,
    pub page_size: usize,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            category: CategoryFilter::All,
            sort: None,
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ProductQuery {
    #[must_use]
    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = term.into();
        self
    }

    #[must_use]
    pub fn in_category(mut self, name: impl Into<String>) -> Self {
        self.category = CategoryFilter::Named(name.into());
        self
    }

    #[must_use]
    pub const fn sorted(mut self, sort: Sort) -> Self {
        self.sort = Some(sort);
        self
    }

    #[must_use]
    pub const fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub const fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Filter and sort without paginating.
    #[must_use]
    pub fn filter<'a>(&self, products: &'a [Product]) -> Vec<&'a Product> {
        let needle = self.search.trim().to_lowercase();
        let mut matches: Vec<&Product> = products
            .iter()
            .filter(|p| self.category.matches(p))
            .filter(|p| {
                needle.is_empty()
                    || p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            })
            .collect();
        if let Some(sort) = self.sort {
            // `sort_by` is stable, so ties keep collection order.
            matches.sort_by(|a, b| sort.compare(a, b));
        }
        matches
    }

    /// Filter, sort and cut out the requested page.
    #[must_use]
    pub fn run<'a>(&self, products: &'a [Product]) -> Page<&'a Product> {
        paginate(self.filter(products), self.page, self.page_size)
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub items: Vec<T>,
    /// The page actually returned, after clamping.
    pub page: usize,
    /// At least 1, even for an empty listing.
    pub total_pages: usize,
    pub total_items: usize,
    pub page_size: usize,
}

impl<T> Page<T> {
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }
}

impl<T> fmt::Display for Page<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {}/{} ({} items)",
            self.page, self.total_pages, self.total_items
        )
    }
}

/// Cut page `page` (1-indexed) of `page_size` out of `items`.
///
/// A zero page size is treated as 1. Pages below 1 clamp to the first page and
/// pages past the end clamp to the last.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: usize, page_size: usize) -> Page<T> {
    let page_size = page_size.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let items = items
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    Page {
        items,
        page,
        total_pages,
        total_items,
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProductDraft;
    use crate::types::{ProductId, Slug};
    use chrono::NaiveDate;

    fn product(id: &str, name: &str, price: &str, stock: u32, day: u32, category: &str) -> Product {
        let draft = ProductDraft::new(name, price.parse().unwrap())
            .with_stock(stock)
            .with_category(category);
        Product::from_draft(
            ProductId::new(id),
            Slug::from_name(name).unwrap(),
            NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
            draft,
        )
    }

    fn catalog() -> Vec<Product> {
        let mut products = vec![
            product("1", "Refresco Maltín Polar", "1.7", 40, 3, "Bebidas"),
            product("2", "Harina P.A.N.", "3.5", 60, 1, "Víveres"),
            product("3", "Queso Llanero", "6.2", 25, 2, "Quesos"),
            product("4", "queso Guayanés", "6.2", 5, 4, "Quesos"),
        ];
        products[1].description = "Harina de maíz precocida".into();
        products
    }

    #[test]
    fn test_search_name_and_description() {
        let products = catalog();
        let found = ProductQuery::default().search("QUESO").filter(&products);
        assert_eq!(found.len(), 2);
        let found = ProductQuery::default().search("maíz").filter(&products);
        assert_eq!(found[0].id.as_str(), "2");
    }

    #[test]
    fn test_category_filter_exact() {
        let products = catalog();
        assert_eq!(ProductQuery::default().in_category("Quesos").filter(&products).len(), 2);
        assert!(ProductQuery::default().in_category("quesos").filter(&products).is_empty());
        assert_eq!(CategoryFilter::parse(" all "), CategoryFilter::All);
    }

    #[test]
    fn test_sort_is_stable() {
        let products = catalog();
        let ids = |sort| {
            ProductQuery::default()
                .sorted(sort)
                .filter(&products)
                .iter()
                .map(|p| p.id.as_str().to_owned())
                .collect::<Vec<_>>()
        };
        assert_eq!(ids(Sort::asc(SortField::Price)), ["1", "2", "3", "4"]);
        assert_eq!(ids(Sort::desc(SortField::Price)), ["3", "4", "2", "1"]);
        assert_eq!(ids(Sort::asc(SortField::Name)), ["2", "4", "3", "1"]);
        assert_eq!(ids(Sort::desc(SortField::CreatedAt)), ["4", "1", "3", "2"]);
        assert_eq!(ids(Sort::asc(SortField::Stock)), ["4", "3", "1", "2"]);
    }

    #[test]
    fn test_paginate_clamps() {
        let page = paginate((1..=25).collect::<Vec<_>>(), 9, 12);
        assert_eq!(page.page, 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.items, vec![25]);
        assert!(!page.has_next());

        let page = paginate((1..=25).collect::<Vec<_>>(), 0, 12);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), 12);
        assert!(page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_paginate_empty() {
        let page = paginate(Vec::<u8>::new(), 4, 0);
        assert_eq!(page.page, 1);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.page_size, 1);
        assert!(page.items.is_empty());
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("createdAt".parse::<SortField>().unwrap(), SortField::CreatedAt);
        assert_eq!("precio".parse::<SortField>().unwrap(), SortField::Price);
        assert!("color".parse::<SortField>().is_err());
    }
}
