//! Catalog and order records.
//!
//! Field names serialize in camelCase so records stay compatible with blobs
//! persisted by earlier storefront releases.

pub mod category;
pub mod order;
pub mod product;

pub use category::{Category, CategoryDraft, CategoryPatch, CategoryWithCount};
pub use order::{Order, OrderDraft, OrderItem, OrderStats, ShippingAddress};
pub use product::{Product, ProductDraft, ProductPatch};

/// Image shown when a record has none.
pub const DEFAULT_IMAGE: &str = "/file.svg";
