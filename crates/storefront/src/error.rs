//! Error types for the storefront record stores.

use olivo_market_core::CatalogError;
use thiserror::Error;

/// Failures of the persistent key-value blob store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing medium failed.
    #[error("I/O error on key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    /// The key cannot be used as a storage name.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// Another thread panicked while holding the store.
    #[error("blob store lock poisoned")]
    Poisoned,
}

/// Errors returned by store operations.
///
/// Unknown ids on update and delete are not errors; those calls succeed
/// without effect.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The collection could not be encoded for persistence.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Duplicate slug or name, invalid status change, or blocked deletion.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation error: {0}")]
    Validation(String),

    /// Checkout was attempted with nothing in the cart.
    #[error("cart is empty")]
    EmptyCart,

    /// The remote catalog rejected a request.
    #[error("catalog error: {0}")]
    Remote(#[from] CatalogError),
}

impl StoreError {
    /// Whether the caller should offer a rename or a different choice.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_) | Self::Remote(CatalogError::Conflict(_)))
    }
}
