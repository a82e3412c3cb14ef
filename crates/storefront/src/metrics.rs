//! Lightweight product counters.
//!
//! Views and order intents are bumped in place on the product records and
//! persisted through the normal store path; there is no separate counter
//! storage.

use olivo_market_core::ProductId;
use tracing::debug;

use crate::error::StoreError;
use crate::products::ProductStore;

/// One product id or several.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductIds {
    One(ProductId),
    Many(Vec<ProductId>),
}

impl ProductIds {
    fn as_strs(&self) -> Vec<&str> {
        match self {
            Self::One(id) => vec![id.as_str()],
            Self::Many(ids) => ids.iter().map(ProductId::as_str).collect(),
        }
    }
}

impl From<ProductId> for ProductIds {
    fn from(id: ProductId) -> Self {
        Self::One(id)
    }
}

impl From<&ProductId> for ProductIds {
    fn from(id: &ProductId) -> Self {
        Self::One(id.clone())
    }
}

impl From<Vec<ProductId>> for ProductIds {
    fn from(ids: Vec<ProductId>) -> Self {
        Self::Many(ids)
    }
}

impl From<&str> for ProductIds {
    fn from(id: &str) -> Self {
        Self::One(ProductId::new(id))
    }
}

impl<const N: usize> From<[&str; N]> for ProductIds {
    fn from(ids: [&str; N]) -> Self {
        Self::Many(ids.into_iter().map(ProductId::new).collect())
    }
}

impl ProductStore {
    /// Count one detail-page view. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn track_view(&mut self, id: &ProductId) -> Result<(), StoreError> {
        let found = self.records.modify(id.as_str(), |product| {
            product.view_count = product.view_count.saturating_add(1);
            Ok(())
        })?;
        if !found {
            debug!(product_id = %id, "View of unknown product ignored");
        }
        Ok(())
    }

    /// Count one order intent (checkout or chat click) for each product.
    ///
    /// A product listed twice is still counted once. Returns how many
    /// products were found.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn track_order_intent(&mut self, ids: impl Into<ProductIds>) -> Result<usize, StoreError> {
        let ids = ids.into();
        let wanted = ids.as_strs();
        let touched = self.records.modify_each(&wanted, |product| {
            product.order_clicks = product.order_clicks.saturating_add(1);
        })?;
        debug!(requested = wanted.len(), touched, "Order intent tracked");
        Ok(touched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBlobStore;
    use chrono::{TimeZone, Utc};
    use olivo_market_core::NormalizeContext;

    fn store() -> ProductStore {
        let ctx = NormalizeContext::at(Utc.with_ymd_and_hms(2025, 9, 1, 0, 0, 0).unwrap());
        ProductStore::load(MemoryBlobStore::shared(), &ctx).unwrap()
    }

    #[test]
    fn test_track_view() {
        let mut store = store();
        let id = ProductId::new("3");
        store.track_view(&id).unwrap();
        store.track_view(&id).unwrap();
        store.track_view(&ProductId::new("missing")).unwrap();
        assert_eq!(store.get_by_id(&id).unwrap().view_count, 2);
    }

    #[test]
    fn test_track_order_intent_list() {
        let mut store = store();
        let before: Vec<_> = store.all().to_vec();
        assert_eq!(store.track_order_intent(["1", "2"]).unwrap(), 2);

        for (old, new) in before.iter().zip(store.all()) {
            if old.id.as_str() == "1" || old.id.as_str() == "2" {
                assert_eq!(new.order_clicks, old.order_clicks + 1);
                let mut expected = old.clone();
                expected.order_clicks = new.order_clicks;
                assert_eq!(&expected, new);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn test_track_order_intent_single_and_unknown() {
        let mut store = store();
        assert_eq!(store.track_order_intent("5").unwrap(), 1);
        assert_eq!(store.track_order_intent(["5", "5", "zzz"]).unwrap(), 1);
        assert_eq!(store.get_by_id(&ProductId::new("5")).unwrap().order_clicks, 2);
    }
}
