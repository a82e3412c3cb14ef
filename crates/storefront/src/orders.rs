//! Order record store.
//!
//! Orders are kept newest first and capped at a configurable maximum. Unlike
//! the catalog, stored orders are migrated rather than discarded when the
//! schema version changes: they are a customer's purchase history.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use olivo_market_core::normalize::{NormalizeContext, ParseResult, normalize_order};
use olivo_market_core::{Order, OrderDraft, OrderId, OrderStats, OrderStatus, Price};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::record_store::{RecordKind, RecordStore, VersionPolicy};
use crate::seed;
use crate::storage::SharedBlobStore;

/// Default cap on stored orders.
pub const DEFAULT_MAX_ORDERS: usize = 1000;

#[derive(Debug)]
pub struct OrderKind;

impl RecordKind for OrderKind {
    type Record = Order;

    const LABEL: &'static str = "orders";
    const STORAGE_KEY: &'static str = "orders";
    const VERSION_KEY: &'static str = "orders_version";
    const SCHEMA_VERSION: &'static str = "2";
    const POLICY: VersionPolicy = VersionPolicy::Migrate;

    fn seed(_ctx: &NormalizeContext) -> Vec<Order> {
        Vec::new()
    }

    fn normalize(raw: &Value, position: usize, ctx: &NormalizeContext) -> ParseResult<Order> {
        normalize_order(raw, position, ctx)
    }

    fn id(record: &Order) -> &str {
        record.id.as_str()
    }
}

/// Outcome of [`OrderStore::cleanup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub before: usize,
    pub after: usize,
}

impl CleanupReport {
    #[must_use]
    pub const fn removed(&self) -> usize {
        self.before - self.after
    }
}

/// The session's order history.
#[derive(Debug)]
pub struct OrderStore {
    records: RecordStore<OrderKind>,
    max_orders: usize,
    default_shipping: Price,
}

impl OrderStore {
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the blob store fails.
    pub fn load(
        blobs: SharedBlobStore,
        ctx: &NormalizeContext,
        max_orders: usize,
        default_shipping: Price,
    ) -> Result<Self, StoreError> {
        Ok(Self {
            records: RecordStore::load(blobs, ctx)?,
            max_orders: max_orders.max(1),
            default_shipping,
        })
    }

    /// All orders, newest first.
    #[must_use]
    pub fn all(&self) -> &[Order] {
        self.records.records()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get_by_id(&self, id: &OrderId) -> Option<&Order> {
        self.records.get(id.as_str())
    }

    /// Orders placed by `user_id`, newest first.
    #[must_use]
    pub fn for_user(&self, user_id: &str) -> Vec<&Order> {
        self.all()
            .iter()
            .filter(|o| o.user_id.as_deref() == Some(user_id))
            .collect()
    }

    /// Place a new order from checkout lines.
    ///
    /// # Errors
    ///
    /// - `StoreError::EmptyCart` if `draft.items` is empty
    /// - `StoreError::Storage` if persisting fails
    pub fn create(&mut self, draft: OrderDraft, now: DateTime<Utc>) -> Result<Order, StoreError> {
        if draft.items.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        let id = loop {
            let candidate = OrderId::generate(now);
            if !self.records.contains(candidate.as_str()) {
                break candidate;
            }
        };
        let order = Order::from_draft(id, now, self.default_shipping, draft);
        self.insert(order.clone())?;
        info!(order_id = %order.id, total = %order.total, items = order.items.len(), "Order created");
        Ok(order)
    }

    /// Store an already-built order at the front of the history.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if an order with the same id exists
    /// - `StoreError::Storage` if persisting fails
    pub fn insert(&mut self, order: Order) -> Result<(), StoreError> {
        if self.records.contains(order.id.as_str()) {
            return Err(StoreError::Conflict(format!("order {} already exists", order.id)));
        }
        self.records.push_front(order)?;
        if self.records.len() > self.max_orders {
            let dropped = self.records.retain_limited(|_| true, self.max_orders)?;
            debug!(dropped, max_orders = self.max_orders, "Trimmed order history");
        }
        Ok(())
    }

    /// Move an order to `status`. Unknown ids are ignored.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if the order is completed or cancelled and
    ///   `status` differs
    /// - `StoreError::Storage` if persisting fails
    pub fn update_status(&mut self, id: &OrderId, status: OrderStatus) -> Result<(), StoreError> {
        let found = self.records.modify(id.as_str(), |order| {
            if !order.status.can_transition_to(status) {
                return Err(StoreError::Conflict(format!(
                    "order {} is {} and cannot become {status}",
                    order.id, order.status
                )));
            }
            order.status = status;
            Ok(())
        })?;
        if found {
            info!(order_id = %id, status = %status, "Order status updated");
        } else {
            debug!(order_id = %id, "Status update of unknown order ignored");
        }
        Ok(())
    }

    /// Drop duplicate ids (keeping the first) and orders with no items or a
    /// negative total, then enforce the cap.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn cleanup(&mut self) -> Result<CleanupReport, StoreError> {
        let before = self.records.len();
        let mut seen = HashSet::new();
        self.records.retain_limited(
            |order| order.is_well_formed() && seen.insert(order.id.clone()),
            self.max_orders,
        )?;
        let report = CleanupReport {
            before,
            after: self.records.len(),
        };
        if report.removed() > 0 {
            warn!(removed = report.removed(), "Removed invalid or duplicate orders");
        }
        Ok(report)
    }

    #[must_use]
    pub fn stats(&self) -> OrderStats {
        OrderStats::from_orders(self.all())
    }

    /// Add the demo orders that are not already present, then clean up.
    ///
    /// Returns how many demo orders were added.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn restore_demo_orders(&mut self, ctx: &NormalizeContext) -> Result<usize, StoreError> {
        let mut restored: Vec<Order> = seed::demo_orders(ctx)
            .into_iter()
            .filter(|order| !self.records.contains(order.id.as_str()))
            .collect();
        let added = restored.len();
        restored.extend(self.all().iter().cloned());
        restored.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.records.replace_all(restored)?;
        self.cleanup()?;
        info!(added, "Demo orders restored");
        Ok(added)
    }
}
