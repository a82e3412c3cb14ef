//! Order records.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{Email, OrderId, OrderItemId, OrderStatus, Price, TransactionId};

/// A purchased line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    /// Product id at the time of purchase.
    pub id: OrderItemId,
    pub name: String,
    pub price: Price,
    /// Always at least 1.
    pub quantity: u32,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl OrderItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Structured delivery address. Every field is optional because older
/// checkouts captured only part of it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShippingAddress {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "calle", skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(rename = "numero", skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(rename = "interior", skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(rename = "colonia", skip_serializing_if = "Option::is_none")]
    pub neighborhood: Option<String>,
    #[serde(rename = "ciudad", skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(rename = "estado", skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(rename = "codigoPostal", skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(rename = "telefono", skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// A placed order.
///
/// `subtotal == Σ item.price × item.quantity` and
/// `total == subtotal + shipping_cost` for every order built from a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub status: OrderStatus,
    pub customer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Email>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub transaction_id: TransactionId,
    #[serde(default)]
    pub notes: String,
}

impl Order {
    /// Customer name used when checkout did not capture one.
    pub const GUEST_CUSTOMER: &'static str = "Invitado";

    /// Build an order from a checkout draft.
    ///
    /// Totals are computed from the items; the caller guarantees `items` is
    /// non-empty.
    #[must_use]
    pub fn from_draft(
        id: OrderId,
        now: DateTime<Utc>,
        default_shipping: Price,
        draft: OrderDraft,
    ) -> Self {
        let subtotal = Self::items_subtotal(&draft.items);
        let shipping_cost = draft.shipping_cost.unwrap_or(default_shipping).amount();
        Self {
            id,
            date: now.date_naive(),
            created_at: now,
            items: draft.items,
            subtotal,
            shipping_cost,
            total: subtotal + shipping_cost,
            status: OrderStatus::default(),
            customer: draft
                .customer
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| Self::GUEST_CUSTOMER.to_owned()),
            email: draft.email,
            user_id: draft.user_id,
            shipping_address: draft.shipping_address,
            payment_method: draft.payment_method,
            transaction_id: TransactionId::generate(now),
            notes: draft.notes.unwrap_or_default(),
        }
    }

    /// Σ price × quantity.
    #[must_use]
    pub fn items_subtotal(items: &[OrderItem]) -> Decimal {
        items.iter().map(|item| item.line_total().amount()).sum()
    }

    /// Whether both total invariants hold.
    #[must_use]
    pub fn totals_consistent(&self) -> bool {
        self.subtotal == Self::items_subtotal(&self.items)
            && self.total == self.subtotal + self.shipping_cost
    }

    /// Orders with no items or a negative total are discarded by cleanup.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        !self.items.is_empty() && !self.total.is_sign_negative()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn unit_count(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }
}

/// Checkout input for a new order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrderDraft {
    pub items: Vec<OrderItem>,
    pub customer: Option<String>,
    pub email: Option<Email>,
    pub user_id: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    /// Falls back to the configured default shipping cost.
    pub shipping_cost: Option<Price>,
    pub notes: Option<String>,
}

/// Aggregate figures over a set of orders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    pub total: usize,
    pub en_proceso: usize,
    pub procesando: usize,
    pub enviado: usize,
    pub completado: usize,
    pub cancelado: usize,
    pub total_sales: Decimal,
    pub average_sale: Decimal,
}

impl OrderStats {
    #[must_use]
    pub fn from_orders(orders: &[Order]) -> Self {
        let mut stats = Self {
            total: orders.len(),
            ..Self::default()
        };
        for order in orders {
            match order.status {
                OrderStatus::EnProceso => stats.en_proceso += 1,
                OrderStatus::Procesando => stats.procesando += 1,
                OrderStatus::Enviado => stats.enviado += 1,
                OrderStatus::Completado => stats.completado += 1,
                OrderStatus::Cancelado => stats.cancelado += 1,
            }
            stats.total_sales += order.total;
        }
        if !orders.is_empty() {
            stats.average_sale = stats.total_sales / Decimal::from(orders.len());
        }
        stats
    }
}
