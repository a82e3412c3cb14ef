//! Loose-record normalizer.
//!
//! Records reach the stores from three places that do not agree on a schema:
//! blobs persisted by older storefront releases, bulk upload files, and the
//! remote catalog. The functions here turn an arbitrary JSON value into a
//! canonical record or reject it with a reason. They never panic and never
//! touch the clock directly; "now" comes from [`NormalizeContext`].
//!
//! # Fallback chains
//!
//! | record   | field        | chain                                        |
//! |----------|--------------|----------------------------------------------|
//! | product  | `categories` | `categories` (array or comma list) → `category` |
//! | product  | `image`      | `image` → first of `gallery` → `/file.svg`   |
//! | category | `isActive`   | `isActive` → `active` → `true`               |
//! | order    | `date`       | `date` → `fecha` → today                     |
//! | order    | `createdAt`  | `createdAt` → `fecha` → now                  |
//! | order    | `status`     | `status` → `estado` → `En proceso`           |
//! | order    | `customer`   | `customer` → `cliente` → `Cliente`           |
//! | order    | `email`      | `email` → `correo` → none                    |
//! | item     | `name`       | `name` → `title` → `Producto <n>`            |
//!
//! Numbers are accepted as JSON numbers or numeric strings; anything else
//! takes the field default (usually 0).

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde_json::{Map, Value};

use crate::models::{
    Category, DEFAULT_IMAGE, Order, OrderItem, Product, ShippingAddress,
};
use crate::types::{
    CategoryId, Email, OrderId, OrderItemId, OrderStatus, Price, ProductId, Slug, TransactionId,
};

/// Shipping cost assumed for legacy orders stored without one.
pub const LEGACY_SHIPPING_COST: Decimal = Decimal::from_parts(10, 0, 0, false, 0);

/// Customer name for legacy orders stored without one.
pub const LEGACY_CUSTOMER: &str = "Cliente";

/// Outcome of normalizing one raw record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult<T> {
    /// The record was converted to the canonical schema.
    Ok(T),
    /// The record lacks an identifying field; the reason is human-readable.
    Rejected(String),
}

impl<T> ParseResult<T> {
    fn reject(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// The record, discarding any rejection reason.
    #[must_use]
    pub fn ok(self) -> Option<T> {
        match self {
            Self::Ok(record) => Some(record),
            Self::Rejected(_) => None,
        }
    }

    /// Convert into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the rejection reason.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            Self::Ok(record) => Ok(record),
            Self::Rejected(reason) => Err(reason),
        }
    }
}

/// The record kinds the normalizer understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Product,
    Category,
    Order,
}

/// A canonical record of any kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizedRecord {
    Product(Product),
    Category(Category),
    Order(Order),
}

/// Ambient inputs for normalization.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeContext {
    pub now: DateTime<Utc>,
}

impl NormalizeContext {
    #[must_use]
    pub const fn at(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now.date_naive()
    }
}

/// Records that survived a batch plus the reasons for the ones that did not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch<T> {
    pub records: Vec<T>,
    /// `(position, reason)` for every rejected input.
    pub rejected: Vec<(usize, String)>,
}

/// Normalize a raw record of the given kind.
///
/// `position` is the record's index in its batch; orders use it to build a
/// unique legacy id.
#[must_use]
pub fn normalize(
    kind: RecordKind,
    raw: &Value,
    position: usize,
    ctx: &NormalizeContext,
) -> ParseResult<NormalizedRecord> {
    match kind {
        RecordKind::Product => match normalize_product(raw, ctx) {
            ParseResult::Ok(p) => ParseResult::Ok(NormalizedRecord::Product(p)),
            ParseResult::Rejected(r) => ParseResult::Rejected(r),
        },
        RecordKind::Category => match normalize_category(raw) {
            ParseResult::Ok(c) => ParseResult::Ok(NormalizedRecord::Category(c)),
            ParseResult::Rejected(r) => ParseResult::Rejected(r),
        },
        RecordKind::Order => match normalize_order(raw, position, ctx) {
            ParseResult::Ok(o) => ParseResult::Ok(NormalizedRecord::Order(o)),
            ParseResult::Rejected(r) => ParseResult::Rejected(r),
        },
    }
}

/// Normalize every element of a batch with `f`, keeping input order.
pub fn normalize_batch<T>(
    raws: &[Value],
    mut f: impl FnMut(&Value, usize) -> ParseResult<T>,
) -> Batch<T> {
    let mut batch = Batch {
        records: Vec::with_capacity(raws.len()),
        rejected: Vec::new(),
    };
    for (position, raw) in raws.iter().enumerate() {
        match f(raw, position) {
            ParseResult::Ok(record) => batch.records.push(record),
            ParseResult::Rejected(reason) => batch.rejected.push((position, reason)),
        }
    }
    batch
}

/// Normalize a product record.
#[must_use]
pub fn normalize_product(raw: &Value, ctx: &NormalizeContext) -> ParseResult<Product> {
    let Some(obj) = raw.as_object() else {
        return ParseResult::reject("product is not an object");
    };
    let Some(name) = text(obj, &["name"]) else {
        return ParseResult::reject("product has no name");
    };
    let Some(id) = text(obj, &["id"]) else {
        return ParseResult::reject(format!("product {name:?} has no id"));
    };
    let slug = match text(obj, &["slug"]).map_or_else(|| Slug::from_name(&name), |s| Slug::from_name(&s)) {
        Ok(slug) => slug,
        Err(e) => return ParseResult::reject(format!("product {name:?}: {e}")),
    };

    let mut categories: BTreeSet<String> = pick(obj, &["categories"]).map(string_list).unwrap_or_default().into_iter().collect();
    if categories.is_empty() {
        categories.extend(text(obj, &["category"]));
    }

    let gallery = pick(obj, &["gallery"]).map(string_list).unwrap_or_default();
    let image = text(obj, &["image"])
        .or_else(|| gallery.first().cloned())
        .unwrap_or_else(|| DEFAULT_IMAGE.to_owned());

    ParseResult::Ok(Product {
        id: ProductId::new(id),
        name,
        slug,
        price: Price::clamped(decimal(obj, &["price"]).unwrap_or_default()),
        price_original: decimal(obj, &["priceOriginal"]).map(Price::clamped),
        image,
        description: text(obj, &["description"]).unwrap_or_default(),
        categories,
        stock: pick(obj, &["stock"]).and_then(count).map_or(0, saturate_u32),
        featured: pick(obj, &["featured"]).is_some_and(truthy),
        created_at: pick(obj, &["createdAt"]).and_then(date).unwrap_or_else(|| ctx.today()),
        gallery,
        features: pick(obj, &["features"]).map(string_list).unwrap_or_default(),
        view_count: pick(obj, &["viewCount"]).and_then(count).unwrap_or(0),
        order_clicks: pick(obj, &["orderClicks"]).and_then(count).unwrap_or(0),
    })
}

/// Normalize a category record.
#[must_use]
pub fn normalize_category(raw: &Value) -> ParseResult<Category> {
    let Some(obj) = raw.as_object() else {
        return ParseResult::reject("category is not an object");
    };
    let Some(name) = text(obj, &["name"]) else {
        return ParseResult::reject("category has no name");
    };
    let Some(id) = text(obj, &["id"]) else {
        return ParseResult::reject(format!("category {name:?} has no id"));
    };
    let slug = match text(obj, &["slug"]).map_or_else(|| Slug::from_name(&name), |s| Slug::from_name(&s)) {
        Ok(slug) => slug,
        Err(e) => return ParseResult::reject(format!("category {name:?}: {e}")),
    };

    ParseResult::Ok(Category {
        id: CategoryId::new(id),
        description: text(obj, &["description"]).unwrap_or_else(|| format!("Productos de {name}")),
        name,
        slug,
        image: text(obj, &["image"]),
        is_active: pick(obj, &["isActive", "active"]).is_none_or(truthy),
    })
}

/// Normalize an order record.
///
/// Orders are only rejected when they are not objects; everything else has a
/// fallback so that a customer's history survives schema changes.
#[must_use]
pub fn normalize_order(raw: &Value, position: usize, ctx: &NormalizeContext) -> ParseResult<Order> {
    let Some(obj) = raw.as_object() else {
        return ParseResult::reject("order is not an object");
    };

    let id = text(obj, &["id"]).map_or_else(|| OrderId::legacy(ctx.now, position), OrderId::new);
    let created_at = pick(obj, &["createdAt", "fecha"])
        .and_then(timestamp)
        .unwrap_or(ctx.now);
    let date = pick(obj, &["date", "fecha"])
        .and_then(date)
        .unwrap_or_else(|| ctx.today());

    let items: Vec<OrderItem> = match pick(obj, &["items"]) {
        Some(Value::Array(raw_items)) => raw_items
            .iter()
            .enumerate()
            .map(|(index, item)| normalize_item(item, index))
            .collect(),
        _ => Vec::new(),
    };

    let shipping_cost = decimal(obj, &["shippingCost"]).unwrap_or(LEGACY_SHIPPING_COST);
    let (subtotal, total) = if items.is_empty() {
        let total = decimal(obj, &["total"]).unwrap_or_default();
        let subtotal = decimal(obj, &["subtotal"]).unwrap_or(total - shipping_cost);
        (subtotal, total)
    } else {
        let subtotal = Order::items_subtotal(&items);
        (subtotal, subtotal + shipping_cost)
    };

    let transaction_id = text(obj, &["transactionId"])
        .map_or_else(|| TransactionId::for_order(&id), TransactionId::new);

    ParseResult::Ok(Order {
        date,
        created_at,
        items,
        subtotal,
        shipping_cost,
        total,
        status: text(obj, &["status", "estado"])
            .and_then(|s| OrderStatus::from_str(&s).ok())
            .unwrap_or_default(),
        customer: text(obj, &["customer", "cliente"]).unwrap_or_else(|| LEGACY_CUSTOMER.to_owned()),
        email: text(obj, &["email", "correo"]).and_then(|e| Email::parse(&e).ok()),
        user_id: text(obj, &["userId"]),
        shipping_address: match pick(obj, &["shippingAddress"]) {
            Some(Value::Object(address)) => Some(normalize_address(address)),
            _ => None,
        },
        payment_method: text(obj, &["paymentMethod"]),
        transaction_id,
        notes: text(obj, &["notes"]).unwrap_or_default(),
        id,
    })
}

fn normalize_item(raw: &Value, index: usize) -> OrderItem {
    let empty = Map::new();
    let obj = raw.as_object().unwrap_or(&empty);
    OrderItem {
        id: OrderItemId::new(text(obj, &["id"]).unwrap_or_else(|| format!("ITEM-{index}"))),
        name: text(obj, &["name", "title"]).unwrap_or_else(|| format!("Producto {}", index + 1)),
        price: Price::clamped(decimal(obj, &["price"]).unwrap_or_default()),
        quantity: pick(obj, &["quantity"])
            .and_then(count)
            .map_or(1, saturate_u32)
            .max(1),
        image: text(obj, &["image"]).unwrap_or_else(|| DEFAULT_IMAGE.to_owned()),
        slug: text(obj, &["slug"]),
    }
}

fn normalize_address(obj: &Map<String, Value>) -> ShippingAddress {
    ShippingAddress {
        name: text(obj, &["nombre"]),
        street: text(obj, &["calle"]),
        number: text(obj, &["numero"]),
        unit: text(obj, &["interior"]),
        neighborhood: text(obj, &["colonia"]),
        city: text(obj, &["ciudad"]),
        state: text(obj, &["estado"]),
        postal_code: text(obj, &["codigoPostal"]),
        phone: text(obj, &["telefono"]),
    }
}

// =============================================================================
// Field coercion
// =============================================================================

/// First key whose value is present, not null and not an empty string.
pub(crate) fn pick<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| obj.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

/// Trimmed text from a string or number field.
pub(crate) fn text(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    pick(obj, keys).and_then(|value| match value {
        Value::String(s) => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

pub(crate) fn decimal(obj: &Map<String, Value>, keys: &[&str]) -> Option<Decimal> {
    pick(obj, keys).and_then(to_decimal)
}

/// Parse a JSON number or numeric string as a decimal.
pub(crate) fn to_decimal(value: &Value) -> Option<Decimal> {
    let raw = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_owned(),
        _ => return None,
    };
    Decimal::from_str(&raw)
        .or_else(|_| Decimal::from_scientific(&raw))
        .ok()
}

/// Non-negative whole count; fractions are truncated and negatives become 0.
pub(crate) fn count(value: &Value) -> Option<u64> {
    let amount = to_decimal(value)?;
    if amount.is_sign_negative() {
        return Some(0);
    }
    u64::try_from(amount.trunc()).ok()
}

pub(crate) fn saturate_u32(n: u64) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

pub(crate) fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.trim().to_ascii_lowercase().as_str(), "true" | "1" | "si" | "sí" | "yes"),
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        _ => false,
    }
}

/// Array of strings, or a comma-separated string.
pub(crate) fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect(),
        _ => Vec::new(),
    }
}

/// A calendar date from `YYYY-MM-DD` or anything starting with it.
fn date(value: &Value) -> Option<NaiveDate> {
    let s = value.as_str()?.trim();
    let prefix = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
}

/// A timestamp from RFC 3339, or a bare date at midnight UTC.
fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| date(value).map(|d| d.and_time(NaiveTime::MIN).and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn ctx() -> NormalizeContext {
        NormalizeContext::at(Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap())
    }

    #[test]
    fn test_order_with_garbage_fields() {
        let raw = json!({ "items": "not-an-array", "total": "abc" });
        let order = normalize_order(&raw, 0, &ctx()).ok().unwrap();
        assert!(order.items.is_empty());
        assert_eq!(order.total, Decimal::ZERO);
        assert_eq!(order.shipping_cost, LEGACY_SHIPPING_COST);
        assert!(order.id.as_str().starts_with("ORD-LEGACY-"));
        assert_eq!(order.date, ctx().today());
        assert_eq!(order.customer, LEGACY_CUSTOMER);
        assert!(!order.is_well_formed());
    }

    #[test]
    fn test_order_spanish_legacy_fields() {
        let raw = json!({
            "id": 42,
            "fecha": "2025-08-14T15:20:00.000Z",
            "estado": "Enviado",
            "cliente": "Carlos Rodríguez",
            "correo": "carlos@example.com",
            "items": [
                { "title": "Cachitos", "price": "65", "quantity": 2 },
                { "name": "Golfeados", "price": 59.99, "quantity": 0 }
            ],
            "shippingCost": 10
        });
        let order = normalize_order(&raw, 3, &ctx()).ok().unwrap();
        assert_eq!(order.id.as_str(), "42");
        assert_eq!(order.date, NaiveDate::from_ymd_opt(2025, 8, 14).unwrap());
        assert_eq!(order.status, OrderStatus::Enviado);
        assert_eq!(order.customer, "Carlos Rodríguez");
        assert_eq!(order.email.as_ref().unwrap().as_str(), "carlos@example.com");
        assert_eq!(order.items[0].name, "Cachitos");
        assert_eq!(order.items[0].id.as_str(), "ITEM-0");
        assert_eq!(order.items[1].quantity, 1);
        assert_eq!(order.transaction_id.as_str(), "TXN-42");
        assert!(order.totals_consistent());
        assert_eq!(order.total, Decimal::from_str("199.99").unwrap());
    }

    #[test]
    fn test_order_totals_recomputed_from_items() {
        let raw = json!({
            "id": "ORD-1",
            "items": [{ "id": "p1", "name": "Harina", "price": 3.5, "quantity": 2 }],
            "subtotal": 999,
            "total": 1,
            "shippingCost": "0"
        });
        let order = normalize_order(&raw, 0, &ctx()).ok().unwrap();
        assert_eq!(order.subtotal, Decimal::from(7));
        assert_eq!(order.shipping_cost, Decimal::ZERO);
        assert_eq!(order.total, Decimal::from(7));
    }

    #[test]
    fn test_order_unknown_status_defaults() {
        let raw = json!({ "id": "ORD-2", "status": "Perdido" });
        let order = normalize_order(&raw, 0, &ctx()).ok().unwrap();
        assert_eq!(order.status, OrderStatus::EnProceso);
    }

    #[test]
    fn test_order_non_object_rejected() {
        assert!(!normalize_order(&json!("ORD-1"), 0, &ctx()).is_ok());
    }

    #[test]
    fn test_product_defaults() {
        let raw = json!({ "id": 7, "name": "Café Molido Oscuro 500g", "price": "6.2" });
        let product = normalize_product(&raw, &ctx()).ok().unwrap();
        assert_eq!(product.id.as_str(), "7");
        assert_eq!(product.slug.as_str(), "cafe-molido-oscuro-500g");
        assert_eq!(product.price, "6.2".parse().unwrap());
        assert_eq!(product.stock, 0);
        assert_eq!(product.view_count, 0);
        assert_eq!(product.order_clicks, 0);
        assert_eq!(product.image, DEFAULT_IMAGE);
        assert_eq!(product.created_at, ctx().today());
    }

    #[test]
    fn test_product_legacy_category_and_bad_numbers() {
        let raw = json!({
            "id": "3",
            "name": "Queso Llanero",
            "category": "Quesos",
            "price": -4,
            "stock": "12.7",
            "viewCount": "muchas",
            "featured": "true",
            "createdAt": "2025-08-01"
        });
        let product = normalize_product(&raw, &ctx()).ok().unwrap();
        assert!(product.in_category("Quesos"));
        assert_eq!(product.price, Price::ZERO);
        assert_eq!(product.stock, 12);
        assert_eq!(product.view_count, 0);
        assert!(product.featured);
        assert_eq!(product.created_at, NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
    }

    #[test]
    fn test_product_rejections() {
        assert!(matches!(
            normalize_product(&json!({ "id": "1" }), &ctx()),
            ParseResult::Rejected(_)
        ));
        assert!(matches!(
            normalize_product(&json!({ "name": "Pan" }), &ctx()),
            ParseResult::Rejected(_)
        ));
        assert!(matches!(
            normalize_product(&json!({ "id": "1", "name": "   " }), &ctx()),
            ParseResult::Rejected(_)
        ));
        assert!(matches!(
            normalize_product(&json!([1, 2]), &ctx()),
            ParseResult::Rejected(_)
        ));
    }

    #[test]
    fn test_category_active_alias() {
        let raw = json!({ "id": "c1", "name": "Víveres", "active": false });
        let category = normalize_category(&raw).ok().unwrap();
        assert!(!category.is_active);
        assert_eq!(category.slug.as_str(), "viveres");

        let raw = json!({ "id": "c2", "name": "Aseo", "slug": "Aseo Hogar" });
        let category = normalize_category(&raw).ok().unwrap();
        assert!(category.is_active);
        assert_eq!(category.slug.as_str(), "aseo-hogar");
    }

    #[test]
    fn test_batch_keeps_order_and_reports_rejects() {
        let raws = vec![
            json!({ "id": "1", "name": "Pan Andino" }),
            json!({ "name": "Sin id" }),
            json!({ "id": "2", "name": "Helado de Coco" }),
        ];
        let batch = normalize_batch(&raws, |raw, _| normalize_product(raw, &ctx()));
        assert_eq!(batch.records.len(), 2);
        assert_eq!(batch.records[1].name, "Helado de Coco");
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].0, 1);
    }

    #[test]
    fn test_dispatch_by_kind() {
        let record = normalize(RecordKind::Order, &json!({}), 5, &ctx()).ok().unwrap();
        let NormalizedRecord::Order(order) = record else {
            panic!("expected an order");
        };
        assert!(order.id.as_str().ends_with("-5"));
    }
}
