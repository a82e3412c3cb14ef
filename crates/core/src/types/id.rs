//! Newtype IDs for type-safe record references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different record kinds. Every OlivoMarket id
//! is a string: local records use short base-36 ids, orders use the
//! `ORD-<epoch-ms>-<random>` format and server rows use UUIDs.

use chrono::{DateTime, Utc};
use rand::Rng;

/// Macro to define a type-safe string ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>` and `Into<String>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use olivo_market_core::define_id;
/// define_id!(SupplierId);
/// define_id!(ShipmentId);
///
/// let supplier = SupplierId::new("sup-1");
/// let shipment = ShipmentId::new("sup-1");
///
/// // These are different types, so this won't compile:
/// // let _: SupplierId = shipment;
/// assert_eq!(supplier.as_str(), shipment.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ID from any string-like value.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the ID and return the underlying string.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <String as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <String as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <String as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <String as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

define_id!(ProductId);
define_id!(CategoryId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(TransactionId);

const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const LOCAL_ID_LEN: usize = 9;

/// Random lowercase base-36 string of the given length.
fn random_base36(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| {
            let idx = rng.random_range(0..BASE36.len());
            char::from(BASE36.get(idx).copied().unwrap_or(b'0'))
        })
        .collect()
}

impl ProductId {
    /// Generate a short random id for a locally created product.
    ///
    /// Collisions are unlikely but possible; stores retry against their own
    /// collection before accepting one.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_base36(LOCAL_ID_LEN))
    }
}

impl CategoryId {
    /// Generate a short random id for a locally created category.
    #[must_use]
    pub fn generate() -> Self {
        Self(random_base36(LOCAL_ID_LEN))
    }
}

impl OrderId {
    /// Prefix shared by every order id.
    pub const PREFIX: &'static str = "ORD-";

    /// Generate an order id of the form `ORD-<epoch-ms>-<6 digits>`.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        let random: u32 = rand::rng().random_range(100_000..=999_999);
        Self(format!("ORD-{}-{random}", now.timestamp_millis()))
    }

    /// Id assigned to a persisted order that was stored without one.
    #[must_use]
    pub fn legacy(now: DateTime<Utc>, position: usize) -> Self {
        Self(format!("ORD-LEGACY-{}-{position}", now.timestamp_millis()))
    }
}

impl TransactionId {
    /// Generate a transaction id of the form `TXN-<epoch-ms>`.
    #[must_use]
    pub fn generate(now: DateTime<Utc>) -> Self {
        Self(format!("TXN-{}", now.timestamp_millis()))
    }

    /// Transaction id derived from an order id, for legacy orders.
    #[must_use]
    pub fn for_order(order_id: &OrderId) -> Self {
        Self(format!("TXN-{order_id}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_product_id_is_base36() {
        let id = ProductId::generate();
        assert_eq!(id.as_str().len(), 9);
        assert!(
            id.as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
        );
    }

    #[test]
    fn test_order_id_format() {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 10, 30, 0).unwrap();
        let id = OrderId::generate(now);
        let parts: Vec<&str> = id.as_str().split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1], now.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), 6);
        let random: u32 = parts[2].parse().unwrap();
        assert!((100_000..=999_999).contains(&random));
    }

    #[test]
    fn test_transaction_id_format() {
        let now = Utc.with_ymd_and_hms(2025, 8, 15, 10, 30, 0).unwrap();
        let txn = TransactionId::generate(now);
        assert_eq!(txn.as_str(), format!("TXN-{}", now.timestamp_millis()));
    }

    #[test]
    fn test_ids_serialize_transparently() {
        let id = ProductId::new("p1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"p1\"");
        let back: ProductId = serde_json::from_str("\"p1\"").unwrap();
        assert_eq!(back, id);
    }
}
