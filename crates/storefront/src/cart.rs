//! Shopping cart persisted under the `cart` key.

use olivo_market_core::{OrderItem, OrderItemId, Price, Product, ProductId};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::storage::SharedBlobStore;

pub const CART_KEY: &str = "cart";

/// One product in the cart, with the price captured when it was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Price,
    pub quantity: u32,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
}

impl CartLine {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }

    fn to_order_item(&self) -> OrderItem {
        OrderItem {
            id: OrderItemId::new(self.product_id.as_str()),
            name: self.name.clone(),
            price: self.price,
            quantity: self.quantity,
            image: self.image.clone(),
            slug: self.slug.clone(),
        }
    }
}

/// The shopper's cart.
pub struct Cart {
    blobs: SharedBlobStore,
    lines: Vec<CartLine>,
}

impl std::fmt::Debug for Cart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cart")
            .field("lines", &self.lines)
            .finish_non_exhaustive()
    }
}

impl Cart {
    /// Load the cart; a corrupt blob is discarded and the cart starts empty.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the blob store fails.
    pub fn load(blobs: SharedBlobStore) -> Result<Self, StoreError> {
        let lines = match blobs.get(CART_KEY)? {
            None => Vec::new(),
            Some(raw) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(lines) => lines.into_iter().filter(|l| l.quantity > 0).collect(),
                Err(e) => {
                    warn!(error = %e, "Stored cart is corrupt, discarding");
                    blobs.remove(CART_KEY)?;
                    Vec::new()
                }
            },
        };
        Ok(Self { blobs, lines })
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Add `quantity` units of `product`, merging with an existing line.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn add(&mut self, product: &Product, quantity: u32) -> Result<(), StoreError> {
        if quantity == 0 {
            return Ok(());
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine {
                product_id: product.id.clone(),
                name: product.name.clone(),
                price: product.price,
                quantity,
                image: product.image.clone(),
                slug: Some(product.slug.as_str().to_owned()),
            });
        }
        debug!(product_id = %product.id, quantity, "Added to cart");
        self.persist()
    }

    /// Set a line's quantity; 0 removes the line. Unknown products are ignored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn set_quantity(&mut self, product_id: &ProductId, quantity: u32) -> Result<(), StoreError> {
        if quantity == 0 {
            return self.remove(product_id);
        }
        match self.lines.iter_mut().find(|l| l.product_id == *product_id) {
            Some(line) => {
                line.quantity = quantity;
                self.persist()
            }
            None => Ok(()),
        }
    }

    /// # Errors
    ///
    /// Returns `StoreError::Storage` if persisting fails.
    pub fn remove(&mut self, product_id: &ProductId) -> Result<(), StoreError> {
        let before = self.lines.len();
        self.lines.retain(|l| l.product_id != *product_id);
        if self.lines.len() == before {
            return Ok(());
        }
        self.persist()
    }

    /// # Errors
    ///
    /// Returns `StoreError::Storage` if the blob cannot be removed.
    pub fn clear(&mut self) -> Result<(), StoreError> {
        self.lines.clear();
        self.blobs.remove(CART_KEY)?;
        Ok(())
    }

    /// The cart as order lines.
    #[must_use]
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.lines.iter().map(CartLine::to_order_item).collect()
    }

    /// Product ids in the cart, in line order.
    #[must_use]
    pub fn product_ids(&self) -> Vec<ProductId> {
        self.lines.iter().map(|l| l.product_id.clone()).collect()
    }

    fn persist(&self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&self.lines)?;
        self.blobs.set(CART_KEY, &encoded)?;
        Ok(())
    }
}
