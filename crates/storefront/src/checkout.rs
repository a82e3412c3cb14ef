//! Turning a cart into an order.

use chrono::{DateTime, Utc};
use olivo_market_core::{Email, Order, OrderDraft, Price, ShippingAddress};
use tracing::{info, instrument};

use crate::cart::Cart;
use crate::error::StoreError;
use crate::orders::OrderStore;
use crate::products::ProductStore;

/// Customer-supplied checkout fields.
#[derive(Debug, Clone, Default)]
pub struct CheckoutDetails {
    pub customer: Option<String>,
    pub email: Option<Email>,
    pub user_id: Option<String>,
    pub shipping_address: Option<ShippingAddress>,
    pub payment_method: Option<String>,
    /// Overrides the configured shipping cost.
    pub shipping_cost: Option<Price>,
    pub notes: Option<String>,
}

/// Place an order for everything in `cart`.
///
/// Records an order intent for each product in the cart and empties the cart.
///
/// # Errors
///
/// - `StoreError::EmptyCart` if the cart is empty
/// - `StoreError::Storage` if any store fails to persist
#[instrument(skip_all, fields(lines = cart.lines().len()))]
pub fn checkout(
    cart: &mut Cart,
    orders: &mut OrderStore,
    products: &mut ProductStore,
    details: CheckoutDetails,
    now: DateTime<Utc>,
) -> Result<Order, StoreError> {
    if cart.is_empty() {
        return Err(StoreError::EmptyCart);
    }

    let draft = OrderDraft {
        items: cart.to_order_items(),
        customer: details.customer,
        email: details.email,
        user_id: details.user_id,
        shipping_address: details.shipping_address,
        payment_method: details.payment_method,
        shipping_cost: details.shipping_cost,
        notes: details.notes,
    };
    let order = orders.create(draft, now)?;
    products.track_order_intent(cart.product_ids())?;
    cart.clear()?;

    info!(order_id = %order.id, total = %order.total, "Checkout completed");
    Ok(order)
}
