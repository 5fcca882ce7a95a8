//! # Cart Manager
//!
//! Cart mutation and presentation over the customer store.
//!
//! ## Line Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Cart Operations                                 │
//! │                                                                         │
//! │  add_item(c, p, qty, size)                                             │
//! │    ├── qty < 1 normalized to 1                                         │
//! │    ├── product loaded, size checked against its declared set           │
//! │    ├── name/price/image SNAPSHOTTED from the product                   │
//! │    └── keyed upsert: same (product, size) merges quantities            │
//! │                                                                         │
//! │  remove_item(c, p, size)                                               │
//! │    ├── size = ""  → every line for the product goes                    │
//! │    └── size = "M" → only the (product, M) line goes                    │
//! │                                                                         │
//! │  get_cart(c) → CartView { lines, total, display string }               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{CheckoutError, CheckoutResult};
use shop_core::validation::{
    normalize_quantity, validate_cart_size, validate_quantity, validate_size_label,
};
use shop_core::{CartItem, CoreError, Money};
use shop_db::{Database, DbError};

// =============================================================================
// Cart View
// =============================================================================

/// A customer's cart, totalled for display.
#[derive(Debug, Clone, Serialize)]
pub struct CartView {
    pub items: Vec<CartItem>,
    /// Sum of snapshot price × quantity over the lines, in cents.
    pub total_cents: i64,
    /// Major-unit rendering of the total (presentation boundary only).
    pub display_total: String,
}

impl CartView {
    fn from_items(items: Vec<CartItem>) -> Self {
        let total_cents: i64 = items.iter().map(CartItem::line_total_cents).sum();
        CartView {
            items,
            total_cents,
            display_total: Money::from_cents(total_cents).to_string(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// =============================================================================
// Cart Manager
// =============================================================================

/// Cart operations for the storefront.
#[derive(Debug, Clone)]
pub struct CartManager {
    db: Database,
}

impl CartManager {
    pub fn new(db: Database) -> Self {
        CartManager { db }
    }

    /// Adds a product to a customer's cart.
    ///
    /// ## Behavior
    /// - A quantity below 1 is normalized to 1, then capped by the
    ///   line-quantity limit.
    /// - The size label must belong to the product's declared set; an
    ///   empty label is only valid on products without variants (and is
    ///   always accepted as "no variant").
    /// - Name, unit price and image are snapshotted from the product at
    ///   this moment. Later product edits never reach this line.
    /// - Adding the same `(product, size)` again merges quantities into
    ///   the existing line.
    pub async fn add_item(
        &self,
        customer_id: &str,
        product_id: &str,
        quantity: i64,
        size: &str,
    ) -> CheckoutResult<CartItem> {
        let quantity = normalize_quantity(quantity);
        validate_quantity(quantity)?;

        // The customer must exist before we hang lines off them.
        if self.db.customers().get_by_id(customer_id).await?.is_none() {
            return Err(CoreError::CustomerNotFound(customer_id.to_string()).into());
        }

        let product = self
            .db
            .products()
            .get_by_id(product_id)
            .await?
            .ok_or_else(|| CheckoutError::from(CoreError::ProductNotFound(product_id.to_string())))?;

        validate_size_label(size, &product.size_labels())?;

        let line_count = self.db.customers().cart_line_count(customer_id).await?;
        validate_cart_size(line_count as usize)?;

        let item = CartItem::from_product(customer_id, &product, quantity, size);
        self.db.customers().upsert_cart_item(&item).await?;

        info!(
            customer_id = %customer_id,
            product_id = %product_id,
            quantity,
            size = %size,
            "Cart line added"
        );

        Ok(item)
    }

    /// Removes lines for a product from a customer's cart.
    ///
    /// An empty `size` removes every line for the product; a non-empty
    /// `size` removes only the exact `(product, size)` line. Removing
    /// something that is not there is a no-op, not an error.
    ///
    /// ## Returns
    /// Number of lines removed.
    pub async fn remove_item(
        &self,
        customer_id: &str,
        product_id: &str,
        size: &str,
    ) -> CheckoutResult<u64> {
        let removed = self
            .db
            .customers()
            .remove_cart_items(customer_id, product_id, size)
            .await?;

        debug!(
            customer_id = %customer_id,
            product_id = %product_id,
            size = %size,
            removed,
            "Cart lines removed"
        );

        Ok(removed)
    }

    /// Returns the customer's cart with its running total.
    pub async fn get_cart(&self, customer_id: &str) -> CheckoutResult<CartView> {
        let with_cart = match self.db.customers().get_with_cart(customer_id).await {
            Ok(v) => v,
            Err(DbError::NotFound { .. }) => {
                return Err(CoreError::CustomerNotFound(customer_id.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };

        Ok(CartView::from_items(with_cart.cart))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
