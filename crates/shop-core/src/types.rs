//! # Domain Types
//!
//! Core domain types used throughout the checkout pipeline.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    CartItem     │   │     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  product_id     │   │  id (UUID)      │       │
//! │  │  price_cents    │   │  name/price     │   │  status         │       │
//! │  │  stock          │   │   snapshots     │   │  total_cents    │       │
//! │  │  sizes (JSON)   │   │  size, quantity │   │  items (frozen) │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │   OrderStatus   │   │ PaymentMethod   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  email (unique) │   │ AwaitingPayment │   │  Card           │       │
//! │  │  password_hash  │   │  Paid           │   │  Pix            │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Cart lines and order items freeze the product's name, price and image
//! at the moment of the action. Later product edits never reach a line
//! that was already placed. Live stock, in contrast, is always re-read
//! from the inventory store at checkout - never from the snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A product available in the storefront.
///
/// Mutated by the pipeline only via the conditional stock decrement;
/// everything else is the administrative collaborator's business.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the storefront.
    pub name: String,

    /// Optional long description.
    pub description: Option<String>,

    /// Reference to the product image.
    pub image_url: Option<String>,

    /// Price in cents (smallest currency unit). Never floating point.
    pub price_cents: i64,

    /// Current stock level. `stock >= 0` holds after any committed mutation.
    pub stock: i64,

    /// Optional set of size labels, stored as a JSON array of strings
    /// (e.g. `["P","M","G"]`). `None` means the product has no variants.
    pub sizes: Option<String>,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Parses the JSON size-label column.
    ///
    /// Malformed JSON is treated as "no sizes" rather than an error:
    /// the column is written by the admin path, and a bad value must not
    /// make the product unsellable.
    pub fn size_labels(&self) -> Vec<String> {
        self.sizes
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<String>>(raw).ok())
            .unwrap_or_default()
    }

    /// Checks whether `label` is one of the product's declared sizes.
    pub fn has_size(&self, label: &str) -> bool {
        self.size_labels().iter().any(|s| s == label)
    }

    /// Checks if the live stock covers the requested quantity.
    #[inline]
    pub fn in_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Cart Item
// =============================================================================

/// A line in a customer's cart.
///
/// ## Identity
/// The purchasable variant is `(product_id, size)`; `size` is the empty
/// string for products without variants. Adding the same variant again
/// merges into the existing line (keyed upsert), never a duplicate row.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CartItem {
    /// Line identifier (UUID v4).
    pub id: String,

    /// Owning customer.
    pub customer_id: String,

    /// Product this line references.
    pub product_id: String,

    /// Product name at add-time (frozen).
    pub name_snapshot: String,

    /// Unit price in cents at add-time (frozen).
    /// Checkout charges this snapshot, not the live price.
    pub price_cents: i64,

    /// Image reference at add-time (frozen).
    pub image_url: Option<String>,

    /// Size label, `""` when the product has no variants.
    pub size: String,

    /// Quantity, always positive. A line at zero is removed, not kept.
    pub quantity: i64,

    /// When this line was first added.
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Builds a cart line by snapshotting the given product.
    pub fn from_product(customer_id: &str, product: &Product, quantity: i64, size: &str) -> Self {
        CartItem {
            id: uuid::Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            product_id: product.id.clone(),
            name_snapshot: product.name.clone(),
            price_cents: product.price_cents,
            image_url: product.image_url.clone(),
            size: size.to_string(),
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Line total in cents (snapshot price × quantity).
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents * self.quantity
    }

    /// Matches a removal/selection filter.
    ///
    /// An empty `size` filter matches every line for the product,
    /// regardless of the line's own size. A non-empty filter matches
    /// exactly. This is the documented (and deliberately broad)
    /// empty-size behavior of cart removal.
    pub fn matches(&self, product_id: &str, size: &str) -> bool {
        self.product_id == product_id && (size.is_empty() || self.size == size)
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A registered customer. The cart rows reference this record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Unique login identity; also captured on orders at checkout.
    pub email: String,
    /// Argon2 hash, never the plaintext credential.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// A customer together with their ordered cart lines.
///
/// Insertion order matters for display, not for correctness.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerWithCart {
    pub customer: Customer,
    pub cart: Vec<CartItem>,
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order.
///
/// The only legal transition is `AwaitingPayment → Paid`, triggered by
/// the external pix-confirmation collaborator. Card orders are created
/// directly as `Paid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Pix order waiting for the external confirmation event.
    AwaitingPayment,
    /// Payment settled.
    Paid,
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Synchronously authorized card payment.
    Card,
    /// Deferred code/QR payment, confirmed asynchronously.
    Pix,
}

// =============================================================================
// Order
// =============================================================================

/// An immutable, committed order.
///
/// Customer name/email/address are captured at checkout, not foreign
/// keys: the order must survive later customer edits unchanged. Once
/// created, `items` and `total_cents` never change; only `status` may
/// transition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Order {
    pub id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Must equal Σ(item.price_cents × item.quantity) over the items.
    pub total_cents: i64,
    /// Idempotency key for the checkout attempt, when the caller sent one.
    pub checkout_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Order Item
// =============================================================================

/// A frozen line inside an order.
/// Uses the snapshot pattern: the purchased cart line is copied verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Product name at purchase time (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at purchase time (frozen, from the cart snapshot).
    pub price_cents: i64,
    pub quantity: i64,
    /// Size label, `""` for products without variants.
    pub size: String,
}

impl OrderItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Line total in cents.
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.price_cents * self.quantity
    }
}

/// Sums order item lines in cents.
///
/// The order total invariant is `order.total_cents == items_total(&items)`
/// for every persisted order.
pub fn items_total(items: &[OrderItem]) -> i64 {
    items.iter().map(OrderItem::line_total_cents).sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
