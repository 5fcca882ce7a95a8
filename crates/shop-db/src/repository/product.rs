//! # Product Repository
//!
//! Database operations for products: the inventory store and the stock
//! guard the whole checkout pipeline leans on.
//!
//! ## The Conditional Decrement
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                 How the Stock Guard Works                               │
//! │                                                                         │
//! │  Two buyers race for the last unit of a product:                       │
//! │                                                                         │
//! │  Buyer A: reserve_stock(p1, 1)   Buyer B: reserve_stock(p1, 1)         │
//! │       │                               │                                 │
//! │       └───────────┬───────────────────┘                                 │
//! │                   ▼                                                     │
//! │  UPDATE products SET stock = stock - 1                                 │
//! │  WHERE id = ?1 AND stock >= 1                                          │
//! │                   │                                                     │
//! │       ┌───────────┴───────────┐                                         │
//! │       ▼                       ▼                                         │
//! │  rows_affected = 1       rows_affected = 0                             │
//! │  (A wins the unit)       (B gets InsufficientStock)                    │
//! │                                                                         │
//! │  The WHERE clause is evaluated at apply time inside the single         │
//! │  UPDATE, so stock can never go negative no matter how many             │
//! │  concurrent buyers hit the same row.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use shop_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_id("uuid-here").await?;
/// repo.reserve_stock("uuid-here", 2).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, image_url,
                price_cents, stock, sizes,
                created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists all products, newest first (the storefront showcase).
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, image_url,
                price_cents, stock, sizes,
                created_at, updated_at
            FROM products
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Inserts a new product (admin path).
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, image_url,
                price_cents, stock, sizes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.sizes)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Updates an existing product (admin path).
    ///
    /// Stock is deliberately NOT settable here: an absolute write would
    /// silently undo decrements from checkouts racing with the edit.
    /// Restocking goes through [`adjust_stock`](Self::adjust_stock);
    /// the pipeline itself only uses [`reserve_stock`](Self::reserve_stock)
    /// and [`release_stock`](Self::release_stock).
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                image_url = ?4,
                price_cents = ?5,
                sizes = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.image_url)
        .bind(product.price_cents)
        .bind(&product.sizes)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Reserves `quantity` units of stock, atomically.
    ///
    /// Performs a single conditional UPDATE: decrement only if the row
    /// still has at least `quantity` units at apply time. Zero rows
    /// affected means the stock was already consumed (or the product
    /// vanished) and nothing was changed.
    ///
    /// With `quantity = 1` this is exactly the classic one-unit
    /// conditional decrement; the pipeline reserves a whole line in one
    /// call so a line is debited all-or-nothing.
    ///
    /// ## Errors
    /// * `DbError::InsufficientStock` - condition not met, no change made
    pub async fn reserve_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Reserving stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock - ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            warn!(id = %id, quantity = %quantity, "Stock reservation refused");
            return Err(DbError::insufficient_stock(id, quantity));
        }

        Ok(())
    }

    /// Credits `quantity` units back to stock.
    ///
    /// The compensating half of the checkout saga: when a later line
    /// fails to reserve, every line already debited in the same checkout
    /// is released through this call.
    pub async fn release_stock(&self, id: &str, quantity: i64) -> DbResult<()> {
        debug!(id = %id, quantity = %quantity, "Releasing stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2,
                updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Applies a stock delta (admin restock path).
    ///
    /// A positive delta restocks, a negative delta writes off inventory.
    /// Like the reservation, this is a single conditional UPDATE: the
    /// write-off only applies if the result stays non-negative, so a
    /// correction racing with checkouts can never drive stock below
    /// zero.
    ///
    /// ## Errors
    /// * `DbError::InsufficientStock` - negative delta exceeds current stock
    /// * `DbError::NotFound` - no such product
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<()> {
        debug!(id = %id, delta = %delta, "Adjusting stock");

        let now = Utc::now();

        let result = sqlx::query(
            r#"
            UPDATE products
            SET stock = stock + ?2,
                updated_at = ?3
            WHERE id = ?1 AND stock + ?2 >= 0
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return match self.get_by_id(id).await? {
                Some(_) => Err(DbError::insufficient_stock(id, -delta)),
                None => Err(DbError::not_found("Product", id)),
            };
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================
