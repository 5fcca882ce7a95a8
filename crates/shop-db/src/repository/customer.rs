//! # Customer Repository
//!
//! Database operations for customers and their cart lines.
//!
//! ## Cart Keying
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Keyed Cart Lines                                      │
//! │                                                                         │
//! │  cart_items is UNIQUE on (customer_id, product_id, size).              │
//! │                                                                         │
//! │  add "Camiseta" size M, qty 2   ──►  line (camiseta, 'M', qty 2)       │
//! │  add "Camiseta" size M, qty 1   ──►  same line, qty 3 (upsert merge)   │
//! │  add "Camiseta" size G, qty 1   ──►  new line (camiseta, 'G', qty 1)   │
//! │                                                                         │
//! │  Products without sizes use size = '' so the unique key still holds.   │
//! │  The snapshot (name, unit price) is frozen on the FIRST add and kept   │
//! │  on merge.                                                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use shop_core::{CartItem, Customer, CustomerWithCart};

/// Repository for customer and cart database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    // =========================================================================
    // Customers
    // =========================================================================

    /// Inserts a new customer.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - email already registered
    pub async fn create(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, email = %customer.email, "Creating customer");

        sqlx::query(
            r#"
            INSERT INTO customers (id, name, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.email)
        .bind(&customer.password_hash)
        .bind(customer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM customers
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer by email (login path).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Customer>> {
        let customer = sqlx::query_as::<_, Customer>(
            r#"
            SELECT id, name, email, password_hash, created_at
            FROM customers
            WHERE email = ?1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Gets a customer together with their full cart.
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no such customer
    pub async fn get_with_cart(&self, id: &str) -> DbResult<CustomerWithCart> {
        let customer = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))?;

        let cart = self.get_cart(id).await?;

        Ok(CustomerWithCart { customer, cart })
    }

    // =========================================================================
    // Cart Lines
    // =========================================================================

    /// Gets all cart lines for a customer, oldest first.
    pub async fn get_cart(&self, customer_id: &str) -> DbResult<Vec<CartItem>> {
        let items = sqlx::query_as::<_, CartItem>(
            r#"
            SELECT
                id, customer_id, product_id,
                name_snapshot, price_cents, image_url,
                size, quantity, added_at
            FROM cart_items
            WHERE customer_id = ?1
            ORDER BY added_at ASC, id ASC
            "#,
        )
        .bind(customer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts the cart lines for a customer (cart-size guard).
    pub async fn cart_line_count(&self, customer_id: &str) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE customer_id = ?1")
                .bind(customer_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Upserts a cart line keyed on (customer_id, product_id, size).
    ///
    /// A second add of the same product/size merges quantities into the
    /// existing line instead of appending a duplicate. The merge keeps
    /// the snapshot (name, unit price) from the first add.
    pub async fn upsert_cart_item(&self, item: &CartItem) -> DbResult<()> {
        debug!(
            customer_id = %item.customer_id,
            product_id = %item.product_id,
            size = %item.size,
            quantity = %item.quantity,
            "Upserting cart line"
        );

        sqlx::query(
            r#"
            INSERT INTO cart_items (
                id, customer_id, product_id,
                name_snapshot, price_cents, image_url,
                size, quantity, added_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT (customer_id, product_id, size) DO UPDATE SET
                quantity = quantity + excluded.quantity
            "#,
        )
        .bind(&item.id)
        .bind(&item.customer_id)
        .bind(&item.product_id)
        .bind(&item.name_snapshot)
        .bind(item.price_cents)
        .bind(&item.image_url)
        .bind(&item.size)
        .bind(item.quantity)
        .bind(item.added_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes cart lines for a product.
    ///
    /// An empty `size` is a wildcard: every line for the product goes,
    /// regardless of size. A non-empty `size` removes only the matching
    /// line. Lines for other products are untouched.
    ///
    /// ## Returns
    /// Number of lines removed (zero is not an error).
    pub async fn remove_cart_items(
        &self,
        customer_id: &str,
        product_id: &str,
        size: &str,
    ) -> DbResult<u64> {
        debug!(
            customer_id = %customer_id,
            product_id = %product_id,
            size = %size,
            "Removing cart lines"
        );

        let result = if size.is_empty() {
            sqlx::query(
                r#"
                DELETE FROM cart_items
                WHERE customer_id = ?1 AND product_id = ?2
                "#,
            )
            .bind(customer_id)
            .bind(product_id)
            .execute(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                DELETE FROM cart_items
                WHERE customer_id = ?1 AND product_id = ?2 AND size = ?3
                "#,
            )
            .bind(customer_id)
            .bind(product_id)
            .bind(size)
            .execute(&self.pool)
            .await?
        };

        Ok(result.rows_affected())
    }

    /// Removes every cart line for a customer.
    pub async fn clear_cart(&self, customer_id: &str) -> DbResult<u64> {
        debug!(customer_id = %customer_id, "Clearing cart");

        let result = sqlx::query("DELETE FROM cart_items WHERE customer_id = ?1")
            .bind(customer_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use uuid::Uuid;

    fn sample_customer() -> Customer {
        Customer {
            id: Uuid::new_v4().to_string(),
            name: "Ana Souza".to_string(),
            email: "ana@example.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            created_at: Utc::now(),
        }
    }

    fn line(customer_id: &str, product_id: &str, size: &str, quantity: i64) -> CartItem {
        CartItem {
            id: Uuid::new_v4().to_string(),
            customer_id: customer_id.to_string(),
            product_id: product_id.to_string(),
            name_snapshot: "Camiseta".to_string(),
            price_cents: 4990,
            image_url: None,
            size: size.to_string(),
            quantity,
            added_at: Utc::now(),
        }
    }

    async fn db_with_customer() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let customer = sample_customer();
        let id = customer.id.clone();
        db.customers().create(&customer).await.unwrap();
        (db, id)
    }

    #[tokio::test]
    async fn test_create_and_fetch_customer() {
        let (db, id) = db_with_customer().await;

        let fetched = db.customers().get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "ana@example.com");

        let by_email = db
            .customers()
            .get_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, id);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (db, _) = db_with_customer().await;

        let dup = sample_customer();
        let err = db.customers().create(&dup).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_upsert_merges_same_product_and_size() {
        let (db, customer_id) = db_with_customer().await;

        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "M", 2))
            .await
            .unwrap();
        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "M", 1))
            .await
            .unwrap();

        let cart = db.customers().get_cart(&customer_id).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].quantity, 3);
    }

    #[tokio::test]
    async fn test_different_sizes_stay_separate_lines() {
        let (db, customer_id) = db_with_customer().await;

        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "M", 1))
            .await
            .unwrap();
        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "G", 1))
            .await
            .unwrap();

        let cart = db.customers().get_cart(&customer_id).await.unwrap();
        assert_eq!(cart.len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_keeps_first_snapshot_price() {
        let (db, customer_id) = db_with_customer().await;

        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "M", 1))
            .await
            .unwrap();

        let mut repriced = line(&customer_id, "p1", "M", 1);
        repriced.price_cents = 9990;
        db.customers().upsert_cart_item(&repriced).await.unwrap();

        let cart = db.customers().get_cart(&customer_id).await.unwrap();
        assert_eq!(cart[0].price_cents, 4990);
        assert_eq!(cart[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_remove_specific_size_only() {
        let (db, customer_id) = db_with_customer().await;

        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "M", 1))
            .await
            .unwrap();
        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "G", 1))
            .await
            .unwrap();
        db.customers()
            .upsert_cart_item(&line(&customer_id, "p2", "", 1))
            .await
            .unwrap();

        let removed = db
            .customers()
            .remove_cart_items(&customer_id, "p1", "M")
            .await
            .unwrap();
        assert_eq!(removed, 1);

        let cart = db.customers().get_cart(&customer_id).await.unwrap();
        assert_eq!(cart.len(), 2);
        assert!(!cart.iter().any(|i| i.product_id == "p1" && i.size == "M"));
    }

    #[tokio::test]
    async fn test_remove_empty_size_is_wildcard() {
        let (db, customer_id) = db_with_customer().await;

        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "M", 1))
            .await
            .unwrap();
        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "G", 1))
            .await
            .unwrap();
        db.customers()
            .upsert_cart_item(&line(&customer_id, "p2", "", 1))
            .await
            .unwrap();

        let removed = db
            .customers()
            .remove_cart_items(&customer_id, "p1", "")
            .await
            .unwrap();
        assert_eq!(removed, 2);

        let cart = db.customers().get_cart(&customer_id).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].product_id, "p2");
    }

    #[tokio::test]
    async fn test_remove_absent_product_is_noop() {
        let (db, customer_id) = db_with_customer().await;

        let removed = db
            .customers()
            .remove_cart_items(&customer_id, "ghost", "")
            .await
            .unwrap();
        assert_eq!(removed, 0);
    }

    #[tokio::test]
    async fn test_get_with_cart() {
        let (db, customer_id) = db_with_customer().await;

        db.customers()
            .upsert_cart_item(&line(&customer_id, "p1", "M", 2))
            .await
            .unwrap();

        let with_cart = db.customers().get_with_cart(&customer_id).await.unwrap();
        assert_eq!(with_cart.customer.id, customer_id);
        assert_eq!(with_cart.cart.len(), 1);

        let err = db.customers().get_with_cart("ghost").await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }
}
