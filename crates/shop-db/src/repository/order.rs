//! # Order Repository
//!
//! Database operations for the order ledger.
//!
//! ## Ledger Discipline
//! Orders are append-only records of what actually happened at checkout:
//! the header and its item lines are written together in one transaction,
//! and after that only `status` may ever change, through the single
//! guarded transition `awaiting_payment -> paid`.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use shop_core::{Order, OrderItem, OrderStatus};

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order header and its item lines atomically.
    ///
    /// Either the whole order lands in the ledger or none of it does.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - checkout key already recorded
    pub async fn insert(&self, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(
            id = %order.id,
            items = items.len(),
            total_cents = order.total_cents,
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, customer_name, customer_email, shipping_address,
                status, payment_method, total_cents, checkout_key, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&order.id)
        .bind(&order.customer_name)
        .bind(&order.customer_email)
        .bind(&order.shipping_address)
        .bind(order.status)
        .bind(order.payment_method)
        .bind(order.total_cents)
        .bind(&order.checkout_key)
        .bind(order.created_at)
        .execute(&mut *tx)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO order_items (
                    id, order_id, product_id,
                    name_snapshot, price_cents, quantity, size
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(&item.name_snapshot)
            .bind(item.price_cents)
            .bind(item.quantity)
            .bind(&item.size)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(id = %order.id, "Order recorded");
        Ok(())
    }

    /// Gets an order header by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, customer_name, customer_email, shipping_address,
                status, payment_method, total_cents, checkout_key, created_at
            FROM orders
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets an order header by its idempotency key, if any order carries it.
    pub async fn get_by_checkout_key(&self, key: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, customer_name, customer_email, shipping_address,
                status, payment_method, total_cents, checkout_key, created_at
            FROM orders
            WHERE checkout_key = ?1
            "#,
        )
        .bind(key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets the item lines of an order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, product_id, name_snapshot, price_cents, quantity, size
            FROM order_items
            WHERE order_id = ?1
            ORDER BY id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Lists orders for a customer email, newest first.
    pub async fn list_by_email(&self, email: &str) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT
                id, customer_name, customer_email, shipping_address,
                status, payment_method, total_cents, checkout_key, created_at
            FROM orders
            WHERE customer_email = ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Marks an awaiting-payment order as paid.
    ///
    /// The WHERE clause carries the transition guard: only an order still
    /// in `awaiting_payment` matches, so a repeated confirmation (or one
    /// against a card order, which is born paid) changes nothing.
    ///
    /// ## Returns
    /// * `Ok(true)` - transition applied
    /// * `Ok(false)` - order exists but was not awaiting payment
    ///
    /// ## Errors
    /// * `DbError::NotFound` - no such order
    pub async fn mark_paid(&self, id: &str) -> DbResult<bool> {
        debug!(id = %id, "Marking order paid");

        let result = sqlx::query(
            r#"
            UPDATE orders
            SET status = ?2
            WHERE id = ?1 AND status = ?3
            "#,
        )
        .bind(id)
        .bind(OrderStatus::Paid)
        .bind(OrderStatus::AwaitingPayment)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            info!(id = %id, "Order paid");
            return Ok(true);
        }

        // Distinguish "missing" from "not in the source state".
        match self.get_by_id(id).await? {
            Some(_) => Ok(false),
            None => Err(DbError::not_found("Order", id)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
