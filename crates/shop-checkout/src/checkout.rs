//! # Checkout Orchestrator
//!
//! Drives a cart through payment and stock reservation into the order
//! ledger.
//!
//! ## The Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        place_order(request)                             │
//! │                                                                         │
//! │  0. checkout_key already in the ledger?  ──► return that order         │
//! │  1. load cart, apply the selection filter                              │
//! │  2. live-stock pre-check on every selected line                        │
//! │  3. total = Σ snapshot price × quantity                                │
//! │  4. card: authorize (decline aborts, nothing mutated)                  │
//! │     pix:  generate charge, order will await payment                    │
//! │  5. debit: one atomic reserve per line                                 │
//! │        └── a line fails? release every debited line, abort             │
//! │  6. remove purchased lines, insert the order + item snapshots          │
//! │  7. return CheckoutOutcome { order, items, pix }                       │
//! │                                                                         │
//! │  Failure before step 5 leaves the system byte-for-byte untouched.      │
//! │  Failure inside step 5 is rolled back by the compensating release.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use crate::payment::{CardDetails, PaymentGateway, PixCharge};
use shop_core::validation::validate_email;
use shop_core::{
    CartItem, CoreError, Order, OrderItem, OrderStatus, PaymentMethod, ValidationError,
};
use shop_db::{Database, DbError};

// =============================================================================
// Request / Outcome
// =============================================================================

/// Everything the host hands over to place an order.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub customer_id: String,
    /// Captured onto the order; the order must survive customer edits.
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub method: PaymentMethod,
    /// Required when `method` is `Card`.
    pub card: Option<CardDetails>,
    /// Product ids to buy. Empty means the whole cart.
    pub selected_product_ids: Vec<String>,
    /// Optional idempotency key; a retried request with the same key
    /// returns the already-placed order instead of charging twice.
    pub checkout_key: Option<String>,
}

/// The result of a placed order.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    pub order: Order,
    pub items: Vec<OrderItem>,
    /// Present on fresh pix orders; `None` for card orders and for
    /// idempotent replays.
    pub pix: Option<PixCharge>,
}

// =============================================================================
// Checkout Service
// =============================================================================

/// The checkout orchestrator.
#[derive(Debug, Clone)]
pub struct CheckoutService {
    db: Database,
    gateway: PaymentGateway,
}

impl CheckoutService {
    pub fn new(db: Database, gateway: PaymentGateway) -> Self {
        CheckoutService { db, gateway }
    }

    /// Places an order from the customer's cart.
    ///
    /// See the module docs for the step-by-step pipeline. The guarantees
    /// that matter:
    ///
    /// - Nothing is mutated before the payment decision.
    /// - Stock effects are all-or-nothing per checkout: a line that
    ///   fails to reserve releases every line debited before it.
    /// - Charged prices are the cart snapshots, not live prices.
    ///
    /// One limitation: a card authorized in step 4 whose debit then
    /// fails in step 5 is not refunded, because the simulated authorizer
    /// has no refund call. The stock release still runs.
    pub async fn place_order(&self, request: CheckoutRequest) -> CheckoutResult<CheckoutOutcome> {
        // Step 0: idempotent replay.
        if let Some(key) = request.checkout_key.as_deref() {
            if let Some(order) = self.db.orders().get_by_checkout_key(key).await? {
                info!(order_id = %order.id, checkout_key = %key, "Checkout replayed idempotently");
                let items = self.db.orders().get_items(&order.id).await?;
                return Ok(CheckoutOutcome {
                    order,
                    items,
                    pix: None,
                });
            }
        }

        validate_email(&request.customer_email)?;
        if request.shipping_address.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "shipping address".to_string(),
            }
            .into());
        }
        if request.customer_name.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "customer name".to_string(),
            }
            .into());
        }

        // Step 1: load the cart and apply the selection filter.
        let lines = self.selected_lines(&request).await?;

        // Step 2: live-stock pre-check. First shortage aborts before any
        // payment or mutation.
        for line in &lines {
            let product = self
                .db
                .products()
                .get_by_id(&line.product_id)
                .await?
                .ok_or_else(|| {
                    CheckoutError::from(CoreError::ProductNotFound(line.product_id.clone()))
                })?;

            if !product.in_stock(line.quantity) {
                debug!(
                    product_id = %line.product_id,
                    available = product.stock,
                    requested = line.quantity,
                    "Pre-check shortage"
                );
                return Err(CoreError::InsufficientStock {
                    product_id: line.product_id.clone(),
                    available: product.stock,
                    requested: line.quantity,
                }
                .into());
            }
        }

        // Step 3: the total is the SNAPSHOT price of each line. A price
        // change after add-to-cart does not reach this checkout.
        let total_cents: i64 = lines.iter().map(CartItem::line_total_cents).sum();

        // Step 4: payment decision.
        let (status, pix) = match request.method {
            PaymentMethod::Card => {
                let card = request.card.as_ref().ok_or_else(|| {
                    CheckoutError::from(ValidationError::Required {
                        field: "card details".to_string(),
                    })
                })?;
                self.gateway.authorize_card(card, total_cents)?;
                (OrderStatus::Paid, None)
            }
            PaymentMethod::Pix => {
                let charge = self.gateway.generate_pix_code(total_cents);
                (OrderStatus::AwaitingPayment, Some(charge))
            }
        };

        // Step 5: debit every line atomically, releasing on failure.
        self.reserve_lines(&lines).await?;

        // Step 6: purchased lines leave the cart, the order enters the
        // ledger with its frozen item snapshots.
        for line in &lines {
            self.db
                .customers()
                .remove_cart_items(&request.customer_id, &line.product_id, &line.size)
                .await?;
        }

        let order_id = Uuid::new_v4().to_string();
        let items: Vec<OrderItem> = lines
            .iter()
            .map(|line| OrderItem {
                id: Uuid::new_v4().to_string(),
                order_id: order_id.clone(),
                product_id: line.product_id.clone(),
                name_snapshot: line.name_snapshot.clone(),
                price_cents: line.price_cents,
                quantity: line.quantity,
                size: line.size.clone(),
            })
            .collect();

        let order = Order {
            id: order_id,
            customer_name: request.customer_name.trim().to_string(),
            customer_email: request.customer_email.trim().to_string(),
            shipping_address: request.shipping_address.trim().to_string(),
            status,
            payment_method: request.method,
            total_cents,
            checkout_key: request.checkout_key.clone(),
            created_at: Utc::now(),
        };

        match self.db.orders().insert(&order, &items).await {
            Ok(()) => {}
            // A concurrent attempt with the same key won the ledger
            // insert; surface that order instead of a duplicate.
            Err(DbError::UniqueViolation { .. }) if request.checkout_key.is_some() => {
                warn!("Checkout key raced; returning the recorded order");
                self.release_lines(&lines).await;
                let key = request.checkout_key.as_deref().unwrap_or_default();
                let recorded = self
                    .db
                    .orders()
                    .get_by_checkout_key(key)
                    .await?
                    .ok_or(CheckoutError::Persistence(DbError::Internal(
                        "checkout key vanished after conflict".to_string(),
                    )))?;
                let items = self.db.orders().get_items(&recorded.id).await?;
                return Ok(CheckoutOutcome {
                    order: recorded,
                    items,
                    pix: None,
                });
            }
            Err(e) => return Err(e.into()),
        }

        info!(
            order_id = %order.id,
            total_cents,
            method = ?request.method,
            status = ?order.status,
            "Order placed"
        );

        Ok(CheckoutOutcome { order, items, pix })
    }

    /// Confirms an out-of-band pix payment.
    ///
    /// Transitions the order `awaiting_payment → paid`. Any other state
    /// is an invalid transition; card orders are born paid and can never
    /// be confirmed.
    pub async fn confirm_payment(&self, order_id: &str) -> CheckoutResult<Order> {
        let transitioned = match self.db.orders().mark_paid(order_id).await {
            Ok(t) => t,
            Err(DbError::NotFound { .. }) => {
                return Err(CoreError::OrderNotFound(order_id.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };

        if !transitioned {
            return Err(CoreError::InvalidStatusTransition {
                order_id: order_id.to_string(),
                current_status: "paid".to_string(),
                requested_status: "paid".to_string(),
            }
            .into());
        }

        let order = self
            .db
            .orders()
            .get_by_id(order_id)
            .await?
            .ok_or_else(|| CheckoutError::from(CoreError::OrderNotFound(order_id.to_string())))?;

        Ok(order)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Loads the cart and applies the selection filter.
    ///
    /// An empty selection means the whole cart. A selection that matches
    /// nothing (or an empty cart) is `InvalidSelection`.
    async fn selected_lines(&self, request: &CheckoutRequest) -> CheckoutResult<Vec<CartItem>> {
        let with_cart = match self.db.customers().get_with_cart(&request.customer_id).await {
            Ok(v) => v,
            Err(DbError::NotFound { .. }) => {
                return Err(CoreError::CustomerNotFound(request.customer_id.clone()).into())
            }
            Err(e) => return Err(e.into()),
        };

        let lines: Vec<CartItem> = if request.selected_product_ids.is_empty() {
            with_cart.cart
        } else {
            with_cart
                .cart
                .into_iter()
                .filter(|line| request.selected_product_ids.contains(&line.product_id))
                .collect()
        };

        if lines.is_empty() {
            return Err(CoreError::InvalidSelection.into());
        }

        Ok(lines)
    }

    /// Reserves stock for every line; all-or-nothing.
    ///
    /// On the first line that fails, every previously debited line is
    /// credited back before the error is surfaced.
    async fn reserve_lines(&self, lines: &[CartItem]) -> CheckoutResult<()> {
        let mut debited: Vec<&CartItem> = Vec::with_capacity(lines.len());

        for line in lines {
            match self
                .db
                .products()
                .reserve_stock(&line.product_id, line.quantity)
                .await
            {
                Ok(()) => debited.push(line),
                Err(DbError::InsufficientStock { .. }) => {
                    warn!(
                        product_id = %line.product_id,
                        requested = line.quantity,
                        "Reservation lost the race; releasing debited lines"
                    );
                    self.release_lines(&debited).await;

                    let available = self
                        .db
                        .products()
                        .get_by_id(&line.product_id)
                        .await?
                        .map(|p| p.stock)
                        .unwrap_or(0);

                    return Err(CoreError::InsufficientStock {
                        product_id: line.product_id.clone(),
                        available,
                        requested: line.quantity,
                    }
                    .into());
                }
                Err(e) => {
                    self.release_lines(&debited).await;
                    return Err(e.into());
                }
            }
        }

        Ok(())
    }

    /// Credits back already-debited lines (compensation path).
    ///
    /// Release failures are logged, not propagated: the caller is
    /// already unwinding a more important error.
    async fn release_lines(&self, debited: &[impl std::borrow::Borrow<CartItem>]) {
        for line in debited {
            let line = line.borrow();
            if let Err(e) = self
                .db
                .products()
                .release_stock(&line.product_id, line.quantity)
                .await
            {
                warn!(
                    product_id = %line.product_id,
                    quantity = line.quantity,
                    error = %e,
                    "Compensating release failed"
                );
            }
        }
    }
}
