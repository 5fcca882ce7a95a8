//! End-to-end tests for the checkout pipeline.
//!
//! Every test runs against a fresh in-memory SQLite database and drives
//! the real components: CartManager, PaymentGateway, CheckoutService.

use std::sync::Once;

use chrono::Utc;
use uuid::Uuid;

use shop_checkout::{
    CardDetails, CartManager, CheckoutError, CheckoutRequest, CheckoutService, PaymentGateway,
};
use shop_core::{items_total, CoreError, Customer, OrderStatus, PaymentMethod, Product};
use shop_db::{Database, DbConfig};

// =============================================================================
// Helpers
// =============================================================================

static TRACING: Once = Once::new();

/// Installs the test subscriber once; `RUST_LOG` controls verbosity.
fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

async fn fresh_db() -> Database {
    init_tracing();
    Database::new(DbConfig::in_memory()).await.unwrap()
}

async fn seed_customer(db: &Database, email: &str) -> Customer {
    let customer = Customer {
        id: Uuid::new_v4().to_string(),
        name: "Ana Souza".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$stub".to_string(),
        created_at: Utc::now(),
    };
    db.customers().create(&customer).await.unwrap();
    customer
}

async fn seed_product(db: &Database, name: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: None,
        image_url: None,
        price_cents,
        stock,
        sizes: None,
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&product).await.unwrap();
    product
}

fn valid_card() -> CardDetails {
    CardDetails {
        number: "4111 1111 1111 1111".to_string(),
        holder: "ANA SOUZA".to_string(),
        cvv: "123".to_string(),
    }
}

fn declined_card() -> CardDetails {
    CardDetails {
        number: "4111 1111 1111 0000".to_string(),
        holder: "ANA SOUZA".to_string(),
        cvv: "123".to_string(),
    }
}

fn card_request(customer: &Customer, card: CardDetails) -> CheckoutRequest {
    CheckoutRequest {
        customer_id: customer.id.clone(),
        customer_name: customer.name.clone(),
        customer_email: customer.email.clone(),
        shipping_address: "Rua das Flores, 123".to_string(),
        method: PaymentMethod::Card,
        card: Some(card),
        selected_product_ids: Vec::new(),
        checkout_key: None,
    }
}

fn pix_request(customer: &Customer) -> CheckoutRequest {
    CheckoutRequest {
        method: PaymentMethod::Pix,
        card: None,
        ..card_request(customer, valid_card())
    }
}

fn services(db: &Database) -> (CartManager, CheckoutService) {
    (
        CartManager::new(db.clone()),
        CheckoutService::new(db.clone(), PaymentGateway::new()),
    )
}

// =============================================================================
// End-to-End Scenarios
// =============================================================================

/// The canonical happy path: one unit in stock at 500 cents, bought by
/// card. The order lands paid with the right total, stock hits zero and
/// the cart line is gone.
#[tokio::test]
async fn card_checkout_happy_path() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 1).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &product.id, 1, "").await.unwrap();

    let outcome = checkout
        .place_order(card_request(&customer, valid_card()))
        .await
        .unwrap();

    assert_eq!(outcome.order.status, OrderStatus::Paid);
    assert_eq!(outcome.order.total_cents, 500);
    assert!(outcome.pix.is_none());

    let live = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock, 0);

    let remaining = cart.get_cart(&customer.id).await.unwrap();
    assert!(remaining.is_empty());

    // The ledger agrees with the outcome.
    let recorded = db.orders().get_by_id(&outcome.order.id).await.unwrap().unwrap();
    assert_eq!(recorded.total_cents, 500);
    let items = db.orders().get_items(&outcome.order.id).await.unwrap();
    assert_eq!(items_total(&items), recorded.total_cents);
}

/// The persisted order total always equals the sum of its item lines.
#[tokio::test]
async fn order_total_matches_item_lines() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let shirt = seed_product(&db, "Camiseta", 4990, 10).await;
    let mug = seed_product(&db, "Caneca", 1500, 10).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &shirt.id, 3, "").await.unwrap();
    cart.add_item(&customer.id, &mug.id, 2, "").await.unwrap();

    let outcome = checkout
        .place_order(card_request(&customer, valid_card()))
        .await
        .unwrap();

    assert_eq!(outcome.order.total_cents, 3 * 4990 + 2 * 1500);
    assert_eq!(items_total(&outcome.items), outcome.order.total_cents);
}

/// The pre-check aborts a short checkout before any payment or mutation.
#[tokio::test]
async fn insufficient_stock_aborts_before_any_effect() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 3).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &product.id, 5, "").await.unwrap();

    let err = checkout
        .place_order(card_request(&customer, valid_card()))
        .await
        .unwrap_err();
    match err {
        CheckoutError::Domain(CoreError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 3);
            assert_eq!(requested, 5);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Nothing changed: stock intact, cart intact, ledger empty.
    let live = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock, 3);
    assert_eq!(cart.get_cart(&customer.id).await.unwrap().items.len(), 1);
    assert!(db
        .orders()
        .list_by_email(&customer.email)
        .await
        .unwrap()
        .is_empty());
}

/// A declined card leaves the system untouched.
#[tokio::test]
async fn declined_card_mutates_nothing() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 2).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &product.id, 1, "").await.unwrap();

    let err = checkout
        .place_order(card_request(&customer, declined_card()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(CoreError::PaymentDeclined)
    ));

    let live = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock, 2);
    assert_eq!(cart.get_cart(&customer.id).await.unwrap().items.len(), 1);
}

/// An empty cart (or a selection matching nothing) cannot check out.
#[tokio::test]
async fn empty_selection_is_rejected() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 2).await;
    let (cart, checkout) = services(&db);

    // Empty cart.
    let err = checkout
        .place_order(card_request(&customer, valid_card()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(CoreError::InvalidSelection)
    ));

    // Selection that matches no cart line.
    cart.add_item(&customer.id, &product.id, 1, "").await.unwrap();
    let mut request = card_request(&customer, valid_card());
    request.selected_product_ids = vec!["not-in-cart".to_string()];
    let err = checkout.place_order(request).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(CoreError::InvalidSelection)
    ));
}

/// A non-empty selection buys only the selected products; the rest of
/// the cart survives.
#[tokio::test]
async fn partial_selection_leaves_other_lines() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let shirt = seed_product(&db, "Camiseta", 4990, 10).await;
    let mug = seed_product(&db, "Caneca", 1500, 10).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &shirt.id, 1, "").await.unwrap();
    cart.add_item(&customer.id, &mug.id, 1, "").await.unwrap();

    let mut request = card_request(&customer, valid_card());
    request.selected_product_ids = vec![mug.id.clone()];

    let outcome = checkout.place_order(request).await.unwrap();
    assert_eq!(outcome.order.total_cents, 1500);
    assert_eq!(outcome.items.len(), 1);

    let remaining = cart.get_cart(&customer.id).await.unwrap();
    assert_eq!(remaining.items.len(), 1);
    assert_eq!(remaining.items[0].product_id, shirt.id);

    let shirt_live = db.products().get_by_id(&shirt.id).await.unwrap().unwrap();
    assert_eq!(shirt_live.stock, 10);
}

/// Checkout charges the price snapshotted at add-to-cart time, not the
/// live price the admin set afterwards.
#[tokio::test]
async fn snapshot_price_survives_a_price_change() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 5).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &product.id, 2, "").await.unwrap();

    // The admin reprices the product while the cart sits there.
    let mut repriced = product.clone();
    repriced.price_cents = 900;
    db.products().update(&repriced).await.unwrap();

    let outcome = checkout
        .place_order(card_request(&customer, valid_card()))
        .await
        .unwrap();

    assert_eq!(outcome.order.total_cents, 2 * 500);
    assert_eq!(outcome.items[0].price_cents, 500);
}

// =============================================================================
// Pix Lifecycle
// =============================================================================

/// A pix order is born awaiting payment with a charge attached, and the
/// external confirmation moves it to paid exactly once.
#[tokio::test]
async fn pix_order_lifecycle() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 5).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &product.id, 1, "").await.unwrap();

    let outcome = checkout.place_order(pix_request(&customer)).await.unwrap();
    assert_eq!(outcome.order.status, OrderStatus::AwaitingPayment);

    let charge = outcome.pix.expect("pix order carries a charge");
    assert!(charge.code.contains("BR.GOV.BCB.PIX"));
    assert_eq!(charge.amount_cents, 500);

    // Stock is reserved up front, before the payment settles.
    let live = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock, 4);

    let paid = checkout.confirm_payment(&outcome.order.id).await.unwrap();
    assert_eq!(paid.status, OrderStatus::Paid);

    // A second confirmation is an invalid transition, not a silent no-op.
    let err = checkout.confirm_payment(&outcome.order.id).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(CoreError::InvalidStatusTransition { .. })
    ));
}

/// Confirming a card order (born paid) or a missing order fails.
#[tokio::test]
async fn confirm_payment_rejects_card_and_missing_orders() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 5).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &product.id, 1, "").await.unwrap();
    let outcome = checkout
        .place_order(card_request(&customer, valid_card()))
        .await
        .unwrap();

    let err = checkout.confirm_payment(&outcome.order.id).await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(CoreError::InvalidStatusTransition { .. })
    ));

    let err = checkout.confirm_payment("ghost").await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(CoreError::OrderNotFound(_))
    ));
}

// =============================================================================
// Idempotency
// =============================================================================

/// Replaying a checkout with the same key returns the recorded order and
/// charges nothing twice.
#[tokio::test]
async fn idempotent_replay_returns_the_same_order() {
    let db = fresh_db().await;
    let customer = seed_customer(&db, "ana@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 5).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&customer.id, &product.id, 2, "").await.unwrap();

    let mut request = card_request(&customer, valid_card());
    request.checkout_key = Some("attempt-42".to_string());

    let first = checkout.place_order(request.clone()).await.unwrap();
    let replay = checkout.place_order(request).await.unwrap();

    assert_eq!(replay.order.id, first.order.id);
    assert_eq!(replay.order.total_cents, first.order.total_cents);
    assert_eq!(replay.items.len(), first.items.len());

    // Stock was debited exactly once.
    let live = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock, 3);

    // One order in the ledger, not two.
    let orders = db.orders().list_by_email(&customer.email).await.unwrap();
    assert_eq!(orders.len(), 1);
}

// =============================================================================
// Concurrency and Compensation
// =============================================================================

/// Two buyers race for the last unit: exactly one order lands, stock
/// ends at zero and never goes negative.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn two_buyers_race_for_the_last_unit() {
    let db = fresh_db().await;
    let ana = seed_customer(&db, "ana@example.com").await;
    let bia = seed_customer(&db, "bia@example.com").await;
    let product = seed_product(&db, "Caneca", 500, 1).await;
    let (cart, checkout) = services(&db);

    cart.add_item(&ana.id, &product.id, 1, "").await.unwrap();
    cart.add_item(&bia.id, &product.id, 1, "").await.unwrap();

    let checkout_a = checkout.clone();
    let checkout_b = checkout.clone();
    let request_a = card_request(&ana, valid_card());
    let request_b = card_request(&bia, valid_card());

    let (result_a, result_b) = tokio::join!(
        tokio::spawn(async move { checkout_a.place_order(request_a).await }),
        tokio::spawn(async move { checkout_b.place_order(request_b).await }),
    );
    let result_a = result_a.unwrap();
    let result_b = result_b.unwrap();

    let wins = [&result_a, &result_b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1, "exactly one buyer gets the unit");

    let loss = [result_a, result_b]
        .into_iter()
        .find(|r| r.is_err())
        .unwrap()
        .unwrap_err();
    assert!(matches!(
        loss,
        CheckoutError::Domain(CoreError::InsufficientStock { .. })
    ));

    let live = db.products().get_by_id(&product.id).await.unwrap().unwrap();
    assert_eq!(live.stock, 0);

    let orders: usize = db.orders().list_by_email("ana@example.com").await.unwrap().len()
        + db.orders().list_by_email("bia@example.com").await.unwrap().len();
    assert_eq!(orders, 1);
}

/// When a later line cannot be reserved, lines already debited in the
/// same checkout are credited back.
///
/// The pre-check is per line: two lines of the same product can each
/// pass it while their sum exceeds stock. The debit then fails on the
/// second line, which must undo the first line's reservation.
#[tokio::test]
async fn failed_line_releases_earlier_debits() {
    let db = fresh_db().await;
    let ana = seed_customer(&db, "ana@example.com").await;
    let now = Utc::now();
    let shirt = Product {
        id: Uuid::new_v4().to_string(),
        name: "Camiseta".to_string(),
        description: None,
        image_url: None,
        price_cents: 4990,
        stock: 3,
        sizes: Some(r#"["M","G"]"#.to_string()),
        created_at: now,
        updated_at: now,
    };
    db.products().insert(&shirt).await.unwrap();
    let (cart, checkout) = services(&db);

    // Each line (qty 2) passes the per-line pre-check against stock 3,
    // but together they need 4 units.
    cart.add_item(&ana.id, &shirt.id, 2, "M").await.unwrap();
    cart.add_item(&ana.id, &shirt.id, 2, "G").await.unwrap();

    let err = checkout
        .place_order(card_request(&ana, valid_card()))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::Domain(CoreError::InsufficientStock { .. })
    ));

    // The first line's debit was compensated; nothing is stranded.
    let live = db.products().get_by_id(&shirt.id).await.unwrap().unwrap();
    assert_eq!(live.stock, 3);

    // Ana's cart is untouched and no order was recorded.
    assert_eq!(cart.get_cart(&ana.id).await.unwrap().items.len(), 2);
    assert!(db
        .orders()
        .list_by_email("ana@example.com")
        .await
        .unwrap()
        .is_empty());
}
