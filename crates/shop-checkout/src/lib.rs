//! # shop-checkout: The Checkout Pipeline
//!
//! Orchestration layer tying the domain rules (`shop-core`) and the
//! SQLite stores (`shop-db`) into the checkout flow an external host
//! calls into. The host owns HTTP routing, sessions and rendering; this
//! crate owns everything between "add to cart" and "order recorded".
//!
//! ## Components
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         shop-checkout                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌─────────────────┐  ┌────────────────────────┐    │
//! │  │ CartManager  │  │ PaymentGateway  │  │    CheckoutService     │    │
//! │  │ add / remove │  │ card + pix,     │  │ pre-check, pay, debit, │    │
//! │  │ / view cart  │  │ simulated       │  │ compensate, record     │    │
//! │  └──────────────┘  └─────────────────┘  └────────────────────────┘    │
//! │                                                                         │
//! │  ┌──────────────┐  ┌─────────────────┐  ┌────────────────────────┐    │
//! │  │ AccountSvc   │  │   ShopConfig    │  │     CheckoutError      │    │
//! │  │ registration │  │ env + operator  │  │ domain vs persistence  │    │
//! │  └──────────────┘  └─────────────────┘  └────────────────────────┘    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//! ```rust,ignore
//! let config = ShopConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let cart = CartManager::new(db.clone());
//! cart.add_item(&customer_id, &product_id, 2, "M").await?;
//!
//! let checkout = CheckoutService::new(db, PaymentGateway::new());
//! let outcome = checkout.place_order(request).await?;
//! ```

pub mod accounts;
pub mod cart;
pub mod checkout;
pub mod config;
pub mod error;
pub mod payment;

pub use accounts::AccountService;
pub use cart::{CartManager, CartView};
pub use checkout::{CheckoutOutcome, CheckoutRequest, CheckoutService};
pub use config::{OperatorCredential, ShopConfig};
pub use error::{CheckoutError, CheckoutResult};
pub use payment::{CardAuthorization, CardDetails, PaymentGateway, PixCharge};
