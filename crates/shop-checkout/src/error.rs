//! # Pipeline Error Types
//!
//! The error surface the external host sees.
//!
//! ## Two Kinds of Failure
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Error Classification                                │
//! │                                                                         │
//! │  Domain (user-visible)          Persistence (infrastructure)           │
//! │  ──────────────────────         ─────────────────────────────          │
//! │  InsufficientStock              ConnectionFailed                       │
//! │  PaymentDeclined / InvalidCard  PoolExhausted                          │
//! │  InvalidSelection               QueryFailed                            │
//! │  ProductNotFound, ...           MigrationFailed                        │
//! │                                                                         │
//! │  Rendered as messages to the    Logged, surfaced as a generic          │
//! │  customer by the host           failure by the host                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use shop_core::{CoreError, ValidationError};
use shop_db::DbError;

/// Errors produced by the checkout pipeline.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// A business rule failed. Safe to show to the customer.
    #[error(transparent)]
    Domain(#[from] CoreError),

    /// A store operation failed for infrastructure reasons.
    #[error("Storage failure: {0}")]
    Persistence(#[source] DbError),

    /// Credential hashing or verification failed internally.
    #[error("Credential processing failed: {0}")]
    Credential(String),

    /// Configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CheckoutError {
    /// Whether the host may show this error's message to the customer.
    ///
    /// Domain errors carry customer-facing text; everything else should
    /// be logged and replaced with a generic failure message.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, CheckoutError::Domain(_))
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Domain(CoreError::Validation(err))
    }
}

/// Database errors cross into the pipeline as infrastructure failures.
///
/// The domain-shaped cases (insufficient stock, missing entities,
/// duplicate keys) are translated at the call sites that know the
/// context; anything reaching this blanket conversion is treated as an
/// infrastructure fault.
impl From<DbError> for CheckoutError {
    fn from(err: DbError) -> Self {
        CheckoutError::Persistence(err)
    }
}

/// Result type for pipeline operations.
pub type CheckoutResult<T> = Result<T, CheckoutError>;
