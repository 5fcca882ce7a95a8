//! # Validation Module
//!
//! Input validation utilities for the checkout pipeline.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: External host (forms, routing)                               │
//! │  ├── Basic format checks before the pipeline is called                 │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Pipeline entry (Rust)                                        │
//! │  └── THIS MODULE: business rule validation                             │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── NOT NULL constraints                                              │
//! │  ├── UNIQUE constraints, CHECK (stock >= 0)                            │
//! │  └── Foreign key constraints                                           │
//! │                                                                         │
//! │  Defense in depth: multiple layers catch different errors              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Numeric Validators
// =============================================================================

/// Normalizes an add-to-cart quantity.
///
/// A quantity below 1 becomes 1 rather than an error: the storefront's
/// quantity field defaults to "one of these, please" when the caller
/// sends zero or garbage.
///
/// ## Example
/// ```rust
/// use shop_core::validation::normalize_quantity;
///
/// assert_eq!(normalize_quantity(0), 1);
/// assert_eq!(normalize_quantity(-5), 1);
/// assert_eq!(normalize_quantity(3), 3);
/// ```
#[inline]
pub const fn normalize_quantity(qty: i64) -> i64 {
    if qty < 1 {
        1
    } else {
        qty
    }
}

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates cart size (number of distinct lines).
///
/// ## Rules
/// - Must not exceed MAX_CART_LINES (100)
pub fn validate_cart_size(current_lines: usize) -> ValidationResult<()> {
    if current_lines >= MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "cart lines".to_string(),
            min: 0,
            max: MAX_CART_LINES as i64,
        });
    }

    Ok(())
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates an email address, loosely.
///
/// ## Rules
/// - Must not be empty
/// - Must contain exactly one `@` with non-empty local and domain parts
/// - Maximum 254 characters
///
/// Deliberately not RFC 5322. The mail provider is the real validator;
/// this just rejects obviously broken input before it lands on an order.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::Required {
            field: "email".to_string(),
        });
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(ValidationError::InvalidFormat {
            field: "email".to_string(),
            reason: "must look like name@domain.tld".to_string(),
        });
    }

    Ok(())
}

/// Validates a size label against a product's declared set.
///
/// ## Rules
/// - Empty label is always fine (products without variants)
/// - A non-empty label on a product with declared sizes must be in the set
/// - A non-empty label on a product without sizes is rejected
pub fn validate_size_label(label: &str, declared: &[String]) -> ValidationResult<()> {
    if label.is_empty() {
        return Ok(());
    }

    if declared.iter().any(|s| s == label) {
        return Ok(());
    }

    Err(ValidationError::NotAllowed {
        field: "size".to_string(),
        allowed: declared.to_vec(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_quantity() {
        assert_eq!(normalize_quantity(-10), 1);
        assert_eq!(normalize_quantity(0), 1);
        assert_eq!(normalize_quantity(1), 1);
        assert_eq!(normalize_quantity(42), 42);
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());

        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_cart_size() {
        assert!(validate_cart_size(0).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES - 1).is_ok());
        assert!(validate_cart_size(MAX_CART_LINES).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ana@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("two@@example.com").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ana@nodot").is_err());
    }

    #[test]
    fn test_validate_size_label() {
        let declared = vec!["P".to_string(), "M".to_string(), "G".to_string()];

        assert!(validate_size_label("", &declared).is_ok());
        assert!(validate_size_label("M", &declared).is_ok());
        assert!(validate_size_label("GG", &declared).is_err());
        assert!(validate_size_label("M", &[]).is_err());
    }
}
