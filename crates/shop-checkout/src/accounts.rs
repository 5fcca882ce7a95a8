//! # Customer Accounts
//!
//! Registration and credential hashing. Sessions and login flows live in
//! the external host; this module only creates customer records and
//! provides the argon2 primitives the host (and the operator config)
//! verify against.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::error::{CheckoutError, CheckoutResult};
use shop_core::validation::validate_email;
use shop_core::{Customer, ValidationError};
use shop_db::{Database, DbError};

/// Minimum length accepted for a customer password.
pub const MIN_PASSWORD_CHARS: usize = 8;

// =============================================================================
// Credential Primitives
// =============================================================================

/// Hashes a plaintext credential with argon2id and a fresh salt.
pub fn hash_password(password: &str) -> CheckoutResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CheckoutError::Credential(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a plaintext credential against a stored argon2 hash.
///
/// A malformed stored hash verifies as false rather than erroring: the
/// caller is answering "may this person log in?", not debugging the column.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

// =============================================================================
// Account Service
// =============================================================================

/// Customer registration over the customer store.
#[derive(Debug, Clone)]
pub struct AccountService {
    db: Database,
}

impl AccountService {
    pub fn new(db: Database) -> Self {
        AccountService { db }
    }

    /// Registers a new customer.
    ///
    /// ## Rules
    /// - Name must be present
    /// - Email must look like an address and be unused
    /// - Password must have at least [`MIN_PASSWORD_CHARS`] characters
    ///
    /// The password is argon2-hashed before it touches the store.
    pub async fn register_customer(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> CheckoutResult<Customer> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Required {
                field: "name".to_string(),
            }
            .into());
        }

        validate_email(email)?;

        if password.chars().count() < MIN_PASSWORD_CHARS {
            return Err(ValidationError::OutOfRange {
                field: "password length".to_string(),
                min: MIN_PASSWORD_CHARS as i64,
                max: i64::MAX,
            }
            .into());
        }

        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            email: email.trim().to_lowercase(),
            password_hash: hash_password(password)?,
            created_at: Utc::now(),
        };

        match self.db.customers().create(&customer).await {
            Ok(()) => {
                info!(id = %customer.id, "Customer registered");
                Ok(customer)
            }
            Err(DbError::UniqueViolation { .. }) => Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: customer.email,
            }
            .into()),
            Err(e) => Err(e.into()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
