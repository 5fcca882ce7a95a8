//! # Pipeline Configuration
//!
//! Environment-driven configuration with sensible defaults.
//!
//! ## Environment Variables
//! ```text
//! SHOP_DATABASE_PATH           Path to the SQLite file   (default: ./shop.db)
//! SHOP_DB_MAX_CONNECTIONS      Pool size                 (default: 5)
//! SHOP_DB_TIMEOUT_SECS         Uniform operation timeout (default: 5)
//! SHOP_OPERATOR_EMAIL          Privileged operator login (no default)
//! SHOP_OPERATOR_PASSWORD_HASH  Argon2 hash of their pass (no default)
//! ```
//!
//! The operator credential has NO baked-in fallback: when the two
//! operator variables are absent, the deployment simply has no
//! privileged role. The hash variable carries an argon2 PHC string,
//! never a plaintext password.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::accounts::verify_password;
use crate::error::{CheckoutError, CheckoutResult};
use shop_db::DbConfig;

// =============================================================================
// Operator Credential
// =============================================================================

/// The privileged operator identity, loaded from the environment.
#[derive(Debug, Clone)]
pub struct OperatorCredential {
    pub email: String,
    password_hash: String,
}

impl OperatorCredential {
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>) -> Self {
        OperatorCredential {
            email: email.into(),
            password_hash: password_hash.into(),
        }
    }

    /// Checks a login attempt against the configured credential.
    ///
    /// Email comparison is case-insensitive; the password is verified
    /// against the stored argon2 hash.
    pub fn verify(&self, email: &str, password: &str) -> bool {
        self.email.eq_ignore_ascii_case(email.trim()) && verify_password(password, &self.password_hash)
    }
}

// =============================================================================
// Shop Config
// =============================================================================

/// Top-level configuration for the pipeline.
#[derive(Debug, Clone)]
pub struct ShopConfig {
    /// Where the SQLite database lives.
    pub database_path: PathBuf,

    /// Pool size for the store connections.
    pub max_connections: u32,

    /// The single timeout applied to every store operation.
    pub operation_timeout: Duration,

    /// Privileged operator, when the deployment configures one.
    pub operator: Option<OperatorCredential>,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            database_path: PathBuf::from("./shop.db"),
            max_connections: 5,
            operation_timeout: Duration::from_secs(5),
            operator: None,
        }
    }
}

impl ShopConfig {
    /// Loads configuration from environment variables.
    ///
    /// Absent variables fall back to defaults; malformed numeric values
    /// are an error rather than a silent fallback.
    pub fn load() -> CheckoutResult<Self> {
        let mut config = ShopConfig::default();

        if let Ok(path) = env::var("SHOP_DATABASE_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Ok(raw) = env::var("SHOP_DB_MAX_CONNECTIONS") {
            config.max_connections = raw.parse().map_err(|_| {
                CheckoutError::Config(format!("SHOP_DB_MAX_CONNECTIONS is not a number: {raw}"))
            })?;
        }

        if let Ok(raw) = env::var("SHOP_DB_TIMEOUT_SECS") {
            let secs: u64 = raw.parse().map_err(|_| {
                CheckoutError::Config(format!("SHOP_DB_TIMEOUT_SECS is not a number: {raw}"))
            })?;
            config.operation_timeout = Duration::from_secs(secs);
        }

        config.operator = match (
            env::var("SHOP_OPERATOR_EMAIL"),
            env::var("SHOP_OPERATOR_PASSWORD_HASH"),
        ) {
            (Ok(email), Ok(hash)) => {
                info!(operator = %email, "Operator role configured");
                Some(OperatorCredential::new(email, hash))
            }
            (Ok(_), Err(_)) | (Err(_), Ok(_)) => {
                warn!("Only one operator variable set; operator role disabled");
                None
            }
            (Err(_), Err(_)) => None,
        };

        info!(
            database_path = %config.database_path.display(),
            timeout_secs = config.operation_timeout.as_secs(),
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Derives the store configuration from this config.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .operation_timeout(self.operation_timeout)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accounts::hash_password;

    #[test]
    fn test_defaults() {
        let config = ShopConfig::default();

        assert_eq!(config.database_path, PathBuf::from("./shop.db"));
        assert_eq!(config.operation_timeout, Duration::from_secs(5));
        assert!(config.operator.is_none());
    }

    #[test]
    fn test_db_config_carries_the_uniform_timeout() {
        let config = ShopConfig {
            operation_timeout: Duration::from_secs(3),
            ..ShopConfig::default()
        };

        let db_config = config.db_config();
        assert_eq!(db_config.operation_timeout, Duration::from_secs(3));
        assert_eq!(db_config.max_connections, 5);
    }

    #[test]
    fn test_operator_verify() {
        let hash = hash_password("s3cret-operator").unwrap();
        let operator = OperatorCredential::new("ops@example.com", hash);

        assert!(operator.verify("ops@example.com", "s3cret-operator"));
        assert!(operator.verify("OPS@example.com", "s3cret-operator"));
        assert!(!operator.verify("ops@example.com", "wrong"));
        assert!(!operator.verify("other@example.com", "s3cret-operator"));
    }
}
