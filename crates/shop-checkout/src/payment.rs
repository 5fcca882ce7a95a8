//! # Simulated Payment Gateway
//!
//! Card authorization and pix charge generation, simulated end to end.
//! Nothing here talks to a real processor; the rules exist so the rest
//! of the pipeline can exercise every payment outcome deterministically.
//!
//! ## Card Decision Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    authorize_card(number, ...)                          │
//! │                                                                         │
//! │  "4111 1111 1111 1111"                                                 │
//! │        │ strip spaces                                                   │
//! │        ▼                                                                │
//! │  "4111111111111111"                                                    │
//! │        │                                                                │
//! │        ├── fewer than 16 chars ──────────► InvalidCard                 │
//! │        ├── ends with "0000" ─────────────► PaymentDeclined             │
//! │        └── otherwise ────────────────────► authorized                  │
//! │                                                                         │
//! │  No network, no retries, no side effects. Declines leave nothing       │
//! │  behind to clean up.                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::CheckoutResult;
use shop_core::{CoreError, ValidationError, MIN_CARD_DIGITS};

// =============================================================================
// Request / Response Types
// =============================================================================

/// Card details supplied by the customer at checkout.
///
/// Held only for the duration of the authorization call; never persisted
/// and never logged.
#[derive(Debug, Clone, Deserialize)]
pub struct CardDetails {
    pub number: String,
    pub holder: String,
    pub cvv: String,
}

/// A successful card authorization.
#[derive(Debug, Clone, Serialize)]
pub struct CardAuthorization {
    /// Opaque authorization reference, unique per charge.
    pub reference: String,
    /// Amount authorized, in cents.
    pub amount_cents: i64,
}

/// A generated pix charge.
///
/// The customer pays out-of-band; the order stays `awaiting_payment`
/// until the external confirmation arrives.
#[derive(Debug, Clone, Serialize)]
pub struct PixCharge {
    /// EMV-style copy-and-paste payload.
    pub code: String,
    /// Data-URI reference standing in for the QR image.
    pub image_ref: String,
    /// Amount to be paid, in cents.
    pub amount_cents: i64,
}

// =============================================================================
// Gateway
// =============================================================================

/// The simulated payment authorizer.
///
/// Stateless; one instance serves every concurrent checkout.
#[derive(Debug, Clone, Default)]
pub struct PaymentGateway;

impl PaymentGateway {
    pub fn new() -> Self {
        PaymentGateway
    }

    /// Authorizes a card charge.
    ///
    /// ## Rules
    /// 1. Holder and CVV must be present.
    /// 2. Spaces are stripped from the number; fewer than 16 remaining
    ///    characters fail as `InvalidCard`.
    /// 3. A number ending in `0000` is declined (`PaymentDeclined`).
    /// 4. Anything else is authorized.
    ///
    /// The amount plays no role in the decision; it is only echoed back
    /// on the authorization.
    pub fn authorize_card(
        &self,
        card: &CardDetails,
        amount_cents: i64,
    ) -> CheckoutResult<CardAuthorization> {
        if card.holder.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "card holder".to_string(),
            }
            .into());
        }
        if card.cvv.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "cvv".to_string(),
            }
            .into());
        }

        let cleaned: String = card.number.chars().filter(|c| *c != ' ').collect();

        if cleaned.len() < MIN_CARD_DIGITS {
            debug!("Card rejected: too short after stripping spaces");
            return Err(CoreError::InvalidCard.into());
        }

        if cleaned.ends_with("0000") {
            warn!(amount_cents, "Card declined by authorizer");
            return Err(CoreError::PaymentDeclined.into());
        }

        let authorization = CardAuthorization {
            reference: format!("AUTH-{}", Uuid::new_v4()),
            amount_cents,
        };

        info!(
            reference = %authorization.reference,
            amount_cents,
            "Card authorized"
        );

        Ok(authorization)
    }

    /// Generates a pix charge for the given amount.
    ///
    /// The payload follows the EMV copy-and-paste shape; the image
    /// reference is a data URI wrapping the payload, standing in for a
    /// rendered QR code. Generation never confirms payment.
    pub fn generate_pix_code(&self, amount_cents: i64) -> PixCharge {
        let txid = Uuid::new_v4().simple().to_string();
        let amount = format!("{}.{:02}", amount_cents / 100, amount_cents % 100);

        // EMV "merchant account information" with the BR Central Bank
        // pix GUI, amount field 54, country/merchant fields, CRC stub.
        let code = format!(
            "00020126580014BR.GOV.BCB.PIX0136{txid}520400005303986\
             54{:02}{amount}5802BR5913Loja Virtual6009Sao Paulo62070503***6304ABCD",
            amount.len(),
        );

        let image_ref = format!("data:image/png;base64,{}", BASE64.encode(code.as_bytes()));

        info!(amount_cents, "Pix charge generated");

        PixCharge {
            code,
            image_ref,
            amount_cents,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
