//! Purchase intent types and the checkout state machine.
//!
//! A purchase intent is the durable record of one initiated checkout. It is
//! correlated with the payment gateway by the session id the gateway issued,
//! and moves through a tiny state machine:
//!
//! ```text
//! pending ──payment completed──▶ completed   (terminal)
//!    └──────session expired────▶ failed      (terminal)
//! ```
//!
//! At most one transition out of `pending` ever succeeds. That single
//! conditional transition is the idempotency gate for webhook processing:
//! a redelivered event finds the intent already terminal and applies nothing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{IntentId, UserId};

/// A purchase intent: one initiated checkout and its lifecycle status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseIntent {
    /// Unique intent ID (ULID for time-ordering).
    pub id: IntentId,

    /// The user who initiated the checkout.
    pub user_id: UserId,

    /// Amount of credits being purchased, in cents. Always the fixed
    /// server-side denomination.
    pub amount_cents: i64,

    /// Session id issued by the payment gateway. Unique across all intents;
    /// webhook events are correlated through it.
    pub gateway_session_id: String,

    /// Current lifecycle status.
    pub status: IntentStatus,

    /// When the checkout was initiated.
    pub created_at: DateTime<Utc>,

    /// When the status last changed.
    pub updated_at: DateTime<Utc>,
}

impl PurchaseIntent {
    /// Create a new pending intent for a freshly created gateway session.
    #[must_use]
    pub fn pending(user_id: UserId, amount_cents: i64, gateway_session_id: String) -> Self {
        let now = Utc::now();
        Self {
            id: IntentId::generate(),
            user_id,
            amount_cents,
            gateway_session_id,
            status: IntentStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Lifecycle status of a purchase intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentStatus {
    /// Checkout initiated, no terminal gateway event applied yet.
    Pending,

    /// A successful-payment event was applied. Credits were granted on the
    /// transition into this state, exactly once.
    Completed,

    /// The session expired or was canceled. No credits were granted.
    Failed,
}

impl IntentStatus {
    /// Check if this status admits no further transitions.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Check if a terminal transition is still possible.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    /// Stable lowercase name, used in API responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

/// Outcome of a conditional intent transition.
///
/// `applied` is true only for the call that actually flipped the intent out
/// of `pending`; every later call for the same session observes the terminal
/// status and gets `applied = false`.
#[derive(Debug, Clone)]
pub struct IntentTransition {
    /// Whether this call performed the transition.
    pub applied: bool,

    /// The intent after the call (terminal status either way).
    pub intent: PurchaseIntent,
}
