//! Usage ledger entry types.
//!
//! Usage entries are the append-only audit trail of debits. An entry is
//! written in the same atomic step as the balance decrement it records and
//! is never mutated or deleted afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{EntryId, UserId};

/// One debit against a credit account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageEntry {
    /// Unique entry ID (ULID for time-ordering).
    pub id: EntryId,

    /// The user whose balance was debited.
    pub user_id: UserId,

    /// Amount debited, in cents. Always positive.
    pub amount_cents: i64,

    /// Balance after this debit (in cents).
    pub balance_after_cents: i64,

    /// Optional reference to the action that consumed the credits
    /// (request id, feature name, etc.).
    pub reference: Option<String>,

    /// When the debit was applied.
    pub created_at: DateTime<Utc>,
}

impl UsageEntry {
    /// Create a new usage entry recording a debit.
    #[must_use]
    pub fn new(
        user_id: UserId,
        amount_cents: i64,
        balance_after_cents: i64,
        reference: Option<String>,
    ) -> Self {
        Self {
            id: EntryId::generate(),
            user_id,
            amount_cents,
            balance_after_cents,
            reference,
            created_at: Utc::now(),
        }
    }
}
