//! Credit account types.
//!
//! This module defines the per-user credit account and the fixed money
//! policy constants (top-up denomination, signup bonus, paging bounds).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::UserId;

// ============================================================================
// Constants
// ============================================================================

/// Fixed checkout top-up denomination in cents ($10).
///
/// Checkout always sells exactly this amount; the value is never taken from
/// client input.
pub const TOPUP_AMOUNT_CENTS: i64 = 1000;

/// Signup bonus granted when an account is first provisioned, in cents ($5).
pub const SIGNUP_BONUS_CENTS: i64 = 500;

/// Maximum page size for history listings.
pub const MAX_PAGE_SIZE: usize = 100;

/// Default page size for history listings when the caller does not ask.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// A credit account for a user.
///
/// The account tracks the spendable balance plus lifetime counters used for
/// usage statistics. Balances are integer cents (1 credit = $0.01) to avoid
/// floating point precision issues.
///
/// The balance is never negative. All mutations go through the storage
/// layer's atomic guard; this type carries no mutation logic of its own
/// beyond construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditAccount {
    /// The user this account belongs to (1:1).
    pub user_id: UserId,

    /// Current spendable balance in cents. Never negative.
    pub balance_cents: i64,

    /// Lifetime credits purchased through checkout (in cents).
    pub lifetime_purchased_cents: i64,

    /// Lifetime credits granted outside purchases, e.g. the signup bonus (in cents).
    pub lifetime_granted_cents: i64,

    /// Lifetime credits debited for usage (in cents).
    pub lifetime_used_cents: i64,

    /// Number of usage debits applied over the account's lifetime.
    pub usage_count: u64,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CreditAccount {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance_cents: 0,
            lifetime_purchased_cents: 0,
            lifetime_granted_cents: 0,
            lifetime_used_cents: 0,
            usage_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a freshly provisioned account carrying the signup bonus.
    #[must_use]
    pub fn with_signup_bonus(user_id: UserId) -> Self {
        let mut account = Self::new(user_id);
        account.balance_cents = SIGNUP_BONUS_CENTS;
        account.lifetime_granted_cents = SIGNUP_BONUS_CENTS;
        account
    }

    /// Check if the account can cover a debit of `amount_cents`.
    #[must_use]
    pub fn has_sufficient_funds(&self, amount_cents: i64) -> bool {
        self.balance_cents >= amount_cents
    }
}
