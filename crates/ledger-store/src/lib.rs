//! `RocksDB` storage layer for the credit ledger.
//!
//! This crate provides persistent storage for credit accounts, purchase
//! intents, and the usage ledger, using `RocksDB` with column families for
//! indexing and pessimistic transactions for atomicity.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: Primary account records, keyed by `user_id`
//! - `purchase_intents`: Intents keyed by `gateway_session_id` (uniqueness)
//! - `purchase_intents_by_user`: Index for listing intents by user
//! - `usage_entries`: Usage ledger entries, keyed by `entry_id` (ULID)
//! - `usage_entries_by_user`: Index for listing entries by user
//!
//! Every mutation locks the record it changes (`get_for_update`) inside a
//! transaction, so balance checks and intent-status checks can never race
//! with a concurrent writer.
//!
//! # Example
//!
//! ```no_run
//! use ledger_store::{RocksStore, Store};
//! use ledger_core::{CreditAccount, UserId};
//!
//! let store = RocksStore::open("/tmp/ledger-db").unwrap();
//!
//! // Provision an account with the signup bonus
//! let user_id = UserId::generate();
//! store
//!     .create_account(&CreditAccount::with_signup_bonus(user_id))
//!     .unwrap();
//!
//! // Spend some credits
//! let (account, _entry) = store.debit(&user_id, 100, None).unwrap();
//! assert!(account.balance_cents >= 0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod keys;
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use rocks::RocksStore;

use ledger_core::{CreditAccount, IntentTransition, PurchaseIntent, UsageEntry, UserId};

/// The storage trait defining all database operations.
///
/// This trait abstracts the storage layer, allowing for different
/// implementations (e.g., `RocksDB`, in-memory for testing).
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Create a new account record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AccountExists` if the user already has an
    /// account, or an error if the database operation fails.
    fn create_account(&self, account: &CreditAccount) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>>;

    /// Atomically add purchased credits to an account.
    ///
    /// Returns the updated account. The signup bonus is granted at
    /// provisioning, not through this path.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `amount_cents` is not positive.
    /// - `StoreError::NotFound` if the account doesn't exist.
    fn credit(&self, user_id: &UserId, amount_cents: i64) -> Result<CreditAccount>;

    /// Atomically debit an account and append the usage ledger entry.
    ///
    /// The sufficiency check, the decrement, the lifetime counters, and the
    /// ledger append all commit in one transaction. Returns the updated
    /// account and the entry that was written.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `amount_cents` is not positive.
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InsufficientFunds` if the balance cannot cover the
    ///   debit; the balance is left unchanged.
    fn debit(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        reference: Option<String>,
    ) -> Result<(CreditAccount, UsageEntry)>;

    // =========================================================================
    // Purchase Intent Operations
    // =========================================================================

    /// Create a new purchase intent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::SessionExists` if an intent already exists for
    /// this gateway session, or an error if the database operation fails.
    fn create_intent(&self, intent: &PurchaseIntent) -> Result<()>;

    /// Get a purchase intent by gateway session ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_intent(&self, gateway_session_id: &str) -> Result<Option<PurchaseIntent>>;

    /// Transition an intent `pending → completed` if it is still pending.
    ///
    /// `applied` is true only for the call that performed the transition;
    /// duplicate deliveries observe the terminal record and get false.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no intent exists for the session.
    fn mark_completed_if_pending(&self, gateway_session_id: &str) -> Result<IntentTransition>;

    /// Transition an intent `pending → failed` if it is still pending.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if no intent exists for the session.
    fn mark_failed_if_pending(&self, gateway_session_id: &str) -> Result<IntentTransition>;

    /// List intents for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_intents_by_user(&self, user_id: &UserId, limit: usize) -> Result<Vec<PurchaseIntent>>;

    // =========================================================================
    // Usage Ledger Operations
    // =========================================================================

    /// List usage entries for a user, ordered by time (newest first).
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_usage_by_user(&self, user_id: &UserId, limit: usize) -> Result<Vec<UsageEntry>>;
}
