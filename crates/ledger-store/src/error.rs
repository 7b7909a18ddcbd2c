//! Error types for ledger storage.

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed (including lock timeouts under contention).
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Insufficient funds for a debit.
    #[error("insufficient funds: balance={balance_cents}, required={required_cents}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance_cents: i64,
        /// Required amount in cents.
        required_cents: i64,
    },

    /// An account already exists for this user.
    #[error("account already exists: {user_id}")]
    AccountExists {
        /// The user ID that already has an account.
        user_id: String,
    },

    /// A purchase intent already exists for this gateway session.
    #[error("purchase intent already exists for session: {session_id}")]
    SessionExists {
        /// The gateway session ID that was replayed.
        session_id: String,
    },

    /// An amount failed the positivity contract.
    #[error("invalid amount: {amount_cents} (must be positive)")]
    InvalidAmount {
        /// The rejected amount in cents.
        amount_cents: i64,
    },
}
