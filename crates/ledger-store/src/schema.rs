//! Database schema definitions and column families.
//!
//! This module defines the column families used in `RocksDB` storage.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Primary account records, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Purchase intents, keyed by `gateway_session_id`.
    ///
    /// Keying by session id is what enforces session-id uniqueness: a second
    /// insert for the same session observes the existing record under lock.
    pub const PURCHASE_INTENTS: &str = "purchase_intents";

    /// Index: intents by user, keyed by `user_id || intent_id`.
    /// Value is the session-id key of the primary record.
    pub const PURCHASE_INTENTS_BY_USER: &str = "purchase_intents_by_user";

    /// Usage ledger entries, keyed by `entry_id` (ULID).
    pub const USAGE_ENTRIES: &str = "usage_entries";

    /// Index: usage entries by user, keyed by `user_id || entry_id`.
    /// Value is empty (the entry id is recoverable from the key).
    pub const USAGE_ENTRIES_BY_USER: &str = "usage_entries_by_user";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::PURCHASE_INTENTS,
        cf::PURCHASE_INTENTS_BY_USER,
        cf::USAGE_ENTRIES,
        cf::USAGE_ENTRIES_BY_USER,
    ]
}
