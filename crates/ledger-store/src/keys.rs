//! Key encoding utilities for `RocksDB`.
//!
//! This module provides functions for encoding and decoding keys used in column families.

use ledger_core::{EntryId, IntentId, UserId};

/// Create an account key from a user ID.
#[must_use]
pub fn account_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a purchase intent key from a gateway session ID.
#[must_use]
pub fn intent_key(gateway_session_id: &str) -> Vec<u8> {
    gateway_session_id.as_bytes().to_vec()
}

/// Create a user-intent index key.
///
/// Format: `user_id (16 bytes) || intent_id (16 bytes)`
///
/// Since ULIDs are time-ordered, intents for a user will be sorted by time.
#[must_use]
pub fn user_intent_key(user_id: &UserId, intent_id: &IntentId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&intent_id.to_bytes());
    key
}

/// Create a prefix for iterating all intents for a user.
#[must_use]
pub fn user_intents_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a usage entry key from an entry ID.
#[must_use]
pub fn entry_key(entry_id: &EntryId) -> Vec<u8> {
    entry_id.to_bytes().to_vec()
}

/// Create a user-entry index key.
///
/// Format: `user_id (16 bytes) || entry_id (16 bytes)`
#[must_use]
pub fn user_entry_key(user_id: &UserId, entry_id: &EntryId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&entry_id.to_bytes());
    key
}

/// Create a prefix for iterating all usage entries for a user.
#[must_use]
pub fn user_entries_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Extract the entry ID from a user-entry index key.
///
/// # Panics
///
/// Panics if the key is not at least 32 bytes.
#[must_use]
pub fn extract_entry_id_from_user_key(key: &[u8]) -> EntryId {
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&key[16..32]);
    EntryId::from_bytes(bytes).expect("valid ULID bytes")
}
