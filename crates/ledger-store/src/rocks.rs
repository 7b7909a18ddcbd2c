//! `RocksDB` storage implementation.
//!
//! This module provides the `RocksStore` implementation of the `Store` trait.
//!
//! All mutations run inside pessimistic transactions: the record being
//! changed is first read with `get_for_update_cf`, which takes an exclusive
//! row lock until commit. Two concurrent debits on one account therefore
//! serialize, and the sufficiency check can never pass against a stale
//! balance. Intent transitions use the same lock to make
//! "set terminal status if still pending" a single atomic step.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, MultiThreaded, Options,
    TransactionDB, TransactionDBOptions,
};

use ledger_core::{
    CreditAccount, IntentStatus, IntentTransition, PurchaseIntent, UsageEntry, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::Store;

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<TransactionDB<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let txn_opts = TransactionDBOptions::default();

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = TransactionDB::open_cf_descriptors(&opts, &txn_opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Transition an intent to a terminal status if it is still pending.
    ///
    /// The intent record is locked for the duration of the transaction, so
    /// exactly one caller ever observes `pending` and flips it; everyone else
    /// gets `applied = false` with the terminal record.
    fn transition_intent(
        &self,
        gateway_session_id: &str,
        target: IntentStatus,
    ) -> Result<IntentTransition> {
        let cf = self.cf(cf::PURCHASE_INTENTS)?;
        let key = keys::intent_key(gateway_session_id);

        let txn = self.db.transaction();
        let data = txn
            .get_for_update_cf(&cf, &key, true)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .ok_or(StoreError::NotFound)?;
        let mut intent: PurchaseIntent = Self::deserialize(&data)?;

        if !intent.status.is_pending() {
            // Already terminal; dropping the transaction releases the lock.
            return Ok(IntentTransition {
                applied: false,
                intent,
            });
        }

        intent.status = target;
        intent.updated_at = chrono::Utc::now();

        let value = Self::serialize(&intent)?;
        txn.put_cf(&cf, &key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(IntentTransition {
            applied: true,
            intent,
        })
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(&self, account: &CreditAccount) -> Result<()> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(&account.user_id);

        let txn = self.db.transaction();
        let existing = txn
            .get_for_update_cf(&cf, &key, true)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if existing.is_some() {
            return Err(StoreError::AccountExists {
                user_id: account.user_id.to_string(),
            });
        }

        let value = Self::serialize(account)?;
        txn.put_cf(&cf, &key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn credit(&self, user_id: &UserId, amount_cents: i64) -> Result<CreditAccount> {
        if amount_cents <= 0 {
            return Err(StoreError::InvalidAmount { amount_cents });
        }

        let cf = self.cf(cf::ACCOUNTS)?;
        let key = keys::account_key(user_id);

        let txn = self.db.transaction();
        let data = txn
            .get_for_update_cf(&cf, &key, true)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .ok_or(StoreError::NotFound)?;
        let mut account: CreditAccount = Self::deserialize(&data)?;

        account.balance_cents += amount_cents;
        account.lifetime_purchased_cents += amount_cents;
        account.updated_at = chrono::Utc::now();

        let value = Self::serialize(&account)?;
        txn.put_cf(&cf, &key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(account)
    }

    fn debit(
        &self,
        user_id: &UserId,
        amount_cents: i64,
        reference: Option<String>,
    ) -> Result<(CreditAccount, UsageEntry)> {
        if amount_cents <= 0 {
            return Err(StoreError::InvalidAmount { amount_cents });
        }

        let cf_accounts = self.cf(cf::ACCOUNTS)?;
        let cf_entries = self.cf(cf::USAGE_ENTRIES)?;
        let cf_by_user = self.cf(cf::USAGE_ENTRIES_BY_USER)?;
        let account_key = keys::account_key(user_id);

        let txn = self.db.transaction();
        let data = txn
            .get_for_update_cf(&cf_accounts, &account_key, true)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .ok_or(StoreError::NotFound)?;
        let mut account: CreditAccount = Self::deserialize(&data)?;

        if account.balance_cents < amount_cents {
            return Err(StoreError::InsufficientFunds {
                balance_cents: account.balance_cents,
                required_cents: amount_cents,
            });
        }

        account.balance_cents -= amount_cents;
        account.lifetime_used_cents += amount_cents;
        account.usage_count += 1;
        account.updated_at = chrono::Utc::now();

        let entry = UsageEntry::new(*user_id, amount_cents, account.balance_cents, reference);

        let account_value = Self::serialize(&account)?;
        let entry_value = Self::serialize(&entry)?;

        // The decrement and the ledger append commit together.
        txn.put_cf(&cf_accounts, &account_key, account_value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.put_cf(&cf_entries, keys::entry_key(&entry.id), entry_value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.put_cf(&cf_by_user, keys::user_entry_key(user_id, &entry.id), [])
            .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok((account, entry))
    }

    // =========================================================================
    // Purchase Intent Operations
    // =========================================================================

    fn create_intent(&self, intent: &PurchaseIntent) -> Result<()> {
        let cf_intents = self.cf(cf::PURCHASE_INTENTS)?;
        let cf_by_user = self.cf(cf::PURCHASE_INTENTS_BY_USER)?;
        let session_key = keys::intent_key(&intent.gateway_session_id);

        let txn = self.db.transaction();
        let existing = txn
            .get_for_update_cf(&cf_intents, &session_key, true)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        if existing.is_some() {
            return Err(StoreError::SessionExists {
                session_id: intent.gateway_session_id.clone(),
            });
        }

        let value = Self::serialize(intent)?;
        txn.put_cf(&cf_intents, &session_key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        // Index value carries the session-id key of the primary record.
        txn.put_cf(
            &cf_by_user,
            keys::user_intent_key(&intent.user_id, &intent.id),
            &session_key,
        )
        .map_err(|e| StoreError::Database(e.to_string()))?;
        txn.commit()
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    fn get_intent(&self, gateway_session_id: &str) -> Result<Option<PurchaseIntent>> {
        let cf = self.cf(cf::PURCHASE_INTENTS)?;
        let key = keys::intent_key(gateway_session_id);

        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    fn mark_completed_if_pending(&self, gateway_session_id: &str) -> Result<IntentTransition> {
        self.transition_intent(gateway_session_id, IntentStatus::Completed)
    }

    fn mark_failed_if_pending(&self, gateway_session_id: &str) -> Result<IntentTransition> {
        self.transition_intent(gateway_session_id, IntentStatus::Failed)
    }

    fn list_intents_by_user(&self, user_id: &UserId, limit: usize) -> Result<Vec<PurchaseIntent>> {
        let cf_by_user = self.cf(cf::PURCHASE_INTENTS_BY_USER)?;
        let cf_intents = self.cf(cf::PURCHASE_INTENTS)?;
        let prefix = keys::user_intents_prefix(user_id);

        // Collect matching index entries, then reverse: ULID suffixes make
        // forward order oldest-first.
        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut session_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            session_keys.push(value.to_vec());
        }

        session_keys.reverse();

        let mut intents = Vec::new();
        for session_key in session_keys {
            if intents.len() >= limit {
                break;
            }

            let data = self
                .db
                .get_cf(&cf_intents, &session_key)
                .map_err(|e| StoreError::Database(e.to_string()))?;
            match data {
                Some(data) => intents.push(Self::deserialize(&data)?),
                None => {
                    tracing::warn!(
                        user_id = %user_id,
                        session_key = %String::from_utf8_lossy(&session_key),
                        "intent index points at missing record"
                    );
                }
            }
        }

        Ok(intents)
    }

    // =========================================================================
    // Usage Ledger Operations
    // =========================================================================

    fn list_usage_by_user(&self, user_id: &UserId, limit: usize) -> Result<Vec<UsageEntry>> {
        let cf_by_user = self.cf(cf::USAGE_ENTRIES_BY_USER)?;
        let cf_entries = self.cf(cf::USAGE_ENTRIES)?;
        let prefix = keys::user_entries_prefix(user_id);

        let iter = self.db.iterator_cf(
            &cf_by_user,
            IteratorMode::From(&prefix, Direction::Forward),
        );

        let mut index_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;

            if !key.starts_with(&prefix) {
                break;
            }

            index_keys.push(key.to_vec());
        }

        index_keys.reverse();

        let mut entries = Vec::new();
        for key in index_keys {
            if entries.len() >= limit {
                break;
            }

            let entry_id = keys::extract_entry_id_from_user_key(&key);
            let data = self
                .db
                .get_cf(&cf_entries, keys::entry_key(&entry_id))
                .map_err(|e| StoreError::Database(e.to_string()))?;
            match data {
                Some(data) => entries.push(Self::deserialize(&data)?),
                None => {
                    tracing::warn!(
                        user_id = %user_id,
                        entry_id = %entry_id,
                        "usage index points at missing record"
                    );
                }
            }
        }

        Ok(entries)
    }
}
