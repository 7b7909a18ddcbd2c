//! Core types for the credit ledger.
//!
//! This crate provides the foundational types used throughout the ledger
//! workspace:
//!
//! - **Identifiers**: `UserId`, `IntentId`, `EntryId`
//! - **Accounts**: `CreditAccount` and the money policy constants
//! - **Purchases**: `PurchaseIntent`, `IntentStatus`, `IntentTransition`
//! - **Usage**: `UsageEntry`
//!
//! # Credit Unit
//!
//! **1 credit = $0.01 (1 cent)**
//!
//! - A $10 top-up grants 1000 credits
//! - An action costing 3 cents debits 3 credits
//! - Stored as `i64` (integer cents) to avoid floating point precision issues

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod account;
pub mod ids;
pub mod intent;
pub mod usage;

pub use account::{
    CreditAccount, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, SIGNUP_BONUS_CENTS, TOPUP_AMOUNT_CENTS,
};
pub use ids::{EntryId, IdError, IntentId, UserId};
pub use intent::{IntentStatus, IntentTransition, PurchaseIntent};
pub use usage::UsageEntry;
