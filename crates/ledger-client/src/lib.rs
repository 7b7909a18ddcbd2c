//! Credit Ledger Client SDK.
//!
//! This crate provides a client library for services to interact with the
//! ledger API: provisioning accounts and recording usage debits.
//!
//! # Example
//!
//! ```no_run
//! use ledger_client::{ClientOptions, LedgerClient};
//!
//! # async fn example() -> Result<(), ledger_client::ClientError> {
//! let client = LedgerClient::with_options(
//!     "http://ledger.billing-system.svc:8080",
//!     "your-service-api-key",
//!     ClientOptions::with_service_name("chat-runtime"),
//! );
//!
//! // Provision an account for a new user (grants the signup bonus)
//! let account = client.provision_account("user-uuid").await?;
//! println!("Starting balance: {} cents", account.balance_cents);
//!
//! // Debit credits for usage
//! let usage = client
//!     .record_usage("user-uuid", 120, Some("message:abc".to_string()))
//!     .await?;
//! println!("New balance: {} cents", usage.balance_cents);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, LedgerClient};
pub use error::ClientError;
pub use types::*;
