//! Credit Ledger HTTP API Service.
//!
//! This crate provides the HTTP API for the credit ledger, including:
//!
//! - Balance and usage history for end users
//! - Credit top-ups through the payment gateway's hosted checkout
//! - Payment webhook ingestion with idempotent credit application
//! - Account provisioning and usage debits for platform services
//!
//! # Authentication
//!
//! The service supports two authentication methods:
//!
//! 1. **User JWT tokens** - For end-user requests (dashboard, etc.)
//! 2. **Service API keys** - For service-to-service requests (usage debits)

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers need async for consistency

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{GatewayEvent, StripeClient, StripeError};
