//! Internal service-to-service handlers.
//!
//! Platform services provision accounts and record usage debits through
//! this surface; both endpoints require the service API key.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use ledger_core::CreditAccount;
use ledger_store::{Store, StoreError};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// Account response.
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    /// User ID.
    pub user_id: String,
    /// Current balance in cents.
    pub balance_cents: i64,
    /// Balance formatted as dollars.
    pub display_balance: String,
    /// Lifetime purchased in cents.
    pub lifetime_purchased_cents: i64,
    /// Lifetime granted in cents.
    pub lifetime_granted_cents: i64,
    /// Lifetime used in cents.
    pub lifetime_used_cents: i64,
    /// Number of usage entries recorded.
    pub usage_count: u64,
    /// Created timestamp.
    pub created_at: String,
}

impl From<&CreditAccount> for AccountResponse {
    fn from(account: &CreditAccount) -> Self {
        Self {
            user_id: account.user_id.to_string(),
            balance_cents: account.balance_cents,
            display_balance: format!("${:.2}", account.balance_cents as f64 / 100.0),
            lifetime_purchased_cents: account.lifetime_purchased_cents,
            lifetime_granted_cents: account.lifetime_granted_cents,
            lifetime_used_cents: account.lifetime_used_cents,
            usage_count: account.usage_count,
            created_at: account.created_at.to_rfc3339(),
        }
    }
}

/// Provision account request.
#[derive(Debug, Deserialize)]
pub struct ProvisionAccountRequest {
    /// The user to provision an account for.
    pub user_id: String,
}

/// Provision a credit account with the signup bonus.
pub async fn provision_account(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<ProvisionAccountRequest>,
) -> Result<Json<AccountResponse>, ApiError> {
    let user_id = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let account = CreditAccount::with_signup_bonus(user_id);
    state.store.create_account(&account)?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %user_id,
        balance_cents = %account.balance_cents,
        "Account provisioned"
    );

    Ok(Json(AccountResponse::from(&account)))
}

/// Usage debit request from services.
#[derive(Debug, Deserialize)]
pub struct RecordUsageRequest {
    /// User ID being charged.
    pub user_id: String,
    /// Cost in cents to debit.
    pub amount_cents: i64,
    /// Optional reference describing the usage (shown in history).
    pub reference: Option<String>,
}

/// Usage debit response.
#[derive(Debug, Serialize)]
pub struct RecordUsageResponse {
    /// Whether the debit was applied.
    pub success: bool,
    /// New balance after the debit.
    pub balance_cents: i64,
    /// Amount debited.
    pub amount_cents: i64,
    /// The ledger entry that was written.
    pub entry_id: String,
}

/// Record a usage debit against an account.
///
/// The sufficiency check and the ledger append are atomic with the debit;
/// an insufficient balance rejects the whole operation.
pub async fn record_usage(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<RecordUsageRequest>,
) -> Result<Json<RecordUsageResponse>, ApiError> {
    let user_id = body
        .user_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid user ID".into()))?;

    let (account, entry) = state
        .store
        .debit(&user_id, body.amount_cents, body.reference.clone())
        .map_err(|e| match e {
            StoreError::NotFound => ApiError::NotFound("Account not found".into()),
            other => other.into(),
        })?;

    tracing::info!(
        service = %auth.service_name,
        user_id = %user_id,
        amount_cents = %body.amount_cents,
        new_balance = %account.balance_cents,
        entry_id = %entry.id,
        "Usage recorded"
    );

    Ok(Json(RecordUsageResponse {
        success: true,
        balance_cents: account.balance_cents,
        amount_cents: entry.amount_cents,
        entry_id: entry.id.to_string(),
    }))
}
