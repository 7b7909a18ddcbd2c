//! User-facing billing handlers: balance, usage history, checkout, purchases.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use ledger_core::{PurchaseIntent, UsageEntry, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, TOPUP_AMOUNT_CENTS};
use ledger_store::Store;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Balance in cents (1 credit = 1 cent).
    pub balance_cents: i64,
    /// Balance formatted as dollars.
    pub display_balance: String,
}

/// Get current credit balance.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Result<Json<BalanceResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(BalanceResponse {
        balance_cents: account.balance_cents,
        display_balance: format!("${:.2}", account.balance_cents as f64 / 100.0),
    }))
}

/// Paging query parameters shared by the listing endpoints.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Maximum number of items to return.
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    DEFAULT_PAGE_SIZE
}

/// A single usage ledger entry in responses.
#[derive(Debug, Serialize)]
pub struct UsageEntryResponse {
    /// Entry ID.
    pub entry_id: String,
    /// Amount debited in cents.
    pub amount_cents: i64,
    /// Balance after the debit.
    pub balance_after_cents: i64,
    /// Caller-supplied reference, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Timestamp (ISO 8601).
    pub created_at: String,
}

impl From<&UsageEntry> for UsageEntryResponse {
    fn from(entry: &UsageEntry) -> Self {
        Self {
            entry_id: entry.id.to_string(),
            amount_cents: entry.amount_cents,
            balance_after_cents: entry.balance_after_cents,
            reference: entry.reference.clone(),
            created_at: entry.created_at.to_rfc3339(),
        }
    }
}

/// Aggregate usage statistics.
#[derive(Debug, Serialize)]
pub struct UsageStats {
    /// Total debited over the account's lifetime, in cents.
    pub total_debited_cents: i64,
    /// Number of usage entries recorded.
    pub entry_count: u64,
}

/// Usage history response.
#[derive(Debug, Serialize)]
pub struct UsageHistoryResponse {
    /// Usage entries (newest first).
    pub history: Vec<UsageEntryResponse>,
    /// Aggregate statistics over the whole account, not just this page.
    pub stats: UsageStats,
}

/// Get usage history and aggregate stats.
pub async fn get_usage(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<UsageHistoryResponse>, ApiError> {
    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let limit = query.limit.min(MAX_PAGE_SIZE);
    let entries = state.store.list_usage_by_user(&auth.user_id, limit)?;

    Ok(Json(UsageHistoryResponse {
        history: entries.iter().map(UsageEntryResponse::from).collect(),
        stats: UsageStats {
            total_debited_cents: account.lifetime_used_cents,
            entry_count: account.usage_count,
        },
    }))
}

/// Checkout initiation request.
#[derive(Debug, Deserialize)]
pub struct StartCheckoutRequest {
    /// URL to redirect to after a successful payment.
    pub success_url: Option<String>,
    /// URL to redirect to if the customer cancels.
    pub cancel_url: Option<String>,
}

/// Checkout initiation response.
#[derive(Debug, Serialize)]
pub struct StartCheckoutResponse {
    /// Gateway session ID for tracking.
    pub session_id: String,
    /// Checkout URL to redirect the user to.
    pub url: String,
    /// The fixed top-up amount in cents.
    pub amount_cents: i64,
}

/// Initiate a credit top-up via Stripe Checkout.
///
/// The amount is always the server-side denomination; requests carry only
/// the redirect URLs.
pub async fn start_checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<StartCheckoutRequest>,
) -> Result<Json<StartCheckoutResponse>, ApiError> {
    let success_url = body
        .success_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("success_url is required".into()))?;
    let cancel_url = body
        .cancel_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::BadRequest("cancel_url is required".into()))?;

    // Verify Stripe is configured
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::Misconfigured("Stripe not configured".into()))?;

    // Verify account exists
    state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    let session = stripe
        .create_checkout_session(
            &auth.user_id.to_string(),
            TOPUP_AMOUNT_CENTS,
            &success_url,
            &cancel_url,
        )
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Failed to create Stripe checkout session");
            ApiError::Gateway(format!("Failed to create checkout session: {e}"))
        })?;

    let url = session
        .url
        .ok_or_else(|| ApiError::Gateway("Stripe returned no checkout URL".into()))?;

    let intent = PurchaseIntent::pending(auth.user_id, TOPUP_AMOUNT_CENTS, session.id.clone());

    // The gateway session exists either way; if the intent cannot be
    // persisted, the session is orphaned and only reconciliation can
    // recover it. Never retry here: a retry would mint a second session.
    if let Err(e) = state.store.create_intent(&intent) {
        tracing::error!(
            user_id = %auth.user_id,
            session_id = %session.id,
            error = %e,
            "Checkout session created but intent persist failed - orphaned session"
        );
        return Err(e.into());
    }

    tracing::info!(
        user_id = %auth.user_id,
        session_id = %session.id,
        intent_id = %intent.id,
        amount_cents = %TOPUP_AMOUNT_CENTS,
        "Checkout session created"
    );

    Ok(Json(StartCheckoutResponse {
        session_id: session.id,
        url,
        amount_cents: TOPUP_AMOUNT_CENTS,
    }))
}

/// A purchase intent in responses.
#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    /// Intent ID.
    pub intent_id: String,
    /// Gateway session ID.
    pub session_id: String,
    /// Top-up amount in cents.
    pub amount_cents: i64,
    /// Intent status (`pending`, `completed`, `failed`).
    pub status: String,
    /// Creation timestamp (ISO 8601).
    pub created_at: String,
    /// Last transition timestamp (ISO 8601).
    pub updated_at: String,
}

impl From<&PurchaseIntent> for PurchaseResponse {
    fn from(intent: &PurchaseIntent) -> Self {
        Self {
            intent_id: intent.id.to_string(),
            session_id: intent.gateway_session_id.clone(),
            amount_cents: intent.amount_cents,
            status: intent.status.as_str().to_string(),
            created_at: intent.created_at.to_rfc3339(),
            updated_at: intent.updated_at.to_rfc3339(),
        }
    }
}

/// List purchases response.
#[derive(Debug, Serialize)]
pub struct ListPurchasesResponse {
    /// Purchase intents (newest first).
    pub purchases: Vec<PurchaseResponse>,
}

/// List the caller's purchase history.
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListPurchasesResponse>, ApiError> {
    let limit = query.limit.min(MAX_PAGE_SIZE);
    let intents = state.store.list_intents_by_user(&auth.user_id, limit)?;

    Ok(Json(ListPurchasesResponse {
        purchases: intents.iter().map(PurchaseResponse::from).collect(),
    }))
}

/// Verify session request.
#[derive(Debug, Deserialize)]
pub struct VerifySessionRequest {
    /// The gateway session ID returned by checkout initiation.
    pub session_id: Option<String>,
}

/// Verify session response.
#[derive(Debug, Serialize)]
pub struct VerifySessionResponse {
    /// The purchase record for the session.
    pub purchase: PurchaseResponse,
    /// The caller's current balance in cents.
    pub balance_cents: i64,
}

/// Look up a checkout session's purchase record.
///
/// Used by the post-payment redirect page to show whether the webhook has
/// landed yet. Only the intent's owner may query it.
pub async fn verify_session(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<VerifySessionRequest>,
) -> Result<Json<VerifySessionResponse>, ApiError> {
    let session_id = body
        .session_id
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("session_id is required".into()))?;

    let intent = state
        .store
        .get_intent(&session_id)?
        .ok_or_else(|| ApiError::NotFound("Unknown checkout session".into()))?;

    // Ownership check applies regardless of the intent's status
    if intent.user_id != auth.user_id {
        return Err(ApiError::Forbidden);
    }

    let account = state
        .store
        .get_account(&auth.user_id)?
        .ok_or_else(|| ApiError::NotFound("Account not found".into()))?;

    Ok(Json(VerifySessionResponse {
        purchase: PurchaseResponse::from(&intent),
        balance_cents: account.balance_cents,
    }))
}
