//! Request and response types for the ledger client.

use serde::{Deserialize, Serialize};

/// Account provisioning request.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionAccountRequest {
    /// The user to provision an account for.
    pub user_id: String,
}

/// Credit account response.
#[derive(Debug, Clone, Deserialize)]
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
    /// Created timestamp (RFC 3339).
    pub created_at: String,
}

/// Usage debit request.
#[derive(Debug, Clone, Serialize)]
pub struct RecordUsageRequest {
    /// User ID being charged.
    pub user_id: String,
    /// Cost in cents to debit.
    pub amount_cents: i64,
    /// Optional reference describing the usage (shown in history).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Usage debit response.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageResponse {
    /// Whether the debit was applied.
    pub success: bool,
    /// New balance after the debit.
    pub balance_cents: i64,
    /// Amount debited.
    pub amount_cents: i64,
    /// The ledger entry that was written.
    pub entry_id: String,
}

/// Balance response.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// Balance in cents.
    pub balance_cents: i64,
    /// Balance formatted as dollars.
    pub display_balance: String,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
