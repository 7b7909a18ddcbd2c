//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthenticated - missing or invalid credentials.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Forbidden - valid credentials but the resource belongs to someone else.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - resource already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Webhook signature missing or failed verification.
    #[error("invalid webhook signature")]
    InvalidSignature,

    /// Insufficient funds for a debit.
    #[error("insufficient funds: balance={balance_cents}, required={required_cents}")]
    InsufficientFunds {
        /// Current balance in cents.
        balance_cents: i64,
        /// Required amount in cents.
        required_cents: i64,
    },

    /// A required piece of configuration is absent.
    #[error("misconfigured: {0}")]
    Misconfigured(String),

    /// Transient backend failure; the caller should retry.
    #[error("transient: {0}")]
    Transient(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Payment gateway returned an error.
    #[error("gateway error: {0}")]
    Gateway(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                "invalid_signature",
                self.to_string(),
                None,
            ),
            Self::InsufficientFunds {
                balance_cents,
                required_cents,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                "insufficient_funds",
                self.to_string(),
                Some(serde_json::json!({
                    "balance_cents": balance_cents,
                    "required_cents": required_cents
                })),
            ),
            Self::Misconfigured(msg) => {
                tracing::error!(error = %msg, "Service misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "misconfigured",
                    msg.clone(),
                    None,
                )
            }
            Self::Transient(msg) => {
                tracing::warn!(error = %msg, "Transient backend failure");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "transient",
                    "Temporarily unavailable, please retry".to_string(),
                    None,
                )
            }
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::Gateway(msg) => (StatusCode::BAD_GATEWAY, "gateway_error", msg.clone(), None),
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ledger_store::StoreError> for ApiError {
    fn from(err: ledger_store::StoreError) -> Self {
        match err {
            ledger_store::StoreError::NotFound => Self::NotFound("Record not found".into()),
            ledger_store::StoreError::InsufficientFunds {
                balance_cents,
                required_cents,
            } => Self::InsufficientFunds {
                balance_cents,
                required_cents,
            },
            ledger_store::StoreError::AccountExists { user_id } => {
                Self::Conflict(format!("Account already exists: {user_id}"))
            }
            ledger_store::StoreError::SessionExists { session_id } => {
                Self::Conflict(format!("Purchase already recorded for session: {session_id}"))
            }
            ledger_store::StoreError::InvalidAmount { amount_cents } => {
                Self::BadRequest(format!("Amount must be positive, got {amount_cents}"))
            }
            ledger_store::StoreError::Database(msg) => Self::Transient(msg),
            ledger_store::StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}
