//! Payment gateway webhook handler.
//!
//! The webhook is the only unauthenticated mutation path; its trust
//! mechanism is the signature over the raw body. Responses double as the
//! acknowledgment protocol: any 2xx tells the gateway the delivery is
//! settled, a 5xx makes it redeliver.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use ledger_store::{Store, StoreError};

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::{GatewayEvent, StripeError};

/// Webhook acknowledgment body.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the delivery was received.
    pub received: bool,
}

/// Handle a gateway webhook delivery.
///
/// Signature verification runs over the raw body bytes before anything is
/// parsed. Once verification passes, every classified outcome except a
/// transient storage failure acknowledges the delivery.
pub async fn gateway_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookResponse>, ApiError> {
    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::Misconfigured("Stripe not configured".into()))?;

    let signature = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::InvalidSignature)?;

    let event = stripe
        .verify_and_parse_event(&body, signature)
        .map_err(|e| match e {
            StripeError::InvalidSignature => {
                tracing::warn!("Invalid webhook signature");
                ApiError::InvalidSignature
            }
            StripeError::Configuration(msg) => ApiError::Misconfigured(msg),
            StripeError::Payload(err) => {
                ApiError::BadRequest(format!("Malformed event payload: {err}"))
            }
            other => ApiError::Internal(other.to_string()),
        })?;

    match event {
        GatewayEvent::PaymentCompleted { session_id, paid } => {
            if paid {
                handle_payment_completed(&state, &session_id)?;
            } else {
                tracing::info!(
                    session_id = %session_id,
                    "Checkout session completed without payment - acknowledging"
                );
            }
        }
        GatewayEvent::SessionExpired { session_id } => {
            handle_session_expired(&state, &session_id)?;
        }
        GatewayEvent::Unrecognized { event_type } => {
            tracing::debug!(event_type = %event_type, "Unhandled gateway event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// Process a paid checkout session.
///
/// The intent's pending→completed transition is the idempotency gate: the
/// credit runs only on the call that flipped it, so N deliveries credit
/// exactly once.
fn handle_payment_completed(state: &AppState, session_id: &str) -> Result<(), ApiError> {
    let transition = match state.store.mark_completed_if_pending(session_id) {
        Ok(t) => t,
        Err(StoreError::NotFound) => {
            tracing::warn!(
                session_id = %session_id,
                "Payment completed for unknown session - acknowledging"
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if !transition.applied {
        tracing::debug!(
            session_id = %session_id,
            status = %transition.intent.status.as_str(),
            "Duplicate completion delivery - intent already terminal"
        );
        return Ok(());
    }

    match state
        .store
        .credit(&transition.intent.user_id, transition.intent.amount_cents)
    {
        Ok(account) => {
            tracing::info!(
                user_id = %transition.intent.user_id,
                session_id = %session_id,
                amount_cents = %transition.intent.amount_cents,
                new_balance = %account.balance_cents,
                "Credits applied from completed checkout"
            );
            Ok(())
        }
        Err(StoreError::NotFound) => {
            // Terminal intent with no account to land on; redelivery cannot
            // fix this, so acknowledge and leave the trace for reconciliation.
            tracing::error!(
                user_id = %transition.intent.user_id,
                session_id = %session_id,
                "Intent completed but account missing - credit not applied"
            );
            Ok(())
        }
        Err(e) => {
            // The intent is already terminal, so the redelivery triggered by
            // withholding the ack will see applied=false and skip the credit.
            // This log line is the reconciliation marker for that gap.
            tracing::error!(
                user_id = %transition.intent.user_id,
                session_id = %session_id,
                amount_cents = %transition.intent.amount_cents,
                error = %e,
                "Intent marked completed but credit failed - needs reconciliation"
            );
            Err(e.into())
        }
    }
}

/// Process an expired checkout session. Never mutates any balance.
fn handle_session_expired(state: &AppState, session_id: &str) -> Result<(), ApiError> {
    let transition = match state.store.mark_failed_if_pending(session_id) {
        Ok(t) => t,
        Err(StoreError::NotFound) => {
            tracing::warn!(
                session_id = %session_id,
                "Session expired for unknown session - acknowledging"
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    if transition.applied {
        tracing::info!(
            user_id = %transition.intent.user_id,
            session_id = %session_id,
            "Purchase intent failed after session expiry"
        );
    } else {
        tracing::debug!(
            session_id = %session_id,
            status = %transition.intent.status.as_str(),
            "Expiry for already-terminal intent - no-op"
        );
    }

    Ok(())
}
