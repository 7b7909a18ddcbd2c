//! Stripe API types.

use serde::Deserialize;

/// Stripe Checkout session object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID.
    pub id: String,
    /// Checkout URL to redirect the user to.
    #[serde(default)]
    pub url: Option<String>,
    /// Payment status.
    #[serde(default)]
    pub payment_status: Option<String>,
    /// Total amount in cents.
    #[serde(default)]
    pub amount_total: Option<i64>,
    /// Client reference ID (our `user_id`).
    #[serde(default)]
    pub client_reference_id: Option<String>,
    /// Session status.
    #[serde(default)]
    pub status: Option<String>,
    /// Metadata.
    #[serde(default)]
    pub metadata: serde_json::Value,
}

/// Stripe webhook event envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event ID.
    pub id: String,
    /// Event type (e.g., "checkout.session.completed").
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event data.
    pub data: WebhookEventData,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
}

/// Webhook event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// The event object.
    pub object: serde_json::Value,
}

/// A verified gateway event, normalized to what the ledger acts on.
///
/// Handlers never see raw Stripe payload shapes; the adapter reduces every
/// delivery to one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    /// A checkout session finished; `paid` reflects its payment status.
    PaymentCompleted {
        /// The gateway session ID.
        session_id: String,
        /// Whether the session reports `payment_status == "paid"`.
        paid: bool,
    },
    /// A checkout session expired before the customer paid.
    SessionExpired {
        /// The gateway session ID.
        session_id: String,
    },
    /// An event type the ledger does not act on.
    Unrecognized {
        /// The raw event type string.
        event_type: String,
    },
}

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
}
