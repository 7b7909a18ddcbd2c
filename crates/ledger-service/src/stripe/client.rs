//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use super::types::{CheckoutSession, GatewayEvent, StripeErrorResponse, WebhookEvent};
use crate::crypto::{constant_time_eq, hmac_sha256_hex};

/// Maximum age (and future skew) of a webhook timestamp, in seconds.
///
/// Signed payloads older than this are rejected to limit replay of a
/// captured delivery.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Payload could not be parsed after verification.
    #[error("Payload error: {0}")]
    Payload(#[from] serde_json::Error),

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    base_url: String,
    api_key: String,
    webhook_secret: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - API base URL (live: `https://api.stripe.com/v1`)
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    /// * `webhook_secret` - Optional webhook signing secret (`whsec_...`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        webhook_secret: Option<String>,
    ) -> Result<Self, StripeError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            webhook_secret,
        })
    }

    /// Create a Checkout session for a credit top-up.
    ///
    /// The amount is always the server-side denomination; it is never taken
    /// from the request. `user_id` rides along as `client_reference_id` and
    /// metadata so the webhook can be traced back even without our intent
    /// record.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or Stripe rejects it.
    pub async fn create_checkout_session(
        &self,
        user_id: &str,
        amount_cents: i64,
        success_url: &str,
        cancel_url: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let params = vec![
            ("mode", "payment".to_string()),
            ("success_url", success_url.to_string()),
            ("cancel_url", cancel_url.to_string()),
            ("client_reference_id", user_id.to_string()),
            ("line_items[0][price_data][currency]", "usd".to_string()),
            (
                "line_items[0][price_data][product_data][name]",
                "Account credits".to_string(),
            ),
            (
                "line_items[0][price_data][product_data][description]",
                format!("{amount_cents} credit top-up"),
            ),
            (
                "line_items[0][price_data][unit_amount]",
                amount_cents.to_string(),
            ),
            ("line_items[0][quantity]", "1".to_string()),
            ("metadata[user_id]", user_id.to_string()),
        ];

        tracing::debug!(
            user_id = %user_id,
            amount_cents = %amount_cents,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Verify a webhook signature and parse the event.
    ///
    /// Verification runs over the raw body bytes before any parsing. The
    /// header carries `t=<unix>,v1=<hex>[,v1=<hex>...]`; the signed payload
    /// is `"{t}.{body}"` and any matching `v1` candidate accepts.
    ///
    /// # Arguments
    ///
    /// * `payload` - Raw request body, exactly as received
    /// * `signature` - Value of the `stripe-signature` header
    ///
    /// # Errors
    ///
    /// - `StripeError::Configuration` if no webhook secret is configured.
    /// - `StripeError::InvalidSignature` if the header is malformed, the
    ///   timestamp is outside tolerance, or no candidate matches.
    /// - `StripeError::Payload` if the verified body is not a valid event.
    pub fn verify_and_parse_event(
        &self,
        payload: &[u8],
        signature: &str,
    ) -> Result<GatewayEvent, StripeError> {
        let secret = self
            .webhook_secret
            .as_ref()
            .ok_or_else(|| StripeError::Configuration("Webhook secret not configured".into()))?;

        // Parse the signature header: t=timestamp,v1=signature[,v1=...]
        let mut timestamp: Option<&str> = None;
        let mut signatures: Vec<&str> = Vec::new();

        for part in signature.split(',') {
            let mut kv = part.splitn(2, '=');
            match (kv.next(), kv.next()) {
                (Some("t"), Some(ts)) => timestamp = Some(ts),
                (Some("v1"), Some(sig)) => signatures.push(sig),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;

        if signatures.is_empty() {
            return Err(StripeError::InvalidSignature);
        }

        // Reject stale (or far-future) timestamps
        let ts: i64 = timestamp
            .parse()
            .map_err(|_| StripeError::InvalidSignature)?;
        let now = chrono::Utc::now().timestamp();
        if (now - ts).abs() > SIGNATURE_TOLERANCE_SECS {
            tracing::debug!(timestamp = %ts, now = %now, "Webhook timestamp outside tolerance");
            return Err(StripeError::InvalidSignature);
        }

        // Compute expected signature over "{t}.{payload}"
        let mut signed_payload = Vec::with_capacity(timestamp.len() + 1 + payload.len());
        signed_payload.extend_from_slice(timestamp.as_bytes());
        signed_payload.push(b'.');
        signed_payload.extend_from_slice(payload);
        let expected = hmac_sha256_hex(secret, &signed_payload);

        // Check if any signature matches (constant-time comparison)
        let valid = signatures.iter().any(|sig| constant_time_eq(&expected, sig));

        if !valid {
            return Err(StripeError::InvalidSignature);
        }

        let event: WebhookEvent = serde_json::from_slice(payload)?;
        Ok(normalize_event(&event))
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

/// Reduce a verified event envelope to the normalized form.
fn normalize_event(event: &WebhookEvent) -> GatewayEvent {
    match event.event_type.as_str() {
        "checkout.session.completed" => match session_from_object(&event.data.object) {
            Some(session) => GatewayEvent::PaymentCompleted {
                session_id: session.id,
                paid: session.payment_status.as_deref() == Some("paid"),
            },
            None => GatewayEvent::Unrecognized {
                event_type: event.event_type.clone(),
            },
        },
        "checkout.session.expired" => match session_from_object(&event.data.object) {
            Some(session) => GatewayEvent::SessionExpired {
                session_id: session.id,
            },
            None => GatewayEvent::Unrecognized {
                event_type: event.event_type.clone(),
            },
        },
        _ => GatewayEvent::Unrecognized {
            event_type: event.event_type.clone(),
        },
    }
}

fn session_from_object(object: &serde_json::Value) -> Option<CheckoutSession> {
    serde_json::from_value(object.clone()).ok()
}
