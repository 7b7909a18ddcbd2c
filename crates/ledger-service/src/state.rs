//! Application state.

use std::sync::Arc;

use ledger_store::RocksStore;

use crate::config::ServiceConfig;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Stripe client for checkout sessions (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        // Create Stripe client if configured
        let stripe = config.stripe_secret_key.as_ref().and_then(|key| {
            match StripeClient::new(
                &config.stripe_api_url,
                key,
                config.stripe_webhook_secret.clone(),
            ) {
                Ok(client) => {
                    tracing::info!(api_url = %config.stripe_api_url, "Stripe integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - checkout will not be available");
        }

        if config.jwt_secret.is_none() {
            tracing::warn!("JWT secret not configured - user endpoints will reject all requests");
        }

        Self {
            store,
            config,
            stripe,
        }
    }

    /// Check if Stripe is configured.
    #[must_use]
    pub fn has_stripe(&self) -> bool {
        self.stripe.is_some()
    }
}
