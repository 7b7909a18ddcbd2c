//! Router configuration.
//!
//! This module sets up the Axum router with all routes and middleware.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{billing, health, internal, webhooks};
use crate::state::AppState;

// ============================================================================
// Concurrency Limiting Constants
// ============================================================================

/// Maximum concurrent requests for internal service endpoints.
/// Usage debits arrive at platform-traffic volume, so this limit is
/// higher than the user-facing one.
const INTERNAL_MAX_CONCURRENT_REQUESTS: usize = 100;

/// Maximum concurrent requests for user-facing billing endpoints.
const BILLING_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Billing (user JWT auth)
/// - `GET /billing/balance` - Get current balance
/// - `GET /billing/usage` - List usage history with stats
/// - `POST /billing/checkout` - Start a credit top-up checkout
/// - `GET /billing/purchases` - List purchase history
/// - `POST /billing/verify-session` - Verify a checkout session's outcome
///
/// ## Webhooks (signature verification)
/// - `POST /billing/webhook` - Payment gateway events
///
/// ## Internal (service API key auth)
/// - `POST /internal/accounts` - Provision a credit account
/// - `POST /internal/usage` - Record a usage debit
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    // Build CORS layer
    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    // User-facing billing routes share a concurrency limit. The webhook is
    // registered after the limit layer so gateway deliveries are never shed
    // by the user-facing cap.
    let billing_routes = Router::new()
        .route("/balance", get(billing::get_balance))
        .route("/usage", get(billing::get_usage))
        .route("/checkout", post(billing::start_checkout))
        .route("/purchases", get(billing::list_purchases))
        .route("/verify-session", post(billing::verify_session))
        .layer(ConcurrencyLimitLayer::new(BILLING_MAX_CONCURRENT_REQUESTS))
        .route("/webhook", post(webhooks::gateway_webhook));

    // Internal service-to-service routes with their own concurrency limit
    let internal_routes = Router::new()
        .route("/accounts", post(internal::provision_account))
        .route("/usage", post(internal::record_usage))
        .layer(ConcurrencyLimitLayer::new(INTERNAL_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        // Billing routes (rate limited, webhook excepted)
        .nest("/billing", billing_routes)
        // Internal routes (rate limited)
        .nest("/internal", internal_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
