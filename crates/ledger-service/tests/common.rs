//! Common test utilities for ledger integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;

use axum::Router;
use axum_test::TestServer;
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::Serialize;
use serde_json::json;
use tempfile::TempDir;

use ledger_core::UserId;
use ledger_service::crypto::hmac_sha256_hex;
use ledger_service::{create_router, AppState, ServiceConfig};
use ledger_store::RocksStore;

/// JWT signing secret shared by every test server.
pub const TEST_JWT_SECRET: &str = "test-jwt-secret";

/// Webhook signing secret shared by every test server.
pub const TEST_WEBHOOK_SECRET: &str = "whsec_test_secret";

#[derive(Serialize)]
struct TestClaims {
    sub: String,
    exp: i64,
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    ///
    /// The gateway client points at the live Stripe URL; nothing in these
    /// tests calls it. Tests that exercise checkout should build the
    /// harness with [`TestHarness::with_gateway_url`] against a mock server.
    pub fn new() -> Self {
        Self::build(Some("https://api.stripe.com/v1".to_string()))
    }

    /// Create a harness whose gateway client targets `url` (a mock server).
    pub fn with_gateway_url(url: &str) -> Self {
        Self::build(Some(url.to_string()))
    }

    /// Create a harness with no payment gateway configured at all.
    pub fn without_gateway() -> Self {
        Self::build(None)
    }

    fn build(gateway_url: Option<String>) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = RocksStore::open(temp_dir.path()).expect("Failed to open store");

        let service_api_key = "test-service-key".to_string();

        let (stripe_secret_key, stripe_api_url) = match gateway_url {
            Some(url) => (Some("sk_test_harness".to_string()), url),
            None => (None, "https://api.stripe.com/v1".to_string()),
        };

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            jwt_secret: Some(TEST_JWT_SECRET.into()),
            service_api_key: Some(service_api_key.clone()),
            stripe_secret_key,
            stripe_webhook_secret: Some(TEST_WEBHOOK_SECRET.into()),
            stripe_api_url,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        };

        let state = AppState::new(Arc::new(store), config);
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");
        let test_user_id = UserId::generate();

        Self {
            server,
            _temp_dir: temp_dir,
            test_user_id,
            service_api_key,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        format!("Bearer {}", mint_token(&self.test_user_id))
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        format!("Bearer {}", mint_token(&UserId::generate()))
    }

    /// Provision a credit account for the test user through the internal API.
    pub async fn provision_account(&self) {
        self.server
            .post("/internal/accounts")
            .add_header("x-api-key", self.service_api_key.clone())
            .json(&json!({ "user_id": self.test_user_id.to_string() }))
            .await
            .assert_status_ok();
    }

    /// Debit the test user's account through the internal API.
    pub async fn record_usage(&self, amount_cents: i64) {
        self.server
            .post("/internal/usage")
            .add_header("x-api-key", self.service_api_key.clone())
            .json(&json!({
                "user_id": self.test_user_id.to_string(),
                "amount_cents": amount_cents
            }))
            .await
            .assert_status_ok();
    }

    /// Fetch the test user's balance in cents.
    pub async fn balance_cents(&self) -> i64 {
        let response = self
            .server
            .get("/billing/balance")
            .add_header("authorization", self.user_auth_header())
            .await;
        response.assert_status_ok();
        let body: serde_json::Value = response.json();
        body["balance_cents"].as_i64().expect("balance_cents")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Mint a signed HS256 token for `user_id` with a one-hour expiry.
pub fn mint_token(user_id: &UserId) -> String {
    let claims = TestClaims {
        sub: user_id.to_string(),
        exp: Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to mint test token")
}

/// Build a `stripe-signature` header value for `body` signed with the test
/// webhook secret.
pub fn sign_webhook(body: &str) -> String {
    sign_webhook_with(TEST_WEBHOOK_SECRET, body)
}

/// Build a `stripe-signature` header value for `body` signed with `secret`.
pub fn sign_webhook_with(secret: &str, body: &str) -> String {
    let timestamp = Utc::now().timestamp();
    let signed_payload = format!("{timestamp}.{body}");
    let signature = hmac_sha256_hex(secret, signed_payload.as_bytes());
    format!("t={timestamp},v1={signature}")
}

/// Build a completed-checkout webhook event body for `session_id`.
pub fn completed_event(session_id: &str) -> String {
    json!({
        "id": "evt_test_completed",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": session_id,
                "payment_status": "paid",
                "status": "complete"
            }
        }
    })
    .to_string()
}

/// Build an unpaid completed-checkout webhook event body for `session_id`.
pub fn unpaid_completed_event(session_id: &str) -> String {
    json!({
        "id": "evt_test_unpaid",
        "type": "checkout.session.completed",
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": session_id,
                "payment_status": "unpaid",
                "status": "complete"
            }
        }
    })
    .to_string()
}

/// Build an expired-checkout webhook event body for `session_id`.
pub fn expired_event(session_id: &str) -> String {
    json!({
        "id": "evt_test_expired",
        "type": "checkout.session.expired",
        "created": Utc::now().timestamp(),
        "data": {
            "object": {
                "id": session_id,
                "status": "expired"
            }
        }
    })
    .to_string()
}
