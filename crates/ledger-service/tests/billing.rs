//! Billing API integration tests (balance, usage history, checkout,
//! purchases, session verification).

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledger_core::{SIGNUP_BONUS_CENTS, TOPUP_AMOUNT_CENTS};

/// Mount a checkout-session mock returning `session_id`.
async fn mount_checkout_mock(mock_server: &MockServer, session_id: &str) {
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": session_id,
            "url": format!("https://checkout.example.com/pay/{session_id}"),
            "status": "open",
            "payment_status": "unpaid"
        })))
        .mount(mock_server)
        .await;
}

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn get_balance_shows_signup_bonus() {
    let harness = TestHarness::new();
    harness.provision_account().await;

    let response = harness
        .server
        .get("/billing/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance_cents"], SIGNUP_BONUS_CENTS);
    assert_eq!(body["display_balance"], "$5.00");
}

#[tokio::test]
async fn get_balance_without_account_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/billing/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn get_balance_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/billing/balance").await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn get_balance_with_garbage_token_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/billing/balance")
        .add_header("authorization", "Bearer not.a.jwt")
        .await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Usage History
// ============================================================================

#[tokio::test]
async fn usage_history_empty_for_fresh_account() {
    let harness = TestHarness::new();
    harness.provision_account().await;

    let response = harness
        .server
        .get("/billing/usage")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["history"].as_array().expect("history").is_empty());
    assert_eq!(body["stats"]["total_debited_cents"], 0);
    assert_eq!(body["stats"]["entry_count"], 0);
}

#[tokio::test]
async fn usage_history_reflects_debits() {
    let harness = TestHarness::new();
    harness.provision_account().await;
    harness.record_usage(100).await;
    harness.record_usage(50).await;

    let response = harness
        .server
        .get("/billing/usage")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let history = body["history"].as_array().expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!(body["stats"]["total_debited_cents"], 150);
    assert_eq!(body["stats"]["entry_count"], 2);
}

#[tokio::test]
async fn usage_history_newest_first_with_limit() {
    let harness = TestHarness::new();
    harness.provision_account().await;

    // Entry IDs order by millisecond timestamp; space the debits out so the
    // expected order is unambiguous.
    for amount in [10, 20, 30] {
        harness.record_usage(amount).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let response = harness
        .server
        .get("/billing/usage?limit=2")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let history = body["history"].as_array().expect("history");
    assert_eq!(history.len(), 2);
    // Newest first
    assert_eq!(history[0]["amount_cents"], 30);
    assert_eq!(history[1]["amount_cents"], 20);
    // Stats cover the whole account, not just the page
    assert_eq!(body["stats"]["total_debited_cents"], 60);
    assert_eq!(body["stats"]["entry_count"], 3);
}

#[tokio::test]
async fn usage_history_without_account_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/billing/usage")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_not_found();
}

// ============================================================================
// Checkout
// ============================================================================

#[tokio::test]
async fn start_checkout_returns_session_and_url() {
    let mock_server = MockServer::start().await;
    mount_checkout_mock(&mock_server, "cs_test_checkout").await;

    let harness = TestHarness::with_gateway_url(&mock_server.uri());
    harness.provision_account().await;

    let response = harness
        .server
        .post("/billing/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "success_url": "https://app.example.com/billing/success",
            "cancel_url": "https://app.example.com/billing/cancel"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["session_id"], "cs_test_checkout");
    assert_eq!(
        body["url"],
        "https://checkout.example.com/pay/cs_test_checkout"
    );
    assert_eq!(body["amount_cents"], TOPUP_AMOUNT_CENTS);
}

#[tokio::test]
async fn start_checkout_records_pending_purchase() {
    let mock_server = MockServer::start().await;
    mount_checkout_mock(&mock_server, "cs_test_pending").await;

    let harness = TestHarness::with_gateway_url(&mock_server.uri());
    harness.provision_account().await;

    harness
        .server
        .post("/billing/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/cancel"
        }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .get("/billing/purchases")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let purchases = body["purchases"].as_array().expect("purchases");
    assert_eq!(purchases.len(), 1);
    assert_eq!(purchases[0]["session_id"], "cs_test_pending");
    assert_eq!(purchases[0]["status"], "pending");
    assert_eq!(purchases[0]["amount_cents"], TOPUP_AMOUNT_CENTS);

    // A pending intent never touches the balance
    assert_eq!(harness.balance_cents().await, SIGNUP_BONUS_CENTS);
}

#[tokio::test]
async fn start_checkout_requires_redirect_urls() {
    let harness = TestHarness::new();
    harness.provision_account().await;

    let response = harness
        .server
        .post("/billing/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "success_url": "https://app.example.com/ok" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn start_checkout_without_gateway_fails() {
    let harness = TestHarness::without_gateway();
    harness.provision_account().await;

    let response = harness
        .server
        .post("/billing/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/cancel"
        }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn start_checkout_without_account_fails() {
    let mock_server = MockServer::start().await;
    mount_checkout_mock(&mock_server, "cs_test_noacct").await;

    let harness = TestHarness::with_gateway_url(&mock_server.uri());

    let response = harness
        .server
        .post("/billing/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/cancel"
        }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn start_checkout_surfaces_gateway_errors() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/checkout/sessions"))
        .respond_with(ResponseTemplate::new(402).set_body_json(json!({
            "error": {
                "type": "card_error",
                "message": "Your card was declined.",
                "code": "card_declined"
            }
        })))
        .mount(&mock_server)
        .await;

    let harness = TestHarness::with_gateway_url(&mock_server.uri());
    harness.provision_account().await;

    let response = harness
        .server
        .post("/billing/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/cancel"
        }))
        .await;

    response.assert_status(StatusCode::BAD_GATEWAY);

    // No intent is recorded for a session that was never created
    let response = harness
        .server
        .get("/billing/purchases")
        .add_header("authorization", harness.user_auth_header())
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["purchases"].as_array().expect("purchases").is_empty());
}

// ============================================================================
// Purchases
// ============================================================================

#[tokio::test]
async fn list_purchases_empty_without_history() {
    let harness = TestHarness::new();
    harness.provision_account().await;

    let response = harness
        .server
        .get("/billing/purchases")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["purchases"].as_array().expect("purchases").is_empty());
}

#[tokio::test]
async fn list_purchases_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/billing/purchases").await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Verify Session
// ============================================================================

#[tokio::test]
async fn verify_session_reports_purchase_state() {
    let mock_server = MockServer::start().await;
    mount_checkout_mock(&mock_server, "cs_test_verify").await;

    let harness = TestHarness::with_gateway_url(&mock_server.uri());
    harness.provision_account().await;

    harness
        .server
        .post("/billing/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/cancel"
        }))
        .await
        .assert_status_ok();

    let response = harness
        .server
        .post("/billing/verify-session")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "session_id": "cs_test_verify" }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["purchase"]["session_id"], "cs_test_verify");
    assert_eq!(body["purchase"]["status"], "pending");
    assert_eq!(body["balance_cents"], SIGNUP_BONUS_CENTS);
}

#[tokio::test]
async fn verify_session_unknown_session_fails() {
    let harness = TestHarness::new();
    harness.provision_account().await;

    let response = harness
        .server
        .post("/billing/verify-session")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "session_id": "cs_test_never_created" }))
        .await;

    response.assert_status_not_found();
}

#[tokio::test]
async fn verify_session_rejects_other_users_session() {
    let mock_server = MockServer::start().await;
    mount_checkout_mock(&mock_server, "cs_test_foreign").await;

    let harness = TestHarness::with_gateway_url(&mock_server.uri());
    harness.provision_account().await;

    harness
        .server
        .post("/billing/checkout")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "success_url": "https://app.example.com/ok",
            "cancel_url": "https://app.example.com/cancel"
        }))
        .await
        .assert_status_ok();

    // A different authenticated user must not see this session
    let response = harness
        .server
        .post("/billing/verify-session")
        .add_header("authorization", TestHarness::other_user_auth_header())
        .json(&json!({ "session_id": "cs_test_foreign" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn verify_session_requires_session_id() {
    let harness = TestHarness::new();
    harness.provision_account().await;

    let response = harness
        .server
        .post("/billing/verify-session")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({}))
        .await;

    response.assert_status_bad_request();
}
