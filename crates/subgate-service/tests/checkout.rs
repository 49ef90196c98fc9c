//! Checkout integration tests.

mod common;

use axum::http::StatusCode;
use serde_json::json;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, ResponseTemplate};

use common::{session_token, stripe_error, TestHarness};

const FORM: &[(&str, &str)] = &[("plan", "standard")];

async fn mount_checkout_session(harness: &TestHarness, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "object": "checkout.session",
            "mode": "subscription",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1"
        })))
        .expect(expected_calls)
        .mount(&harness.stripe)
        .await;
}

// ============================================================================
// Successful checkout
// ============================================================================

#[tokio::test]
async fn checkout_redirects_to_stripe_session() {
    let harness = TestHarness::new().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains("mode=subscription"))
        .and(body_string_contains("line_items%5B0%5D%5Bprice%5D=price_123"))
        .and(body_string_contains("line_items%5B0%5D%5Bquantity%5D=1"))
        .and(body_string_contains("customer_email=a%40b.com"))
        .and(body_string_contains("client_reference_id=a%40b.com"))
        .and(body_string_contains(
            "success_url=https%3A%2F%2Fx.test%2Fsubscription%2Fsuccess",
        ))
        .and(body_string_contains(
            "cancel_url=https%3A%2F%2Fx.test%2Fsubscription%2Fcancel",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_1",
            "url": "https://checkout.stripe.com/c/pay/cs_test_1"
        })))
        .expect(1)
        .mount(&harness.stripe)
        .await;

    let response = harness
        .server
        .post("/subscription/checkout")
        .add_header("authorization", TestHarness::auth_header("a@b.com"))
        .form(&FORM)
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(
        response.header("location"),
        "https://checkout.stripe.com/c/pay/cs_test_1"
    );
    harness.stripe.verify().await;
}

#[tokio::test]
async fn checkout_accepts_session_cookie() {
    let harness = TestHarness::new().await;
    mount_checkout_session(&harness, 1).await;

    let response = harness
        .server
        .post("/subscription/checkout")
        .add_header(
            "cookie",
            format!("subgate_session={}", session_token("alice", "a@b.com")),
        )
        .form(&FORM)
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn checkout_callbacks_include_base_path() {
    let harness = TestHarness::with_config(|config| config.base_path = "/app".into()).await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .and(body_string_contains(
            "success_url=https%3A%2F%2Fx.test%2Fapp%2Fsubscription%2Fsuccess",
        ))
        .and(body_string_contains(
            "cancel_url=https%3A%2F%2Fx.test%2Fapp%2Fsubscription%2Fcancel",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "cs_test_2",
            "url": "https://checkout.stripe.com/c/pay/cs_test_2"
        })))
        .expect(1)
        .mount(&harness.stripe)
        .await;

    let response = harness
        .server
        .post("/app/subscription/checkout")
        .add_header("authorization", TestHarness::auth_header("a@b.com"))
        .form(&FORM)
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    harness.stripe.verify().await;
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn checkout_without_email_never_calls_stripe() {
    let harness = TestHarness::new().await;
    mount_checkout_session(&harness, 0).await;

    for email in ["", "   "] {
        let response = harness
            .server
            .post("/subscription/checkout")
            .add_header("authorization", TestHarness::auth_header(email))
            .form(&FORM)
            .await;

        assert_eq!(response.status_code(), StatusCode::FOUND);
        assert_eq!(
            response.header("location"),
            "/settings?error=missing%20e-mail%20address#subscription"
        );
    }

    assert!(harness.stripe_requests().await.is_empty());
    harness.stripe.verify().await;
}

#[tokio::test]
async fn checkout_without_form_body_still_starts_checkout() {
    let harness = TestHarness::new().await;
    mount_checkout_session(&harness, 2).await;

    let bodyless = harness
        .server
        .post("/subscription/checkout")
        .add_header("authorization", TestHarness::auth_header("a@b.com"))
        .await;
    assert_eq!(bodyless.status_code(), StatusCode::SEE_OTHER);

    let json_body = harness
        .server
        .post("/subscription/checkout")
        .add_header("authorization", TestHarness::auth_header("a@b.com"))
        .json(&json!({ "plan": "standard" }))
        .await;
    assert_eq!(json_body.status_code(), StatusCode::SEE_OTHER);

    harness.stripe.verify().await;
}

#[tokio::test]
async fn checkout_with_unreadable_form_redirects_with_error() {
    // The form extractor buffers at most 2 MiB, below the configured limit.
    let harness =
        TestHarness::with_config(|config| config.max_body_bytes = 8 * 1024 * 1024).await;
    mount_checkout_session(&harness, 0).await;

    let response = harness
        .server
        .post("/subscription/checkout")
        .add_header("authorization", TestHarness::auth_header("a@b.com"))
        .form(&[("plan", "x".repeat(3 * 1024 * 1024))])
        .await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        "/settings?error=missing%20form%20values#subscription"
    );
    harness.stripe.verify().await;
}

#[tokio::test]
async fn checkout_accepts_quoted_session_cookie() {
    let harness = TestHarness::new().await;
    mount_checkout_session(&harness, 1).await;

    let response = harness
        .server
        .post("/subscription/checkout")
        .add_header(
            "cookie",
            format!("lang=en; subgate_session=\"{}\"", session_token("alice", "a@b.com")),
        )
        .form(&FORM)
        .await;

    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    harness.stripe.verify().await;
}

#[tokio::test]
async fn checkout_stripe_failure_redirects_with_generic_error() {
    let harness = TestHarness::new().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(400).set_body_json(stripe_error("No such price")))
        .expect(1)
        .mount(&harness.stripe)
        .await;

    let response = harness
        .server
        .post("/subscription/checkout")
        .add_header("authorization", TestHarness::auth_header("a@b.com"))
        .form(&FORM)
        .await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        "/settings?error=something%20went%20wrong#subscription"
    );
    harness.stripe.verify().await;
}

#[tokio::test]
async fn checkout_session_without_url_redirects_with_generic_error() {
    let harness = TestHarness::new().await;

    Mock::given(method("POST"))
        .and(path("/v1/checkout/sessions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "cs_test_3" })))
        .mount(&harness.stripe)
        .await;

    let response = harness
        .server
        .post("/subscription/checkout")
        .add_header("authorization", TestHarness::auth_header("a@b.com"))
        .form(&FORM)
        .await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(
        response.header("location"),
        "/settings?error=something%20went%20wrong#subscription"
    );
}

#[tokio::test]
async fn checkout_without_auth_redirects_to_landing_page() {
    let harness = TestHarness::new().await;
    mount_checkout_session(&harness, 0).await;

    let response = harness
        .server
        .post("/subscription/checkout")
        .form(&FORM)
        .await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(response.header("location"), "/?error=unauthorized");
    harness.stripe.verify().await;
}

#[tokio::test]
async fn checkout_with_invalid_token_redirects_to_landing_page() {
    let harness = TestHarness::with_config(|config| config.base_path = "/app".into()).await;
    mount_checkout_session(&harness, 0).await;

    let response = harness
        .server
        .post("/app/subscription/checkout")
        .add_header("authorization", "Bearer not-a-jwt")
        .form(&FORM)
        .await;

    assert_eq!(response.status_code(), StatusCode::FOUND);
    assert_eq!(response.header("location"), "/app/?error=unauthorized");
    harness.stripe.verify().await;
}
