//! Common test utilities for subgate integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::fmt;
use std::sync::{Arc, Mutex};

use axum_test::TestServer;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use subgate_service::auth::SessionClaims;
use subgate_service::stripe::signature_header;
use subgate_service::{create_router, AppState, ServiceConfig, SubscriptionsConfig};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const ENDPOINT_SECRET: &str = "whsec_test_endpoint_secret";
pub const PRICE_ID: &str = "price_123";
pub const PUBLIC_URL: &str = "https://x.test";

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Mock Stripe API.
    pub stripe: MockServer,
    /// Configuration the server was started with.
    pub config: ServiceConfig,
}

impl TestHarness {
    /// Start a harness with subscriptions enabled and no path prefix.
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Start a harness after adjusting the default test configuration.
    pub async fn with_config(adjust: impl FnOnce(&mut ServiceConfig)) -> Self {
        let stripe = MockServer::start().await;
        mount_standard_price(&stripe).await;

        let mut config = test_config(&stripe);
        adjust(&mut config);

        let state = AppState::bootstrap(config.clone())
            .await
            .expect("Failed to bootstrap app state");
        let server = TestServer::new(create_router(state)).expect("Failed to create test server");

        Self {
            server,
            stripe,
            config,
        }
    }

    /// Authorization header for a user with the given email.
    pub fn auth_header(email: &str) -> String {
        format!("Bearer {}", session_token("alice", email))
    }

    /// Signature header for a webhook payload signed now.
    pub fn sign(payload: &str) -> String {
        signature_header(
            payload.as_bytes(),
            ENDPOINT_SECRET,
            chrono::Utc::now().timestamp(),
        )
    }

    /// Requests Stripe received, excluding the startup price lookup.
    pub async fn stripe_requests(&self) -> Vec<wiremock::Request> {
        self.stripe
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| !r.url.path().starts_with("/v1/prices/"))
            .collect()
    }
}

/// Default configuration pointing at a mock Stripe.
pub fn test_config(stripe: &MockServer) -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        public_url: PUBLIC_URL.into(),
        base_path: String::new(),
        app_name: None,
        auth_jwt_secret: Some(JWT_SECRET.into()),
        auth_cookie_name: "subgate_session".into(),
        subscriptions: SubscriptionsConfig {
            enabled: true,
            stripe_secret_key: Some("sk_test_xxx".into()),
            stripe_endpoint_secret: Some(ENDPOINT_SECRET.into()),
            standard_price_id: Some(PRICE_ID.into()),
            stripe_api_base: stripe.uri(),
        },
        cors_origins: vec!["*".into()],
        max_body_bytes: 1024 * 1024,
        request_timeout_seconds: 30,
    }
}

/// Serve the standard price from the mock Stripe.
pub async fn mount_standard_price(stripe: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/prices/{PRICE_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": PRICE_ID,
            "object": "price",
            "active": true,
            "currency": "eur",
            "unit_amount": 300,
            "unit_amount_decimal": "300",
            "recurring": { "interval": "month", "interval_count": 1 }
        })))
        .mount(stripe)
        .await;
}

/// A session token signed with the test secret.
pub fn session_token(sub: &str, email: &str) -> String {
    let claims = SessionClaims {
        sub: sub.into(),
        email: email.into(),
        exp: chrono::Utc::now().timestamp() + 3600,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode session token")
}

/// A Stripe error body.
pub fn stripe_error(message: &str) -> serde_json::Value {
    json!({
        "error": {
            "type": "invalid_request_error",
            "message": message
        }
    })
}

// ============================================================================
// Log capture
// ============================================================================

/// Log events captured on the current thread.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<(Level, String)>>>);

impl CapturedLogs {
    /// Capture events on this thread until the guard is dropped.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(CaptureLayer(self.clone()));
        tracing::subscriber::set_default(subscriber)
    }

    /// Number of events at `level` whose message contains `needle`.
    pub fn count(&self, level: Level, needle: &str) -> usize {
        self.0
            .lock()
            .expect("log buffer poisoned")
            .iter()
            .filter(|(l, msg)| *l == level && msg.contains(needle))
            .count()
    }
}

struct CaptureLayer(CapturedLogs);

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(String::new());
        event.record(&mut visitor);
        let CaptureLayer(CapturedLogs(events)) = self;
        events
            .lock()
            .expect("log buffer poisoned")
            .push((*event.metadata().level(), visitor.0));
    }
}

struct MessageVisitor(String);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}
