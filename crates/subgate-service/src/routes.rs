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

use crate::handlers::{health, subscription, webhooks};
use crate::state::{AppState, SubscriptionState};

/// Maximum concurrent requests for the authenticated subscription endpoints.
/// Each one holds an outbound Stripe call for up to the client timeout.
const PRIVATE_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Subscriptions (only when enabled, under the configured prefix)
/// - `GET /subscription/success` - Checkout success landing
/// - `GET /subscription/cancel` - Checkout cancel landing
/// - `POST /subscription/webhook` - Stripe webhooks (signature verification)
/// - `POST /subscription/checkout` - Start checkout (session auth)
/// - `POST /subscription/portal` - Open billing portal (session auth)
pub fn create_router(state: AppState) -> Router {
    // Extract config values before moving state
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;
    let subscriptions = state.subscriptions.clone();

    let cors = build_cors_layer(&cors_origins);

    let mut router = Router::new()
        .route("/health", get(health::health))
        .with_state(Arc::new(state));

    if let Some(subscriptions) = subscriptions {
        router = router.merge(subscription_routes(subscriptions, max_body_bytes));
    }

    router
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
}

/// Build the `/subscription` routes, nested under the configured prefix.
///
/// The webhook route is left out of the global body limit: it enforces its
/// own cap and answers oversized bodies with `503`.
fn subscription_routes(state: Arc<SubscriptionState>, max_body_bytes: usize) -> Router {
    let base_path = state.config.base_path().to_string();

    let private_routes = Router::new()
        .route("/checkout", post(subscription::post_checkout))
        .route("/portal", post(subscription::post_portal))
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(ConcurrencyLimitLayer::new(PRIVATE_MAX_CONCURRENT_REQUESTS));

    let public_routes = Router::new()
        .route("/success", get(subscription::get_checkout_success))
        .route("/cancel", get(subscription::get_checkout_cancel))
        .route("/webhook", post(webhooks::post_webhook));

    let routes = Router::new()
        .nest("/subscription", public_routes.merge(private_routes))
        .with_state(state);

    if base_path.is_empty() {
        routes
    } else {
        Router::new().nest(&base_path, routes)
    }
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
