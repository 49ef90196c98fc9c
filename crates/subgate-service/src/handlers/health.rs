//! Health check handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Whether the subscription routes are registered.
    pub subscriptions_enabled: bool,
    /// Display price of the standard plan, when subscriptions are enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub standard_price: Option<String>,
}

/// Health check endpoint.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "subgate".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        subscriptions_enabled: state.has_subscriptions(),
        standard_price: state
            .subscriptions
            .as_ref()
            .map(|subs| subs.standard_price.display()),
    })
}
