//! Stripe webhook handler.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use crate::error::ApiError;
use crate::state::SubscriptionState;
use crate::stripe::webhook::SIGNATURE_HEADER;
use crate::stripe::{construct_event, Customer, StripeClient, Subscription, WebhookEvent};

/// Largest webhook body accepted, in bytes.
pub const WEBHOOK_MAX_BODY_BYTES: usize = 65_536;

const SUBSCRIPTION_CREATED: &str = "customer.subscription.created";
const SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
const SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle Stripe webhooks.
pub async fn post_webhook(
    State(state): State<Arc<SubscriptionState>>,
    headers: HeaderMap,
    body: Body,
) -> Result<Json<WebhookResponse>, ApiError> {
    let payload = axum::body::to_bytes(body, WEBHOOK_MAX_BODY_BYTES)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "Error reading Stripe webhook request");
            ApiError::ServiceUnavailable("unable to read request body".into())
        })?;

    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let event = construct_event(&payload, signature, &state.endpoint_secret).map_err(|e| {
        tracing::error!(error = %e, "Stripe webhook signature verification failed");
        ApiError::BadRequest("invalid webhook signature".into())
    })?;

    if event
        .api_version
        .as_deref()
        .is_some_and(|v| v != StripeClient::API_VERSION)
    {
        tracing::debug!(
            event_id = %event.id,
            api_version = ?event.api_version,
            "Accepting Stripe event rendered with a different API version"
        );
    }

    match event.event_type.as_str() {
        SUBSCRIPTION_CREATED | SUBSCRIPTION_UPDATED | SUBSCRIPTION_DELETED => {
            let (subscription, customer) = parse_subscription(&state, &event).await?;

            tracing::info!(
                event_type = %event.event_type,
                subscription_id = %subscription.id,
                status = subscription.status.as_str(),
                customer_id = %customer.id,
                email = customer.email.as_deref().unwrap_or_default(),
                "Associated Stripe customer with subscription event"
            );
            // TODO: update the user's subscription period: set it to
            // `current_period_end` while `active`, clear it once `canceled` or
            // `unpaid` and the period has ended. Needs a user store lookup by
            // customer email first.
        }
        other => {
            tracing::warn!(event_type = %other, event_id = %event.id, "Got Stripe event with no handler defined");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

/// Decode the event's subscription and fetch its full customer record.
async fn parse_subscription(
    state: &SubscriptionState,
    event: &WebhookEvent,
) -> Result<(Subscription, Customer), ApiError> {
    let subscription: Subscription = serde_json::from_value(event.data.object.clone())
        .map_err(|e| {
            tracing::error!(event_id = %event.id, error = %e, "Failed to parse Stripe webhook payload");
            ApiError::BadRequest("invalid subscription payload".into())
        })?;

    let customer_id = subscription.customer.id();
    let customer = match state.stripe.get_customer(customer_id).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            tracing::error!(customer_id = %customer_id, "Stripe customer not found");
            return Err(ApiError::BadRequest("unknown customer".into()));
        }
        Err(e) => {
            tracing::error!(customer_id = %customer_id, error = %e, "Failed to fetch Stripe customer");
            return Err(ApiError::BadRequest("customer lookup failed".into()));
        }
    };

    Ok((subscription, customer))
}
