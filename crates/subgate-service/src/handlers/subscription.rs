//! Browser-facing subscription handlers.
//!
//! Every outcome is a redirect: either to a Stripe-hosted page (`303`) or
//! back to the settings page with a message (`302`).

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::rejection::FormRejection;
use axum::extract::State;
use axum::response::Redirect;
use axum::Form;

use crate::auth::AuthUser;
use crate::error::AppRedirect;
use crate::state::SubscriptionState;
use crate::stripe::SubscriptionCheckout;

const MSG_MISSING_EMAIL: &str = "missing e-mail address";
const MSG_MISSING_FORM: &str = "missing form values";
const MSG_NO_SUBSCRIPTION: &str =
    "no subscription found with your e-mail address, please contact us!";
const MSG_GENERIC_ERROR: &str = "something went wrong";

/// Path of the checkout success callback, relative to the prefix.
pub const SUCCESS_PATH: &str = "/subscription/success";

/// Path of the checkout cancel callback, relative to the prefix.
pub const CANCEL_PATH: &str = "/subscription/cancel";

/// Start a hosted Checkout session for the standard plan.
pub async fn post_checkout(
    State(state): State<Arc<SubscriptionState>>,
    AuthUser { principal }: AuthUser,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Result<Redirect, AppRedirect> {
    let base_path = state.config.base_path();

    let Some(email) = principal.email() else {
        return Err(AppRedirect::settings_error(base_path, MSG_MISSING_EMAIL));
    };

    // No form fields are required; only a body that cannot be read fails.
    match form {
        Ok(_) | Err(FormRejection::InvalidFormContentType(_)) => {}
        Err(e) => {
            tracing::debug!(user_id = %principal.user_id, error = %e, "Unreadable checkout form");
            return Err(AppRedirect::settings_error(base_path, MSG_MISSING_FORM));
        }
    }

    let checkout = SubscriptionCheckout {
        price_id: &state.price_id,
        email,
        success_url: state.config.public_link(SUCCESS_PATH),
        cancel_url: state.config.public_link(CANCEL_PATH),
    };

    let session = state
        .stripe
        .create_checkout_session(&checkout)
        .await
        .map_err(|e| {
            tracing::error!(
                user_id = %principal.user_id,
                error = %e,
                "Failed to create Stripe checkout session"
            );
            AppRedirect::settings_error(base_path, MSG_GENERIC_ERROR)
        })?;

    let Some(url) = session.url else {
        tracing::error!(
            user_id = %principal.user_id,
            session_id = %session.id,
            "Stripe checkout session has no URL"
        );
        return Err(AppRedirect::settings_error(base_path, MSG_GENERIC_ERROR));
    };

    tracing::info!(
        user_id = %principal.user_id,
        session_id = %session.id,
        "Redirecting to Stripe checkout"
    );

    Ok(Redirect::to(&url))
}

/// Open the hosted billing portal for the user's Stripe customer.
pub async fn post_portal(
    State(state): State<Arc<SubscriptionState>>,
    AuthUser { principal }: AuthUser,
) -> Result<Redirect, AppRedirect> {
    let base_path = state.config.base_path();

    let Some(email) = principal.email() else {
        return Err(AppRedirect::settings_error(base_path, MSG_NO_SUBSCRIPTION));
    };

    let customer = match state.stripe.find_customer_by_email(email).await {
        Ok(Some(customer)) => customer,
        Ok(None) => {
            tracing::info!(user_id = %principal.user_id, "No Stripe customer for e-mail");
            return Err(AppRedirect::settings_error(base_path, MSG_NO_SUBSCRIPTION));
        }
        Err(e) => {
            tracing::error!(
                user_id = %principal.user_id,
                error = %e,
                "Failed to search Stripe customers"
            );
            return Err(AppRedirect::settings_error(base_path, MSG_NO_SUBSCRIPTION));
        }
    };

    let session = state
        .stripe
        .create_portal_session(&customer.id, state.config.public_url())
        .await
        .map_err(|e| {
            tracing::error!(
                user_id = %principal.user_id,
                customer_id = %customer.id,
                error = %e,
                "Failed to create Stripe portal session"
            );
            AppRedirect::settings_error(base_path, MSG_GENERIC_ERROR)
        })?;

    Ok(Redirect::to(&session.url))
}

/// Landing page after a completed checkout.
pub async fn get_checkout_success(State(state): State<Arc<SubscriptionState>>) -> AppRedirect {
    let message = match state.config.app_name() {
        Some(name) => format!("you have successfully subscribed to {name}!"),
        None => "you have successfully subscribed!".to_string(),
    };
    AppRedirect::settings_success(state.config.base_path(), &message)
}

/// Landing page after an abandoned checkout.
pub async fn get_checkout_cancel(State(state): State<Arc<SubscriptionState>>) -> AppRedirect {
    AppRedirect::settings(state.config.base_path())
}
