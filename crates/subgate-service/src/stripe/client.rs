//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use subgate_core::{CustomerId, PriceId};

use super::types::{
    CheckoutSession, Customer, PortalSession, Price, SearchResult, StripeErrorResponse,
};

/// Timeout applied to every outbound Stripe request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed or the response body could not be decoded.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error ({status}): {error_type} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },
}

/// Parameters for a hosted subscription checkout with a single line item.
#[derive(Debug, Clone)]
pub struct SubscriptionCheckout<'a> {
    /// Price the customer subscribes to.
    pub price_id: &'a PriceId,
    /// Email used both as customer email and client reference.
    pub email: &'a str,
    /// Where Stripe sends the browser after a successful checkout.
    pub success_url: String,
    /// Where Stripe sends the browser when checkout is abandoned.
    pub cancel_url: String,
}

impl SubscriptionCheckout<'_> {
    /// Form parameters for `POST /v1/checkout/sessions`.
    #[must_use]
    pub fn form_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("mode", "subscription".to_string()),
            ("line_items[0][price]", self.price_id.to_string()),
            ("line_items[0][quantity]", "1".to_string()),
            ("customer_email", self.email.to_string()),
            ("client_reference_id", self.email.to_string()),
            ("success_url", self.success_url.clone()),
            ("cancel_url", self.cancel_url.clone()),
        ]
    }
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    /// Stripe API base URL.
    pub const DEFAULT_BASE_URL: &'static str = "https://api.stripe.com";

    /// API version requests are pinned to. Webhook payloads rendered with
    /// other versions are still accepted.
    pub const API_VERSION: &'static str = "2022-11-15";

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, StripeError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API host (used by tests).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.base_url, path)
    }

    /// Retrieve a price by ID.
    pub async fn get_price(&self, price_id: &PriceId) -> Result<Price, StripeError> {
        let response = self
            .client
            .get(self.url(&format!("/prices/{price_id}")))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .header("Stripe-Version", Self::API_VERSION)
            .send()
            .await?;

        handle_response(response).await
    }

    /// Create a hosted Checkout session in subscription mode.
    pub async fn create_checkout_session(
        &self,
        checkout: &SubscriptionCheckout<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        tracing::debug!(
            price_id = %checkout.price_id,
            success_url = %checkout.success_url,
            cancel_url = %checkout.cancel_url,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(self.url("/checkout/sessions"))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .header("Stripe-Version", Self::API_VERSION)
            .form(&checkout.form_params())
            .send()
            .await?;

        handle_response(response).await
    }

    /// Create a billing portal session for an existing customer.
    pub async fn create_portal_session(
        &self,
        customer_id: &CustomerId,
        return_url: &str,
    ) -> Result<PortalSession, StripeError> {
        let response = self
            .client
            .post(self.url("/billing_portal/sessions"))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .header("Stripe-Version", Self::API_VERSION)
            .form(&[("customer", customer_id.as_str()), ("return_url", return_url)])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Get a customer by ID. Returns `None` if Stripe does not know the ID.
    pub async fn get_customer(
        &self,
        customer_id: &CustomerId,
    ) -> Result<Option<Customer>, StripeError> {
        let response = self
            .client
            .get(self.url(&format!("/customers/{customer_id}")))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .header("Stripe-Version", Self::API_VERSION)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        handle_response(response).await.map(Some)
    }

    /// Search customers with Stripe's search query language.
    pub async fn search_customers(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<SearchResult<Customer>, StripeError> {
        let limit = limit.clamp(1, 100).to_string();

        let response = self
            .client
            .get(self.url("/customers/search"))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .header("Stripe-Version", Self::API_VERSION)
            .query(&[("query", query), ("limit", limit.as_str())])
            .send()
            .await?;

        handle_response(response).await
    }

    /// Find the first customer whose email matches exactly.
    ///
    /// Several customers may share an email; only the first search hit is
    /// returned and no attempt is made to pick between them.
    pub async fn find_customer_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Customer>, StripeError> {
        let result = self.search_customers(&email_query(email), 1).await?;
        Ok(result.data.into_iter().next())
    }
}

/// Build an exact-match email query, escaping quotes and backslashes.
fn email_query(email: &str) -> String {
    let escaped = email.replace('\\', "\\\\").replace('"', "\\\"");
    format!("email:\"{escaped}\"")
}

/// Handle API response and convert errors.
async fn handle_response<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StripeError> {
    let status = response.status();

    if status.is_success() {
        return Ok(response.json().await?);
    }

    let error_body: Result<StripeErrorResponse, _> = response.json().await;

    match error_body {
        Ok(stripe_error) => Err(StripeError::Api {
            status: status.as_u16(),
            error_type: stripe_error.error.error_type,
            message: stripe_error.error.message,
            code: stripe_error.error.code,
        }),
        Err(_) => Err(StripeError::Api {
            status: status.as_u16(),
            error_type: "unknown".to_string(),
            message: format!("HTTP {status}"),
            code: None,
        }),
    }
}
