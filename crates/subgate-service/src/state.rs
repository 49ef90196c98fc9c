//! Application state.

use std::sync::Arc;

use subgate_core::PriceId;

use crate::auth::SessionAuth;
use crate::config::{ConfigError, ServiceConfig};
use crate::stripe::{Price, StripeClient, StripeError};

/// Errors that prevent the service from starting.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// The configuration is incomplete or invalid.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The Stripe client could not be built.
    #[error("failed to create Stripe client: {0}")]
    Client(#[source] StripeError),

    /// The standard price could not be fetched from Stripe.
    #[error("failed to fetch stripe plan details for {price_id}: {source}")]
    PriceLookup {
        /// Configured price ID.
        price_id: PriceId,
        /// Underlying Stripe error.
        #[source]
        source: StripeError,
    },
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// Subscription state, present only when subscriptions are enabled.
    pub subscriptions: Option<Arc<SubscriptionState>>,
}

/// State behind the `/subscription` routes.
#[derive(Clone)]
pub struct SubscriptionState {
    /// Service configuration.
    pub config: ServiceConfig,

    /// Stripe API client.
    pub stripe: StripeClient,

    /// Session token validation.
    pub auth: SessionAuth,

    /// Price every checkout subscribes to.
    pub price_id: PriceId,

    /// Price details fetched at startup.
    pub standard_price: Price,

    /// Webhook endpoint signing secret.
    pub endpoint_secret: String,
}

impl AppState {
    /// Validate the configuration and connect to Stripe.
    ///
    /// When subscriptions are enabled the standard price is fetched once;
    /// a failure here is fatal because every checkout depends on it.
    pub async fn bootstrap(config: ServiceConfig) -> Result<Self, StartupError> {
        config.validate()?;

        if !config.subscriptions.enabled {
            tracing::warn!("Subscriptions disabled - subscription routes will not be registered");
            return Ok(Self {
                config,
                subscriptions: None,
            });
        }

        let subs = &config.subscriptions;
        let price_id = config.standard_price_id()?;
        let secret_key = subs
            .stripe_secret_key
            .clone()
            .ok_or(ConfigError::Missing("STRIPE_SECRET_KEY"))?;
        let endpoint_secret = subs
            .stripe_endpoint_secret
            .clone()
            .ok_or(ConfigError::Missing("STRIPE_ENDPOINT_SECRET"))?;
        let jwt_secret = config
            .auth_jwt_secret
            .as_deref()
            .ok_or(ConfigError::Missing("AUTH_JWT_SECRET"))?;

        let stripe = StripeClient::new(secret_key)
            .map_err(StartupError::Client)?
            .with_base_url(&subs.stripe_api_base);

        let standard_price =
            stripe
                .get_price(&price_id)
                .await
                .map_err(|source| StartupError::PriceLookup {
                    price_id: price_id.clone(),
                    source,
                })?;

        tracing::info!(
            price_id = %price_id,
            price = %standard_price.display(),
            "Enabling subscriptions with Stripe payment"
        );

        let subscriptions = SubscriptionState {
            auth: SessionAuth::new(jwt_secret, config.auth_cookie_name.clone()),
            config: config.clone(),
            stripe,
            price_id,
            standard_price,
            endpoint_secret,
        };

        Ok(Self {
            config,
            subscriptions: Some(Arc::new(subscriptions)),
        })
    }

    /// Check if subscriptions are enabled.
    #[must_use]
    pub fn has_subscriptions(&self) -> bool {
        self.subscriptions.is_some()
    }
}
