//! Service configuration.

use serde::Deserialize;
use std::path::Path;

use subgate_core::{IdError, PriceId};

use crate::stripe::StripeClient;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:3000").
    pub listen_addr: String,

    /// Public URL of the web application, without path prefix
    /// (default: `http://localhost:3000`).
    pub public_url: String,

    /// Path prefix the web application is mounted under (default: empty).
    pub base_path: String,

    /// Product name shown in the subscription success message.
    pub app_name: Option<String>,

    /// Shared secret used to validate session tokens (HS256).
    pub auth_jwt_secret: Option<String>,

    /// Cookie carrying the session token (default: `subgate_session`).
    pub auth_cookie_name: String,

    /// Subscription settings.
    pub subscriptions: SubscriptionsConfig,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes for interactive routes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Stripe subscription settings.
#[derive(Debug, Clone)]
pub struct SubscriptionsConfig {
    /// Whether the subscription routes are registered at all.
    pub enabled: bool,

    /// Stripe secret API key.
    pub stripe_secret_key: Option<String>,

    /// Webhook endpoint signing secret (`whsec_...`).
    pub stripe_endpoint_secret: Option<String>,

    /// Price ID of the standard plan.
    pub standard_price_id: Option<String>,

    /// Stripe API host (default: `https://api.stripe.com`).
    pub stripe_api_base: String,
}

/// Configuration errors detected at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is missing.
    #[error("missing required setting: {0}")]
    Missing(&'static str),

    /// The configured price ID is not a valid identifier.
    #[error("invalid standard price id: {0}")]
    InvalidPriceId(#[from] IdError),

    /// The public URL is not an absolute http(s) URL.
    #[error("public url must start with http:// or https://: {0}")]
    InvalidPublicUrl(String),

    /// The base path does not start with a slash.
    #[error("base path must be empty or start with '/': {0}")]
    InvalidBasePath(String),
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    secret_key: String,
    #[serde(default)]
    endpoint_secret: Option<String>,
    #[serde(default)]
    standard_price_id: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (stripe_secret_key, stripe_endpoint_secret, secrets_price_id) = load_stripe_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into()),
            public_url: std::env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            base_path: std::env::var("BASE_PATH").unwrap_or_default(),
            app_name: std::env::var("APP_NAME").ok(),
            auth_jwt_secret: std::env::var("AUTH_JWT_SECRET").ok(),
            auth_cookie_name: std::env::var("AUTH_COOKIE_NAME")
                .unwrap_or_else(|_| "subgate_session".into()),
            subscriptions: SubscriptionsConfig {
                enabled: std::env::var("SUBSCRIPTIONS_ENABLED")
                    .map(|v| parse_bool(&v))
                    .unwrap_or(false),
                stripe_secret_key,
                stripe_endpoint_secret,
                standard_price_id: std::env::var("STRIPE_STANDARD_PRICE_ID")
                    .ok()
                    .or(secrets_price_id),
                stripe_api_base: std::env::var("STRIPE_API_BASE")
                    .unwrap_or_else(|_| StripeClient::DEFAULT_BASE_URL.into()),
            },
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }

    /// Check that the configuration is usable.
    ///
    /// Subscriptions need the Stripe keys, a price and a session secret;
    /// with subscriptions disabled only the URLs are checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.public_url.starts_with("http://") || self.public_url.starts_with("https://")) {
            return Err(ConfigError::InvalidPublicUrl(self.public_url.clone()));
        }
        if !self.base_path.is_empty() && !self.base_path.starts_with('/') {
            return Err(ConfigError::InvalidBasePath(self.base_path.clone()));
        }

        if !self.subscriptions.enabled {
            return Ok(());
        }

        let subs = &self.subscriptions;
        non_empty(subs.stripe_secret_key.as_deref(), "STRIPE_SECRET_KEY")?;
        non_empty(subs.stripe_endpoint_secret.as_deref(), "STRIPE_ENDPOINT_SECRET")?;
        non_empty(self.auth_jwt_secret.as_deref(), "AUTH_JWT_SECRET")?;
        self.standard_price_id()?;

        Ok(())
    }

    /// The configured standard price, parsed.
    pub fn standard_price_id(&self) -> Result<PriceId, ConfigError> {
        let raw = self
            .subscriptions
            .standard_price_id
            .as_deref()
            .ok_or(ConfigError::Missing("STRIPE_STANDARD_PRICE_ID"))?;
        Ok(PriceId::new(raw)?)
    }

    /// Path prefix without trailing slash (`""` when mounted at the root).
    #[must_use]
    pub fn base_path(&self) -> &str {
        self.base_path.trim_end_matches('/')
    }

    /// Public URL without trailing slash.
    #[must_use]
    pub fn public_url(&self) -> &str {
        self.public_url.trim_end_matches('/')
    }

    /// Product name, if one is configured and not blank.
    #[must_use]
    pub fn app_name(&self) -> Option<&str> {
        self.app_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    /// Absolute URL of a path inside the application.
    #[must_use]
    pub fn public_link(&self, path: &str) -> String {
        format!("{}{}{}", self.public_url(), self.base_path(), path)
    }
}

fn non_empty(value: Option<&str>, name: &'static str) -> Result<(), ConfigError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(()),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>, Option<String>) {
    let secret_paths = [".secrets/stripe.json", "../.secrets/stripe.json"];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (
                Some(secrets.secret_key),
                secrets
                    .endpoint_secret
                    .or_else(|| std::env::var("STRIPE_ENDPOINT_SECRET").ok()),
                secrets.standard_price_id,
            );
        }
    }

    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_SECRET_KEY").ok(),
        std::env::var("STRIPE_ENDPOINT_SECRET").ok(),
        None,
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for SubscriptionsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            stripe_secret_key: None,
            stripe_endpoint_secret: None,
            standard_price_id: None,
            stripe_api_base: StripeClient::DEFAULT_BASE_URL.into(),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".into(),
            public_url: "http://localhost:3000".into(),
            base_path: String::new(),
            app_name: None,
            auth_jwt_secret: None,
            auth_cookie_name: "subgate_session".into(),
            subscriptions: SubscriptionsConfig::default(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
