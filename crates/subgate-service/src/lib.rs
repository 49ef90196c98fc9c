//! Subgate HTTP subscription gateway.
//!
//! This crate sits between a web application's user accounts and Stripe:
//!
//! - Hosted Checkout for new subscriptions
//! - Hosted billing portal for existing customers
//! - Signed Stripe webhooks for subscription lifecycle events
//! - Success/cancel landing redirects
//!
//! # Authentication
//!
//! Checkout and portal requests carry the web application's HS256 session
//! token, either as a Bearer token or in the session cookie. Webhooks are
//! authenticated by their Stripe signature.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Redirect handlers need async for routing

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::{ConfigError, ServiceConfig, SubscriptionsConfig};
pub use error::{ApiError, AppRedirect};
pub use routes::create_router;
pub use state::{AppState, StartupError, SubscriptionState};
pub use stripe::{StripeClient, StripeError};
