//! Stripe integration for subscriptions.
//!
//! Stripe handles:
//! - Price lookup for the standard plan
//! - Hosted Checkout for new subscriptions
//! - Hosted billing portal for existing customers
//! - Signed webhooks for subscription lifecycle events

pub mod client;
pub mod types;
pub mod webhook;

pub use client::{StripeClient, StripeError, SubscriptionCheckout};
pub use types::*;
pub use webhook::{construct_event, signature_header, WebhookError};
