//! Stripe API types.
//!
//! Only the fields the gateway reads are modelled; everything else in the
//! Stripe payloads is ignored during deserialization.

use serde::Deserialize;

use subgate_core::{CustomerId, PriceId, SubscriptionId};

/// Currencies Stripe bills in whole units (no minor unit).
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "bif", "clp", "djf", "gnf", "jpy", "kmf", "krw", "mga", "pyg", "rwf", "ugx", "vnd", "vuv",
    "xaf", "xof", "xpf",
];

/// Stripe price object.
#[derive(Debug, Clone, Deserialize)]
pub struct Price {
    /// Price ID.
    pub id: PriceId,
    /// Three-letter ISO currency code, lowercase.
    pub currency: String,
    /// Unit amount in the currency's minor unit.
    #[serde(default)]
    pub unit_amount: Option<i64>,
    /// Unit amount as a decimal string, for sub-cent prices.
    #[serde(default)]
    pub unit_amount_decimal: Option<String>,
    /// Recurring billing details, absent for one-time prices.
    #[serde(default)]
    pub recurring: Option<Recurring>,
    /// Whether the price can be used for new purchases.
    #[serde(default)]
    pub active: bool,
}

/// Recurring component of a price.
#[derive(Debug, Clone, Deserialize)]
pub struct Recurring {
    /// Billing interval (`day`, `week`, `month` or `year`).
    pub interval: String,
    /// Number of intervals between billings.
    #[serde(default = "default_interval_count")]
    pub interval_count: u32,
}

fn default_interval_count() -> u32 {
    1
}

impl Price {
    fn is_zero_decimal(&self) -> bool {
        ZERO_DECIMAL_CURRENCIES.contains(&self.currency.to_ascii_lowercase().as_str())
    }

    /// Amount in the currency's major unit (e.g. euros rather than cents).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn major_amount(&self) -> Option<f64> {
        let minor = match (self.unit_amount, &self.unit_amount_decimal) {
            (Some(amount), _) => amount as f64,
            (None, Some(decimal)) => decimal.parse::<f64>().ok()?,
            (None, None) => return None,
        };

        if self.is_zero_decimal() {
            Some(minor)
        } else {
            Some(minor / 100.0)
        }
    }

    /// Human-readable price, e.g. `"9.00 EUR / month"`.
    #[must_use]
    pub fn display(&self) -> String {
        let currency = self.currency.to_ascii_uppercase();
        let amount = match self.major_amount() {
            Some(amount) if self.is_zero_decimal() => format!("{amount:.0} {currency}"),
            Some(amount) => format!("{amount:.2} {currency}"),
            None => format!("? {currency}"),
        };

        match &self.recurring {
            Some(r) if r.interval_count > 1 => {
                format!("{amount} / {} {}s", r.interval_count, r.interval)
            }
            Some(r) => format!("{amount} / {}", r.interval),
            None => amount,
        }
    }
}

/// Stripe Checkout session object.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    /// Session ID.
    pub id: String,
    /// Hosted checkout URL to redirect the user to.
    #[serde(default)]
    pub url: Option<String>,
    /// Session mode (`subscription`, `payment` or `setup`).
    #[serde(default)]
    pub mode: Option<String>,
    /// Client reference ID (the user's email).
    #[serde(default)]
    pub client_reference_id: Option<String>,
}

/// Stripe billing portal session object.
#[derive(Debug, Clone, Deserialize)]
pub struct PortalSession {
    /// Session ID.
    pub id: String,
    /// Hosted portal URL to redirect the user to.
    pub url: String,
    /// Customer the session belongs to.
    #[serde(default)]
    pub customer: Option<String>,
}

/// Stripe customer object.
#[derive(Debug, Clone, Deserialize)]
pub struct Customer {
    /// Stripe customer ID.
    pub id: CustomerId,
    /// Customer email.
    #[serde(default)]
    pub email: Option<String>,
    /// Customer name.
    #[serde(default)]
    pub name: Option<String>,
    /// Set for customers that have been deleted.
    #[serde(default)]
    pub deleted: bool,
}

/// A reference to a customer that may or may not have been expanded.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum CustomerRef {
    /// Bare customer ID.
    Id(CustomerId),
    /// Expanded customer object.
    Object(Box<Customer>),
}

impl CustomerRef {
    /// The referenced customer's ID.
    #[must_use]
    pub fn id(&self) -> &CustomerId {
        match self {
            Self::Id(id) => id,
            Self::Object(customer) => &customer.id,
        }
    }
}

/// Subscription status as reported by Stripe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Initial payment attempt failed or requires action.
    Incomplete,
    /// Initial payment was never completed.
    IncompleteExpired,
    /// In a trial period.
    Trialing,
    /// Paid and active.
    Active,
    /// Latest payment failed, retries pending.
    PastDue,
    /// Canceled.
    Canceled,
    /// Retries exhausted.
    Unpaid,
    /// Trial ended without a payment method.
    Paused,
    /// A status this service does not know about.
    #[serde(other)]
    Unknown,
}

impl SubscriptionStatus {
    /// Stripe's wire name for the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Incomplete => "incomplete",
            Self::IncompleteExpired => "incomplete_expired",
            Self::Trialing => "trialing",
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Unpaid => "unpaid",
            Self::Paused => "paused",
            Self::Unknown => "unknown",
        }
    }
}

/// Stripe subscription object, as embedded in `customer.subscription.*` events.
#[derive(Debug, Clone, Deserialize)]
pub struct Subscription {
    /// Subscription ID.
    pub id: SubscriptionId,
    /// Customer the subscription belongs to.
    pub customer: CustomerRef,
    /// Current status.
    pub status: SubscriptionStatus,
    /// End of the current billing period (Unix).
    #[serde(default)]
    pub current_period_end: Option<i64>,
    /// Whether the subscription ends at the period end.
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Stripe webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    /// Event ID.
    pub id: String,
    /// Event type (e.g. `customer.subscription.updated`).
    #[serde(rename = "type")]
    pub event_type: String,
    /// API version the event payload was rendered with.
    #[serde(default)]
    pub api_version: Option<String>,
    /// Created timestamp (Unix).
    #[serde(default)]
    pub created: i64,
    /// Whether the event comes from live mode.
    #[serde(default)]
    pub livemode: bool,
    /// Event data.
    pub data: WebhookEventData,
}

/// Webhook event data container.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEventData {
    /// The raw event object.
    pub object: serde_json::Value,
}

/// Stripe search response wrapper.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResult<T> {
    /// Matching items.
    pub data: Vec<T>,
    /// Whether more results are available.
    #[serde(default)]
    pub has_more: bool,
    /// Cursor for the next page.
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Stripe API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorResponse {
    /// Error details.
    pub error: StripeErrorDetail,
}

/// Stripe error detail.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorDetail {
    /// Error type.
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error message.
    #[serde(default)]
    pub message: String,
    /// Error code.
    #[serde(default)]
    pub code: Option<String>,
    /// Parameter that caused the error.
    #[serde(default)]
    pub param: Option<String>,
}
