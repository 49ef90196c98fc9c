//! Webhook signature verification.
//!
//! Stripe signs every webhook delivery with the endpoint's signing secret.
//! The `Stripe-Signature` header has the form
//! `t=<unix timestamp>,v1=<hex hmac>[,v1=<hex hmac>...]` where each `v1` is
//! `HMAC-SHA256(secret, "<t>.<raw body>")`. Several `v1` entries appear while a
//! secret is being rolled; any one of them matching is enough.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use super::types::WebhookEvent;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age of a signed payload before it is rejected as a replay.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Name of the header carrying the signature.
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Errors raised while verifying or decoding a webhook.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The signature header is absent or empty.
    #[error("missing Stripe-Signature header")]
    MissingHeader,

    /// The header has no timestamp or the timestamp is not a number.
    #[error("malformed Stripe-Signature header")]
    MalformedHeader,

    /// The header carries no `v1` signatures.
    #[error("no v1 signatures in Stripe-Signature header")]
    NoSignatures,

    /// The signed timestamp is outside the tolerance window.
    #[error("timestamp outside tolerance ({age_secs}s)")]
    TimestampOutOfTolerance {
        /// Age of the signature in seconds (negative if in the future).
        age_secs: i64,
    },

    /// No signature matched the expected value.
    #[error("signature mismatch")]
    InvalidSignature,

    /// The payload verified but is not a Stripe event.
    #[error("invalid event payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Parsed `Stripe-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Signing timestamp.
    pub timestamp: i64,
    /// Decoded `v1` signatures. Entries that are not valid hex are dropped.
    pub signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parse a header value.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        if header.trim().is_empty() {
            return Err(WebhookError::MissingHeader);
        }

        let mut timestamp = None;
        let mut signatures = Vec::new();

        for part in header.split(',') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            match key {
                "t" => {
                    timestamp = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_| WebhookError::MalformedHeader)?,
                    );
                }
                "v1" => {
                    if let Ok(sig) = hex::decode(value) {
                        signatures.push(sig);
                    }
                }
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(WebhookError::MalformedHeader)?;
        if signatures.is_empty() {
            return Err(WebhookError::NoSignatures);
        }

        Ok(Self {
            timestamp,
            signatures,
        })
    }
}

fn signed_mac(payload: &[u8], secret: &str, timestamp: i64) -> Result<HmacSha256, WebhookError> {
    // HMAC accepts keys of any length; the error arm is unreachable in practice.
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| WebhookError::InvalidSignature)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Verify a payload's signature at the given point in time.
pub fn verify_signature_at(
    payload: &[u8],
    header: &str,
    secret: &str,
    now: i64,
    tolerance_secs: i64,
) -> Result<(), WebhookError> {
    let header = SignatureHeader::parse(header)?;

    // The timestamp is sender-controlled; an age that overflows is out of tolerance.
    let age_secs = now
        .checked_sub(header.timestamp)
        .ok_or(WebhookError::TimestampOutOfTolerance { age_secs: i64::MAX })?;
    if age_secs.unsigned_abs() > tolerance_secs.unsigned_abs() {
        return Err(WebhookError::TimestampOutOfTolerance { age_secs });
    }

    let mac = signed_mac(payload, secret, header.timestamp)?;
    // `verify_slice` compares in constant time.
    let valid = header
        .signatures
        .iter()
        .any(|sig| mac.clone().verify_slice(sig).is_ok());

    if valid {
        Ok(())
    } else {
        Err(WebhookError::InvalidSignature)
    }
}

/// Verify a webhook delivery and decode its event.
///
/// The event's `api_version` is not compared against the client's pinned
/// version, so deliveries rendered with a newer API version are accepted.
pub fn construct_event(
    payload: &[u8],
    header: &str,
    secret: &str,
) -> Result<WebhookEvent, WebhookError> {
    verify_signature_at(
        payload,
        header,
        secret,
        chrono::Utc::now().timestamp(),
        DEFAULT_TOLERANCE_SECS,
    )?;
    Ok(serde_json::from_slice(payload)?)
}

/// Produce a valid `Stripe-Signature` header for a payload.
///
/// Useful for exercising webhook endpoints without Stripe.
#[must_use]
pub fn signature_header(payload: &[u8], secret: &str, timestamp: i64) -> String {
    let signature = signed_mac(payload, secret, timestamp)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default();
    format!("t={timestamp},v1={signature}")
}
