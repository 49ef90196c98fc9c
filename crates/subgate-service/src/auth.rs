//! Authentication extractor.
//!
//! The web application issues HS256 session tokens; this module validates
//! them and turns them into a [`Principal`]. The token is taken from the
//! `Authorization: Bearer` header or, for plain browser form posts, from the
//! session cookie.

use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use subgate_core::{Principal, UserId};

use crate::error::AppRedirect;
use crate::state::SubscriptionState;

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID).
    pub sub: String,
    /// The user's email, empty if unknown.
    #[serde(default)]
    pub email: String,
    /// Expiration time.
    pub exp: i64,
}

/// Keys and settings for validating session tokens.
#[derive(Clone)]
pub struct SessionAuth {
    decoding_key: DecodingKey,
    validation: Validation,
    cookie_name: String,
}

impl SessionAuth {
    /// Create a validator for tokens signed with `secret`.
    #[must_use]
    pub fn new(secret: &str, cookie_name: impl Into<String>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            cookie_name: cookie_name.into(),
        }
    }

    /// Validate a token and build the principal it describes.
    pub fn principal(&self, token: &str) -> Option<Principal> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| tracing::debug!(error = %e, "Rejected session token"))
            .ok()?;

        let user_id = UserId::new(data.claims.sub).ok()?;
        Some(Principal::new(user_id, data.claims.email))
    }

    /// Find the session token in the request headers.
    fn token(&self, headers: &HeaderMap) -> Option<String> {
        if let Some(token) = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
        {
            return Some(token.trim().to_string());
        }

        CookieJar::from_headers(headers)
            .get(&self.cookie_name)
            .map(|cookie| cookie.value_trimmed().to_string())
    }
}

/// An authenticated user.
///
/// Rejected requests are redirected to the application's landing page with
/// `?error=unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The authenticated principal.
    pub principal: Principal,
}

#[async_trait]
impl FromRequestParts<Arc<SubscriptionState>> for AuthUser {
    type Rejection = AppRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SubscriptionState>,
    ) -> Result<Self, Self::Rejection> {
        let unauthorized = || AppRedirect::unauthorized(state.config.base_path());

        let token = state.auth.token(&parts.headers).ok_or_else(unauthorized)?;
        let principal = state.auth.principal(&token).ok_or_else(unauthorized)?;

        Ok(AuthUser { principal })
    }
}
