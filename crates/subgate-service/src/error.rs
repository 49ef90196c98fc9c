//! API error types and responses.
//!
//! Two kinds of failures leave this service:
//!
//! - [`ApiError`] for server-to-server endpoints (webhooks), rendered as a
//!   JSON body with a matching status code.
//! - [`AppRedirect`] for browser-facing endpoints, rendered as a `302 Found`
//!   back into the web application with a human-readable message.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Anchor of the subscription section on the settings page.
const SUBSCRIPTION_ANCHOR: &str = "#subscription";

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Bad request - invalid input or signature.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The request body could not be read.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg),
            Self::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// A `302 Found` redirect back into the web application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRedirect {
    location: String,
}

impl AppRedirect {
    /// Settings page showing an error message.
    #[must_use]
    pub fn settings_error(base_path: &str, message: &str) -> Self {
        Self {
            location: format!(
                "{base_path}/settings?error={}{SUBSCRIPTION_ANCHOR}",
                urlencoding::encode(message)
            ),
        }
    }

    /// Settings page showing a success message.
    #[must_use]
    pub fn settings_success(base_path: &str, message: &str) -> Self {
        Self {
            location: format!(
                "{base_path}/settings?success={}{SUBSCRIPTION_ANCHOR}",
                urlencoding::encode(message)
            ),
        }
    }

    /// Plain settings page.
    #[must_use]
    pub fn settings(base_path: &str) -> Self {
        Self {
            location: format!("{base_path}/settings{SUBSCRIPTION_ANCHOR}"),
        }
    }

    /// Landing page for unauthenticated requests.
    #[must_use]
    pub fn unauthorized(base_path: &str) -> Self {
        Self {
            location: format!("{base_path}/?error=unauthorized"),
        }
    }

    /// Redirect target.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }
}

impl IntoResponse for AppRedirect {
    fn into_response(self) -> Response {
        (StatusCode::FOUND, [(header::LOCATION, self.location)]).into_response()
    }
}
