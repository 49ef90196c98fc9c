//! The authenticated user making a request.

use serde::{Deserialize, Serialize};

use crate::UserId;

/// An authenticated user.
///
/// Principals are produced by the authentication layer. The email may be
/// empty for accounts that never provided one; such principals cannot start
/// a checkout or open the billing portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The local user ID.
    pub user_id: UserId,

    /// The user's email address (may be empty).
    #[serde(default)]
    pub email: String,
}

impl Principal {
    /// Create a new principal.
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
        }
    }

    /// Returns the trimmed email address, or `None` if it is blank.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        let email = self.email.trim();
        (!email.is_empty()).then_some(email)
    }
}
