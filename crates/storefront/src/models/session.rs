//! Session-related types.
//!
//! The session lives entirely in a signed token cookie; nothing here is
//! stored server-side.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prostore_core::{UserId, UserRole};

/// The signed-in user as seen by handlers and templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionUser {
    pub id: UserId,
    pub name: String,
    pub email: Option<String>,
    pub role: UserRole,
}

/// A decoded, projected session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub user: SessionUser,
    /// When the underlying token stops being accepted.
    pub expires: DateTime<Utc>,
}

impl SessionView {
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.role.is_admin()
    }
}

/// Cookie names used by the storefront.
pub mod cookie_names {
    /// Signed session token (JWT).
    pub const SESSION_TOKEN: &str = "session-token";

    /// Anonymous cart key, set for every browser.
    pub const SESSION_CART_ID: &str = "sessionCartId";
}
