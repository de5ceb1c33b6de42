//! User domain types.
//!
//! These types represent validated domain objects separate from database row types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use prostore_core::{Email, UserId, UserRole};

/// Placeholder display name given to accounts created without one.
///
/// Replaced by the email's local part the first time the account signs in.
pub const NO_NAME: &str = "NO_NAME";

/// A storefront account as held by the credential store.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Unique user ID.
    pub id: UserId,
    /// Display name (may be [`NO_NAME`]).
    pub name: String,
    /// Sign-in email.
    pub email: Email,
    /// Account role.
    pub role: UserRole,
    /// Argon2 PHC string; `None` for accounts that cannot use a password.
    pub password_hash: Option<String>,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}

impl UserRecord {
    /// Project the record to the identity handed out after authentication.
    #[must_use]
    pub fn identity(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// The minimal identity returned by a successful credential check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub role: UserRole,
}
