//! Storefront user management.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin (password read from PS_CLI_USER_PASSWORD if omitted)
//! ps-cli user create -e admin@example.com -n "Admin Name" -r admin --password '...'
//! ```

use prostore_core::{Email, EmailError, RoleError, UserRole};
use prostore_storefront::db::{self, RepositoryError, users::UserRepository};
use prostore_storefront::services::auth::{self, AuthError};
use thiserror::Error;

use super::{CommandError, database_url};

/// Errors that can occur while creating users.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Invalid role.
    #[error("{0}. Valid roles: user, admin")]
    InvalidRole(#[from] RoleError),

    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password rejected or could not be hashed.
    #[error(transparent)]
    Password(#[from] AuthError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("Database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for UserError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::Database(e) => Self::Command(CommandError::Database(e)),
            other => Self::Repository(other),
        }
    }
}

/// Create a password account.
///
/// # Errors
///
/// Returns an error for an invalid email, role or password, an existing
/// account, or a database failure.
pub async fn create(email: &str, name: &str, role: &str, password: &str) -> Result<(), UserError> {
    let role: UserRole = role.parse()?;
    let email = Email::parse(email)?;
    auth::validate_password(password)?;
    let hash = auth::hash_password(password)?;

    let pool = db::create_pool(&database_url()?)
        .await
        .map_err(CommandError::from)?;
    let users = UserRepository::new(&pool);

    tracing::info!("Creating user: {} ({})", email, role);

    let user = match users.create_with_password(name, &email, &hash, role).await {
        Ok(user) => user,
        Err(RepositoryError::Conflict { .. }) => {
            return Err(UserError::UserExists(email.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(
        "User created. ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}
