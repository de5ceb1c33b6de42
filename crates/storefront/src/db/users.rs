//! User repository for database operations.
//!
//! Queries are checked at runtime (`query_as` + `FromRow`) so the crate builds
//! without a live database.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use prostore_core::{Email, UserId, UserRole};

use super::RepositoryError;
use crate::models::user::UserRecord;
use crate::services::auth::CredentialStore;

const TABLE: &str = "users";

/// Raw `storefront.users` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    role: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let role = row
            .role
            .parse::<UserRole>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Self {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email,
            role,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<UserRecord>, RepositoryError> {
        sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, name, email, role, password_hash, created_at
            FROM storefront.users
            WHERE email = $1
            LIMIT 1
            ",
        )
        .bind(email.as_str())
        .fetch_optional(self.pool)
        .await?
        .map(UserRecord::try_from)
        .transpose()
    }

    /// Create a new user with a password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create_with_password(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<UserRecord, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO storefront.users (id, name, email, role, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, role, password_hash, created_at
            ",
        )
        .bind(UserId::new().as_uuid())
        .bind(name)
        .bind(email.as_str())
        .bind(role.as_str())
        .bind(password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, TABLE))?;

        UserRecord::try_from(row)
    }

    /// Replace a user's display name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no user has this ID.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_name(&self, id: UserId, name: &str) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.users
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id.as_uuid())
        .bind(name)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

impl CredentialStore for UserRepository<'_> {
    async fn find_by_email(&self, email: &Email) -> Result<Option<UserRecord>, RepositoryError> {
        self.get_by_email(email).await
    }

    async fn update_name(&self, id: UserId, name: &str) -> Result<(), RepositoryError> {
        Self::update_name(self, id, name).await
    }

    async fn create_user(
        &self,
        name: &str,
        email: &Email,
        password_hash: &str,
        role: UserRole,
    ) -> Result<UserRecord, RepositoryError> {
        self.create_with_password(name, email, password_hash, role)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(email: &str, role: &str) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            name: "NO_NAME".to_string(),
            email: email.to_string(),
            role: role.to_string(),
            password_hash: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_row_conversion() {
        let record = UserRecord::try_from(row("jane@x.com", "admin")).unwrap();
        assert_eq!(record.email.as_str(), "jane@x.com");
        assert_eq!(record.role, UserRole::Admin);
        assert!(record.password_hash.is_none());
    }

    #[test]
    fn test_row_conversion_rejects_corrupt_data() {
        assert!(matches!(
            UserRecord::try_from(row("not-an-email", "user")),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert!(matches!(
            UserRecord::try_from(row("jane@x.com", "superuser")),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
