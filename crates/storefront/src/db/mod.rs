//! Database operations for storefront `PostgreSQL`.
//!
//! # Schema: `storefront`
//!
//! - `users` - Accounts (the credential store)
//! - `orders` - Placed orders, shipping address as JSONB
//! - `order_items` - Order lines frozen at checkout
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p prostore-cli -- migrate
//! ```

pub mod orders;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

/// Errors returned by repositories.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation; `field` is the offending column when known.
    #[error("unique constraint violation on {}", .field.as_deref().unwrap_or("unknown field"))]
    Conflict { field: Option<String> },
}

impl RepositoryError {
    /// Classify a write error, turning unique violations into `Conflict`.
    ///
    /// `table` is used to strip the table prefix from Postgres' default
    /// `<table>_<column>_key` constraint names.
    pub(crate) fn from_write(error: sqlx::Error, table: &str) -> Self {
        if let sqlx::Error::Database(ref db_err) = error
            && db_err.is_unique_violation()
        {
            let field = db_err
                .constraint()
                .and_then(|constraint| field_from_constraint(constraint, table));
            return Self::Conflict { field };
        }
        Self::Database(error)
    }
}

/// Extract the column name from a `<table>_<column>_key` constraint name.
fn field_from_constraint(constraint: &str, table: &str) -> Option<String> {
    let column = constraint
        .strip_prefix(table)
        .and_then(|rest| rest.strip_prefix('_'))?;
    let column = column
        .strip_suffix("_key")
        .or_else(|| column.strip_suffix("_idx"))
        .unwrap_or(column);
    (!column.is_empty()).then(|| column.to_string())
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
