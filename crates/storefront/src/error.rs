//! Unified error handling with Sentry integration.
//!
//! All route handlers return `Result<T, AppError>`. Server-side failures are
//! captured to Sentry before the response is built; clients only ever see
//! a generic message for those.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::forms::FieldError;
use crate::services::auth::AuthError;
use crate::services::payments::PaymentError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Payment provider call failed.
    #[error("Payment error: {0}")]
    Payment(#[from] PaymentError),

    /// Submitted form failed validation.
    #[error("Validation failed: {}", join_messages(.0))]
    Validation(Vec<FieldError>),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<Vec<FieldError>> for AppError {
    fn from(errors: Vec<FieldError>) -> Self {
        Self::Validation(errors)
    }
}

fn join_messages(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join(". ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

impl AppError {
    /// The unique-constraint conflict behind this error, if any.
    fn conflict(&self) -> Option<&Option<String>> {
        match self {
            Self::Database(RepositoryError::Conflict { field })
            | Self::Auth(AuthError::Repository(RepositoryError::Conflict { field })) => Some(field),
            _ => None,
        }
    }

    fn is_server_error(&self) -> bool {
        match self {
            Self::Database(e) | Self::Auth(AuthError::Repository(e)) => {
                !matches!(e, RepositoryError::Conflict { .. } | RepositoryError::NotFound)
            }
            Self::Auth(AuthError::PasswordHash | AuthError::Token(_)) | Self::Payment(_) | Self::Internal(_) => {
                true
            }
            _ => false,
        }
    }

    fn status(&self) -> StatusCode {
        if self.conflict().is_some() {
            return StatusCode::CONFLICT;
        }
        match self {
            Self::Database(RepositoryError::NotFound)
            | Self::Auth(AuthError::Repository(RepositoryError::NotFound) | AuthError::UserNotFound)
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Auth(AuthError::InvalidEmail(_) | AuthError::WeakPassword(_))
            | Self::Validation(_)
            | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Payment(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// User-facing text for an error.
///
/// - validation failures: every field message, joined with `". "`
/// - unique-constraint conflicts: `"{Field} already exists"`, using the
///   offending column when known
/// - anything else: the underlying error's message
#[must_use]
pub fn format_error(error: &AppError) -> String {
    if let Some(field) = error.conflict() {
        return format!(
            "{} already exists",
            capitalize(field.as_deref().unwrap_or("field"))
        );
    }

    match error {
        AppError::Validation(errors) => join_messages(errors),
        AppError::Auth(e) => e.to_string(),
        AppError::Database(e) => e.to_string(),
        AppError::Payment(e) => e.to_string(),
        AppError::NotFound(msg) | AppError::BadRequest(msg) | AppError::Internal(msg) => {
            msg.clone()
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Payment(_) => "Payment provider error".to_string(),
            _ if status.is_server_error() => "Internal server error".to_string(),
            _ => format_error(&self),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after sign-in.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context on sign-out.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}
