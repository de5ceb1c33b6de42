//! Form payloads and their validation rules.

use serde::Deserialize;

use prostore_core::Email;

use crate::services::auth::MIN_PASSWORD_LENGTH;

/// Minimum length of a display name on sign-up.
pub const MIN_NAME_LENGTH: usize = 3;

/// One failed validation rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

fn check_email(email: &str, errors: &mut Vec<FieldError>) {
    if Email::parse(email).is_err() {
        errors.push(FieldError::new("email", "Invalid email address"));
    }
}

fn check_min_len(field: &'static str, label: &str, value: &str, min: usize, errors: &mut Vec<FieldError>) {
    if value.trim().chars().count() < min {
        errors.push(FieldError::new(
            field,
            format!("{label} must be at least {min} characters"),
        ));
    }
}

/// Sign-in form.
#[derive(Debug, Deserialize)]
pub struct SignInForm {
    pub email: String,
    pub password: String,
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

impl SignInForm {
    /// # Errors
    ///
    /// Returns every failed rule, in field order.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_email(&self.email, &mut errors);
        check_min_len("password", "Password", &self.password, MIN_PASSWORD_LENGTH, &mut errors);
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Sign-up form.
#[derive(Debug, Deserialize)]
pub struct SignUpForm {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(rename = "confirmPassword")]
    pub confirm_password: String,
    #[serde(default, rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

impl SignUpForm {
    /// # Errors
    ///
    /// Returns every failed rule, in field order.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        check_min_len("name", "Name", &self.name, MIN_NAME_LENGTH, &mut errors);
        check_email(&self.email, &mut errors);
        check_min_len("password", "Password", &self.password, MIN_PASSWORD_LENGTH, &mut errors);
        check_min_len(
            "confirmPassword",
            "Confirm password",
            &self.confirm_password,
            MIN_PASSWORD_LENGTH,
            &mut errors,
        );
        if self.password != self.confirm_password {
            errors.push(FieldError::new("confirmPassword", "Passwords don't match"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Body of `POST /api/session/update`.
#[derive(Debug, Deserialize)]
pub struct SessionUpdate {
    pub name: String,
}

/// Only same-site relative paths are accepted as post-sign-in targets.
#[must_use]
pub fn safe_callback(callback: Option<&str>) -> &str {
    match callback {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.contains('\\') => {
            path
        }
        _ => "/",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sign_up(name: &str, password: &str, confirm: &str) -> SignUpForm {
        SignUpForm {
            name: name.to_string(),
            email: "jane@x.com".to_string(),
            password: password.to_string(),
            confirm_password: confirm.to_string(),
            callback_url: None,
        }
    }

    #[test]
    fn test_sign_in_validation() {
        let ok = SignInForm {
            email: "jane@x.com".to_string(),
            password: "hunter22".to_string(),
            callback_url: None,
        };
        assert!(ok.validate().is_ok());

        let bad = SignInForm {
            email: "nope".to_string(),
            password: "123".to_string(),
            callback_url: None,
        };
        let errors = bad.validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, ["email", "password"]);
    }

    #[test]
    fn test_sign_up_password_mismatch() {
        let errors = sign_up("Jane", "hunter22", "hunter23").validate().unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new("confirmPassword", "Passwords don't match")]
        );
    }

    #[test]
    fn test_sign_up_short_name() {
        let errors = sign_up("Jo", "hunter22", "hunter22").validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.first().map(|e| e.message.as_str()), Some("Name must be at least 3 characters"));
    }

    #[test]
    fn test_safe_callback() {
        assert_eq!(safe_callback(Some("/order/1")), "/order/1");
        assert_eq!(safe_callback(Some("https://evil.test")), "/");
        assert_eq!(safe_callback(Some("//evil.test")), "/");
        assert_eq!(safe_callback(None), "/");
    }
}
