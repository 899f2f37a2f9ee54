//! Sign-up and sign-in credential checks.

use serde::Deserialize;
use validator::{Validate, ValidationErrors};

use nestdrive_core::config::AuthConfig;
use nestdrive_core::error::AppError;

/// Credentials as typed by the user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Credentials {
    /// Email address.
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Validates credentials against the configured policy.
#[derive(Debug, Clone)]
pub struct CredentialValidator {
    /// Minimum password length for new accounts.
    min_length: usize,
}

impl CredentialValidator {
    /// Creates a new validator from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            min_length: config.password_min_length,
        }
    }

    /// Check email shape and password presence.
    pub fn validate(&self, email: &str, password: &str) -> Result<(), AppError> {
        Credentials {
            email: email.to_string(),
            password: password.to_string(),
        }
        .validate()
        .map_err(|errors| AppError::validation(first_message(&errors)))
    }

    /// Check credentials for a new account, including password length.
    pub fn validate_new(&self, email: &str, password: &str) -> Result<(), AppError> {
        self.validate(email, password)?;
        if password.chars().count() < self.min_length {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters long",
                self.min_length
            )));
        }
        Ok(())
    }
}

fn first_message(errors: &ValidationErrors) -> String {
    let fields = errors.field_errors();
    ["email", "password"]
        .iter()
        .filter_map(|field| fields.get(*field))
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| "Invalid credentials".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> CredentialValidator {
        CredentialValidator::new(&AuthConfig::default())
    }

    #[test]
    fn test_malformed_email() {
        let err = validator().validate("not-an-email", "secret1").expect_err("bad email");
        assert_eq!(err.message, "Enter a valid email address");
    }

    #[test]
    fn test_short_password_only_rejected_for_new_accounts() {
        assert!(validator().validate("a@b.io", "12345").is_ok());
        let err = validator().validate_new("a@b.io", "12345").expect_err("short");
        assert!(err.message.contains("at least 6"));
        assert!(validator().validate_new("a@b.io", "123456").is_ok());
    }

    #[test]
    fn test_empty_password() {
        let err = validator().validate("a@b.io", "").expect_err("empty");
        assert_eq!(err.message, "Password is required");
    }
}
