// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation.

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;
use vikasana_common::LoginRequest;

const MAX_EMAIL_LENGTH: usize = 254; // RFC 5321 SMTP limit
const MAX_PASSWORD_LENGTH: usize = 1024;

static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap());

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("email: {0}")]
    InvalidEmail(String),

    #[error("password: {0}")]
    InvalidPassword(String),
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Canonical form of an email: trimmed and lowercased
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Validate that an email is plausible
pub fn validate_email(email: &str) -> ValidationResult<&str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail("field required".to_string()));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "must be at most {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidEmail(
            "value is not a valid email address".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a login password: present and bounded
pub fn validate_login_password(password: &str) -> ValidationResult<&str> {
    if password.is_empty() {
        return Err(ValidationError::InvalidPassword("field required".to_string()));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "must be at most {MAX_PASSWORD_LENGTH} bytes"
        )));
    }

    Ok(password)
}

/// Validate a login body
pub fn validate_login_request(request: &LoginRequest) -> ValidationResult<()> {
    validate_email(&request.email)?;
    validate_login_password(&request.password)?;
    Ok(())
}
