// crates/backend-lib/src/error.rs

//! Central error types + Axum integration.
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use vikasana_common::DetailResponse;

use crate::storage::StoreError;
use crate::validation::ValidationError;

/// Client-facing message for every token failure
pub const INVALID_TOKEN_DETAIL: &str = "Invalid or missing token";
/// Client-facing message for a failed login
pub const INVALID_CREDENTIALS_DETAIL: &str = "Invalid email or password";

/// Outcomes of the session authenticator.
///
/// The distinctions between token failures are kept for logs and metrics only;
/// at the HTTP boundary they collapse to the same 401 body.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("malformed token")]
    MalformedToken,

    #[error("token expired")]
    Expired,

    #[error("token revoked")]
    Revoked,

    #[error("token already invalid")]
    AlreadyInvalid,

    #[error("admin account is deactivated")]
    Inactive,

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Stable code used in logs and metric labels
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "AUTH_001",
            AuthError::MalformedToken => "AUTH_002",
            AuthError::Expired => "AUTH_003",
            AuthError::Revoked => "AUTH_004",
            AuthError::AlreadyInvalid => "AUTH_005",
            AuthError::Inactive => "AUTH_006",
            AuthError::StoreUnavailable(_) => "STORE_001",
            AuthError::Internal(_) => "INT_002",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        AuthError::StoreUnavailable(err.to_string())
    }
}

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Too many login attempts")]
    RateLimited,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(AuthError::Inactive) => StatusCode::FORBIDDEN,
            AppError::Auth(AuthError::StoreUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Auth(AuthError::Internal(_)) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Auth(err) => err.code(),
            AppError::InvalidInput(_) => "VAL_001",
            AppError::RateLimited => "RATE_001",
            AppError::Internal(_) => "INT_001",
        }
    }

    /// Message sent to the client. Never reveals which check failed.
    pub fn detail(&self) -> String {
        match self {
            AppError::Auth(AuthError::InvalidCredentials) => INVALID_CREDENTIALS_DETAIL.to_string(),
            AppError::Auth(AuthError::Inactive) => {
                "This admin account has been deactivated".to_string()
            },
            AppError::Auth(AuthError::StoreUnavailable(_)) => {
                "Service temporarily unavailable".to_string()
            },
            AppError::Auth(AuthError::Internal(_)) | AppError::Internal(_) => {
                "An internal server error occurred".to_string()
            },
            AppError::Auth(_) => INVALID_TOKEN_DETAIL.to_string(),
            AppError::InvalidInput(msg) => msg.clone(),
            AppError::RateLimited => "Too many login attempts, please try again later".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_code = self.error_code();

        if status.is_server_error() {
            tracing::error!(code = error_code, error = %self, "request failed");
        } else {
            tracing::debug!(code = error_code, error = %self, "request rejected");
        }

        let mut response = (status, Json(DetailResponse::new(self.detail()))).into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::InvalidInput(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Auth(err.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    #[test]
    fn test_app_error_display() {
        let auth_error = AppError::from(AuthError::Expired);
        assert_eq!(auth_error.to_string(), "token expired");

        let input_error = AppError::InvalidInput("email is required".to_string());
        assert_eq!(input_error.to_string(), "Invalid input: email is required");

        assert_eq!(AppError::RateLimited.to_string(), "Too many login attempts");
    }

    #[test]
    fn test_token_failures_share_status_and_detail() {
        let failures = [
            AuthError::MalformedToken,
            AuthError::Expired,
            AuthError::Revoked,
            AuthError::AlreadyInvalid,
        ];

        for failure in failures {
            let err = AppError::from(failure);
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
            assert_eq!(err.detail(), INVALID_TOKEN_DETAIL);
        }
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(AuthError::Inactive).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(AuthError::StoreUnavailable("down".to_string())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            AppError::InvalidInput("bad".to_string()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::RateLimited.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[test]
    fn test_app_error_error_codes() {
        assert_eq!(AppError::from(AuthError::InvalidCredentials).error_code(), "AUTH_001");
        assert_eq!(AppError::from(AuthError::Revoked).error_code(), "AUTH_004");
        assert_eq!(AppError::InvalidInput("x".to_string()).error_code(), "VAL_001");
        assert_eq!(AppError::Internal("x".to_string()).error_code(), "INT_001");
    }

    #[test]
    fn test_store_detail_is_sanitized() {
        let err = AppError::from(AuthError::StoreUnavailable(
            "connection refused at 10.0.0.3".to_string(),
        ));
        assert!(!err.detail().contains("10.0.0.3"));
    }

    #[test]
    fn test_unauthorized_response_carries_challenge() {
        let response = AppError::from(AuthError::Revoked).into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
            "Bearer"
        );
        assert!(response
            .headers()
            .get("content-type")
            .unwrap()
            .to_str()
            .unwrap()
            .contains("application/json"));
    }

    #[test]
    fn test_forbidden_response_has_no_challenge() {
        let response = AppError::from(AuthError::Inactive).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
