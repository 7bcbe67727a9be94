// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! used for communication between the Vikasana admin panel and the API server.
//! This module defines the JSON bodies of the HTTP auth surface.

use serde::{Deserialize, Serialize};

/// Token type reported to clients alongside every access token
pub const BEARER_TOKEN_TYPE: &str = "bearer";

/// Body of `POST /api/auth/login`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    /// Login email, matched case-insensitively
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// Sanitized admin view. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AdminInfo {
    /// Admin identifier
    pub id: i64,
    /// Normalized email
    pub email: String,
    /// Display name
    pub name: String,
}

/// Successful login response
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    /// Signed access token to send as `Authorization: Bearer <token>`
    pub access_token: String,
    /// Always `"bearer"`
    pub token_type: String,
    /// Token lifetime in seconds
    pub expires_in: i64,
    /// The admin who logged in
    pub admin: AdminInfo,
}

/// Plain message body, used for acknowledgements and every error response
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DetailResponse {
    pub detail: String,
}

impl DetailResponse {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

/// Liveness payload for `GET /health`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
}

/// Service banner for `GET /`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    pub status: String,
    pub app: String,
    pub env: String,
}
