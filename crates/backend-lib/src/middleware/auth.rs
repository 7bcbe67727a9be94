//! Bearer-token gate for protected routes.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::AdminIdentity;
use crate::error::{AppError, AuthError};
use crate::storage::{Admin, Storage};
use crate::AppState;

/// The authenticated admin, attached to the request by [`require_admin`]
#[derive(Debug, Clone)]
pub struct CurrentAdmin {
    pub admin: Admin,
    pub identity: AdminIdentity,
    /// Raw bearer token, kept for logout
    pub token: String,
}

/// Extract the credential from `Authorization: Bearer <token>`.
/// The scheme is matched case-insensitively.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
        Some(token)
    } else {
        None
    }
}

/// Validate the bearer token and attach [`CurrentAdmin`] to the request
pub async fn require_admin<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())
        .map(str::to_string)
        .ok_or(AuthError::MalformedToken)?;

    let (admin, identity) = state.auth.current_admin(&token).await?;
    request.extensions_mut().insert(CurrentAdmin {
        admin,
        identity,
        token,
    });

    Ok(next.run(request).await)
}
