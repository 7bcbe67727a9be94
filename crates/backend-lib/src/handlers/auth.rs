//! Admin auth handlers: login, current admin, logout.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use vikasana_common::{AdminInfo, DetailResponse, LoginRequest, LoginResponse, BEARER_TOKEN_TYPE};

use crate::error::AppError;
use crate::middleware::CurrentAdmin;
use crate::storage::Storage;
use crate::validation::validate_login_request;
use crate::AppState;

/// `POST /api/auth/login`
pub async fn login<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::InvalidInput(rejection.body_text()))?;
    validate_login_request(&request)?;

    let session = state
        .auth
        .authenticate(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        token_type: BEARER_TOKEN_TYPE.to_string(),
        expires_in: session.expires_in,
        admin: session.admin,
    }))
}

/// `GET /api/auth/me`
pub async fn me(Extension(current): Extension<CurrentAdmin>) -> Json<AdminInfo> {
    Json(current.admin.view())
}

/// `POST /api/auth/logout`
pub async fn logout<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    Extension(current): Extension<CurrentAdmin>,
) -> Result<Json<DetailResponse>, AppError> {
    state.auth.revoke(&current.token).await?;
    Ok(Json(DetailResponse::new("Logged out")))
}
