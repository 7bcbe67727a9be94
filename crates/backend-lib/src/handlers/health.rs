//! Liveness endpoints.
use std::sync::Arc;

use axum::{extract::State, Json};
use vikasana_common::{HealthResponse, ServiceInfo};

use crate::storage::Storage;
use crate::AppState;

/// Name reported by `GET /`
pub const APP_NAME: &str = "Vikasana Foundation API";

/// `GET /health`
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
    })
}

/// `GET /`
pub async fn root<S: Storage>(State(state): State<Arc<AppState<S>>>) -> Json<ServiceInfo> {
    Json(ServiceInfo {
        status: "ok".to_string(),
        app: APP_NAME.to_string(),
        env: state.settings.app_env.clone(),
    })
}
