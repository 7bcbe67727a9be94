// ============================
// backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};

use crate::config::Settings;
use crate::handlers::{auth, health};
use crate::middleware::{login_rate_limit, require_admin};
use crate::storage::Storage;
use crate::AppState;

/// Create the application router
pub fn create_router<S: Storage>(state: Arc<AppState<S>>) -> Router {
    let public = Router::new()
        .route("/login", post(auth::login::<S>))
        .route_layer(from_fn_with_state(state.clone(), login_rate_limit::<S>));

    let protected = Router::new()
        .route("/me", get(auth::me))
        .route("/logout", post(auth::logout::<S>))
        .route_layer(from_fn_with_state(state.clone(), require_admin::<S>));

    Router::new()
        .route("/", get(health::root::<S>))
        .route("/health", get(health::health))
        .nest("/api/auth", public.merge(protected))
        .layer(cors_layer(&state.settings))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS for the configured origins, with credentials
fn cors_layer(settings: &Settings) -> CorsLayer {
    let origins: Vec<HeaderValue> = settings
        .origins_list()
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparsable CORS origin");
                None
            },
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
}
