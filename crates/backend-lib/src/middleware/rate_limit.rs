use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::error::AppError;
use crate::storage::Storage;
use crate::AppState;

/// Identify the caller for lockout purposes.
///
/// The connected peer is the client unless it is a trusted proxy, in which
/// case the proxy-supplied `X-Real-IP` or first `X-Forwarded-For` hop wins.
pub fn client_key(headers: &HeaderMap, peer: Option<IpAddr>, trusted_proxies: &[IpAddr]) -> String {
    let Some(peer) = peer else {
        return "unknown".to_string();
    };

    if trusted_proxies.contains(&peer) {
        if let Some(forwarded) = forwarded_client(headers) {
            return forwarded.to_string();
        }
    }

    peer.to_string()
}

fn forwarded_client(headers: &HeaderMap) -> Option<IpAddr> {
    headers
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|h| h.to_str().ok())
                .and_then(|v| v.split(',').next())
        })
        .and_then(|v| v.trim().parse().ok())
}

/// Login lockout middleware.
///
/// Locked-out clients are refused before the authenticator runs. A 401 from
/// the login handler counts as a failure, a 200 clears the streak.
pub async fn login_rate_limit<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let client = client_key(request.headers(), peer, &state.trusted_proxies);

    if !state.login_limiter.check_rate_limit(&client) {
        return Err(AppError::RateLimited);
    }

    let response = next.run(request).await;

    match response.status() {
        StatusCode::OK => state.login_limiter.record_success(&client),
        StatusCode::UNAUTHORIZED => state.login_limiter.record_failed_attempt(&client),
        _ => {},
    }

    Ok(response)
}
