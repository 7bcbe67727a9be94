// ============================
// backend-lib/src/lib.rs
// ============================
//! Core backend-lib functionality for the Vikasana admin API:
//! admin login, bearer-token validation and logout with server-side revocation.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod router;
pub mod storage;
pub mod validation;

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::auth::{Authenticator, LoginRateLimiter};
use crate::config::Settings;
use crate::storage::Storage;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Settings, read-only after startup
    pub settings: Arc<Settings>,
    /// Session authenticator
    pub auth: Arc<Authenticator<S>>,
    /// Failed-login lockout
    pub login_limiter: Arc<LoginRateLimiter>,
    /// Peers allowed to name the client in forwarding headers
    pub trusted_proxies: Arc<[IpAddr]>,
}

impl<S: Storage> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, settings: Settings) -> anyhow::Result<Self> {
        let auth = Arc::new(Authenticator::new(store, &settings)?);
        let login_limiter = Arc::new(LoginRateLimiter::from_settings(&settings.login_limit));
        let trusted_proxies = settings.trusted_proxy_list()?.into();

        Ok(Self {
            settings: Arc::new(settings),
            auth,
            login_limiter,
            trusted_proxies,
        })
    }

    /// Periodically purge expired revocation records and stale lockouts
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let state = Arc::clone(self);
        let period = Duration::from_secs(state.settings.revocation_sweep_secs);

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                state.sweep().await;
            }
        })
    }

    /// One sweep pass
    pub async fn sweep(&self) {
        match self.auth.purge_expired_revocations().await {
            Ok(0) => {},
            Ok(purged) => tracing::info!(purged, "purged expired revocation records"),
            Err(e) => tracing::warn!(error = %e, "revocation sweep failed"),
        }
        self.login_limiter.cleanup();
    }
}
