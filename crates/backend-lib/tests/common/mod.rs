//! Test utilities for the admin API tests
//!
//! Builds an application over an in-memory SQLite store with one seeded admin
//! and cheap password hashing.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    extract::ConnectInfo,
    http::{header, Method, Request, Response},
    Router,
};
use backend_lib::{
    auth::{hash_password, HashCost},
    config::{SecretKey, Settings},
    router::create_router,
    storage::{Admin, AdminStore, NewAdmin, SqliteStore},
    AppState,
};
use serde_json::Value;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tower::ServiceExt;

pub const ADMIN_EMAIL: &str = "admin@vikasanafoundation.org";
pub const ADMIN_PASSWORD: &str = "ChangeMe@2025";
pub const ADMIN_NAME: &str = "Super Admin";

pub const CHEAP_COST: HashCost = HashCost { log_n: 6, r: 8, p: 1 };

/// Settings suitable for tests
pub fn test_settings() -> Settings {
    Settings {
        database_url: "sqlite::memory:".to_string(),
        secret_key: SecretKey::new("integration-test-secret-0123456789"),
        password_hash: CHEAP_COST,
        ..Settings::default()
    }
}

/// A running app plus handles to poke at its internals
pub struct TestApp {
    pub router: Router,
    pub state: Arc<AppState<SqliteStore>>,
    pub admin: Admin,
}

/// Sets up an app with one seeded admin
pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(test_settings()).await
}

pub async fn setup_test_app_with(settings: Settings) -> TestApp {
    let store = SqliteStore::connect(&settings.database_url).await.unwrap();
    let admin = store
        .insert_admin(NewAdmin {
            name: ADMIN_NAME.to_string(),
            email: ADMIN_EMAIL.to_string(),
            password_hash: hash_password(ADMIN_PASSWORD, CHEAP_COST).unwrap(),
        })
        .await
        .unwrap();

    let state = Arc::new(AppState::new(store, settings).expect("Failed to create AppState for test"));
    let router = create_router(state.clone());

    TestApp {
        router,
        state,
        admin,
    }
}

impl TestApp {
    /// Send a request and return the status and parsed JSON body
    pub async fn send(&self, request: Request<Body>) -> (Response<()>, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (Response::from_parts(parts, ()), json)
    }

    pub async fn login(&self, email: &str, password: &str) -> (Response<()>, Value) {
        self.send(login_request(email, password, None)).await
    }

    /// Log in as the seeded admin and return the access token
    pub async fn token(&self) -> String {
        let (response, body) = self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
        assert_eq!(response.status(), 200, "login failed: {body}");
        body["access_token"].as_str().unwrap().to_string()
    }

    pub async fn me(&self, token: &str) -> (Response<()>, Value) {
        self.send(authed(Method::GET, "/api/auth/me", token)).await
    }

    pub async fn logout(&self, token: &str) -> (Response<()>, Value) {
        self.send(authed(Method::POST, "/api/auth/logout", token)).await
    }
}

/// Login request, optionally arriving over a connection from `peer`
pub fn login_request(email: &str, password: &str, peer: Option<&str>) -> Request<Body> {
    let body = serde_json::json!({ "email": email, "password": password });
    let mut request = Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    if let Some(peer) = peer {
        let ip: IpAddr = peer.parse().unwrap();
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::new(ip, 40_000)));
    }
    request
}

/// Attach a forwarding header naming `client`
pub fn forwarded_for(mut request: Request<Body>, client: &str) -> Request<Body> {
    request
        .headers_mut()
        .insert("x-real-ip", client.parse().unwrap());
    request
}

pub fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}
