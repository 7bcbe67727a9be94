// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the admin API.

pub mod auth;
pub mod rate_limit;

pub use auth::{bearer_token, require_admin, CurrentAdmin};
pub use rate_limit::{client_key, login_rate_limit};
