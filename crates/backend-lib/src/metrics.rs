// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for Prometheus metric keys
pub const LOGIN_SUCCESS: &str = "auth.login.success";
pub const LOGIN_FAILURE: &str = "auth.login.failure";
pub const LOGIN_LOCKOUT: &str = "auth.login.lockout";
pub const TOKEN_REJECTED: &str = "auth.token.rejected";
pub const TOKEN_REVOKED: &str = "auth.token.revoked";
pub const REVOCATIONS_PURGED: &str = "auth.revocation.purged";
