// ============================
// backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod rate_limit;
pub mod service;
pub mod token;
pub mod token_generator;

pub use password::{
    hash_password, hash_password_secure, validate_password_strength, verify_password, HashCost,
    PasswordRequirements, MIN_PASSWORD_LENGTH,
};
pub use rate_limit::LoginRateLimiter;
pub use service::{AdminIdentity, Authenticator, Session};
pub use token::{Claims, IssuedToken, TokenCodec, ACCESS_TOKEN_TYPE};

pub use crate::error::AuthError;
