// ============================
// backend-lib/src/auth/token.rs
// ============================
//! Signed access tokens (HS256 JWT).
//!
//! Expiry is checked here against an explicit clock rather than by the JWT
//! library, so an expired token is always reported as [`AuthError::Expired`]
//! and never as a malformed one.
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::token_generator::generate_secure_token;
use crate::config::SecretKey;
use crate::error::AuthError;

/// Value of the `type` claim on access tokens
pub const ACCESS_TOKEN_TYPE: &str = "access";

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Admin id
    pub sub: String,
    /// Admin email at issue time
    pub email: String,
    /// Guards against other token kinds signed with the same key
    #[serde(rename = "type")]
    pub token_type: String,
    /// Issued at (unix seconds)
    pub iat: i64,
    /// Expiry (unix seconds)
    pub exp: i64,
    /// Token id, the revocation key
    pub jti: String,
}

impl Claims {
    /// Natural expiry as a timestamp
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Admin id from `sub`
    pub fn admin_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::MalformedToken)
    }
}

/// A freshly signed token and the claims inside it
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// Encodes and verifies access tokens with the process-wide signing key
#[derive(Clone)]
pub struct TokenCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &Algorithm::HS256)
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    pub fn new(secret: &SecretKey, ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.expose().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose().as_bytes()),
            ttl,
        }
    }

    /// Token lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Sign a token for `admin_id` that is valid from `now` for the configured ttl
    pub fn issue_at(
        &self,
        admin_id: i64,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let expires_at = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AuthError::Internal("token expiry out of range".to_string()))?;

        let claims = Claims {
            sub: admin_id.to_string(),
            email: email.to_string(),
            token_type: ACCESS_TOKEN_TYPE.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: generate_secure_token(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AuthError::Internal(format!("token signing failed: {e}")))?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify signature and shape, then expiry against `now`
    pub fn decode_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|e| {
                tracing::debug!(kind = ?e.kind(), "token failed verification");
                AuthError::MalformedToken
            })?
            .claims;

        if claims.token_type != ACCESS_TOKEN_TYPE {
            return Err(AuthError::MalformedToken);
        }
        if now.timestamp() >= claims.exp {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}
