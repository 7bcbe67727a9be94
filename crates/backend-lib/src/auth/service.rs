// ============================
// backend-lib/src/auth/service.rs
// ============================
//! Session authenticator: credential verification, token issuance,
//! validation and revocation.
use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::{info, warn};
use vikasana_common::AdminInfo;

use super::password::{hash_password, verify_password, HashCost};
use super::token::{Claims, TokenCodec};
use super::token_generator::generate_secure_token;
use crate::config::Settings;
use crate::error::AuthError;
use crate::metrics::{
    LOGIN_FAILURE, LOGIN_SUCCESS, REVOCATIONS_PURGED, TOKEN_REJECTED, TOKEN_REVOKED,
};
use crate::storage::{Admin, AdminStore, RevocationStore, Storage};
use crate::validation::normalize_email;

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    /// Lifetime in seconds
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    pub admin: AdminInfo,
}

/// Identity resolved from a valid token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    pub admin_id: i64,
    pub email: String,
    pub jti: String,
    pub expires_at: DateTime<Utc>,
}

impl TryFrom<Claims> for AdminIdentity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            admin_id: claims.admin_id()?,
            expires_at: claims.expires_at(),
            email: claims.email,
            jti: claims.jti,
        })
    }
}

/// Authenticates admins and manages the lifecycle of their access tokens
pub struct Authenticator<S> {
    store: S,
    codec: TokenCodec,
    /// Verified against when the email is unknown, so both failures cost the same
    dummy_hash: String,
}

impl<S: Storage> Authenticator<S> {
    /// Build an authenticator from loaded settings
    pub fn new(store: S, settings: &Settings) -> anyhow::Result<Self> {
        let codec = TokenCodec::new(&settings.secret_key, settings.token_ttl()?);
        Self::with_codec(store, codec, settings.password_hash)
    }

    pub fn with_codec(store: S, codec: TokenCodec, cost: HashCost) -> anyhow::Result<Self> {
        let dummy_hash = hash_password(&generate_secure_token(), cost)?;
        Ok(Self {
            store,
            codec,
            dummy_hash,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    /// Verify credentials and issue an access token.
    ///
    /// Unknown email and wrong password both yield `InvalidCredentials` after a
    /// full hash verification.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        self.authenticate_at(email, password, Utc::now()).await
    }

    pub async fn authenticate_at(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let admin = self.store.find_admin_by_email(&email).await?;

        let hash = admin
            .as_ref()
            .map_or_else(|| self.dummy_hash.clone(), |a| a.password_hash.clone());
        let password_ok = self.verify_off_thread(hash, password.to_string()).await?;

        let admin = match admin {
            Some(admin) if password_ok => admin,
            _ => {
                counter!(LOGIN_FAILURE).increment(1);
                info!(code = AuthError::InvalidCredentials.code(), "login rejected");
                return Err(AuthError::InvalidCredentials);
            },
        };

        if !admin.is_active {
            counter!(LOGIN_FAILURE).increment(1);
            warn!(admin_id = admin.id, "login by deactivated admin");
            return Err(AuthError::Inactive);
        }

        let issued = self.codec.issue_at(admin.id, &admin.email, now)?;
        counter!(LOGIN_SUCCESS).increment(1);
        info!(admin_id = admin.id, "admin logged in");

        Ok(Session {
            access_token: issued.token,
            expires_in: self.codec.ttl().num_seconds(),
            expires_at: issued.claims.expires_at(),
            admin: admin.view(),
        })
    }

    /// Scrypt is deliberately slow, keep it off the async workers
    async fn verify_off_thread(&self, hash: String, password: String) -> Result<bool, AuthError> {
        tokio::task::spawn_blocking(move || verify_password(&hash, &password))
            .await
            .map_err(|e| AuthError::Internal(format!("password verification task failed: {e}")))
    }

    /// Check a bearer token: signature, then expiry, then revocation
    pub async fn validate(&self, token: &str) -> Result<AdminIdentity, AuthError> {
        self.validate_at(token, Utc::now()).await
    }

    pub async fn validate_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<AdminIdentity, AuthError> {
        let result = self.check_token(token, now).await;
        if let Err(err) = &result {
            counter!(TOKEN_REJECTED, "code" => err.code()).increment(1);
            info!(code = err.code(), reason = %err, "token rejected");
        }
        result
    }

    async fn check_token(&self, token: &str, now: DateTime<Utc>) -> Result<AdminIdentity, AuthError> {
        let identity = AdminIdentity::try_from(self.codec.decode_at(token, now)?)?;
        if self.store.is_token_revoked(&identity.jti).await? {
            return Err(AuthError::Revoked);
        }
        Ok(identity)
    }

    /// Validate a token and load the admin it was issued to
    pub async fn current_admin(&self, token: &str) -> Result<(Admin, AdminIdentity), AuthError> {
        let identity = self.validate(token).await?;

        let admin = match self.store.find_admin_by_id(identity.admin_id).await? {
            Some(admin) => admin,
            None => {
                warn!(admin_id = identity.admin_id, "token for unknown admin");
                return Err(AuthError::MalformedToken);
            },
        };

        if !admin.is_active {
            return Err(AuthError::Inactive);
        }

        Ok((admin, identity))
    }

    /// Revoke a token until its natural expiry. Revoking twice succeeds twice.
    pub async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.revoke_at(token, Utc::now()).await
    }

    pub async fn revoke_at(&self, token: &str, now: DateTime<Utc>) -> Result<(), AuthError> {
        let claims = match self.codec.decode_at(token, now) {
            Ok(claims) => claims,
            Err(AuthError::MalformedToken | AuthError::Expired) => {
                return Err(AuthError::AlreadyInvalid)
            },
            Err(err) => return Err(err),
        };

        let newly_revoked = self
            .store
            .revoke_token(&claims.jti, now, claims.expires_at())
            .await?;

        if newly_revoked {
            counter!(TOKEN_REVOKED).increment(1);
            info!(sub = %claims.sub, "token revoked");
        }
        Ok(())
    }

    /// Drop revocation records whose tokens have expired anyway
    pub async fn purge_expired_revocations(&self) -> Result<u64, AuthError> {
        let purged = self.store.purge_revoked_before(Utc::now()).await?;
        if purged > 0 {
            counter!(REVOCATIONS_PURGED).increment(purged);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::config::SecretKey;
    use crate::storage::{NewAdmin, SqliteStore};
    use chrono::Duration;

    const CHEAP: HashCost = HashCost { log_n: 6, r: 8, p: 1 };
    const EMAIL: &str = "admin@vikasanafoundation.org";
    const PASSWORD: &str = "ChangeMe@2025";

    async fn seeded() -> (Authenticator<SqliteStore>, Admin) {
        let store = SqliteStore::connect("sqlite::memory:").await.unwrap();
        let admin = store
            .insert_admin(NewAdmin {
                name: "Super Admin".to_string(),
                email: EMAIL.to_string(),
                password_hash: hash_password(PASSWORD, CHEAP).unwrap(),
            })
            .await
            .unwrap();
        let codec = TokenCodec::new(
            &SecretKey::new("service-test-secret-service-test!"),
            Duration::hours(24),
        );
        let auth = Authenticator::with_codec(store, codec, CHEAP).unwrap();
        (auth, admin)
    }

    #[tokio::test]
    async fn test_authenticate_then_validate() {
        let (auth, admin) = seeded().await;

        let session = auth.authenticate(EMAIL, PASSWORD).await.unwrap();
        assert_eq!(session.admin, admin.view());
        assert_eq!(session.expires_in, 24 * 60 * 60);

        let identity = auth.validate(&session.access_token).await.unwrap();
        assert_eq!(identity.admin_id, admin.id);
        assert_eq!(identity.email, EMAIL);
        assert_eq!(identity.expires_at, session.expires_at);
    }

    #[tokio::test]
    async fn test_email_is_matched_case_insensitively() {
        let (auth, admin) = seeded().await;
        let session = auth
            .authenticate("  ADMIN@VikasanaFoundation.org ", PASSWORD)
            .await
            .unwrap();
        assert_eq!(session.admin.id, admin.id);
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_look_alike() {
        let (auth, _) = seeded().await;

        let wrong_password = auth.authenticate(EMAIL, "ChangeMe@2026").await.unwrap_err();
        let unknown_email = auth
            .authenticate("ghost@vikasanafoundation.org", PASSWORD)
            .await
            .unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_inactive_admin_cannot_log_in() {
        let (auth, admin) = seeded().await;
        auth.store().set_admin_active(admin.id, false).await.unwrap();

        assert!(matches!(
            auth.authenticate(EMAIL, PASSWORD).await,
            Err(AuthError::Inactive)
        ));
        // Wrong password still reports the generic failure
        assert!(matches!(
            auth.authenticate(EMAIL, "nope").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_expired_token_reports_expired() {
        let (auth, _) = seeded().await;
        let session = auth
            .authenticate_at(EMAIL, PASSWORD, Utc::now() - Duration::hours(25))
            .await
            .unwrap();

        assert!(matches!(
            auth.validate(&session.access_token).await,
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_revoked_token_reports_revoked() {
        let (auth, _) = seeded().await;
        let session = auth.authenticate(EMAIL, PASSWORD).await.unwrap();

        auth.revoke(&session.access_token).await.unwrap();
        assert!(matches!(
            auth.validate(&session.access_token).await,
            Err(AuthError::Revoked)
        ));

        // Other sessions of the same admin are untouched
        let other = auth.authenticate(EMAIL, PASSWORD).await.unwrap();
        assert!(auth.validate(&other.access_token).await.is_ok());
    }

    #[tokio::test]
    async fn test_revoke_twice_succeeds() {
        let (auth, _) = seeded().await;
        let session = auth.authenticate(EMAIL, PASSWORD).await.unwrap();

        auth.revoke(&session.access_token).await.unwrap();
        auth.revoke(&session.access_token).await.unwrap();
    }

    #[tokio::test]
    async fn test_revoke_invalid_token_is_already_invalid() {
        let (auth, _) = seeded().await;
        assert!(matches!(
            auth.revoke("not-a-token").await,
            Err(AuthError::AlreadyInvalid)
        ));

        let stale = auth
            .authenticate_at(EMAIL, PASSWORD, Utc::now() - Duration::hours(48))
            .await
            .unwrap();
        assert!(matches!(
            auth.revoke(&stale.access_token).await,
            Err(AuthError::AlreadyInvalid)
        ));
    }

    #[tokio::test]
    async fn test_revoked_then_expired_reports_expired() {
        let (auth, _) = seeded().await;
        let session = auth.authenticate(EMAIL, PASSWORD).await.unwrap();
        auth.revoke(&session.access_token).await.unwrap();

        let later = session.expires_at + Duration::seconds(1);
        assert!(matches!(
            auth.validate_at(&session.access_token, later).await,
            Err(AuthError::Expired)
        ));
    }

    #[tokio::test]
    async fn test_current_admin() {
        let (auth, admin) = seeded().await;
        let session = auth.authenticate(EMAIL, PASSWORD).await.unwrap();

        let (loaded, identity) = auth.current_admin(&session.access_token).await.unwrap();
        assert_eq!(loaded, admin);
        assert_eq!(identity.admin_id, admin.id);

        auth.store().set_admin_active(admin.id, false).await.unwrap();
        assert!(matches!(
            auth.current_admin(&session.access_token).await,
            Err(AuthError::Inactive)
        ));
    }

    #[tokio::test]
    async fn test_token_for_missing_admin_is_rejected() {
        let (auth, _) = seeded().await;
        let issued = auth.codec().issue_at(999, "ghost@example.org", Utc::now()).unwrap();

        assert!(auth.validate(&issued.token).await.is_ok());
        assert!(matches!(
            auth.current_admin(&issued.token).await,
            Err(AuthError::MalformedToken)
        ));
    }

    #[tokio::test]
    async fn test_purge_expired_revocations() {
        let (auth, _) = seeded().await;
        let now = Utc::now();
        auth.store()
            .revoke_token("gone", now - Duration::hours(2), now - Duration::hours(1))
            .await
            .unwrap();

        let session = auth.authenticate(EMAIL, PASSWORD).await.unwrap();
        auth.revoke(&session.access_token).await.unwrap();

        assert_eq!(auth.purge_expired_revocations().await.unwrap(), 1);
        assert!(matches!(
            auth.validate(&session.access_token).await,
            Err(AuthError::Revoked)
        ));
    }
}
