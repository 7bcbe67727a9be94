// ============================
// backend-lib/src/storage.rs
// ============================
//! Storage abstraction with a SQLite implementation.
//!
//! Two tables back the authenticator: `admins` (credential lookup) and
//! `revoked_tokens` (logout before natural expiry). Every operation is a single
//! statement, so the database's per-row atomicity is all the locking needed.
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Row, SqlitePool,
};
use thiserror::Error;
use vikasana_common::AdminInfo;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS admins (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    name          TEXT    NOT NULL,
    email         TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT    NOT NULL
);
CREATE TABLE IF NOT EXISTS revoked_tokens (
    jti        TEXT PRIMARY KEY,
    revoked_at TEXT NOT NULL,
    expires_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS ix_revoked_tokens_expires_at ON revoked_tokens (expires_at);
";

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persisted admin record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Admin {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    /// Client-safe view without the password hash
    pub fn view(&self) -> AdminInfo {
        AdminInfo {
            id: self.id,
            email: self.email.clone(),
            name: self.name.clone(),
        }
    }
}

/// Fields supplied when seeding an admin
#[derive(Debug, Clone)]
pub struct NewAdmin {
    pub name: String,
    /// Must already be normalized
    pub email: String,
    pub password_hash: String,
}

/// Credential lookup
#[async_trait]
pub trait AdminStore: Send + Sync {
    /// Find an admin by normalized email
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError>;

    /// Find an admin by id
    async fn find_admin_by_id(&self, id: i64) -> Result<Option<Admin>, StoreError>;

    /// Insert a new admin and return the stored record
    async fn insert_admin(&self, admin: NewAdmin) -> Result<Admin, StoreError>;
}

/// Revocation set keyed by token id
#[async_trait]
pub trait RevocationStore: Send + Sync {
    /// Record a revocation. Returns `false` if `jti` was already revoked.
    async fn revoke_token(
        &self,
        jti: &str,
        revoked_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Whether `jti` is in the revocation set
    async fn is_token_revoked(&self, jti: &str) -> Result<bool, StoreError>;

    /// Delete records whose token expired at or before `now`
    async fn purge_revoked_before(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Everything the authenticator needs from its backing store
pub trait Storage: AdminStore + RevocationStore + 'static {}

impl<T: AdminStore + RevocationStore + 'static> Storage for T {}

/// SQLite implementation of the storage traits
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and bootstrap the schema
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);

        // Every connection to `:memory:` is a separate database, so pin to one
        let pool = if url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
                .connect_with(options)
                .await?
        } else {
            if let Some(dir) = options.get_filename().parent() {
                if !dir.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(dir).await?;
                }
            }
            SqlitePoolOptions::new()
                .max_connections(8)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    /// Create tables if they do not exist
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }

    /// Mark an admin active or inactive
    pub async fn set_admin_active(&self, id: i64, active: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE admins SET is_active = ?1 WHERE id = ?2")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() == 1)
    }

}

/// Fixed-width RFC 3339 so lexical order matches time order
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp {raw:?}: {e}")))
}

fn row_to_admin(row: &SqliteRow) -> Result<Admin, StoreError> {
    let created_at: String = row.try_get("created_at")?;
    Ok(Admin {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        is_active: row.try_get("is_active")?,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait]
impl AdminStore for SqliteStore {
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, password_hash, is_active, created_at
            FROM admins
            WHERE email = ?1
            ",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_admin(&r)).transpose()
    }

    async fn find_admin_by_id(&self, id: i64) -> Result<Option<Admin>, StoreError> {
        let row = sqlx::query(
            r"
            SELECT id, name, email, password_hash, is_active, created_at
            FROM admins
            WHERE id = ?1
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| row_to_admin(&r)).transpose()
    }

    async fn insert_admin(&self, admin: NewAdmin) -> Result<Admin, StoreError> {
        let created_at = Utc::now();
        let result = sqlx::query(
            r"
            INSERT INTO admins (name, email, password_hash, is_active, created_at)
            VALUES (?1, ?2, ?3, 1, ?4)
            ",
        )
        .bind(&admin.name)
        .bind(&admin.email)
        .bind(&admin.password_hash)
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(Admin {
            id: result.last_insert_rowid(),
            name: admin.name,
            email: admin.email,
            password_hash: admin.password_hash,
            is_active: true,
            created_at: parse_timestamp(&format_timestamp(created_at))?,
        })
    }
}

#[async_trait]
impl RevocationStore for SqliteStore {
    async fn revoke_token(
        &self,
        jti: &str,
        revoked_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r"
            INSERT OR IGNORE INTO revoked_tokens (jti, revoked_at, expires_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(jti)
        .bind(format_timestamp(revoked_at))
        .bind(format_timestamp(expires_at))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn is_token_revoked(&self, jti: &str) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM revoked_tokens WHERE jti = ?1")
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn purge_revoked_before(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM revoked_tokens WHERE expires_at <= ?1")
            .bind(format_timestamp(now))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
