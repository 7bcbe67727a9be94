// ============================
// backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;

use anyhow::{bail, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;

use crate::auth::HashCost;

/// Prefix for environment overrides, e.g. `VIKASANA_SECRET_KEY`
pub const ENV_PREFIX: &str = "VIKASANA_";

/// Shortest signing secret accepted at startup
pub const MIN_SECRET_LEN: usize = 32;

/// Longest access token lifetime accepted at startup (ten years)
pub const MAX_TOKEN_TTL_MINUTES: i64 = 525_600 * 10;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// sqlx connection string for the admin and revocation tables
    pub database_url: String,
    /// HS256 signing secret
    pub secret_key: SecretKey,
    /// Access token lifetime in minutes
    pub access_token_expire_minutes: i64,
    /// Comma-separated CORS origins
    pub allowed_origins: String,
    /// Comma-separated peer addresses whose `X-Real-IP` / `X-Forwarded-For` are trusted
    pub trusted_proxies: String,
    /// Deployment name reported by `GET /`
    pub app_env: String,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// Seconds between sweeps of expired revocation records
    pub revocation_sweep_secs: u64,
    /// Scrypt cost for password hashes
    pub password_hash: HashCost,
    /// Failed-login lockout policy
    pub login_limit: LoginLimitSettings,
}

/// Failed-login lockout policy
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoginLimitSettings {
    /// Failed attempts before a client is locked out
    pub max_attempts: u32,
    /// Lockout duration in seconds
    pub lockout_secs: u64,
}

/// Signing secret. `Debug` never prints the value.
#[derive(Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SecretKey(String);

impl SecretKey {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKey(**redacted**)")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            database_url: "sqlite://data/vikasana.db?mode=rwc".to_string(),
            secret_key: SecretKey::default(),
            access_token_expire_minutes: 60,
            allowed_origins: "http://localhost:5173".to_string(),
            trusted_proxies: String::new(),
            app_env: "production".to_string(),
            log_level: "info".to_string(),
            log_json: false,
            revocation_sweep_secs: 60 * 60,
            password_hash: HashCost::default(),
            login_limit: LoginLimitSettings::default(),
        }
    }
}

impl Default for LoginLimitSettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            lockout_secs: 5 * 60,
        }
    }
}

impl Settings {
    /// Load settings from `config.toml` and `VIKASANA_*` environment variables
    pub fn load() -> Result<Self> {
        Self::extract(Self::figment("config.toml"))
    }

    /// Load settings from an explicit config file, still honouring the environment
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::extract(Self::figment(path))
    }

    fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let settings: Settings = figment.extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject settings the server cannot run safely with
    pub fn validate(&self) -> Result<()> {
        if self.secret_key.len() < MIN_SECRET_LEN {
            bail!("secret_key must be at least {MIN_SECRET_LEN} bytes");
        }
        if self.access_token_expire_minutes <= 0 {
            bail!("access_token_expire_minutes must be positive");
        }
        if self.access_token_expire_minutes > MAX_TOKEN_TTL_MINUTES {
            bail!("access_token_expire_minutes must be at most {MAX_TOKEN_TTL_MINUTES}");
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!("unknown log_level {:?}", self.log_level);
        }
        if self.revocation_sweep_secs == 0 {
            bail!("revocation_sweep_secs must be positive");
        }
        if self.login_limit.max_attempts == 0 {
            bail!("login_limit.max_attempts must be positive");
        }
        if self.database_url.trim().is_empty() {
            bail!("database_url is required");
        }
        self.trusted_proxy_list()?;
        self.password_hash.params()?;
        Ok(())
    }

    /// Access token lifetime
    pub fn token_ttl(&self) -> Result<chrono::Duration> {
        match chrono::Duration::try_minutes(self.access_token_expire_minutes) {
            Some(ttl) => Ok(ttl),
            None => bail!(
                "access_token_expire_minutes {} is out of range",
                self.access_token_expire_minutes
            ),
        }
    }

    /// Parsed trusted proxy addresses, blanks dropped
    pub fn trusted_proxy_list(&self) -> Result<Vec<IpAddr>> {
        self.trusted_proxies
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(|p| {
                p.parse::<IpAddr>()
                    .map_err(|e| anyhow::anyhow!("bad trusted_proxies entry {p:?}: {e}"))
            })
            .collect()
    }

    /// Parsed CORS origins, blanks dropped
    pub fn origins_list(&self) -> Vec<String> {
        self.allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|o| !o.is_empty())
            .map(str::to_string)
            .collect()
    }
}
