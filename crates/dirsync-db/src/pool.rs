//! Database connection pool.

use std::env::VarError;
use std::fmt;
use std::time::Duration;

use dirsync_core::config::{parse_or, required, ConfigError, EnvReader};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::info;

use crate::error::DbError;

/// Default maximum number of pooled connections.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Default upper bound for waiting on a pooled connection, in seconds.
pub const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 5;

/// Connection settings for the backing store.
#[derive(Clone)]
pub struct DbConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
    /// Upper bound for acquiring a connection from the pool.
    pub acquire_timeout: Duration,
}

impl DbConfig {
    /// Settings with default pool sizing for `database_url`.
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: Duration::from_secs(DEFAULT_ACQUIRE_TIMEOUT_SECS),
        }
    }

    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key: &str| std::env::var(key))
    }

    /// Load from a custom variable reader.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL` (required)
    /// - `DATABASE_MAX_CONNECTIONS` (default 10)
    /// - `DATABASE_ACQUIRE_TIMEOUT_SECS` (default 5)
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        Self::load(&reader)
    }

    fn load<R: EnvReader>(reader: &R) -> Result<Self, ConfigError> {
        let database_url = required(reader, "DATABASE_URL")?;
        let max_connections = parse_or(reader, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
        if max_connections == 0 {
            return Err(ConfigError::InvalidValue(
                "DATABASE_MAX_CONNECTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let acquire_secs = parse_or(
            reader,
            "DATABASE_ACQUIRE_TIMEOUT_SECS",
            DEFAULT_ACQUIRE_TIMEOUT_SECS,
        )?;

        Ok(Self {
            database_url,
            max_connections,
            acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }
}

impl fmt::Debug for DbConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbConfig")
            .field("database_url", &redact_url(&self.database_url))
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

/// Hide the password component of a connection URL.
fn redact_url(url: &str) -> String {
    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    match rest.split_once('@') {
        Some((userinfo, host)) => {
            let user = userinfo.split(':').next().unwrap_or_default();
            format!("{scheme}://{user}:***@{host}")
        }
        None => url.to_string(),
    }
}

/// Shared PostgreSQL connection pool.
///
/// Cheap to clone; every store and repository holds its own clone.
#[derive(Debug, Clone)]
pub struct DbPool {
    inner: PgPool,
}

impl DbPool {
    /// Connect with default pool sizing.
    pub async fn connect(database_url: &str) -> Result<Self, DbError> {
        Self::connect_with(&DbConfig::new(database_url)).await
    }

    /// Connect with explicit settings.
    pub async fn connect_with(config: &DbConfig) -> Result<Self, DbError> {
        let inner = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(DbError::ConnectionFailed)?;

        info!(
            max_connections = config.max_connections,
            "Database connection pool established"
        );

        Ok(Self { inner })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(inner: PgPool) -> Self {
        Self { inner }
    }

    /// Borrow the underlying `SQLx` pool.
    #[must_use]
    pub fn inner(&self) -> &PgPool {
        &self.inner
    }

    /// Begin a transaction that rolls back unless committed.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DbError> {
        self.inner.begin().await.map_err(DbError::from)
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.inner.close().await;
    }
}
