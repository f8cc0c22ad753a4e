//! Wiring of stores and services from the environment

use std::sync::Arc;

use dirsync_connector_ldap::{LdapConfig, LdapDirectorySource};
use dirsync_db::{DbConfig, DbPool, PgGroupRepository, SystemStore};
use dirsync_reconcile::{GroupReconciler, ReconcilerConfig};
use tracing::{debug, info};

use crate::error::CliResult;

/// Database-backed command context.
pub struct AppContext {
    pool: DbPool,
}

impl AppContext {
    /// Connect to the database named by `DATABASE_URL`.
    pub async fn connect() -> CliResult<Self> {
        let config = DbConfig::from_env()?;
        debug!(?config, "Connecting to database");
        let pool = DbPool::connect_with(&config).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }

    pub fn systems(&self) -> SystemStore {
        SystemStore::new(&self.pool)
    }

    pub fn groups(&self) -> PgGroupRepository {
        PgGroupRepository::new(&self.pool)
    }

    /// Build a reconciler over the configured LDAP directory.
    pub fn reconciler(&self) -> CliResult<GroupReconciler> {
        let directory = directory_from_env()?;
        let config = ReconcilerConfig::from_env()?;
        let reconciler =
            GroupReconciler::new(Arc::new(directory), Arc::new(self.groups()), config)?;
        Ok(reconciler)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Close the pool, then hand back the command's result.
    pub async fn finish<T>(self, result: CliResult<T>) -> CliResult<T> {
        self.close().await;
        result
    }
}

/// Build the LDAP directory source from `LDAP_*` variables.
pub fn directory_from_env() -> CliResult<LdapDirectorySource> {
    let config = LdapConfig::from_env()?;
    info!(host = %config.host, base_dn = %config.base_dn, "Using LDAP directory");
    Ok(LdapDirectorySource::new(config)?)
}
