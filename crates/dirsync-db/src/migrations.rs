//! Embedded schema migrations.

use tracing::info;

use crate::error::DbError;
use crate::pool::DbPool;

/// Apply every pending migration from `migrations/`.
///
/// Safe to run on every start; applied versions are skipped.
///
/// # Errors
///
/// `DbError::MigrationFailed` when a script fails or an applied script was
/// edited after the fact.
pub async fn run_migrations(pool: &DbPool) -> Result<(), DbError> {
    let migrator = sqlx::migrate!("./migrations");
    info!(available = migrator.iter().count(), "Applying schema migrations");

    migrator
        .run(pool.inner())
        .await
        .map_err(DbError::MigrationFailed)?;

    info!("Schema is up to date");
    Ok(())
}
