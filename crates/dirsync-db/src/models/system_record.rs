//! Installation-wide key/value settings.
//!
//! `SystemStore` backs the `systems` table. Besides plain CRUD it offers
//! [`SystemStore::insert_if_absent`], which gives exactly-once creation when
//! several nodes race to define the same key.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use tracing::{debug, info, instrument, warn};

use crate::error::{is_serialization_failure, is_unique_violation, DbError};
use crate::pool::DbPool;

/// Maximum length of a setting name (column width).
pub const SYSTEM_NAME_MAX_LENGTH: usize = 64;

/// Maximum length of a setting value (column width).
pub const SYSTEM_VALUE_MAX_LENGTH: usize = 1024;

/// A single named setting.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct SystemRecord {
    /// Unique key.
    pub name: String,
    /// Opaque value; a stored empty value counts as unset for `insert_if_absent`.
    pub value: String,
}

impl SystemRecord {
    /// Build a record.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Check the record fits the table.
    pub fn validate(&self) -> Result<(), DbError> {
        validate_name(&self.name)?;
        if self.value.chars().count() > SYSTEM_VALUE_MAX_LENGTH {
            return Err(DbError::ValidationFailed {
                field: "value",
                message: format!("must be at most {SYSTEM_VALUE_MAX_LENGTH} characters"),
            });
        }
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), DbError> {
    if name.is_empty() {
        return Err(DbError::ValidationFailed {
            field: "name",
            message: "must not be empty".to_string(),
        });
    }
    if name.chars().count() > SYSTEM_NAME_MAX_LENGTH {
        return Err(DbError::ValidationFailed {
            field: "name",
            message: format!("must be at most {SYSTEM_NAME_MAX_LENGTH} characters"),
        });
    }
    Ok(())
}

/// Persistent key/value store over the `systems` table.
#[derive(Debug, Clone)]
pub struct SystemStore {
    pool: PgPool,
}

impl SystemStore {
    /// Create a store sharing `pool`.
    #[must_use]
    pub fn new(pool: &DbPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Every stored setting keyed by name.
    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<HashMap<String, String>, DbError> {
        let rows: Vec<SystemRecord> = sqlx::query_as("SELECT name, value FROM systems")
            .fetch_all(&self.pool)
            .await?;

        debug!(count = rows.len(), "Loaded system settings");
        Ok(rows.into_iter().map(|r| (r.name, r.value)).collect())
    }

    /// Fetch one setting.
    ///
    /// # Errors
    ///
    /// `DbError::NotFound` when no row has this name.
    #[instrument(skip(self))]
    pub async fn get_by_name(&self, name: &str) -> Result<SystemRecord, DbError> {
        sqlx::query_as("SELECT name, value FROM systems WHERE name = $1")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::NotFound {
                resource: "system",
                id: name.to_string(),
            })
    }

    /// Insert a new setting.
    ///
    /// # Errors
    ///
    /// `DbError::Conflict` when the name is already taken.
    #[instrument(skip(self, record), fields(name = %record.name))]
    pub async fn save(&self, record: &SystemRecord) -> Result<(), DbError> {
        record.validate()?;
        sqlx::query("INSERT INTO systems (name, value) VALUES ($1, $2)")
            .bind(&record.name)
            .bind(&record.value)
            .execute(&self.pool)
            .await?;

        info!("System setting saved");
        Ok(())
    }

    /// Overwrite the value of an existing setting.
    ///
    /// Updating a name that does not exist is not an error.
    #[instrument(skip(self, record), fields(name = %record.name))]
    pub async fn update(&self, record: &SystemRecord) -> Result<(), DbError> {
        record.validate()?;
        let result = sqlx::query("UPDATE systems SET value = $2 WHERE name = $1")
            .bind(&record.name)
            .bind(&record.value)
            .execute(&self.pool)
            .await?;

        debug!(rows = result.rows_affected(), "System setting updated");
        Ok(())
    }

    /// Update the setting if it exists, insert it otherwise.
    ///
    /// Not atomic: a concurrent insert of the same name between the read and
    /// the write surfaces as `DbError::Conflict`.
    #[instrument(skip(self, record), fields(name = %record.name))]
    pub async fn save_or_update(&self, record: &SystemRecord) -> Result<(), DbError> {
        match self.get_by_name(&record.name).await {
            Ok(_) => self.update(record).await,
            Err(DbError::NotFound { .. }) => self.save(record).await,
            Err(e) => Err(e),
        }
    }

    /// Insert the setting unless a non-empty value is already stored.
    ///
    /// Runs under `SERIALIZABLE` isolation. Returns the value that ends up
    /// stored and whether this call wrote it. Exactly one of several
    /// concurrent callers observes `true`; the others get the winner's value.
    ///
    /// A stored row with an empty value is treated as absent and overwritten.
    ///
    /// # Errors
    ///
    /// - `DbError::ValidationFailed` when `record.value` is empty.
    /// - The underlying storage error when the transaction fails and no
    ///   concurrent writer left a non-empty value behind. A serialization
    ///   failure between writers of different keys ends up here too; see
    ///   [`DbError::is_serialization_failure`].
    #[instrument(skip(self, record), fields(name = %record.name))]
    pub async fn insert_if_absent(
        &self,
        record: &SystemRecord,
    ) -> Result<(SystemRecord, bool), DbError> {
        record.validate()?;
        if record.value.is_empty() {
            return Err(DbError::ValidationFailed {
                field: "value",
                message: "must not be empty".to_string(),
            });
        }

        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await?;

        let existing: Option<SystemRecord> =
            sqlx::query_as("SELECT name, value FROM systems WHERE name = $1")
                .bind(&record.name)
                .fetch_optional(&mut *tx)
                .await?;

        if let Some(existing) = existing.filter(|r| !r.value.is_empty()) {
            tx.rollback().await?;
            debug!("System setting already present");
            return Ok((existing, false));
        }

        match Self::write_in_tx(&mut tx, record).await {
            Ok(true) => {}
            Ok(false) => {
                tx.rollback().await?;
                return self
                    .settle_lost_race(record, sqlx::Error::RowNotFound)
                    .await;
            }
            Err(e) if is_lost_race(&e) => {
                tx.rollback().await?;
                return self.settle_lost_race(record, e).await;
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = tx.commit().await {
            if is_lost_race(&e) {
                return self.settle_lost_race(record, e).await;
            }
            return Err(e.into());
        }

        info!("System setting inserted");
        Ok((record.clone(), true))
    }

    /// Resolve a failed insert: a committed non-empty value means another
    /// writer won this key, anything else is a plain storage failure.
    async fn settle_lost_race(
        &self,
        record: &SystemRecord,
        error: sqlx::Error,
    ) -> Result<(SystemRecord, bool), DbError> {
        match self.read_filled(&record.name).await? {
            Some(winner) => {
                warn!(error = %error, "Concurrent writer won insert_if_absent; using its value");
                Ok((winner, false))
            }
            None => {
                warn!(error = %error, "insert_if_absent failed with no concurrent winner");
                Err(error.into())
            }
        }
    }

    /// Write the record, overwriting only an empty stored value.
    ///
    /// Returns whether a row was written.
    async fn write_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        record: &SystemRecord,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r"
            INSERT INTO systems (name, value)
            VALUES ($1, $2)
            ON CONFLICT (name) DO UPDATE SET value = EXCLUDED.value
            WHERE systems.value = ''
            ",
        )
        .bind(&record.name)
        .bind(&record.value)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn read_filled(&self, name: &str) -> Result<Option<SystemRecord>, DbError> {
        let row: Option<SystemRecord> =
            sqlx::query_as("SELECT name, value FROM systems WHERE name = $1")
                .bind(name)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.filter(|r| !r.value.is_empty()))
    }

    /// Hard-delete a setting.
    ///
    /// Returns whether a row was removed; a missing name is not an error.
    #[instrument(skip(self))]
    pub async fn permanent_delete_by_name(&self, name: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM systems WHERE name = $1")
            .bind(name)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("System setting deleted");
        }
        Ok(deleted)
    }
}

fn is_lost_race(error: &sqlx::Error) -> bool {
    is_serialization_failure(error) || is_unique_violation(error)
}
