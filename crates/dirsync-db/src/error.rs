//! Error types for the dirsync-db crate.
//!
//! Wraps `SQLx` errors with enough classification for callers to tell a
//! lost uniqueness race from a broken connection.

use dirsync_core::DirsyncError;
use thiserror::Error;

/// SQLSTATE raised when a serializable transaction cannot be committed.
pub const SERIALIZATION_FAILURE: &str = "40001";

/// SQLSTATE raised on a unique constraint violation.
pub const UNIQUE_VIOLATION: &str = "23505";

/// Database operation errors.
///
/// # Example
///
/// ```rust
/// use dirsync_db::DbError;
///
/// fn handle_error(err: DbError) {
///     match err {
///         DbError::ConnectionFailed(e) => eprintln!("Cannot connect: {}", e),
///         DbError::MigrationFailed(e) => eprintln!("Migration error: {}", e),
///         DbError::QueryFailed(e) => eprintln!("Query error: {}", e),
///         DbError::Conflict(e) => eprintln!("Duplicate: {}", e),
///         DbError::NotFound { resource, id } => eprintln!("No {} {}", resource, id),
///         DbError::ValidationFailed { field, message } => eprintln!("{}: {}", field, message),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum DbError {
    /// Failed to establish or acquire a database connection.
    ///
    /// Covers pool acquisition timeouts, closed pools and socket errors.
    #[error("Database connection failed: {0}")]
    ConnectionFailed(#[source] sqlx::Error),

    /// A database migration failed to apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(#[source] sqlx::migrate::MigrateError),

    /// A database query failed to execute.
    #[error("Query failed: {0}")]
    QueryFailed(#[source] sqlx::Error),

    /// A unique constraint rejected the write.
    #[error("Duplicate record: {0}")]
    Conflict(#[source] sqlx::Error),

    /// Resource not found.
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Validation failed before reaching the database.
    #[error("Validation failed on '{field}': {message}")]
    ValidationFailed { field: &'static str, message: String },
}

impl DbError {
    /// Check if this error indicates a connection problem.
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(self, DbError::ConnectionFailed(_))
    }

    /// Check if this error indicates a uniqueness conflict.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, DbError::Conflict(_))
    }

    /// Check if a serializable transaction was cancelled by the database.
    ///
    /// Safe to retry: nothing was committed.
    #[must_use]
    pub fn is_serialization_failure(&self) -> bool {
        matches!(self, DbError::QueryFailed(e) if is_serialization_failure(e))
    }

    /// Check if this error indicates a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, DbError::NotFound { .. })
    }

    /// Check if this error indicates a validation error.
    #[must_use]
    pub fn is_validation_failed(&self) -> bool {
        matches!(self, DbError::ValidationFailed { .. })
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed => DbError::ConnectionFailed(err),
            _ if is_unique_violation(&err) => DbError::Conflict(err),
            _ => DbError::QueryFailed(err),
        }
    }
}

impl From<DbError> for DirsyncError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::ConnectionFailed(e) => {
                DirsyncError::unavailable_with_source("database unreachable", e)
            }
            DbError::MigrationFailed(e) => {
                DirsyncError::internal_with_source("database migration failed", e)
            }
            DbError::QueryFailed(e) => DirsyncError::internal_with_source("database query failed", e),
            DbError::Conflict(e) => DirsyncError::Conflict {
                resource: "record".to_string(),
                message: "unique constraint violated".to_string(),
                source: Some(Box::new(e)),
            },
            DbError::NotFound { resource, id } => DirsyncError::not_found(resource, id),
            DbError::ValidationFailed { field, message } => {
                DirsyncError::invalid_input(field, message)
            }
        }
    }
}

/// Whether `error` carries the given SQLSTATE.
fn has_code(error: &sqlx::Error, code: &str) -> bool {
    matches!(
        error,
        sqlx::Error::Database(db_error) if db_error.code().as_deref() == Some(code)
    )
}

/// Whether a write was rejected by a unique constraint.
pub fn is_unique_violation(error: &sqlx::Error) -> bool {
    has_code(error, UNIQUE_VIOLATION)
}

/// Whether a serializable transaction lost to a concurrent writer.
pub fn is_serialization_failure(error: &sqlx::Error) -> bool {
    has_code(error, SERIALIZATION_FAILURE)
}
