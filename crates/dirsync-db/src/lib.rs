//! dirsync Database Layer
//!
//! PostgreSQL persistence for dirsync, built on `SQLx`.
//!
//! # Modules
//!
//! - [`pool`] - Connection pool and its configuration (`DbPool`, `DbConfig`)
//! - [`models`] - `SystemStore` key/value settings and `PgGroupRepository`
//! - [`bootstrap`] - Installation identity bootstrap
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - `DbError` and SQLSTATE helpers
//!
//! # Example
//!
//! ```rust,ignore
//! use dirsync_db::{run_migrations, DbPool, SystemRecord, SystemStore};
//!
//! let pool = DbPool::connect("postgres://localhost/dirsync").await?;
//! run_migrations(&pool).await?;
//!
//! let store = SystemStore::new(&pool);
//! let (record, inserted) = store
//!     .insert_if_absent(&SystemRecord::new("InstallationId", "abc"))
//!     .await?;
//! ```

pub mod bootstrap;
pub mod error;
pub mod migrations;
pub mod models;
pub mod pool;

pub use error::{is_serialization_failure, is_unique_violation, DbError};
pub use migrations::run_migrations;
pub use models::{
    GroupSyncable, PgGroupRepository, SyncableKind, SystemRecord, SystemStore,
    SYSTEM_NAME_MAX_LENGTH, SYSTEM_VALUE_MAX_LENGTH,
};
pub use pool::{DbConfig, DbPool};
