//! Installation Bootstrap Module
//!
//! Every deployment carries a stable installation identity in the `systems`
//! table. Whichever node boots first defines it; later nodes, including ones
//! racing the first, read the same values back.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dirsync_db::bootstrap::ensure_installation;
//! use dirsync_db::SystemStore;
//!
//! let result = ensure_installation(&SystemStore::new(&pool)).await?;
//! if result.created {
//!     info!(installation_id = %result.installation_id, "New installation");
//! }
//! ```

mod installation;

pub use installation::{ensure_installation, BootstrapResult};

use thiserror::Error;

use crate::error::DbError;

/// Setting name holding the installation UUID.
pub const INSTALLATION_ID_KEY: &str = "InstallationId";

/// Setting name holding the RFC 3339 installation timestamp.
pub const INSTALLATION_DATE_KEY: &str = "InstallationDate";

/// Errors that can occur during the bootstrap process.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The backing store failed.
    #[error("Database error during bootstrap: {0}")]
    Database(#[from] DbError),

    /// A stored installation value could not be parsed.
    #[error("Stored value for {key} is not valid: {value}")]
    CorruptValue { key: &'static str, value: String },
}
