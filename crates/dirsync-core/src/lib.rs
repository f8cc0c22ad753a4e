//! dirsync Core Library
//!
//! Shared types and traits for dirsync.
//!
//! # Modules
//!
//! - [`ids`] - Strongly typed identifiers (`GroupId`)
//! - [`models`] - Linked group domain model
//! - [`repository`] - Storage seam for linked groups (`GroupRepository`)
//! - [`error`] - Classified error type (`DirsyncError`, `ErrorKind`)
//! - [`config`] - Environment configuration helpers
//!
//! # Example
//!
//! ```
//! use dirsync_core::{DirsyncError, ErrorKind, GroupId, Result};
//!
//! let id = GroupId::new();
//! assert_eq!(id.to_string().len(), GroupId::WIDTH);
//!
//! fn example() -> Result<()> {
//!     Err(DirsyncError::not_found("group", "ext-1"))
//! }
//! assert_eq!(example().unwrap_err().kind(), ErrorKind::NotFound);
//! ```

pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod repository;

// Re-export main types for convenient access
pub use config::{ConfigError, EnvReader};
pub use error::{DirsyncError, ErrorKind, Result};
pub use ids::{GroupId, ParseIdError};
pub use models::{
    validate_remote_id, GroupLinkage, GroupSource, GroupState, InternalGroup, NewGroup,
    GROUP_DISPLAY_NAME_MAX_LENGTH, REMOTE_ID_MAX_LENGTH,
};
pub use repository::{GroupRepository, InMemoryGroupRepository};
