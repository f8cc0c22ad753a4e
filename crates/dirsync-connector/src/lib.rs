//! dirsync Directory Connector
//!
//! The seam between dirsync and an external directory service. Concrete
//! adapters (LDAP in `dirsync-connector-ldap`) implement
//! [`ExternalDirectorySource`]; the reconciler only ever sees the trait.
//!
//! # Example
//!
//! ```
//! use dirsync_connector::{ExternalDirectorySource, ExternalGroupRecord, InMemoryDirectorySource};
//!
//! let directory = InMemoryDirectorySource::with_groups(vec![
//!     ExternalGroupRecord::new("ext-1", "Engineering"),
//! ]);
//! assert_eq!(directory.display_name(), "in-memory");
//! ```

pub mod error;
pub mod memory;
pub mod traits;
pub mod types;

pub use error::{ConnectorError, ConnectorResult};
pub use memory::InMemoryDirectorySource;
pub use traits::ExternalDirectorySource;
pub use types::{ExternalGroupRecord, PageRequest};
