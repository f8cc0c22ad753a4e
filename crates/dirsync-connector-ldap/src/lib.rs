//! # LDAP Directory Source
//!
//! LDAP v3 adapter for dirsync's `ExternalDirectorySource`.
//!
//! ## Features
//!
//! - Simple bind over `ldap://` or `ldaps://`, optional STARTTLS
//! - Configurable group filter and id/display name/member attributes
//! - Escaped search filters
//! - Stable (display name, remote id) ordering for paging
//!
//! ## Example
//!
//! ```ignore
//! use dirsync_connector::ExternalDirectorySource;
//! use dirsync_connector_ldap::{LdapConfig, LdapDirectorySource};
//!
//! let config = LdapConfig::new(
//!     "ldap.example.com",
//!     "dc=example,dc=com",
//!     "cn=admin,dc=example,dc=com",
//! )
//! .with_password("secret")
//! .with_ssl();
//!
//! let source = LdapDirectorySource::new(config)?;
//! source.test_connection().await?;
//! ```

pub mod config;
pub mod source;

pub use config::LdapConfig;
pub use source::LdapDirectorySource;
