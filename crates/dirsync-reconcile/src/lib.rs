//! dirsync Group Reconciliation
//!
//! Links groups from an external directory to internal linked groups, lists
//! the two sides merged and refreshes linked groups from the directory.
//!
//! # Overview
//!
//! [`GroupReconciler`] sits between an
//! [`ExternalDirectorySource`](dirsync_connector::ExternalDirectorySource)
//! and a [`GroupRepository`](dirsync_core::GroupRepository). Every operation
//! runs under the configured deadline and reports an exceeded deadline as
//! `Unavailable`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use dirsync_connector::{ExternalGroupRecord, InMemoryDirectorySource};
//! use dirsync_core::InMemoryGroupRepository;
//! use dirsync_reconcile::{GroupReconciler, LinkOutcome, ReconcilerConfig};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let directory = Arc::new(InMemoryDirectorySource::with_groups(vec![
//!     ExternalGroupRecord::new("ext-1", "Engineering"),
//! ]));
//! let groups = Arc::new(InMemoryGroupRepository::new());
//! let reconciler = GroupReconciler::new(directory, groups, ReconcilerConfig::default()).unwrap();
//!
//! let first = reconciler.link("ext-1").await.unwrap();
//! assert_eq!(first.outcome, LinkOutcome::Created);
//! let second = reconciler.link("ext-1").await.unwrap();
//! assert_eq!(second.outcome, LinkOutcome::AlreadyLinked);
//! assert_eq!(first.group.id, second.group.id);
//! # }
//! ```

pub mod config;
mod merge;
pub mod reconciler;
pub mod types;

pub use config::ReconcilerConfig;
pub use reconciler::GroupReconciler;
pub use types::{
    truncate_display_name, GroupListFilter, LinkOutcome, LinkResult, MergedGroupPage,
    MixedGroupView, SyncReport, UnlinkOutcome,
};
