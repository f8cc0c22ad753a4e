//! Directory record and paging types.

use serde::{Deserialize, Serialize};

/// A group as seen in the external directory.
///
/// Read-only from dirsync's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalGroupRecord {
    /// Stable identifier, unique within the directory.
    pub remote_id: String,
    /// Display name as stored at the source (unbounded).
    pub display_name: String,
    /// Whether the group has member entries.
    pub has_nested_entries: bool,
}

impl ExternalGroupRecord {
    pub fn new(remote_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            remote_id: remote_id.into(),
            display_name: display_name.into(),
            has_nested_entries: false,
        }
    }

    /// Ordering key used by every source: display name, then remote id.
    pub fn sort_key(&self) -> (&str, &str) {
        (&self.display_name, &self.remote_id)
    }
}

/// One page of a directory search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    /// Zero-based page index.
    pub page: u32,
    /// Maximum number of records on the page.
    pub per_page: u32,
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }

    /// Number of records to skip.
    pub fn offset(&self) -> usize {
        self.page as usize * self.per_page as usize
    }

    /// Apply this page to an already ordered result set.
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset())
            .take(self.per_page as usize)
            .collect()
    }
}
