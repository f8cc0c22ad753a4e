//! In-memory directory source.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::error::{ConnectorError, ConnectorResult};
use crate::traits::ExternalDirectorySource;
use crate::types::{ExternalGroupRecord, PageRequest};

/// In-memory implementation of `ExternalDirectorySource` for testing.
#[derive(Debug, Default)]
pub struct InMemoryDirectorySource {
    groups: RwLock<Vec<ExternalGroupRecord>>,
    unavailable: AtomicBool,
    search_calls: AtomicUsize,
}

impl InMemoryDirectorySource {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a directory holding `groups`.
    #[must_use]
    pub fn with_groups(groups: Vec<ExternalGroupRecord>) -> Self {
        Self {
            groups: RwLock::new(groups),
            ..Self::default()
        }
    }

    /// Add or replace a group (matched by remote id).
    pub fn upsert(&self, record: ExternalGroupRecord) {
        let mut groups = self.groups.write().expect("lock poisoned");
        match groups.iter_mut().find(|g| g.remote_id == record.remote_id) {
            Some(existing) => *existing = record,
            None => groups.push(record),
        }
    }

    /// Remove a group.
    pub fn remove(&self, remote_id: &str) {
        self.groups
            .write()
            .expect("lock poisoned")
            .retain(|g| g.remote_id != remote_id);
    }

    /// Make every call fail as if the directory were unreachable.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `search_groups` calls served (for testing).
    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    fn check_available(&self) -> ConnectorResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(ConnectorError::connection_failed("directory is offline"));
        }
        Ok(())
    }
}

#[async_trait]
impl ExternalDirectorySource for InMemoryDirectorySource {
    fn display_name(&self) -> &str {
        "in-memory"
    }

    async fn test_connection(&self) -> ConnectorResult<()> {
        self.check_available()
    }

    async fn search_groups(
        &self,
        query: Option<&str>,
        page: PageRequest,
    ) -> ConnectorResult<Vec<ExternalGroupRecord>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let needle = query.map(str::to_lowercase);
        let mut matches: Vec<ExternalGroupRecord> = self
            .groups
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|g| match &needle {
                Some(n) => g.display_name.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

        Ok(page.slice(matches))
    }

    async fn get_group(&self, remote_id: &str) -> ConnectorResult<Option<ExternalGroupRecord>> {
        self.check_available()?;
        Ok(self
            .groups
            .read()
            .expect("lock poisoned")
            .iter()
            .find(|g| g.remote_id == remote_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directory() -> InMemoryDirectorySource {
        InMemoryDirectorySource::with_groups(vec![
            ExternalGroupRecord::new("g-3", "Support"),
            ExternalGroupRecord::new("g-1", "Engineering"),
            ExternalGroupRecord::new("g-2", "engineering leads"),
        ])
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_and_ordered() {
        let dir = directory();
        let found = dir
            .search_groups(Some("ENGINEERING"), PageRequest::new(0, 10))
            .await
            .unwrap();
        let ids: Vec<&str> = found.iter().map(|g| g.remote_id.as_str()).collect();
        assert_eq!(ids, vec!["g-1", "g-2"]);
        assert_eq!(dir.search_calls(), 1);
    }

    #[tokio::test]
    async fn test_search_pages() {
        let dir = directory();
        let second = dir.search_groups(None, PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].remote_id, "g-2");
    }

    #[tokio::test]
    async fn test_get_and_offline() {
        let dir = directory();
        assert!(dir.get_group("g-1").await.unwrap().is_some());
        assert!(dir.get_group("missing").await.unwrap().is_none());

        dir.set_unavailable(true);
        let err = dir.get_group("g-1").await.unwrap_err();
        assert!(err.is_transient());
        assert!(dir.test_connection().await.is_err());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_remote_id() {
        let dir = directory();
        dir.upsert(ExternalGroupRecord::new("g-1", "Platform"));
        dir.remove("g-3");
        let all = dir.search_groups(None, PageRequest::new(0, 10)).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].display_name, "Platform");
    }
}
