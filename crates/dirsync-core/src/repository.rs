//! Linked group storage trait and in-memory implementation.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use crate::error::{DirsyncError, Result};
use crate::ids::GroupId;
use crate::models::{GroupLinkage, GroupSource, GroupState, InternalGroup, NewGroup};

/// Storage for internal linked groups.
///
/// Implementations return `Ok(None)` for an absent row; every `Err` is a
/// real storage failure.
#[async_trait]
pub trait GroupRepository: Send + Sync {
    /// Look up a group, active or tombstoned, by its external identity.
    async fn get_by_remote_id(
        &self,
        remote_id: &str,
        source: GroupSource,
    ) -> Result<Option<InternalGroup>>;

    /// Load the active groups for a batch of remote ids in one call.
    ///
    /// Remote ids with no active row are simply absent from the result.
    async fn list_active_by_remote_ids(
        &self,
        remote_ids: &[String],
        source: GroupSource,
    ) -> Result<Vec<GroupLinkage>>;

    /// Every active group of `source`, ordered by remote id.
    async fn list_active(&self, source: GroupSource) -> Result<Vec<InternalGroup>>;

    /// Insert a new active group with a freshly generated id.
    ///
    /// Fails with a conflict when (remote id, source) is already taken.
    async fn create(&self, group: NewGroup) -> Result<InternalGroup>;

    /// Persist display name, remote id and state of an existing group.
    async fn update(&self, group: &InternalGroup) -> Result<InternalGroup>;

    /// Tombstone a group.
    async fn soft_delete(&self, id: &GroupId) -> Result<InternalGroup>;
}

/// In-memory implementation of `GroupRepository` for testing.
#[derive(Debug, Default)]
pub struct InMemoryGroupRepository {
    groups: RwLock<HashMap<GroupId, InternalGroup>>,
    // Groups with at least one attached team or channel.
    configured: RwLock<HashSet<GroupId>>,
}

impl InMemoryGroupRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a group as having (or not having) syncables attached.
    pub fn set_has_syncables(&self, id: GroupId, has_syncables: bool) {
        let mut configured = self.configured.write().expect("lock poisoned");
        if has_syncables {
            configured.insert(id);
        } else {
            configured.remove(&id);
        }
    }

    /// Insert a row as-is, bypassing the uniqueness check (for testing).
    pub fn insert_raw(&self, group: InternalGroup) {
        self.groups
            .write()
            .expect("lock poisoned")
            .insert(group.id, group);
    }

    /// Get all stored rows (for testing).
    pub fn get_all(&self) -> Vec<InternalGroup> {
        self.groups
            .read()
            .expect("lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Get count of stored rows (for testing).
    pub fn count(&self) -> usize {
        self.groups.read().expect("lock poisoned").len()
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn get_by_remote_id(
        &self,
        remote_id: &str,
        source: GroupSource,
    ) -> Result<Option<InternalGroup>> {
        let groups = self.groups.read().expect("lock poisoned");
        Ok(groups
            .values()
            .find(|g| g.remote_id == remote_id && g.source == source)
            .cloned())
    }

    async fn list_active_by_remote_ids(
        &self,
        remote_ids: &[String],
        source: GroupSource,
    ) -> Result<Vec<GroupLinkage>> {
        let wanted: HashSet<&str> = remote_ids.iter().map(String::as_str).collect();
        let groups = self.groups.read().expect("lock poisoned");
        let configured = self.configured.read().expect("lock poisoned");
        Ok(groups
            .values()
            .filter(|g| g.source == source && g.is_active())
            .filter(|g| wanted.contains(g.remote_id.as_str()))
            .map(|g| GroupLinkage {
                group: g.clone(),
                has_syncables: configured.contains(&g.id),
            })
            .collect())
    }

    async fn list_active(&self, source: GroupSource) -> Result<Vec<InternalGroup>> {
        let groups = self.groups.read().expect("lock poisoned");
        let mut active: Vec<InternalGroup> = groups
            .values()
            .filter(|g| g.source == source && g.is_active())
            .cloned()
            .collect();
        active.sort_by(|a, b| a.remote_id.cmp(&b.remote_id));
        Ok(active)
    }

    async fn create(&self, group: NewGroup) -> Result<InternalGroup> {
        let mut groups = self.groups.write().expect("lock poisoned");
        if groups
            .values()
            .any(|g| g.remote_id == group.remote_id && g.source == group.source)
        {
            return Err(DirsyncError::conflict(
                "group",
                format!("remote id '{}' is already materialized", group.remote_id),
            ));
        }
        let now = Utc::now();
        let created = InternalGroup {
            id: GroupId::new(),
            display_name: group.display_name,
            remote_id: group.remote_id,
            source: group.source,
            state: GroupState::Active,
            created_at: now,
            updated_at: now,
        };
        groups.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update(&self, group: &InternalGroup) -> Result<InternalGroup> {
        let mut groups = self.groups.write().expect("lock poisoned");
        let stored = groups
            .get_mut(&group.id)
            .ok_or_else(|| DirsyncError::not_found("group", group.id.to_string()))?;
        stored.display_name.clone_from(&group.display_name);
        stored.remote_id.clone_from(&group.remote_id);
        stored.state = group.state;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn soft_delete(&self, id: &GroupId) -> Result<InternalGroup> {
        let mut groups = self.groups.write().expect("lock poisoned");
        let stored = groups
            .get_mut(id)
            .ok_or_else(|| DirsyncError::not_found("group", id.to_string()))?;
        let now = Utc::now();
        stored.state = GroupState::Deleted { at: now };
        stored.updated_at = now;
        Ok(stored.clone())
    }
}
