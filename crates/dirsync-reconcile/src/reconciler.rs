//! Group link reconciler.
//!
//! Keeps internal linked groups consistent with the external directory:
//!
//! - `link` materializes, restores or confirms an internal group for a
//!   directory group.
//! - `unlink` tombstones it, keeping the surrogate id for a later restore.
//! - `list_merged` pages through directory groups annotated with their
//!   internal linkage.
//! - `sync` refreshes every linked group from the directory.
//!
//! The directory is never written to.

use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;

use dirsync_connector::{ExternalDirectorySource, ExternalGroupRecord, PageRequest};
use dirsync_core::{
    validate_remote_id, ConfigError, DirsyncError, GroupRepository, GroupSource, GroupState,
    InternalGroup, NewGroup, Result,
};
use tracing::{debug, info, instrument, warn};

use crate::config::ReconcilerConfig;
use crate::merge::merge;
use crate::types::{
    truncate_display_name, GroupListFilter, LinkOutcome, LinkResult, MergedGroupPage,
    SyncReport, UnlinkOutcome,
};

/// Reconciles external directory groups with internal linked groups.
pub struct GroupReconciler {
    directory: Arc<dyn ExternalDirectorySource>,
    groups: Arc<dyn GroupRepository>,
    config: ReconcilerConfig,
    source: GroupSource,
}

impl GroupReconciler {
    /// Create a reconciler.
    ///
    /// # Errors
    ///
    /// Returns an error when `config` is out of range.
    pub fn new(
        directory: Arc<dyn ExternalDirectorySource>,
        groups: Arc<dyn GroupRepository>,
        config: ReconcilerConfig,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            directory,
            groups,
            config,
            source: GroupSource::ExternalDirectory,
        })
    }

    /// Get the active configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Link a directory group, materializing it internally if needed.
    ///
    /// Idempotent: linking an already linked group writes nothing and
    /// reports [`LinkOutcome::AlreadyLinked`]. A previously unlinked group is
    /// restored under its original id with a refreshed display name.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` for a malformed remote id or a group without a
    ///   display name.
    /// - `NotFound` when the directory has no such group.
    /// - `Unavailable` when the directory cannot be reached in time.
    #[instrument(skip(self), fields(directory = %self.directory.display_name()))]
    pub async fn link(&self, remote_id: &str) -> Result<LinkResult> {
        self.with_deadline("link", self.link_inner(remote_id)).await
    }

    async fn link_inner(&self, remote_id: &str) -> Result<LinkResult> {
        validate_remote_id(remote_id)?;

        let record = self
            .directory
            .get_group(remote_id)
            .await?
            .ok_or_else(|| DirsyncError::not_found("external group", remote_id))?;

        let display_name =
            truncate_display_name(&record.display_name, self.config.max_display_name_length);
        if display_name.trim().is_empty() {
            return Err(DirsyncError::invalid_input(
                "display_name",
                format!("external group '{remote_id}' has no display name"),
            ));
        }

        let stored = self
            .groups
            .get_by_remote_id(&record.remote_id, self.source)
            .await?;
        let result = match stored {
            Some(existing) => self.relink(existing, display_name, record).await?,
            None => self.materialize(display_name, record).await?,
        };

        info!(
            group_id = %result.group.id,
            outcome = result.outcome.as_str(),
            "Group link reconciled"
        );
        Ok(result)
    }

    async fn materialize(
        &self,
        display_name: String,
        record: ExternalGroupRecord,
    ) -> Result<LinkResult> {
        let created = self
            .groups
            .create(NewGroup {
                display_name: display_name.clone(),
                remote_id: record.remote_id.clone(),
                source: self.source,
            })
            .await;

        match created {
            Ok(group) => Ok(LinkResult {
                group,
                outcome: LinkOutcome::Created,
            }),
            Err(e) if e.is_conflict() => {
                // Another caller materialized the same remote id after our lookup.
                warn!(error = %e, "Concurrent link detected; re-reading group");
                let Some(existing) = self
                    .groups
                    .get_by_remote_id(&record.remote_id, self.source)
                    .await?
                else {
                    return Err(e);
                };
                self.relink(existing, display_name, record).await
            }
            Err(e) => Err(e),
        }
    }

    async fn relink(
        &self,
        mut group: InternalGroup,
        display_name: String,
        record: ExternalGroupRecord,
    ) -> Result<LinkResult> {
        match group.state {
            GroupState::Active => {
                debug!(group_id = %group.id, "Group already linked");
                Ok(LinkResult {
                    group,
                    outcome: LinkOutcome::AlreadyLinked,
                })
            }
            GroupState::Deleted { .. } => {
                group.restore(display_name, record.remote_id);
                let group = self.groups.update(&group).await?;
                Ok(LinkResult {
                    group,
                    outcome: LinkOutcome::Restored,
                })
            }
        }
    }

    /// Unlink a group by tombstoning its internal row.
    ///
    /// Unlinking an already unlinked group is a no-op.
    ///
    /// # Errors
    ///
    /// `NotFound` when the group was never linked.
    #[instrument(skip(self))]
    pub async fn unlink(&self, remote_id: &str) -> Result<UnlinkOutcome> {
        self.with_deadline("unlink", self.unlink_inner(remote_id))
            .await
    }

    async fn unlink_inner(&self, remote_id: &str) -> Result<UnlinkOutcome> {
        validate_remote_id(remote_id)?;

        let group = self
            .groups
            .get_by_remote_id(remote_id, self.source)
            .await?
            .ok_or_else(|| DirsyncError::not_found("group", remote_id))?;

        match group.state {
            GroupState::Active => {
                self.groups.soft_delete(&group.id).await?;
                info!(group_id = %group.id, "Group unlinked");
                Ok(UnlinkOutcome::Unlinked)
            }
            GroupState::Deleted { .. } => {
                debug!(group_id = %group.id, "Group already unlinked");
                Ok(UnlinkOutcome::AlreadyUnlinked)
            }
        }
    }

    /// List directory groups annotated with their internal linkage.
    ///
    /// `page` is zero-based. `total` counts every group matching `filter`.
    ///
    /// # Errors
    ///
    /// `InvalidInput` when `per_page` is zero or above the configured maximum.
    #[instrument(skip(self, filter), fields(query = ?filter.query))]
    pub async fn list_merged(
        &self,
        page: u32,
        per_page: u32,
        filter: &GroupListFilter,
    ) -> Result<MergedGroupPage> {
        if per_page == 0 || per_page > self.config.max_per_page {
            return Err(DirsyncError::invalid_input(
                "per_page",
                format!("must be between 1 and {}", self.config.max_per_page),
            ));
        }

        self.with_deadline("list_merged", self.list_merged_inner(page, per_page, filter))
            .await
    }

    async fn list_merged_inner(
        &self,
        page: u32,
        per_page: u32,
        filter: &GroupListFilter,
    ) -> Result<MergedGroupPage> {
        let records = self.fetch_directory(filter.normalized_query()).await?;
        let remote_ids: Vec<String> = records.iter().map(|r| r.remote_id.clone()).collect();
        let linkages = self
            .groups
            .list_active_by_remote_ids(&remote_ids, self.source)
            .await?;

        let matching: Vec<_> = merge(records, linkages)
            .into_iter()
            .filter(|view| filter.matches(view))
            .collect();
        let total = matching.len();
        let groups = PageRequest::new(page, per_page).slice(matching);

        debug!(total, returned = groups.len(), "Merged group listing built");
        Ok(MergedGroupPage { total, groups })
    }

    /// Pull every matching group from the directory, one page at a time.
    async fn fetch_directory(&self, query: Option<&str>) -> Result<Vec<ExternalGroupRecord>> {
        let page_size = self.config.directory_page_size;
        let mut seen = HashSet::new();
        let mut records = Vec::new();
        let mut page = 0;

        loop {
            let batch = self
                .directory
                .search_groups(query, PageRequest::new(page, page_size))
                .await?;
            let batch_len = batch.len();

            let before = records.len();
            for record in batch {
                if seen.insert(record.remote_id.clone()) {
                    records.push(record);
                }
            }

            // A short page is the last one. A page of repeats means the source
            // ignores paging.
            if batch_len < page_size as usize || records.len() == before {
                break;
            }
            page += 1;
        }

        debug!(count = records.len(), pages = page + 1, "Fetched directory groups");
        Ok(records)
    }

    /// Refresh every linked group from the directory.
    ///
    /// Display names and remote ids are rewritten when the directory reports
    /// new ones. Groups the directory no longer knows are reported in
    /// [`SyncReport::missing_upstream`] and stay linked.
    ///
    /// # Errors
    ///
    /// `Unavailable` when the directory cannot be reached in time. A failed
    /// write stops the pass; groups refreshed before it keep their new values.
    #[instrument(skip(self), fields(directory = %self.directory.display_name()))]
    pub async fn sync(&self) -> Result<SyncReport> {
        self.with_deadline("sync", self.sync_inner()).await
    }

    async fn sync_inner(&self) -> Result<SyncReport> {
        let linked = self.groups.list_active(self.source).await?;
        let mut report = SyncReport {
            checked: linked.len(),
            ..SyncReport::default()
        };

        for mut group in linked {
            let Some(record) = self.directory.get_group(&group.remote_id).await? else {
                warn!(group_id = %group.id, remote_id = %group.remote_id, "Linked group missing from directory");
                report.missing_upstream.push(group.remote_id);
                continue;
            };

            let display_name =
                truncate_display_name(&record.display_name, self.config.max_display_name_length);
            if display_name.trim().is_empty() {
                warn!(group_id = %group.id, "Directory group has no display name; keeping stored one");
                report.skipped.push(group.remote_id);
                continue;
            }

            if group.refresh(display_name, record.remote_id) {
                self.groups.update(&group).await?;
                debug!(group_id = %group.id, "Linked group refreshed");
                report.updated += 1;
            }
        }

        info!(
            checked = report.checked,
            updated = report.updated,
            missing = report.missing_upstream.len(),
            "Linked groups synced"
        );
        Ok(report)
    }

    /// Check the directory is reachable and accepts our credentials.
    #[instrument(skip(self), fields(directory = %self.directory.display_name()))]
    pub async fn test_directory(&self) -> Result<()> {
        self.with_deadline("test_directory", async {
            self.directory.test_connection().await?;
            Ok(())
        })
        .await
    }

    async fn with_deadline<T, F>(&self, operation: &'static str, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        let timeout = self.config.operation_timeout;
        tokio::time::timeout(timeout, fut).await.map_err(|_| {
            warn!(operation, timeout_secs = timeout.as_secs(), "Operation timed out");
            DirsyncError::unavailable(format!(
                "{operation} did not complete within {}s",
                timeout.as_secs()
            ))
        })?
    }
}

impl std::fmt::Debug for GroupReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupReconciler")
            .field("directory", &self.directory.display_name())
            .field("config", &self.config)
            .finish()
    }
}
