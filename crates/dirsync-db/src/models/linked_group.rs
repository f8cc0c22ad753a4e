//! PostgreSQL storage for linked groups.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dirsync_core::{
    DirsyncError, GroupId, GroupLinkage, GroupRepository, GroupSource, GroupState, InternalGroup,
    NewGroup,
};
use sqlx::{FromRow, PgPool};
use tracing::{debug, info, instrument};

use crate::error::DbError;
use crate::models::group_syncable::{GroupSyncable, SyncableKind};
use crate::pool::DbPool;

const GROUP_COLUMNS: &str =
    "id, display_name, remote_id, source, created_at, updated_at, deleted_at";

/// Raw `linked_groups` row.
#[derive(Debug, Clone, FromRow)]
pub struct LinkedGroupRow {
    pub id: String,
    pub display_name: String,
    pub remote_id: String,
    pub source: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<LinkedGroupRow> for InternalGroup {
    type Error = DirsyncError;

    fn try_from(row: LinkedGroupRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .parse::<GroupId>()
            .map_err(|e| DirsyncError::internal_with_source("corrupt linked group id", e))?;
        Ok(Self {
            id,
            display_name: row.display_name,
            remote_id: row.remote_id,
            source: row.source.parse()?,
            state: GroupState::from_deleted_at(row.deleted_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct LinkageRow {
    #[sqlx(flatten)]
    group: LinkedGroupRow,
    has_syncables: bool,
}

/// `GroupRepository` backed by the `linked_groups` table.
#[derive(Debug, Clone)]
pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    /// Create a repository sharing `pool`.
    #[must_use]
    pub fn new(pool: &DbPool) -> Self {
        Self {
            pool: pool.inner().clone(),
        }
    }

    /// Attach a team or channel to a linked group.
    ///
    /// Returns `false` when it was already attached.
    #[instrument(skip(self))]
    pub async fn attach_syncable(
        &self,
        group_id: &GroupId,
        syncable_id: &str,
        kind: SyncableKind,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            INSERT INTO group_syncables (group_id, syncable_id, syncable_kind)
            VALUES ($1, $2, $3)
            ON CONFLICT DO NOTHING
            ",
        )
        .bind(group_id.to_string())
        .bind(syncable_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Detach a team or channel. Returns whether anything was removed.
    #[instrument(skip(self))]
    pub async fn detach_syncable(
        &self,
        group_id: &GroupId,
        syncable_id: &str,
        kind: SyncableKind,
    ) -> Result<bool, DbError> {
        let result = sqlx::query(
            r"
            DELETE FROM group_syncables
            WHERE group_id = $1 AND syncable_id = $2 AND syncable_kind = $3
            ",
        )
        .bind(group_id.to_string())
        .bind(syncable_id)
        .bind(kind.as_str())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List the syncables attached to a group.
    pub async fn list_syncables(&self, group_id: &GroupId) -> Result<Vec<GroupSyncable>, DbError> {
        let rows = sqlx::query_as(
            r"
            SELECT group_id, syncable_id, syncable_kind, created_at
            FROM group_syncables
            WHERE group_id = $1
            ORDER BY syncable_kind, syncable_id
            ",
        )
        .bind(group_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    #[instrument(skip(self))]
    async fn get_by_remote_id(
        &self,
        remote_id: &str,
        source: GroupSource,
    ) -> dirsync_core::Result<Option<InternalGroup>> {
        let row: Option<LinkedGroupRow> = sqlx::query_as(&format!(
            "SELECT {GROUP_COLUMNS} FROM linked_groups WHERE remote_id = $1 AND source = $2"
        ))
        .bind(remote_id)
        .bind(source.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        debug!(found = row.is_some(), "Looked up linked group");
        row.map(InternalGroup::try_from).transpose()
    }

    #[instrument(skip(self, remote_ids), fields(count = remote_ids.len()))]
    async fn list_active_by_remote_ids(
        &self,
        remote_ids: &[String],
        source: GroupSource,
    ) -> dirsync_core::Result<Vec<GroupLinkage>> {
        if remote_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<LinkageRow> = sqlx::query_as(
            r"
            SELECT g.id, g.display_name, g.remote_id, g.source,
                   g.created_at, g.updated_at, g.deleted_at,
                   EXISTS (
                       SELECT 1 FROM group_syncables s WHERE s.group_id = g.id
                   ) AS has_syncables
            FROM linked_groups g
            WHERE g.source = $1
              AND g.deleted_at IS NULL
              AND g.remote_id = ANY($2)
            ",
        )
        .bind(source.as_str())
        .bind(remote_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        rows.into_iter()
            .map(|row| {
                Ok(GroupLinkage {
                    group: InternalGroup::try_from(row.group)?,
                    has_syncables: row.has_syncables,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn list_active(&self, source: GroupSource) -> dirsync_core::Result<Vec<InternalGroup>> {
        let rows: Vec<LinkedGroupRow> = sqlx::query_as(&format!(
            r"
            SELECT {GROUP_COLUMNS} FROM linked_groups
            WHERE source = $1 AND deleted_at IS NULL
            ORDER BY remote_id
            "
        ))
        .bind(source.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(DbError::from)?;

        debug!(count = rows.len(), "Loaded active linked groups");
        rows.into_iter().map(InternalGroup::try_from).collect()
    }

    #[instrument(skip(self, group), fields(remote_id = %group.remote_id))]
    async fn create(&self, group: NewGroup) -> dirsync_core::Result<InternalGroup> {
        let id = GroupId::new();
        let row: LinkedGroupRow = sqlx::query_as(&format!(
            r"
            INSERT INTO linked_groups (id, display_name, remote_id, source)
            VALUES ($1, $2, $3, $4)
            RETURNING {GROUP_COLUMNS}
            "
        ))
        .bind(id.to_string())
        .bind(&group.display_name)
        .bind(&group.remote_id)
        .bind(group.source.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::Conflict(e) => DirsyncError::Conflict {
                resource: "group".to_string(),
                message: format!("remote id '{}' is already materialized", group.remote_id),
                source: Some(Box::new(e)),
            },
            other => other.into(),
        })?;

        info!(group_id = %id, "Linked group created");
        InternalGroup::try_from(row)
    }

    #[instrument(skip(self, group), fields(group_id = %group.id))]
    async fn update(&self, group: &InternalGroup) -> dirsync_core::Result<InternalGroup> {
        let row: Option<LinkedGroupRow> = sqlx::query_as(&format!(
            r"
            UPDATE linked_groups
            SET display_name = $2, remote_id = $3, deleted_at = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {GROUP_COLUMNS}
            "
        ))
        .bind(group.id.to_string())
        .bind(&group.display_name)
        .bind(&group.remote_id)
        .bind(group.state.deleted_at())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let row = row.ok_or_else(|| DirsyncError::not_found("group", group.id.to_string()))?;
        debug!("Linked group updated");
        InternalGroup::try_from(row)
    }

    #[instrument(skip(self))]
    async fn soft_delete(&self, id: &GroupId) -> dirsync_core::Result<InternalGroup> {
        let row: Option<LinkedGroupRow> = sqlx::query_as(&format!(
            r"
            UPDATE linked_groups
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1
            RETURNING {GROUP_COLUMNS}
            "
        ))
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(DbError::from)?;

        let row = row.ok_or_else(|| DirsyncError::not_found("group", id.to_string()))?;
        info!("Linked group soft-deleted");
        InternalGroup::try_from(row)
    }
}
