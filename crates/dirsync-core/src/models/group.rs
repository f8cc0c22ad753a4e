//! Linked group domain model.
//!
//! An [`InternalGroup`] is the internal materialization of a group that lives
//! in an external directory. It is created on the first link, tombstoned on
//! unlink and brought back on a later link; it is never hard-deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use crate::error::{DirsyncError, Result};
use crate::ids::GroupId;

/// Upper bound for a stored display name (column width).
pub const GROUP_DISPLAY_NAME_MAX_LENGTH: usize = 128;

/// Upper bound for a remote identifier (column width).
pub const REMOTE_ID_MAX_LENGTH: usize = 48;

/// Provenance of an internal group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GroupSource {
    /// Mirrored from the external directory.
    #[serde(rename = "external-directory")]
    ExternalDirectory,
}

impl GroupSource {
    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExternalDirectory => "external-directory",
        }
    }
}

impl Display for GroupSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GroupSource {
    type Err = DirsyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "external-directory" => Ok(Self::ExternalDirectory),
            other => Err(DirsyncError::invalid_input(
                "source",
                format!("unknown group source '{other}'"),
            )),
        }
    }
}

/// Link state of an internal group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GroupState {
    /// Linked.
    Active,
    /// Unlinked; the row is kept as a tombstone.
    Deleted { at: DateTime<Utc> },
}

impl GroupState {
    /// Build from a nullable deletion timestamp column.
    #[must_use]
    pub fn from_deleted_at(deleted_at: Option<DateTime<Utc>>) -> Self {
        match deleted_at {
            Some(at) => Self::Deleted { at },
            None => Self::Active,
        }
    }

    /// Deletion timestamp column value.
    #[must_use]
    pub fn deleted_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Active => None,
            Self::Deleted { at } => Some(*at),
        }
    }
}

/// A group materialized internally from the external directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternalGroup {
    /// Surrogate identifier, immutable once assigned.
    pub id: GroupId,
    /// Display name, already truncated to the configured maximum.
    pub display_name: String,
    /// Identifier of the group in the external directory.
    pub remote_id: String,
    /// Provenance tag.
    pub source: GroupSource,
    /// Linked or tombstoned.
    #[serde(flatten)]
    pub state: GroupState,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last written.
    pub updated_at: DateTime<Utc>,
}

impl InternalGroup {
    /// Whether the group is currently linked.
    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.state, GroupState::Active)
    }

    /// Bring a tombstoned group back with refreshed external attributes.
    ///
    /// The surrogate id is left untouched.
    pub fn restore(&mut self, display_name: String, remote_id: String) {
        self.state = GroupState::Active;
        self.display_name = display_name;
        self.remote_id = remote_id;
    }

    /// Apply the directory's current attributes to a linked group.
    ///
    /// Returns whether anything changed.
    pub fn refresh(&mut self, display_name: String, remote_id: String) -> bool {
        if self.display_name == display_name && self.remote_id == remote_id {
            return false;
        }
        self.display_name = display_name;
        self.remote_id = remote_id;
        true
    }
}

/// Data needed to create a new internal group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub display_name: String,
    pub remote_id: String,
    pub source: GroupSource,
}

/// An active internal group together with its sync configuration flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupLinkage {
    pub group: InternalGroup,
    /// Whether at least one team or channel is attached.
    pub has_syncables: bool,
}

/// Check a remote identifier before it reaches storage.
pub fn validate_remote_id(remote_id: &str) -> Result<()> {
    if remote_id.trim().is_empty() {
        return Err(DirsyncError::invalid_input("remote_id", "must not be empty"));
    }
    if remote_id.chars().count() > REMOTE_ID_MAX_LENGTH {
        return Err(DirsyncError::invalid_input(
            "remote_id",
            format!("must be at most {REMOTE_ID_MAX_LENGTH} characters"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn sample(state: GroupState) -> InternalGroup {
        let now = Utc::now();
        InternalGroup {
            id: GroupId::new(),
            display_name: "Engineering".to_string(),
            remote_id: "ext-1".to_string(),
            source: GroupSource::ExternalDirectory,
            state,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_source_db_representation() {
        assert_eq!(GroupSource::ExternalDirectory.as_str(), "external-directory");
        assert_eq!(
            "external-directory".parse::<GroupSource>().unwrap(),
            GroupSource::ExternalDirectory
        );
        let err = "ldap".parse::<GroupSource>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_state_from_deleted_at() {
        assert_eq!(GroupState::from_deleted_at(None), GroupState::Active);
        let at = Utc::now();
        let state = GroupState::from_deleted_at(Some(at));
        assert_eq!(state, GroupState::Deleted { at });
        assert_eq!(state.deleted_at(), Some(at));
        assert_eq!(GroupState::Active.deleted_at(), None);
    }

    #[test]
    fn test_restore_keeps_id() {
        let mut group = sample(GroupState::Deleted { at: Utc::now() });
        let id = group.id;
        assert!(!group.is_active());

        group.restore("Platform".to_string(), "ext-1b".to_string());

        assert!(group.is_active());
        assert_eq!(group.id, id);
        assert_eq!(group.display_name, "Platform");
        assert_eq!(group.remote_id, "ext-1b");
    }

    #[test]
    fn test_refresh_reports_changes() {
        let mut group = sample(GroupState::Active);
        assert!(!group.refresh("Engineering".to_string(), "ext-1".to_string()));
        assert!(group.refresh("Platform".to_string(), "ext-1".to_string()));
        assert_eq!(group.display_name, "Platform");
        assert!(group.refresh("Platform".to_string(), "EXT-1".to_string()));
        assert_eq!(group.remote_id, "EXT-1");
        assert!(group.is_active());
    }

    #[test]
    fn test_validate_remote_id() {
        assert!(validate_remote_id("ext-1").is_ok());
        assert!(validate_remote_id(&"a".repeat(REMOTE_ID_MAX_LENGTH)).is_ok());

        let err = validate_remote_id("  ").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = validate_remote_id(&"a".repeat(REMOTE_ID_MAX_LENGTH + 1)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_serialized_state_is_flattened() {
        let group = sample(GroupState::Active);
        let json = serde_json::to_value(&group).unwrap();
        assert_eq!(json["state"], "active");
        assert_eq!(json["source"], "external-directory");
    }
}
