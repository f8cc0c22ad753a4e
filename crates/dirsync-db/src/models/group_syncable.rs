//! Teams and channels attached to a linked group.
//!
//! A linked group with at least one attached syncable is "configured".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// What kind of object a syncable is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncableKind {
    Team,
    Channel,
}

impl SyncableKind {
    /// Convert from database string representation.
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "team" => Some(Self::Team),
            "channel" => Some(Self::Channel),
            _ => None,
        }
    }

    /// Convert to database string representation.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Channel => "channel",
        }
    }
}

impl Display for SyncableKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SyncableKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_db(s).ok_or_else(|| format!("unknown syncable kind '{s}'"))
    }
}

/// A `group_syncables` row.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GroupSyncable {
    pub group_id: String,
    pub syncable_id: String,
    pub syncable_kind: String,
    pub created_at: DateTime<Utc>,
}

impl GroupSyncable {
    /// Get the typed kind.
    pub fn kind(&self) -> Option<SyncableKind> {
        SyncableKind::from_db(&self.syncable_kind)
    }
}
