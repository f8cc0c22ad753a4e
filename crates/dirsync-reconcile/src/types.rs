//! Reconciliation results and the merged listing view.

use dirsync_core::{GroupId, InternalGroup};
use serde::{Deserialize, Serialize};

/// What `link` did to the internal side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkOutcome {
    /// A new internal group was materialized.
    Created,
    /// An active internal group already existed; nothing was written.
    AlreadyLinked,
    /// A tombstoned group was brought back under its original id.
    Restored,
}

impl LinkOutcome {
    /// Status code an HTTP surface should report for this outcome.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Created | Self::Restored => 201,
            Self::AlreadyLinked => 200,
        }
    }

    /// Whether this call changed stored state.
    #[must_use]
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::AlreadyLinked)
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyLinked => "already_linked",
            Self::Restored => "restored",
        }
    }
}

/// Result of a successful link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkResult {
    pub group: InternalGroup,
    pub outcome: LinkOutcome,
}

/// What `unlink` did to the internal side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnlinkOutcome {
    /// The group was active and is now tombstoned.
    Unlinked,
    /// The group was already tombstoned; nothing was written.
    AlreadyUnlinked,
}

/// Summary of a sync pass over the linked groups.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Active linked groups examined.
    pub checked: usize,
    /// Groups whose display name or remote id was rewritten.
    pub updated: usize,
    /// Remote ids the directory no longer knows. They stay linked.
    pub missing_upstream: Vec<String>,
    /// Remote ids left as stored because the directory entry has no display name.
    pub skipped: Vec<String>,
}

/// Optional narrowing of the merged listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupListFilter {
    /// Case-insensitive substring of the display name.
    pub query: Option<String>,
    /// Keep only linked (`true`) or only unlinked (`false`) groups.
    pub is_linked: Option<bool>,
    /// Keep only configured (`true`) or only unconfigured (`false`) groups.
    ///
    /// A group is configured when it is linked and has syncables attached.
    pub is_configured: Option<bool>,
}

impl GroupListFilter {
    /// Filter on a display name substring.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn with_linked(mut self, is_linked: bool) -> Self {
        self.is_linked = Some(is_linked);
        self
    }

    #[must_use]
    pub fn with_configured(mut self, is_configured: bool) -> Self {
        self.is_configured = Some(is_configured);
        self
    }

    /// Blank queries count as no query.
    pub(crate) fn normalized_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    pub(crate) fn matches(&self, view: &MixedGroupView) -> bool {
        if let Some(query) = self.normalized_query() {
            if !view
                .display_name
                .to_lowercase()
                .contains(&query.to_lowercase())
            {
                return false;
            }
        }
        if let Some(linked) = self.is_linked {
            if view.is_linked() != linked {
                return false;
            }
        }
        if let Some(configured) = self.is_configured {
            if view.is_configured() != configured {
                return false;
            }
        }
        true
    }
}

/// An external group annotated with its internal linkage.
///
/// `internal_id` and `has_syncables` are both `None` for an unlinked group,
/// which serializes as `null` rather than a zero value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MixedGroupView {
    pub remote_id: String,
    /// Display name as stored in the directory, untruncated.
    pub display_name: String,
    pub internal_id: Option<GroupId>,
    pub has_syncables: Option<bool>,
}

impl MixedGroupView {
    #[must_use]
    pub fn is_linked(&self) -> bool {
        self.internal_id.is_some()
    }

    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.is_linked() && self.has_syncables == Some(true)
    }
}

/// One page of the merged listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergedGroupPage {
    /// Number of groups matching the filter across all pages.
    pub total: usize,
    pub groups: Vec<MixedGroupView>,
}

/// Truncate a display name to at most `max` characters.
#[must_use]
pub fn truncate_display_name(name: &str, max: usize) -> String {
    name.chars().take(max).collect()
}
