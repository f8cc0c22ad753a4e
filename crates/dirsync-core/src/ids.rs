//! Strongly Typed Identifiers
//!
//! Internal groups are keyed by a fixed-width surrogate identifier. The
//! width itself carries meaning: a candidate whose internal id has exactly
//! [`GroupId::WIDTH`] characters is materialized internally, anything else is
//! an external-only reference.
//!
//! # Example
//!
//! ```
//! use dirsync_core::GroupId;
//!
//! let id = GroupId::new();
//! let parsed: GroupId = id.to_string().parse().unwrap();
//! assert_eq!(id, parsed);
//!
//! assert!(GroupId::from_materialized("").is_none());
//! ```

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use ulid::Ulid;

/// Error type for ID parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The type of ID that failed to parse
    pub id_type: &'static str,
    /// The underlying parse error message
    pub message: String,
}

impl Display for ParseIdError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Failed to parse {}: {}", self.id_type, self.message)
    }
}

impl std::error::Error for ParseIdError {}

/// Surrogate identifier of an internal group.
///
/// Backed by a ULID, rendered as 26 Crockford base32 characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(Ulid);

impl GroupId {
    /// Width of the rendered identifier.
    pub const WIDTH: usize = 26;

    /// Creates a new identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }

    /// Creates an ID from an existing ULID.
    #[must_use]
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    /// Returns a reference to the underlying ULID.
    #[must_use]
    pub fn as_ulid(&self) -> &Ulid {
        &self.0
    }

    /// Interprets a raw internal id column.
    ///
    /// Returns `None` unless `raw` has the surrogate width and parses.
    #[must_use]
    pub fn from_materialized(raw: &str) -> Option<Self> {
        if raw.len() != Self::WIDTH {
            return None;
        }
        raw.parse().ok()
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GroupId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GroupId {
    type Err = ParseIdError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self).map_err(|e| ParseIdError {
            id_type: "GroupId",
            message: e.to_string(),
        })
    }
}
