//! Error Types
//!
//! Every fallible operation in dirsync surfaces a [`DirsyncError`]. The
//! boundary layer maps [`ErrorKind`] to whatever transport status it needs;
//! this crate only classifies.
//!
//! # Example
//!
//! ```
//! use dirsync_core::{DirsyncError, ErrorKind};
//!
//! let err = DirsyncError::invalid_input("remote_id", "must not be empty");
//! assert_eq!(err.kind(), ErrorKind::InvalidInput);
//! assert_eq!(
//!     err.to_string(),
//!     "Validation error on field 'remote_id': must not be empty"
//! );
//! ```

use std::fmt::{Display, Formatter};
use thiserror::Error;

/// Boxed cause kept for diagnostics.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse error classification consumed by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Lookup target absent.
    NotFound,
    /// Uniqueness or constraint violation.
    Conflict,
    /// Backing store or external directory unreachable or timed out.
    Unavailable,
    /// Malformed identifier, oversized or empty required field.
    InvalidInput,
    /// Serialization or unexpected storage failure.
    Internal,
}

impl ErrorKind {
    /// Stable snake_case name, used in structured logs.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Unavailable => "unavailable",
            Self::InvalidInput => "invalid_input",
            Self::Internal => "internal",
        }
    }
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Standardized error type for dirsync.
#[derive(Debug, Error)]
pub enum DirsyncError {
    /// Requested resource was not found.
    #[error("{resource} not found: {id}")]
    NotFound {
        /// The type of resource (e.g. "group", "system")
        resource: String,
        /// Identifier that was looked up
        id: String,
    },

    /// A uniqueness or constraint violation.
    #[error("Conflict on {resource}: {message}")]
    Conflict {
        resource: String,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Backing store or directory could not be reached in time.
    #[error("Service unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Input validation failure.
    #[error("Validation error on field '{field}': {message}")]
    InvalidInput {
        /// The field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Anything the caller cannot act on.
    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<BoxError>,
    },
}

impl DirsyncError {
    /// Create a not found error.
    pub fn not_found(resource: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    /// Create a conflict error without an underlying cause.
    pub fn conflict(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conflict {
            resource: resource.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailable error without an underlying cause.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: None,
        }
    }

    /// Create an unavailable error wrapping its cause.
    pub fn unavailable_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Unavailable {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a validation error.
    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create an internal error without an underlying cause.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Create an internal error wrapping its cause.
    pub fn internal_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::Internal { .. } => ErrorKind::Internal,
        }
    }

    /// Check if this error indicates a missing lookup target.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error indicates a constraint violation.
    #[must_use]
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }
}

/// Type alias for Results using `DirsyncError`.
pub type Result<T> = std::result::Result<T, DirsyncError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[derive(Debug, Error)]
    #[error("socket closed")]
    struct SocketClosed;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            DirsyncError::not_found("group", "ext-1").kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            DirsyncError::conflict("system", "duplicate name").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            DirsyncError::unavailable("pool timed out").kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            DirsyncError::invalid_input("name", "too long").kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(DirsyncError::internal("boom").kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_not_found_display() {
        let err = DirsyncError::not_found("group", "ext-1");
        assert_eq!(err.to_string(), "group not found: ext-1");
        assert!(err.is_not_found());
        assert!(!err.is_conflict());
    }

    #[test]
    fn test_source_is_preserved() {
        let err = DirsyncError::unavailable_with_source("directory unreachable", SocketClosed);
        let source = err.source().expect("source should be kept");
        assert_eq!(source.to_string(), "socket closed");

        let err = DirsyncError::internal_with_source("decode failed", SocketClosed);
        assert!(err.source().is_some());
        assert!(DirsyncError::internal("plain").source().is_none());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(ErrorKind::NotFound.to_string(), "not_found");
        assert_eq!(ErrorKind::InvalidInput.as_str(), "invalid_input");
    }

    fn propagating() -> Result<()> {
        Err::<(), _>(DirsyncError::conflict("group", "remote id taken"))?;
        Ok(())
    }

    #[test]
    fn test_question_mark_propagation() {
        assert!(propagating().unwrap_err().is_conflict());
    }
}
