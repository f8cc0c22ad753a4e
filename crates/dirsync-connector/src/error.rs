//! Errors raised by directory sources.

use dirsync_core::DirsyncError;
use thiserror::Error;

type Cause = Box<dyn std::error::Error + Send + Sync>;

/// Failure talking to the external directory.
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// The directory could not be reached or refused the session.
    #[error("directory unreachable: {message}")]
    ConnectionFailed {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// No answer within the configured deadline.
    #[error("directory did not answer within {timeout_secs}s")]
    ConnectionTimeout { timeout_secs: u64 },

    /// Bind credentials were rejected.
    #[error("directory rejected the bind credentials")]
    AuthenticationFailed,

    #[error("directory settings are invalid: {message}")]
    InvalidConfiguration { message: String },

    /// The directory answered a request with an error.
    #[error("directory request failed: {message}")]
    OperationFailed {
        message: String,
        #[source]
        source: Option<Cause>,
    },

    /// An entry could not be read as a group record.
    #[error("unusable directory entry: {message}")]
    InvalidData { message: String },
}

impl ConnectorError {
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn connection_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::ConnectionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::OperationFailed {
            message: message.into(),
            source: None,
        }
    }

    pub fn operation_failed_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::OperationFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /// Whether the same call may succeed once the directory recovers.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed { .. } | Self::ConnectionTimeout { .. }
        )
    }

    #[must_use]
    pub fn is_permanent(&self) -> bool {
        !self.is_transient()
    }

    /// Stable code for logs.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::ConnectionFailed { .. } => "DIRECTORY_UNREACHABLE",
            Self::ConnectionTimeout { .. } => "DIRECTORY_TIMEOUT",
            Self::AuthenticationFailed => "DIRECTORY_AUTH_REJECTED",
            Self::InvalidConfiguration { .. } => "DIRECTORY_CONFIG_INVALID",
            Self::OperationFailed { .. } => "DIRECTORY_REQUEST_FAILED",
            Self::InvalidData { .. } => "DIRECTORY_ENTRY_INVALID",
        }
    }
}

impl From<ConnectorError> for DirsyncError {
    fn from(err: ConnectorError) -> Self {
        match err {
            e @ (ConnectorError::ConnectionFailed { .. }
            | ConnectorError::ConnectionTimeout { .. }
            | ConnectorError::AuthenticationFailed) => {
                DirsyncError::unavailable_with_source("external directory unavailable", e)
            }
            ConnectorError::InvalidConfiguration { message } => {
                DirsyncError::invalid_input("directory", message)
            }
            e @ (ConnectorError::OperationFailed { .. } | ConnectorError::InvalidData { .. }) => {
                DirsyncError::internal_with_source("external directory request failed", e)
            }
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
