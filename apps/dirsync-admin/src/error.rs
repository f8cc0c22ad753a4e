//! CLI error types and exit codes

use dirsync_connector::ConnectorError;
use dirsync_core::{ConfigError, DirsyncError, ErrorKind};
use dirsync_db::bootstrap::BootstrapError;
use dirsync_db::DbError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 3: Database or directory unreachable
/// - 4: Validation error, missing or conflicting object
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unavailable: {0}\n\nTroubleshooting:\n  - Check DATABASE_URL and LDAP_HOST\n  - Run `dirsync-admin directory test`")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Output error: {0}")]
    Output(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Unavailable(_) => 3,
            CliError::NotFound(_) | CliError::Conflict(_) | CliError::Validation(_) => 4,
            CliError::Config(_) | CliError::Internal(_) | CliError::Output(_) => 1,
        }
    }

    /// Print the error to stderr
    pub fn print(&self) {
        eprintln!("Error: {self}");
    }
}

impl From<DirsyncError> for CliError {
    fn from(err: DirsyncError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::NotFound => CliError::NotFound(message),
            ErrorKind::Conflict => CliError::Conflict(message),
            ErrorKind::InvalidInput => CliError::Validation(message),
            ErrorKind::Unavailable => CliError::Unavailable(message),
            ErrorKind::Internal => CliError::Internal(message),
        }
    }
}

impl From<DbError> for CliError {
    fn from(err: DbError) -> Self {
        DirsyncError::from(err).into()
    }
}

impl From<ConnectorError> for CliError {
    fn from(err: ConnectorError) -> Self {
        DirsyncError::from(err).into()
    }
}

impl From<BootstrapError> for CliError {
    fn from(err: BootstrapError) -> Self {
        match err {
            BootstrapError::Database(e) => e.into(),
            other => CliError::Internal(other.to_string()),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::Output(err.to_string())
    }
}
