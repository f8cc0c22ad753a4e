//! Reconciler configuration.

use std::env::VarError;
use std::time::Duration;

use dirsync_core::config::{parse_or, ConfigError, EnvReader};
use dirsync_core::GROUP_DISPLAY_NAME_MAX_LENGTH;

/// Default number of records requested per directory page.
pub const DEFAULT_DIRECTORY_PAGE_SIZE: u32 = 1000;

/// Default upper bound for a caller-requested page size.
pub const DEFAULT_MAX_PER_PAGE: u32 = 1000;

/// Default deadline for a single reconciler operation, in seconds.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Tunables for [`GroupReconciler`](crate::GroupReconciler).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerConfig {
    /// Stored display names are truncated to this many characters.
    pub max_display_name_length: usize,
    /// Page size used when pulling groups from the directory.
    pub directory_page_size: u32,
    /// Largest `per_page` a caller may request from the merged listing.
    pub max_per_page: u32,
    /// Deadline applied to each link, unlink, listing or directory test.
    pub operation_timeout: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_display_name_length: GROUP_DISPLAY_NAME_MAX_LENGTH,
            directory_page_size: DEFAULT_DIRECTORY_PAGE_SIZE,
            max_per_page: DEFAULT_MAX_PER_PAGE,
            operation_timeout: Duration::from_secs(DEFAULT_OPERATION_TIMEOUT_SECS),
        }
    }
}

impl ReconcilerConfig {
    /// Load from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_reader(|key: &str| std::env::var(key))
    }

    /// Load from a custom variable reader.
    ///
    /// # Environment Variables
    ///
    /// - `GROUP_DISPLAY_NAME_MAX_LENGTH` (default 128, at most 128)
    /// - `DIRECTORY_PAGE_SIZE` (default 1000)
    /// - `GROUP_LIST_MAX_PER_PAGE` (default 1000)
    /// - `RECONCILE_TIMEOUT_SECS` (default 30)
    pub fn from_reader<F>(reader: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Result<String, VarError>,
    {
        Self::load(&reader)
    }

    fn load<R: EnvReader>(reader: &R) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let config = Self {
            max_display_name_length: parse_or(
                reader,
                "GROUP_DISPLAY_NAME_MAX_LENGTH",
                defaults.max_display_name_length,
            )?,
            directory_page_size: parse_or(
                reader,
                "DIRECTORY_PAGE_SIZE",
                defaults.directory_page_size,
            )?,
            max_per_page: parse_or(reader, "GROUP_LIST_MAX_PER_PAGE", defaults.max_per_page)?,
            operation_timeout: Duration::from_secs(parse_or(
                reader,
                "RECONCILE_TIMEOUT_SECS",
                DEFAULT_OPERATION_TIMEOUT_SECS,
            )?),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every tunable is in range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_display_name_length == 0
            || self.max_display_name_length > GROUP_DISPLAY_NAME_MAX_LENGTH
        {
            return Err(ConfigError::InvalidValue(
                "GROUP_DISPLAY_NAME_MAX_LENGTH".to_string(),
                format!("must be between 1 and {GROUP_DISPLAY_NAME_MAX_LENGTH}"),
            ));
        }
        if self.directory_page_size == 0 {
            return Err(ConfigError::InvalidValue(
                "DIRECTORY_PAGE_SIZE".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if self.max_per_page == 0 {
            return Err(ConfigError::InvalidValue(
                "GROUP_LIST_MAX_PER_PAGE".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        if self.operation_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "RECONCILE_TIMEOUT_SECS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
