//! Environment configuration helpers.
//!
//! Every config struct in the workspace exposes `from_env()` and a
//! `from_reader(reader)` twin so tests can supply variables without mutating
//! process-global state.

use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;

/// Source of configuration variables.
pub trait EnvReader: Fn(&str) -> Result<String, VarError> {}

impl<F> EnvReader for F where F: Fn(&str) -> Result<String, VarError> {}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(String),

    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Read a required variable.
pub fn required<R: EnvReader>(reader: &R, key: &str) -> Result<String, ConfigError> {
    match reader(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(key.to_string())),
    }
}

/// Read an optional variable, `None` when unset or blank.
pub fn optional<R: EnvReader>(reader: &R, key: &str) -> Option<String> {
    reader(key).ok().filter(|v| !v.trim().is_empty())
}

/// Read and parse a variable, falling back to `default` when unset.
pub fn parse_or<R, T>(reader: &R, key: &str, default: T) -> Result<T, ConfigError>
where
    R: EnvReader,
    T: FromStr,
    T::Err: Display,
{
    match optional(reader, key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}
