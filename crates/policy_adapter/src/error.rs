//! Adapter error taxonomy.
//!
//! # Responsibility
//! - Separate construction-time misconfiguration from storage failures.
//! - Surface database client errors verbatim.
//!
//! # Invariants
//! - `AdapterError::Storage` displays exactly the wrapped rusqlite message.
//! - No variant carries rule parameter values.

use std::error::Error;
use std::fmt::{Display, Formatter};

pub type AdapterResult<T> = Result<T, AdapterError>;

/// Top-level error returned by every adapter operation.
#[derive(Debug)]
pub enum AdapterError {
    /// Adapter could not be constructed from the supplied handle/config.
    Config(ConfigError),
    /// Create, drop, read, insert, delete or commit failed.
    Storage(rusqlite::Error),
}

/// Misconfiguration detected while opening an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingConnection,
    InvalidTableName(String),
    MissingRequiredColumn { table: String, column: &'static str },
}

impl Display for AdapterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(err) => write!(f, "{err}"),
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AdapterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Storage(err) => Some(err),
        }
    }
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingConnection => write!(f, "database connection is not initialized"),
            Self::InvalidTableName(name) => write!(
                f,
                "invalid table name `{name}`; expected an SQL identifier of at most 63 characters"
            ),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "table `{table}` is missing required column `{column}`")
            }
        }
    }
}

impl Error for ConfigError {}

impl From<ConfigError> for AdapterError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<rusqlite::Error> for AdapterError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value)
    }
}
