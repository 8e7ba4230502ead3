//! Code-level adapter configuration.
//!
//! # Invariants
//! - A validated table name is a plain SQL identifier and is safe to
//!   interpolate into DDL/DML text.

use crate::error::ConfigError;
use once_cell::sync::Lazy;
use regex::Regex;

/// Table used when the caller does not pick one.
pub const DEFAULT_TABLE_NAME: &str = "casbin_rule";

static TABLE_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,62}$").expect("valid table name regex"));

/// Settings an adapter is bound to for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    pub table_name: String,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
        }
    }
}

impl AdapterConfig {
    pub fn with_table_name(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }

    /// Checks the configuration and returns the normalized table name.
    pub fn validate(&self) -> Result<&str, ConfigError> {
        validate_table_name(&self.table_name)
    }
}

/// Accepts `[A-Za-z_][A-Za-z0-9_]*` up to 63 characters, after trimming.
pub fn validate_table_name(name: &str) -> Result<&str, ConfigError> {
    let trimmed = name.trim();
    if TABLE_NAME_RE.is_match(trimmed) {
        Ok(trimmed)
    } else {
        Err(ConfigError::InvalidTableName(name.to_string()))
    }
}
