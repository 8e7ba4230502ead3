//! SQLite persistence adapter for access-control policy rules.
//! Translates between an in-memory policy model and rows of a rule table.

pub mod adapter;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod persist;
pub mod repo;

pub use adapter::{Adapter, AdapterBuilder, SqliteAdapter};
pub use config::{AdapterConfig, DEFAULT_TABLE_NAME};
pub use error::{AdapterError, AdapterResult, ConfigError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::policy::PolicyModel;
pub use model::rule::{CasbinRule, MAX_RULE_FIELDS};
pub use persist::{format_policy_line, load_policy_line, split_policy_line};
pub use repo::rule_repo::{RuleFilter, RuleRepository, SqliteRuleRepository};

/// Returns the adapter crate version.
pub fn adapter_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
