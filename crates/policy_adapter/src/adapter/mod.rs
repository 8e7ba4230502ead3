//! Adapter capability set exposed to the policy engine.
//!
//! # Responsibility
//! - Define the operations an engine calls to persist its policy.
//! - Keep callers independent of the backing database.
//!
//! # Invariants
//! - The `sec` argument never selects a table; one table holds all sections.
//! - Errors from the database are surfaced unchanged.

mod sqlite_adapter;

pub use sqlite_adapter::{AdapterBuilder, SqliteAdapter};

use crate::error::AdapterResult;
use crate::model::policy::PolicyModel;
use crate::repo::rule_repo::RuleFilter;

/// Storage operations the policy engine drives.
pub trait Adapter {
    /// Appends every stored rule to `model`.
    fn load_policy(&self, model: &mut PolicyModel) -> AdapterResult<()>;

    /// Appends only the stored rules matched by `filter` to `model`.
    fn load_filtered_policy(
        &self,
        model: &mut PolicyModel,
        filter: &RuleFilter,
    ) -> AdapterResult<()>;

    /// Replaces the stored rules with every `p` and `g` section rule of `model`.
    fn save_policy(&self, model: &PolicyModel) -> AdapterResult<()>;

    /// Stores one rule. Parameters beyond the sixth are dropped.
    fn add_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> AdapterResult<()>;

    /// Deletes rows whose non-empty parameters equal `rule` position by position.
    fn remove_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> AdapterResult<()>;

    /// Deletes rows matching `field_values` starting at column `v{field_index}`.
    fn remove_filtered_policy(
        &self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> AdapterResult<()>;
}
