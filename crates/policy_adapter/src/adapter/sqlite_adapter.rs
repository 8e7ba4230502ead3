//! SQLite implementation of the adapter capability set.
//!
//! # Responsibility
//! - Bind one validated table name to a caller-owned connection.
//! - Translate model rules to rows and rows back to policy lines.
//! - Emit `policy_*` logging events with duration and status.
//!
//! # Invariants
//! - Opening never clears or duplicates existing rows.
//! - `save_policy` replaces table content inside a single transaction; a
//!   failure leaves the previous rows untouched.
//! - Loads see rows in insertion order.

use super::Adapter;
use crate::config::AdapterConfig;
use crate::error::{AdapterError, AdapterResult, ConfigError};
use crate::model::policy::{PolicyModel, POLICY_SECTIONS};
use crate::model::rule::{CasbinRule, MAX_RULE_FIELDS};
use crate::persist::load_policy_line;
use crate::repo::rule_repo::{RuleFilter, RuleRepository, SqliteRuleRepository};
use log::{debug, error, info, log, warn, Level};
use rusqlite::Connection;
use std::time::Instant;

/// Policy adapter over a borrowed SQLite connection.
pub struct SqliteAdapter<'conn> {
    conn: &'conn Connection,
    table_name: String,
}

/// Collects the connection handle and configuration for `SqliteAdapter`.
#[derive(Default)]
pub struct AdapterBuilder<'conn> {
    conn: Option<&'conn Connection>,
    config: AdapterConfig,
}

impl<'conn> AdapterBuilder<'conn> {
    pub fn connection(mut self, conn: &'conn Connection) -> Self {
        self.conn = Some(conn);
        self
    }

    pub fn table_name(mut self, table_name: impl Into<String>) -> Self {
        self.config.table_name = table_name.into();
        self
    }

    pub fn config(mut self, config: AdapterConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates the configuration and creates the rule table if absent.
    ///
    /// # Errors
    /// - `ConfigError::MissingConnection` when no connection was supplied.
    /// - `ConfigError::InvalidTableName` for a non-identifier table name.
    /// - `ConfigError::MissingRequiredColumn` when an existing table lacks a
    ///   rule column.
    /// - `AdapterError::Storage` when table creation or inspection fails, for
    ///   example on a read-only handle whose database lacks the table.
    pub fn build(self) -> AdapterResult<SqliteAdapter<'conn>> {
        let started_at = Instant::now();
        info!("event=adapter_open module=adapter status=start");

        match open_adapter(self.conn, &self.config) {
            Ok(adapter) => {
                info!(
                    "event=adapter_open module=adapter status=ok table={} duration_ms={}",
                    adapter.table_name,
                    started_at.elapsed().as_millis()
                );
                Ok(adapter)
            }
            Err(err) => {
                error!(
                    "event=adapter_open module=adapter status=error duration_ms={} error_code={} error={}",
                    started_at.elapsed().as_millis(),
                    open_error_code(&err),
                    err
                );
                Err(err)
            }
        }
    }
}

fn open_adapter<'conn>(
    conn: Option<&'conn Connection>,
    config: &AdapterConfig,
) -> AdapterResult<SqliteAdapter<'conn>> {
    let conn = conn.ok_or(ConfigError::MissingConnection)?;
    let table_name = config.validate()?.to_string();

    let repo = SqliteRuleRepository::new(conn, &table_name);
    let existed = repo.table_exists()?;
    repo.ensure_table()?;
    debug!(
        "event=rule_table_ready module=adapter table={} created={}",
        table_name, !existed
    );
    if let Some(column) = repo.missing_column()? {
        return Err(ConfigError::MissingRequiredColumn {
            table: table_name,
            column,
        }
        .into());
    }

    Ok(SqliteAdapter { conn, table_name })
}

fn open_error_code(err: &AdapterError) -> &'static str {
    match err {
        AdapterError::Config(ConfigError::MissingConnection) => "missing_connection",
        AdapterError::Config(ConfigError::InvalidTableName(_)) => "invalid_table_name",
        AdapterError::Config(ConfigError::MissingRequiredColumn { .. }) => "schema_mismatch",
        AdapterError::Storage(_) => "db_bootstrap_failed",
    }
}

impl<'conn> SqliteAdapter<'conn> {
    pub fn builder() -> AdapterBuilder<'conn> {
        AdapterBuilder::default()
    }

    /// Opens an adapter on the default `casbin_rule` table.
    pub fn open(conn: &'conn Connection) -> AdapterResult<Self> {
        Self::builder().connection(conn).build()
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Number of rows currently stored.
    pub fn rule_count(&self) -> AdapterResult<u64> {
        Ok(self.repo().count_rules()?)
    }

    fn repo(&self) -> SqliteRuleRepository<'_> {
        SqliteRuleRepository::new(self.conn, &self.table_name)
    }

    fn load_rows(
        &self,
        model: &mut PolicyModel,
        filter: Option<&RuleFilter>,
    ) -> AdapterResult<()> {
        let rows = self.repo().list_rules(filter)?;
        let loaded = rows
            .iter()
            .filter(|row| load_policy_line(&row.to_policy_line(), model))
            .count();
        debug!(
            "event=policy_rows_read module=adapter table={} rows={} loaded={}",
            self.table_name,
            rows.len(),
            loaded
        );
        Ok(())
    }

    fn replace_rows(&self, model: &PolicyModel) -> AdapterResult<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let repo = SqliteRuleRepository::new(&tx, &self.table_name);
        repo.drop_table()?;
        repo.ensure_table()?;

        let mut written = 0;
        for sec in POLICY_SECTIONS {
            for (ptype, rules) in model.rule_types(sec) {
                for rule in rules {
                    log_truncation(ptype, rule);
                    repo.insert_rule(&CasbinRule::from_rule(ptype, rule))?;
                    written += 1;
                }
            }
        }

        tx.commit()?;
        Ok(written)
    }

    fn delete_matching(&self, filter: &RuleFilter) -> AdapterResult<()> {
        let removed = self.repo().delete_rules(filter)?;
        debug!(
            "event=policy_rows_deleted module=adapter table={} ptype={} constrained_fields={} rows={}",
            self.table_name,
            filter.ptype(),
            filter.constrained_fields(),
            removed
        );
        Ok(())
    }

    fn finish<T>(
        &self,
        event: &'static str,
        level: Level,
        started_at: Instant,
        result: AdapterResult<T>,
    ) -> AdapterResult<T> {
        match &result {
            Ok(_) => log!(
                level,
                "event={} module=adapter status=ok table={} duration_ms={}",
                event,
                self.table_name,
                started_at.elapsed().as_millis()
            ),
            Err(err) => error!(
                "event={} module=adapter status=error table={} duration_ms={} error={}",
                event,
                self.table_name,
                started_at.elapsed().as_millis(),
                err
            ),
        }
        result
    }
}

impl Adapter for SqliteAdapter<'_> {
    fn load_policy(&self, model: &mut PolicyModel) -> AdapterResult<()> {
        let started_at = Instant::now();
        let result = self.load_rows(model, None);
        self.finish("policy_load", Level::Info, started_at, result)
    }

    fn load_filtered_policy(
        &self,
        model: &mut PolicyModel,
        filter: &RuleFilter,
    ) -> AdapterResult<()> {
        let started_at = Instant::now();
        let result = self.load_rows(model, Some(filter));
        self.finish("policy_load_filtered", Level::Info, started_at, result)
    }

    fn save_policy(&self, model: &PolicyModel) -> AdapterResult<()> {
        let started_at = Instant::now();
        let result = self.replace_rows(model).map(|written| {
            debug!(
                "event=policy_rows_written module=adapter table={} rows={}",
                self.table_name, written
            );
        });
        self.finish("policy_save", Level::Info, started_at, result)
    }

    fn add_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> AdapterResult<()> {
        let started_at = Instant::now();
        debug!(
            "event=policy_add module=adapter status=start section={} ptype={} fields={}",
            sec,
            ptype,
            rule.len()
        );
        log_truncation(ptype, rule);
        let result = self
            .repo()
            .insert_rule(&CasbinRule::from_rule(ptype, rule))
            .map_err(AdapterError::from);
        self.finish("policy_add", Level::Debug, started_at, result)
    }

    fn remove_policy(&self, sec: &str, ptype: &str, rule: &[String]) -> AdapterResult<()> {
        let started_at = Instant::now();
        debug!(
            "event=policy_remove module=adapter status=start section={} ptype={}",
            sec, ptype
        );
        let result = self.delete_matching(&RuleFilter::from_rule(ptype, rule));
        self.finish("policy_remove", Level::Debug, started_at, result)
    }

    fn remove_filtered_policy(
        &self,
        sec: &str,
        ptype: &str,
        field_index: usize,
        field_values: &[String],
    ) -> AdapterResult<()> {
        let started_at = Instant::now();
        debug!(
            "event=policy_remove_filtered module=adapter status=start section={} ptype={} field_index={} values={}",
            sec,
            ptype,
            field_index,
            field_values.len()
        );
        if field_index >= MAX_RULE_FIELDS {
            warn!(
                "event=policy_remove_filtered module=adapter status=unconstrained ptype={} field_index={} max_fields={}",
                ptype, field_index, MAX_RULE_FIELDS
            );
        }
        let filter = RuleFilter::from_field_values(ptype, field_index, field_values);
        let result = self.delete_matching(&filter);
        self.finish("policy_remove_filtered", Level::Debug, started_at, result)
    }
}

fn log_truncation(ptype: &str, rule: &[String]) {
    if rule.len() > MAX_RULE_FIELDS {
        debug!(
            "event=policy_rule_truncated module=adapter ptype={} fields={} max_fields={}",
            ptype,
            rule.len(),
            MAX_RULE_FIELDS
        );
    }
}
