//! Rule repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Insert, list and delete rule rows of one table.
//! - Translate `RuleFilter` constraints into parameterized `WHERE` clauses.
//!
//! # Invariants
//! - `ptype` is always constrained; `v0..v5` only when the filter sets them.
//! - An empty filter value never becomes a constraint.
//! - Listing returns rows in insertion (`rowid`) order.

use crate::model::rule::{CasbinRule, MAX_RULE_FIELDS};
use crate::repo::schema;
use rusqlite::{params, params_from_iter, Connection, Row};

const RULE_SELECT_SQL: &str = "SELECT ptype, v0, v1, v2, v3, v4, v5";
const FIELD_COLUMNS: [&str; MAX_RULE_FIELDS] = ["v0", "v1", "v2", "v3", "v4", "v5"];

/// Row constraints shared by filtered loads and removals.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleFilter {
    ptype: String,
    fields: [Option<String>; MAX_RULE_FIELDS],
}

impl RuleFilter {
    /// Matches every row of `ptype`.
    pub fn for_ptype(ptype: impl Into<String>) -> Self {
        Self {
            ptype: ptype.into(),
            fields: Default::default(),
        }
    }

    /// Constrains each position to the matching rule parameter.
    ///
    /// Empty parameters leave their position unconstrained, so
    /// `["alice", "", "read"]` matches any `v1`.
    pub fn from_rule(ptype: impl Into<String>, rule: &[String]) -> Self {
        let mut filter = Self::for_ptype(ptype);
        for (index, value) in rule.iter().take(MAX_RULE_FIELDS).enumerate() {
            filter = filter.with_field(index, value.as_str());
        }
        filter
    }

    /// Constrains positions `field_index..field_index + field_values.len()`.
    ///
    /// Positions past `v5` are ignored. Empty values are unconstrained.
    pub fn from_field_values(
        ptype: impl Into<String>,
        field_index: usize,
        field_values: &[String],
    ) -> Self {
        let mut filter = Self::for_ptype(ptype);
        for (offset, value) in field_values.iter().enumerate() {
            filter = filter.with_field(field_index.saturating_add(offset), value.as_str());
        }
        filter
    }

    /// Sets one positional constraint; out-of-range or empty values are no-ops.
    pub fn with_field(mut self, index: usize, value: impl Into<String>) -> Self {
        let value = value.into();
        if let Some(slot) = self.fields.get_mut(index) {
            if !value.is_empty() {
                *slot = Some(value);
            }
        }
        self
    }

    pub fn ptype(&self) -> &str {
        &self.ptype
    }

    /// Number of positional fields this filter constrains.
    pub fn constrained_fields(&self) -> usize {
        self.fields.iter().filter(|field| field.is_some()).count()
    }

    fn where_clause(&self) -> (String, Vec<&str>) {
        let mut sql = String::from(" WHERE ptype = ?");
        let mut bind_values = vec![self.ptype.as_str()];

        for (column, value) in FIELD_COLUMNS.iter().zip(&self.fields) {
            if let Some(value) = value {
                sql.push_str(" AND ");
                sql.push_str(column);
                sql.push_str(" = ?");
                bind_values.push(value.as_str());
            }
        }

        (sql, bind_values)
    }
}

/// Repository interface for rule table access.
pub trait RuleRepository {
    /// Creates the table when absent; never touches existing rows.
    fn ensure_table(&self) -> rusqlite::Result<()>;
    fn drop_table(&self) -> rusqlite::Result<()>;
    fn table_exists(&self) -> rusqlite::Result<bool>;
    /// Returns the first required column the table lacks.
    fn missing_column(&self) -> rusqlite::Result<Option<&'static str>>;
    fn insert_rule(&self, rule: &CasbinRule) -> rusqlite::Result<()>;
    /// Lists rows matching `filter`, or every row when `None`.
    fn list_rules(&self, filter: Option<&RuleFilter>) -> rusqlite::Result<Vec<CasbinRule>>;
    /// Deletes rows matching `filter` and returns how many were removed.
    fn delete_rules(&self, filter: &RuleFilter) -> rusqlite::Result<usize>;
    fn count_rules(&self) -> rusqlite::Result<u64>;
}

/// SQLite-backed rule repository bound to one table.
pub struct SqliteRuleRepository<'a> {
    conn: &'a Connection,
    table: &'a str,
}

impl<'a> SqliteRuleRepository<'a> {
    /// `table` must already be a validated identifier.
    pub fn new(conn: &'a Connection, table: &'a str) -> Self {
        Self { conn, table }
    }
}

impl RuleRepository for SqliteRuleRepository<'_> {
    fn ensure_table(&self) -> rusqlite::Result<()> {
        schema::create_table(self.conn, self.table)
    }

    fn drop_table(&self) -> rusqlite::Result<()> {
        schema::drop_table(self.conn, self.table)
    }

    fn table_exists(&self) -> rusqlite::Result<bool> {
        schema::table_exists(self.conn, self.table)
    }

    fn missing_column(&self) -> rusqlite::Result<Option<&'static str>> {
        schema::missing_column(self.conn, self.table)
    }

    fn insert_rule(&self, rule: &CasbinRule) -> rusqlite::Result<()> {
        self.conn.execute(
            &format!(
                "INSERT INTO \"{}\" (ptype, v0, v1, v2, v3, v4, v5)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
                self.table
            ),
            params![
                rule.ptype.as_str(),
                rule.v0.as_str(),
                rule.v1.as_str(),
                rule.v2.as_str(),
                rule.v3.as_str(),
                rule.v4.as_str(),
                rule.v5.as_str(),
            ],
        )?;
        Ok(())
    }

    fn list_rules(&self, filter: Option<&RuleFilter>) -> rusqlite::Result<Vec<CasbinRule>> {
        let mut sql = format!("{RULE_SELECT_SQL} FROM \"{}\"", self.table);
        let mut bind_values = Vec::new();
        if let Some(filter) = filter {
            let (clause, values) = filter.where_clause();
            sql.push_str(&clause);
            bind_values = values;
        }
        sql.push_str(" ORDER BY rowid ASC;");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut rules = Vec::new();
        while let Some(row) = rows.next()? {
            rules.push(parse_rule_row(row)?);
        }

        Ok(rules)
    }

    fn delete_rules(&self, filter: &RuleFilter) -> rusqlite::Result<usize> {
        let (clause, bind_values) = filter.where_clause();
        let sql = format!("DELETE FROM \"{}\"{clause};", self.table);
        self.conn.execute(&sql, params_from_iter(bind_values))
    }

    fn count_rules(&self) -> rusqlite::Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM \"{}\";", self.table),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or_default())
    }
}

fn parse_rule_row(row: &Row<'_>) -> rusqlite::Result<CasbinRule> {
    Ok(CasbinRule {
        ptype: text_or_empty(row, "ptype")?,
        v0: text_or_empty(row, "v0")?,
        v1: text_or_empty(row, "v1")?,
        v2: text_or_empty(row, "v2")?,
        v3: text_or_empty(row, "v3")?,
        v4: text_or_empty(row, "v4")?,
        v5: text_or_empty(row, "v5")?,
    })
}

// Rows written by other tools may carry NULL instead of ''.
fn text_or_empty(row: &Row<'_>, column: &str) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(column)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{RuleFilter, RuleRepository, SqliteRuleRepository};
    use crate::model::rule::CasbinRule;
    use rusqlite::Connection;

    fn params(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn filter_from_rule_skips_empty_parameters() {
        let filter = RuleFilter::from_rule("p", &params(&["alice", "", "read"]));
        let (sql, values) = filter.where_clause();
        assert_eq!(sql, " WHERE ptype = ? AND v0 = ? AND v2 = ?");
        assert_eq!(values, ["p", "alice", "read"]);
    }

    #[test]
    fn filter_from_field_values_offsets_positions() {
        let filter = RuleFilter::from_field_values("p", 1, &params(&["data1", "read"]));
        let (sql, values) = filter.where_clause();
        assert_eq!(sql, " WHERE ptype = ? AND v1 = ? AND v2 = ?");
        assert_eq!(values, ["p", "data1", "read"]);
    }

    #[test]
    fn filter_ignores_positions_past_last_column() {
        let filter = RuleFilter::from_field_values("p", 5, &params(&["x", "y", "z"]));
        assert_eq!(filter.constrained_fields(), 1);

        let out_of_range = RuleFilter::from_field_values("p", 9, &params(&["x"]));
        assert_eq!(out_of_range, RuleFilter::for_ptype("p"));
    }

    #[test]
    fn table_exists_follows_ensure_and_drop() {
        let conn = Connection::open_in_memory().unwrap();
        let repo = SqliteRuleRepository::new(&conn, "tenant_rules");
        assert!(!repo.table_exists().unwrap());

        repo.ensure_table().unwrap();
        assert!(repo.table_exists().unwrap());
        assert!(!SqliteRuleRepository::new(&conn, "casbin_rule")
            .table_exists()
            .unwrap());

        repo.drop_table().unwrap();
        assert!(!repo.table_exists().unwrap());
    }

    #[test]
    fn list_rules_reads_null_fields_as_empty() {
        let conn = Connection::open_in_memory().unwrap();
        let repo = SqliteRuleRepository::new(&conn, "casbin_rule");
        repo.ensure_table().unwrap();
        conn.execute(
            "INSERT INTO casbin_rule (ptype, v0, v1) VALUES ('g', 'alice', 'admin');",
            [],
        )
        .unwrap();

        let rules = repo.list_rules(None).unwrap();
        assert_eq!(
            rules,
            [CasbinRule::from_rule("g", &params(&["alice", "admin"]))]
        );
    }

    #[test]
    fn delete_rules_reports_removed_count() {
        let conn = Connection::open_in_memory().unwrap();
        let repo = SqliteRuleRepository::new(&conn, "casbin_rule");
        repo.ensure_table().unwrap();
        repo.insert_rule(&CasbinRule::from_rule("p", &params(&["alice", "data1", "read"])))
            .unwrap();
        repo.insert_rule(&CasbinRule::from_rule("p", &params(&["alice", "data2", "read"])))
            .unwrap();
        repo.insert_rule(&CasbinRule::from_rule("g", &params(&["alice", "admin"])))
            .unwrap();

        let removed = repo.delete_rules(&RuleFilter::for_ptype("p")).unwrap();
        assert_eq!(removed, 2);
        assert_eq!(repo.count_rules().unwrap(), 1);
    }
}
