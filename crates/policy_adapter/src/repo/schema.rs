//! Rule table DDL and schema introspection.

use rusqlite::{Connection, OptionalExtension};

/// Columns every rule table must have, in declaration order.
pub const RULE_COLUMNS: [&str; 7] = ["ptype", "v0", "v1", "v2", "v3", "v4", "v5"];

/// Creates the rule table unless it already exists.
pub fn create_table(conn: &Connection, table: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS \"{table}\" (
            ptype VARCHAR(10),
            v0 VARCHAR(256),
            v1 VARCHAR(256),
            v2 VARCHAR(256),
            v3 VARCHAR(256),
            v4 VARCHAR(256),
            v5 VARCHAR(256)
        );"
    ))
}

pub fn drop_table(conn: &Connection, table: &str) -> rusqlite::Result<()> {
    conn.execute_batch(&format!("DROP TABLE IF EXISTS \"{table}\";"))
}

pub fn table_exists(conn: &Connection, table: &str) -> rusqlite::Result<bool> {
    let found: Option<i64> = conn
        .query_row(
            "SELECT 1
             FROM sqlite_master
             WHERE type = 'table' AND name = ?1;",
            [table],
            |row| row.get(0),
        )
        .optional()?;
    Ok(found.is_some())
}

/// Returns the first required column the table lacks, if any.
pub fn missing_column(conn: &Connection, table: &str) -> rusqlite::Result<Option<&'static str>> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info(\"{table}\");"))?;
    let mut rows = stmt.query([])?;
    let mut present = Vec::new();
    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        present.push(name.to_ascii_lowercase());
    }

    Ok(RULE_COLUMNS
        .into_iter()
        .find(|column| !present.iter().any(|name| name == column)))
}
