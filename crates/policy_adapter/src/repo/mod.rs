//! Rule table persistence.
//!
//! # Responsibility
//! - Own every SQL statement that touches the rule table.
//! - Keep the adapter layer free of query text.
//!
//! # Invariants
//! - Table names reaching this layer were validated by `config`.
//! - Errors are returned as raw `rusqlite::Error` values.

pub mod rule_repo;
pub mod schema;
