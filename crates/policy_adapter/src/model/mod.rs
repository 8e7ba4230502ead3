//! Policy data shapes shared by the persistence layers.
//!
//! # Responsibility
//! - `policy`: the in-memory model the authorization engine evaluates.
//! - `rule`: one persisted row of the rule table.
//!
//! # Invariants
//! - A rule row carries at most `MAX_RULE_FIELDS` positional parameters.
//! - The model never interprets parameters; it only groups and orders them.

pub mod policy;
pub mod rule;
