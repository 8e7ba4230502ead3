//! In-memory policy model.
//!
//! # Responsibility
//! - Hold rule lists keyed by section (`p`, `g`) and rule type (`p`, `p2`, ...).
//! - Accept rules only for rule types that were defined up front.
//!
//! # Invariants
//! - The section of a rule type is its first character.
//! - Rule order inside one rule type is insertion order.
//! - Sections and rule types iterate in sorted order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Sections persisted by the adapter, in save order.
pub const POLICY_SECTIONS: [&str; 2] = ["p", "g"];

type RuleLists = BTreeMap<String, Vec<Vec<String>>>;

/// Section -> rule type -> ordered parameter tuples.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyModel {
    sections: BTreeMap<String, RuleLists>,
}

impl PolicyModel {
    /// Creates a model with no rule types defined.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model with the conventional `p` and `g` rule types defined.
    pub fn rbac() -> Self {
        let mut model = Self::new();
        model.define("p");
        model.define("g");
        model
    }

    /// Defines a rule type so lines of that type can be loaded.
    ///
    /// Returns `false` for an empty rule type. Redefining keeps existing rules.
    pub fn define(&mut self, ptype: &str) -> bool {
        let Some(sec) = section_of(ptype) else {
            return false;
        };
        self.sections
            .entry(sec.to_string())
            .or_default()
            .entry(ptype.to_string())
            .or_default();
        true
    }

    pub fn is_defined(&self, sec: &str, ptype: &str) -> bool {
        self.sections
            .get(sec)
            .is_some_and(|types| types.contains_key(ptype))
    }

    /// Appends one rule. Returns `false` when the rule type is undefined.
    pub fn add_rule(&mut self, sec: &str, ptype: &str, rule: Vec<String>) -> bool {
        match self
            .sections
            .get_mut(sec)
            .and_then(|types| types.get_mut(ptype))
        {
            Some(rules) => {
                rules.push(rule);
                true
            }
            None => false,
        }
    }

    /// Rules of one rule type; empty when undefined.
    pub fn rules(&self, sec: &str, ptype: &str) -> &[Vec<String>] {
        self.sections
            .get(sec)
            .and_then(|types| types.get(ptype))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Rule types of one section with their rules, sorted by rule type.
    pub fn rule_types<'a>(
        &'a self,
        sec: &str,
    ) -> impl Iterator<Item = (&'a str, &'a [Vec<String>])> + 'a {
        self.sections
            .get(sec)
            .into_iter()
            .flat_map(|types| types.iter())
            .map(|(ptype, rules)| (ptype.as_str(), rules.as_slice()))
    }

    pub fn rule_count(&self) -> usize {
        self.sections
            .values()
            .flat_map(|types| types.values())
            .map(Vec::len)
            .sum()
    }
}

/// Returns the section a rule type belongs to (`p2` -> `p`).
pub fn section_of(ptype: &str) -> Option<&str> {
    ptype.chars().next().map(|first| &ptype[..first.len_utf8()])
}
