//! Persisted rule row.
//!
//! # Invariants
//! - Unused trailing fields are empty strings, never `None`.
//! - Parameters beyond `MAX_RULE_FIELDS` are dropped on conversion.

use crate::persist::format_policy_line;
use serde::{Deserialize, Serialize};

/// Number of positional parameter columns (`v0..v5`) in the rule table.
pub const MAX_RULE_FIELDS: usize = 6;

/// One row of the rule table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasbinRule {
    /// Rule-type discriminator such as `p`, `p2` or `g`.
    pub ptype: String,
    pub v0: String,
    pub v1: String,
    pub v2: String,
    pub v3: String,
    pub v4: String,
    pub v5: String,
}

impl CasbinRule {
    /// Builds a row from a rule type and its positional parameters.
    ///
    /// Missing positions become empty strings; extra parameters are ignored.
    pub fn from_rule(ptype: &str, rule: &[String]) -> Self {
        let mut fields: [String; MAX_RULE_FIELDS] = Default::default();
        for (slot, value) in fields.iter_mut().zip(rule) {
            slot.clone_from(value);
        }
        let [v0, v1, v2, v3, v4, v5] = fields;

        Self {
            ptype: ptype.to_string(),
            v0,
            v1,
            v2,
            v3,
            v4,
            v5,
        }
    }

    /// Positional fields `v0..v5` in column order.
    pub fn fields(&self) -> [&str; MAX_RULE_FIELDS] {
        [
            self.v0.as_str(),
            self.v1.as_str(),
            self.v2.as_str(),
            self.v3.as_str(),
            self.v4.as_str(),
            self.v5.as_str(),
        ]
    }

    /// Renders `ptype, v0, v1, ...` keeping only non-empty fields.
    ///
    /// An empty middle field is skipped, so later fields shift left when the
    /// line is parsed back.
    pub fn to_policy_line(&self) -> String {
        let tokens = std::iter::once(self.ptype.as_str())
            .chain(self.fields().into_iter().filter(|field| !field.is_empty()));
        format_policy_line(tokens)
    }
}
