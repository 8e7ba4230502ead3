//! Textual policy lines.
//!
//! # Responsibility
//! - Parse `ptype, v0, v1, ...` lines into a `PolicyModel`.
//! - Render tokens back into a line the parser accepts.
//!
//! # Invariants
//! - Tokens are comma separated; surrounding whitespace is trimmed.
//! - A token holding a comma, a quote, surrounding whitespace or nothing is
//!   double-quoted with inner quotes doubled.
//! - Blank lines and `#` comment lines are ignored.

use crate::model::policy::{section_of, PolicyModel};
use log::warn;

/// Parses one policy line and appends the rule to `model`.
///
/// Returns `true` when a rule was added. Comment lines, blank lines and lines
/// whose rule type is not defined in `model` are skipped.
pub fn load_policy_line(line: &str, model: &mut PolicyModel) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return false;
    }

    let mut tokens = split_policy_line(trimmed);
    let ptype = tokens.remove(0);
    let Some(sec) = section_of(&ptype) else {
        return false;
    };

    if !model.is_defined(sec, &ptype) {
        warn!(
            "event=policy_line_skipped module=persist status=ignored reason=undefined_ptype ptype={}",
            ptype
        );
        return false;
    }
    model.add_rule(sec, &ptype, tokens)
}

/// Splits a policy line into tokens, honoring double-quoted tokens.
///
/// Always returns at least one token.
pub fn split_policy_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut token = String::new();
        let quoted = chars.next_if_eq(&'"').is_some();
        if quoted {
            while let Some(c) = chars.next() {
                match c {
                    '"' if chars.next_if_eq(&'"').is_some() => token.push('"'),
                    '"' => break,
                    other => token.push(other),
                }
            }
        }

        let mut at_separator = false;
        for c in chars.by_ref() {
            if c == ',' {
                at_separator = true;
                break;
            }
            // Text after a closing quote is discarded.
            if !quoted {
                token.push(c);
            }
        }

        if quoted {
            tokens.push(token);
        } else {
            tokens.push(token.trim_end().to_string());
        }

        if !at_separator {
            return tokens;
        }
    }
}

/// Joins tokens with `", "`, quoting the ones the parser would otherwise alter.
pub fn format_policy_line<'a>(tokens: impl IntoIterator<Item = &'a str>) -> String {
    let mut line = String::new();
    for (index, token) in tokens.into_iter().enumerate() {
        if index > 0 {
            line.push_str(", ");
        }
        if needs_quotes(token) {
            line.push('"');
            line.push_str(&token.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(token);
        }
    }
    line
}

fn needs_quotes(token: &str) -> bool {
    token.is_empty() || token.contains([',', '"']) || token.trim() != token
}
