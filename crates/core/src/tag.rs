// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic task-tag derivation.
//!
//! A task tag is the concatenation, in declared split-key order, of
//! `_<abbrev><value>` fragments, with the project-points axis contributing
//! `_j<chunk-index>`. Tags key the status store and name derived config
//! files, so every fragment must be filesystem-safe.

use serde_json::Value;

/// Shorten a split-key name for a tag fragment.
///
/// Underscores are removed, then interior vowels dropped; the first
/// character always survives so single-letter keys keep their name
/// (`a` stays `a`, `resolution` becomes `rsltn`).
pub fn abbrev(key: &str) -> String {
    let compact: String = key.chars().filter(|c| *c != '_').collect();
    let mut out = String::with_capacity(compact.len());
    for (i, c) in compact.chars().enumerate() {
        if i == 0 || !matches!(c.to_ascii_lowercase(), 'a' | 'e' | 'i' | 'o' | 'u') {
            out.push(c);
        }
    }
    out
}

/// Render a split value for a tag fragment.
///
/// Numbers render without decimal points (`1.5` becomes `15`); strings are
/// stripped to the filesystem-safe alphabet; booleans render as
/// `true`/`false`.
pub fn value_fragment(value: &Value) -> String {
    match value {
        Value::Number(n) => n.to_string().replace('.', ""),
        Value::String(s) => sanitize(s),
        Value::Bool(b) => b.to_string(),
        other => sanitize(&other.to_string()),
    }
}

/// A `_<abbrev><value>` fragment for one named split key.
pub fn fragment(key: &str, value: &Value) -> String {
    format!("_{}{}", abbrev(key), value_fragment(value))
}

/// The fragment for chunk `index` of the project-points axis.
pub fn points_fragment(index: usize) -> String {
    format!("_j{}", index)
}

fn sanitize(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            // never emit a ".." pair
            '.' if !out.ends_with('.') => out.push(c),
            '.' => {}
            c if c.is_ascii_alphanumeric() || c == '-' => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
#[path = "tag_tests.rs"]
mod tests;
