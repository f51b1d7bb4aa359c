// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed accessors over the untyped config tree.
//!
//! Configs are free-form mappings; these helpers fail with a `ConfigError`
//! naming the key and the expected type instead of panicking or silently
//! coercing.

use crate::error::ConfigError;
use serde_json::{Map, Value};

/// Placeholder left by template emission for a value the user must fill in.
pub const REQUIRED: &str = "[REQUIRED]";
/// Placeholder for a value required only when running on a cluster.
pub const REQUIRED_IF_HPC: &str = "[REQUIRED IF ON HPC]";

/// Fetch a key that must be present.
pub fn require<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a Value, ConfigError> {
    map.get(key).ok_or_else(|| ConfigError::MissingKey {
        key: key.to_string(),
    })
}

pub fn require_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<&'a str, ConfigError> {
    require(map, key)?.as_str().ok_or(ConfigError::WrongType {
        key: key.to_string(),
        expected: "string",
    })
}

pub fn require_sequence<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Vec<Value>, ConfigError> {
    require(map, key)?.as_array().ok_or(ConfigError::WrongType {
        key: key.to_string(),
        expected: "sequence",
    })
}

pub fn opt_str<'a>(map: &'a Map<String, Value>, key: &str) -> Result<Option<&'a str>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(ConfigError::WrongType {
            key: key.to_string(),
            expected: "string",
        }),
    }
}

/// A string, or a number rendered as one (memory sizes, module versions).
pub fn opt_stringy(map: &Map<String, Value>, key: &str) -> Result<Option<String>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(_) => Err(ConfigError::WrongType {
            key: key.to_string(),
            expected: "string or number",
        }),
    }
}

pub fn opt_u64(map: &Map<String, Value>, key: &str) -> Result<Option<u64>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_u64().map(Some).ok_or(ConfigError::WrongType {
            key: key.to_string(),
            expected: "non-negative integer",
        }),
    }
}

pub fn opt_f64(map: &Map<String, Value>, key: &str) -> Result<Option<f64>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_f64().map(Some).ok_or(ConfigError::WrongType {
            key: key.to_string(),
            expected: "number",
        }),
    }
}

pub fn opt_mapping<'a>(
    map: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, ConfigError> {
    match map.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Object(inner)) => Ok(Some(inner)),
        Some(_) => Err(ConfigError::WrongType {
            key: key.to_string(),
            expected: "mapping",
        }),
    }
}

/// Depth-first scan for placeholder strings, returning dotted key paths.
pub fn scan_placeholders(value: &Value) -> Vec<String> {
    let mut hits = Vec::new();
    walk(value, String::new(), &mut hits);
    hits
}

/// Fail on the first placeholder found anywhere in the tree.
pub fn reject_placeholders(value: &Value) -> Result<(), ConfigError> {
    match scan_placeholders(value).into_iter().next() {
        Some(key) => Err(ConfigError::Placeholder { key }),
        None => Ok(()),
    }
}

fn walk(value: &Value, path: String, hits: &mut Vec<String>) {
    match value {
        Value::String(s) if s == REQUIRED || s == REQUIRED_IF_HPC => hits.push(path),
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                walk(child, child_path, hits);
            }
        }
        Value::Array(items) => {
            for (i, child) in items.iter().enumerate() {
                walk(child, format!("{}[{}]", path, i), hits);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
#[path = "value_tests.rs"]
mod tests;
