// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde_json::json;

#[test]
fn canonical_json_sorts_keys_recursively() {
    let value = json!({"b": 1, "a": {"z": true, "y": [1, 2]}});
    assert_eq!(
        canonical_json(&value),
        "{\"a\":{\"y\":[1,2],\"z\":true},\"b\":1}"
    );
}

#[test]
fn hash_is_key_order_independent() {
    let one = json!({"alpha": 1, "beta": [1, 2, 3]});
    let two = json!({"beta": [1, 2, 3], "alpha": 1});
    assert_eq!(config_hash(&one), config_hash(&two));
}

#[test]
fn hash_is_value_sensitive() {
    let one = json!({"alpha": 1});
    let two = json!({"alpha": 2});
    assert_ne!(config_hash(&one), config_hash(&two));
}

#[test]
fn hash_is_sha256_hex() {
    let digest = config_hash(&json!({}));
    assert_eq!(digest.len(), 64);
    assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn array_order_matters() {
    assert_ne!(
        config_hash(&json!({"k": [1, 2]})),
        config_hash(&json!({"k": [2, 1]}))
    );
}
