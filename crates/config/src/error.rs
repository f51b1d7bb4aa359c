// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Config error taxonomy.
//!
//! Every variant names the offending file or key; config errors always
//! surface before any job is submitted.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("cannot parse {path} as {format}: {message}")]
    Parse {
        path: String,
        format: &'static str,
        message: String,
    },
    #[error("unsupported config extension: {path} (expected .json, .json5, .jsonc, .yaml, .yml, or .toml)")]
    UnsupportedFormat { path: String },
    #[error("cannot render config as {format}: {message}")]
    Render {
        format: &'static str,
        message: String,
    },
    #[error("config is not a mapping: {path}")]
    NotAMapping { path: String },
    #[error("missing required key: {key}")]
    MissingKey { key: String },
    #[error("wrong type for {key}: expected {expected}")]
    WrongType { key: String, expected: &'static str },
    #[error("placeholder value left unfilled for key: {key}")]
    Placeholder { key: String },
    #[error("duplicate step alias in pipeline: {alias}")]
    DuplicateAlias { alias: String },
    #[error("unrecognized execution_control key: {key}")]
    UnknownExecKey { key: String },
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("batch index error in {path}: {message}")]
    BatchIndex { path: String, message: String },
}
