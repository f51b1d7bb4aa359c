// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy.
//!
//! Config and consistency errors abort before any submission; submission
//! errors pass through from the backend; runtime errors are recorded in the
//! status store by the run guard and surface here only to set the exit
//! code.

use swath_config::ConfigError;
use swath_core::PointsError;
use swath_hpc::HpcError;
use swath_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("status store error: {0}")]
    Store(#[from] StoreError),
    #[error("submission backend error: {0}")]
    Hpc(#[from] HpcError),
    #[error("config error: {0}")]
    Points(#[from] PointsError),

    #[error("no registered entry point named: {command}")]
    UnknownCommand { command: String },
    #[error("step {step}: split key {key} missing from config")]
    MissingSplitKey { step: String, key: String },
    #[error("step {step}: split key {key} must be a sequence")]
    SplitNotASequence { step: String, key: String },
    #[error("step {step}: split key {key} is an empty sequence")]
    EmptySplit { step: String, key: String },
    #[error("step {step}: zipped split keys {keys} have mismatched lengths")]
    ZipLengthMismatch { step: String, keys: String },
    #[error("step {step}: execution_control.nodes is set but the entry point does not split on project_points")]
    NodesWithoutPoints { step: String },
    #[error("step {step}: duplicate task tag: {tag}")]
    DuplicateTag { step: String, tag: String },
    #[error("step {step}: task {tag} already succeeded with a different config (reset the step to re-run it)")]
    HashChanged { step: String, tag: String },
    #[error("step {step}: dispatch produced no tasks")]
    EmptyStep { step: String },
    #[error("step {step}: config pre-processor failed: {message}")]
    Preprocess { step: String, message: String },
    #[error("step {step}: entry point failed: {message}")]
    Run { step: String, message: String },

    #[error("a pipeline monitor is already driving this project (pid {pid}); refusing to double-drive")]
    MonitorActive { pid: u32 },
    #[error("step {step} failed again after re-submission; giving up")]
    StepFailed { step: String },
    #[error("pipeline has no step aliased: {alias}")]
    StepNotFound { alias: String },
    #[error("batch would generate duplicate directory: {name}")]
    DuplicateBatchDir { name: String },
    #[error("batch index missing at {path}; nothing to delete")]
    BatchIndexMissing { path: String },

    #[error("{0}")]
    Io(String),
}

impl EngineError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        EngineError::Io(format!("I/O error at {}: {}", path.display(), source))
    }
}
