// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Node-side execution wrapper.
//!
//! Every submitted command line lands here: record the start marker, run
//! the entry point, record the end marker whatever happened. The records
//! are single-record pending files, so any number of tasks can finish at
//! once on different hosts without coordinating.

use crate::registry::Registry;
use crate::EngineError;
use std::path::Path;
use std::time::Instant;
use swath_config::StepConfig;
use swath_core::{Clock, TaskEntry, TaskState};
use swath_hpc::cleanup_script;
use swath_store::record_pending;

/// Recover a task's tag from its derived config file name
/// (`<alias><tag>.task.<ext>`). A missing marker means the file was handed
/// over directly (`swath script -c config.json`), which is the empty tag.
pub fn tag_from_config_path(alias: &str, config_path: &Path) -> String {
    let stem = config_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    stem.strip_suffix(".task")
        .and_then(|name| name.strip_prefix(alias))
        .unwrap_or_default()
        .to_string()
}

/// Run one task under the status guard.
///
/// The start marker transitions the task to `running`; the end marker is
/// written regardless of the entry point's outcome, carrying the runtime,
/// the artifact path on success, or the error text on failure. The
/// returned error only sets the process exit code; the status store
/// already knows.
pub fn run_step(
    registry: &Registry,
    project_dir: &Path,
    alias: &str,
    command: &str,
    config_path: &Path,
    clock: &impl Clock,
) -> Result<(), EngineError> {
    let entry = registry.get(command)?;
    let cfg = StepConfig::load(config_path)?;
    let tag = tag_from_config_path(alias, config_path);

    let start_entry = TaskEntry {
        state: TaskState::Running,
        time_start: Some(clock.timestamp()),
        ..TaskEntry::default()
    };
    record_pending(project_dir, alias, &tag, "start", &start_entry)?;
    tracing::info!(step = alias, %tag, command, "task starting");

    let started = Instant::now();
    let result = (entry.run)(&cfg);
    let runtime = started.elapsed().as_secs_f64();

    let mut end_entry = TaskEntry {
        time_end: Some(clock.timestamp()),
        total_runtime: Some(runtime),
        ..TaskEntry::default()
    };
    match &result {
        Ok(artifact) => {
            end_entry.state = TaskState::Successful;
            end_entry.job_out = artifact.as_ref().map(|p| p.display().to_string());
            // the submission script's job is over; a failed task keeps its
            // script for inspection and re-use
            cleanup_script(project_dir, &format!("{}{}", alias, tag));
            tracing::info!(step = alias, %tag, runtime, "task successful");
        }
        Err(message) => {
            end_entry.state = TaskState::Failed;
            end_entry.error = Some(message.clone());
            tracing::error!(step = alias, %tag, runtime, %message, "task failed");
        }
    }
    record_pending(project_dir, alias, &tag, "end", &end_entry)?;

    result.map(|_| ()).map_err(|message| EngineError::Run {
        step: alias.to_string(),
        message,
    })
}

#[cfg(test)]
#[path = "run_guard_tests.rs"]
mod tests;
