// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The pipeline executor: a state machine over the ordered step list.
//!
//! Each invocation reconciles the status store against the scheduler,
//! finds the first step that is not done, and acts on it: dispatch a
//! pending step, wait on an active one, re-dispatch only the failed tasks
//! of a failed one. Monitor mode loops invocations; background mode is a
//! detached monitor guarded by a pid token in the status store.

use crate::dispatch::{dispatch_step, DispatchOptions, DispatchOutcome};
use crate::process::process_exists;
use crate::registry::Registry;
use crate::EngineError;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use swath_config::{is_pipeline_config, PipelineSpec};
use swath_core::{Clock, StepState, TaskState};
use swath_hpc::Backend;
use swath_store::StatusStore;

/// Default sleep between monitor polls.
pub const DEFAULT_POLL: Duration = Duration::from_secs(30);

/// Driver-wide executor settings.
#[derive(Debug, Clone)]
pub struct ExecOptions {
    /// Program name for generated command lines
    pub program: String,
    pub verbose: bool,
}

impl ExecOptions {
    fn dispatch(&self) -> DispatchOptions {
        DispatchOptions {
            program: self.program.clone(),
            verbose: self.verbose,
        }
    }
}

/// What one executor invocation found or did.
#[derive(Debug, Clone)]
pub enum CycleOutcome {
    /// The pipeline has zero steps
    Empty,
    /// Every step is done
    Done,
    /// The current step still has live tasks
    Active { step: String },
    /// A pending step was dispatched
    Dispatched { step: String, outcome: DispatchOutcome },
    /// A failed step had its failed tasks re-submitted
    Resubmitted { step: String, outcome: DispatchOutcome },
}

/// One executor invocation (the one-shot mode).
///
/// `as_monitor` carries the monitor's own pid so its cycles pass the
/// double-drive guard it registered.
pub async fn run_once(
    pipeline: &PipelineSpec,
    registry: &Registry,
    opts: &ExecOptions,
    clock: &impl Clock,
    as_monitor: Option<u32>,
) -> Result<CycleOutcome, EngineError> {
    if pipeline.steps.is_empty() {
        return Ok(CycleOutcome::Empty);
    }

    let mut store = StatusStore::open(pipeline.project_dir())?;

    // refuse to double-drive a project a live monitor owns
    if let Some(pid) = store.monitor_pid() {
        if as_monitor != Some(pid) {
            if process_exists(pid) {
                return Err(EngineError::MonitorActive { pid });
            }
            tracing::warn!(pid, "clearing stale monitor token (process is gone)");
            store.set_monitor(None, clock)?;
        }
    }

    reconcile(&mut store, clock).await?;

    for step in &pipeline.steps {
        let state = step_state(&store, &step.alias);
        match state {
            StepState::Done => {
                // the store only knows the tasks that were ever dispatched;
                // re-enumerate through the dispatcher's dedupe so a split
                // that grew since the step completed still fans out. With
                // nothing new, every task skips and the step stays done.
                let outcome = dispatch_step(
                    &mut store,
                    registry,
                    &step.alias,
                    step.command_name(),
                    &step.config_path,
                    &opts.dispatch(),
                    clock,
                    None,
                )
                .await?;
                if outcome.submitted.is_empty() {
                    continue;
                }
                tracing::info!(
                    step = %step.alias,
                    count = outcome.submitted.len(),
                    "completed step enumerated new tasks"
                );
                return Ok(CycleOutcome::Dispatched {
                    step: step.alias.clone(),
                    outcome,
                });
            }
            StepState::Active => {
                return Ok(CycleOutcome::Active {
                    step: step.alias.clone(),
                })
            }
            StepState::Pending => {
                let outcome = dispatch_step(
                    &mut store,
                    registry,
                    &step.alias,
                    step.command_name(),
                    &step.config_path,
                    &opts.dispatch(),
                    clock,
                    None,
                )
                .await?;
                return Ok(CycleOutcome::Dispatched {
                    step: step.alias.clone(),
                    outcome,
                });
            }
            StepState::Failed => {
                let failed: HashSet<String> = store
                    .step(&step.alias)
                    .map(|tasks| {
                        tasks
                            .iter()
                            .filter(|(_, e)| e.state == TaskState::Failed)
                            .map(|(tag, _)| tag.clone())
                            .collect()
                    })
                    .unwrap_or_default();
                tracing::info!(step = %step.alias, count = failed.len(), "re-submitting failed tasks");
                let outcome = dispatch_step(
                    &mut store,
                    registry,
                    &step.alias,
                    step.command_name(),
                    &step.config_path,
                    &opts.dispatch(),
                    clock,
                    Some(&failed),
                )
                .await?;
                return Ok(CycleOutcome::Resubmitted {
                    step: step.alias.clone(),
                    outcome,
                });
            }
        }
    }
    Ok(CycleOutcome::Done)
}

/// Foreground monitor: loop invocations with a bounded sleep until the
/// final step is done or a step fails twice in one session.
///
/// The monitor registers its pid in the status store so one-shot
/// invocations refuse to double-drive, and clears it on the way out.
pub async fn monitor(
    pipeline: &PipelineSpec,
    registry: &Registry,
    opts: &ExecOptions,
    poll: Duration,
    clock: &impl Clock,
) -> Result<CycleOutcome, EngineError> {
    let pid = std::process::id();
    {
        let mut store = StatusStore::open(pipeline.project_dir())?;
        if let Some(existing) = store.monitor_pid() {
            if existing != pid && process_exists(existing) {
                return Err(EngineError::MonitorActive { pid: existing });
            }
        }
        store.set_monitor(Some(pid), clock)?;
    }

    // one re-submission per step per session; a second failure is terminal
    let mut resubmitted: HashSet<String> = HashSet::new();
    let result = loop {
        let outcome = run_once(pipeline, registry, opts, clock, Some(pid)).await;
        match outcome {
            Err(e) => break Err(e),
            Ok(CycleOutcome::Done) => break Ok(CycleOutcome::Done),
            Ok(CycleOutcome::Empty) => break Ok(CycleOutcome::Empty),
            Ok(CycleOutcome::Resubmitted { step, outcome }) => {
                if !resubmitted.insert(step.clone()) {
                    break Err(EngineError::StepFailed { step });
                }
                tracing::info!(%step, submitted = outcome.submitted.len(), "monitor re-submitted");
            }
            Ok(CycleOutcome::Active { .. }) | Ok(CycleOutcome::Dispatched { .. }) => {}
        }

        if let Ok(mut store) = StatusStore::open(pipeline.project_dir()) {
            let _ = store.touch_monitor(clock);
        }
        tokio::time::sleep(poll).await;
    };

    if let Ok(mut store) = StatusStore::open(pipeline.project_dir()) {
        let _ = store.set_monitor(None, clock);
    }
    result
}

/// Detach a monitor process that outlives the parent shell. Returns its
/// pid; liveness is tracked through the status store token the monitor
/// registers itself.
pub fn spawn_background_monitor(
    program: &Path,
    pipeline_config: &Path,
    verbose: bool,
) -> Result<u32, EngineError> {
    let mut cmd = std::process::Command::new(program);
    cmd.arg("pipeline")
        .arg("-c")
        .arg(pipeline_config)
        .arg("--monitor")
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());
    if verbose {
        cmd.arg("-v");
    }

    let child = cmd
        .spawn()
        .map_err(|e| EngineError::Io(format!("could not spawn background monitor: {}", e)))?;
    let pid = child.id();
    tracing::info!(pid, config = %pipeline_config.display(), "background monitor started");
    Ok(pid)
}

/// Find the pipelines under `root` for recursive execution: each immediate
/// subdirectory containing exactly one pipeline-config file. Zero or
/// multiple matches skip the directory with a warning.
pub fn discover_pipelines(root: &Path) -> Result<Vec<PathBuf>, EngineError> {
    let mut found = Vec::new();
    let entries = std::fs::read_dir(root).map_err(|e| EngineError::io(root, e))?;
    for dirent in entries {
        let dirent = dirent.map_err(|e| EngineError::io(root, e))?;
        let dir = dirent.path();
        if !dir.is_dir() {
            continue;
        }

        let mut matches = Vec::new();
        let children = std::fs::read_dir(&dir).map_err(|e| EngineError::io(&dir, e))?;
        for child in children {
            let child = child.map_err(|e| EngineError::io(&dir, e))?;
            let path = child.path();
            let name = child.file_name();
            if path.is_file() && is_pipeline_config(&name.to_string_lossy()) {
                matches.push(path);
            }
        }

        match matches.len() {
            1 => found.extend(matches),
            0 => tracing::debug!(dir = %dir.display(), "no pipeline config, skipping"),
            n => tracing::warn!(dir = %dir.display(), n, "multiple pipeline configs, skipping"),
        }
    }
    found.sort();
    Ok(found)
}

/// Run one executor invocation in every discovered sub-pipeline.
pub async fn run_recursive(
    root: &Path,
    registry: &Registry,
    opts: &ExecOptions,
    clock: &impl Clock,
) -> Result<Vec<(PathBuf, CycleOutcome)>, EngineError> {
    let mut results = Vec::new();
    for config in discover_pipelines(root)? {
        let pipeline = PipelineSpec::load(&config)?;
        let outcome = run_once(&pipeline, registry, opts, clock, None).await?;
        results.push((config, outcome));
    }
    Ok(results)
}

/// Aggregate the tasks the store has recorded for a step. `Done` here only
/// means every *known* task succeeded; `run_once` re-enumerates done steps
/// against their current config before moving past them.
fn step_state(store: &StatusStore, alias: &str) -> StepState {
    store
        .step(alias)
        .map(|tasks| StepState::aggregate(tasks.values().map(|e| &e.state)))
        .unwrap_or(StepState::Pending)
}

/// Reconcile the store against the scheduler queue. The queue is fetched
/// once, and only when some live entry was actually submitted to a
/// scheduler (local job ids never outlive their submit call).
async fn reconcile(store: &mut StatusStore, clock: &impl Clock) -> Result<(), EngineError> {
    let needs_scheduler = store.steps().any(|(_, tasks)| {
        tasks.values().any(|e| {
            e.state.is_live()
                && e.job_id
                    .as_deref()
                    .map(|id| !id.starts_with("local-"))
                    .unwrap_or(false)
        })
    });

    let live = if needs_scheduler {
        Backend::Slurm.live_jobs().await?
    } else {
        HashSet::new()
    };
    store.reconcile(&live, clock)?;
    Ok(())
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
