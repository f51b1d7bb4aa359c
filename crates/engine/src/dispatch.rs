// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The step dispatcher: fan one logical step out into tagged cluster jobs.
//!
//! Order of operations is fixed: pre-process, validate splits, enumerate
//! tasks, tag them, materialize per-task configs, dedupe against the status
//! store, submit. Any error before submission leaves the store untouched.

use crate::registry::{PlatformParams, Registry, SplitSpec};
use crate::EngineError;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use swath_config::{dump, StepConfig};
use swath_core::{config_hash, fragment, points_fragment, Clock, ProjectPoints, TaskEntry, TaskState};
use swath_hpc::{Backend, SubmitSpec};
use swath_store::StatusStore;

/// Driver-wide dispatch settings.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    /// Program name for generated command lines (`swath` unless embedded)
    pub program: String,
    pub verbose: bool,
}

/// What one dispatch invocation did.
#[derive(Debug, Clone, Default)]
pub struct DispatchOutcome {
    pub submitted: Vec<String>,
    pub skipped: Vec<String>,
    pub total: usize,
}

/// One enumerated split axis, in declared order.
enum Axis {
    Points { chunks: Vec<Vec<i64>> },
    Zipped { keys: Vec<(String, Vec<Value>)> },
    Product { key: String, values: Vec<Value> },
}

impl Axis {
    fn len(&self) -> usize {
        match self {
            Axis::Points { chunks } => chunks.len(),
            Axis::Zipped { keys } => keys.first().map(|(_, v)| v.len()).unwrap_or(0),
            Axis::Product { values, .. } => values.len(),
        }
    }
}

/// A fully derived task: its tag and its materialized config.
struct Task {
    tag: String,
    config: Map<String, Value>,
    hash: String,
}

/// Where the derived config for `(alias, tag)` lands: next to the step
/// config, named by the tag, with a `.task` marker so the empty tag never
/// collides with the step config itself.
pub fn task_config_path(step_config: &Path, alias: &str, tag: &str) -> PathBuf {
    let ext = step_config
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("json");
    let dir = step_config.parent().unwrap_or_else(|| Path::new("."));
    dir.join(format!("{}{}.task.{}", alias, tag, ext))
}

/// Dispatch one step: derive its tasks and submit the ones that need it.
///
/// `only_tags` restricts submission to the given tags (failed-task
/// re-dispatch); other tasks are left exactly as recorded.
#[allow(clippy::too_many_arguments)]
pub async fn dispatch_step(
    store: &mut StatusStore,
    registry: &Registry,
    alias: &str,
    command: &str,
    config_path: &Path,
    opts: &DispatchOptions,
    clock: &impl Clock,
    only_tags: Option<&HashSet<String>>,
) -> Result<DispatchOutcome, EngineError> {
    let entry = registry.get(command)?;
    let mut cfg = StepConfig::load(config_path)?;
    let log_directory = cfg.log_directory()?;

    // 1. pre-process, in the driver, before anything is derived
    if let Some(preprocess) = entry.preprocess {
        let params = PlatformParams {
            job_name: alias,
            log_directory: &log_directory,
            verbose: opts.verbose,
        };
        preprocess(&mut cfg, &params).map_err(|message| EngineError::Preprocess {
            step: alias.to_string(),
            message,
        })?;
    }

    // 2. resolve the backend and validate resources up front
    let control = cfg.execution_control(&entry.extra_exec_keys())?;
    let backend = Backend::from_option(&control.option)?;
    let resources = backend.resources(&control)?;
    if control.nodes.is_some() && !entry.splits_on_points() {
        return Err(EngineError::NodesWithoutPoints {
            step: alias.to_string(),
        });
    }

    // 3.–5. validate splits, enumerate, tag, materialize
    let axes = build_axes(alias, entry.splits.as_slice(), &cfg, control.nodes)?;
    let tasks = enumerate_tasks(alias, &axes, &cfg, entry.accepts_tag)?;
    if tasks.is_empty() {
        return Err(EngineError::EmptyStep {
            step: alias.to_string(),
        });
    }

    // 6. dedupe needs the scheduler's live queue at most once
    let needs_queue = tasks.iter().any(|task| {
        store
            .entry(alias, &task.tag)
            .map(|e| e.state.is_live())
            .unwrap_or(false)
    });
    let live_jobs = if needs_queue {
        backend.live_jobs().await?
    } else {
        HashSet::new()
    };

    let mut outcome = DispatchOutcome {
        total: tasks.len(),
        ..DispatchOutcome::default()
    };

    for task in tasks {
        let job_name = format!("{}{}", alias, task.tag);

        if let Some(only) = only_tags {
            if !only.contains(&task.tag) {
                outcome.skipped.push(task.tag);
                continue;
            }
        }

        match store.entry(alias, &task.tag) {
            Some(existing) if existing.state == TaskState::Successful => {
                if existing.config_hash.as_deref() == Some(task.hash.as_str()) {
                    tracing::debug!(step = alias, tag = %task.tag, "already successful, skipping");
                    outcome.skipped.push(task.tag);
                    continue;
                }
                return Err(EngineError::HashChanged {
                    step: alias.to_string(),
                    tag: task.tag,
                });
            }
            Some(existing) if existing.state.is_live() => {
                let still_queued = existing
                    .job_id
                    .as_ref()
                    .map(|id| live_jobs.contains(id))
                    .unwrap_or(false);
                if still_queued {
                    tracing::debug!(step = alias, tag = %task.tag, "job still in queue, skipping");
                    outcome.skipped.push(task.tag);
                    continue;
                }
                // gone from the queue without an end marker: fail it first so
                // the fresh submission is a legal transition
                store.record(
                    alias,
                    &task.tag,
                    &TaskEntry {
                        state: TaskState::Failed,
                        reconciled_at: Some(clock.timestamp()),
                        ..TaskEntry::default()
                    },
                )?;
            }
            _ => {}
        }

        // 7. submit
        let task_path = task_config_path(config_path, alias, &task.tag);
        dump(&task_path, &Value::Object(task.config))?;

        let command_line = format!(
            "{} {} -c {}{}",
            opts.program,
            alias,
            task_path.display(),
            if opts.verbose { " -v" } else { "" }
        );
        let stdout_dir = log_directory.join("stdout");
        let spec = SubmitSpec {
            job_name: &job_name,
            command: &command_line,
            project_dir: store.project_dir(),
            stdout_dir: &stdout_dir,
            resources: &resources,
        };

        tracing::info!(step = alias, tag = %task.tag, backend = backend.name(), "submitting");
        let job_id = backend.submit(&spec).await?;

        store.replace(
            alias,
            &task.tag,
            TaskEntry {
                state: TaskState::Submitted,
                job_id: Some(job_id),
                time_submitted: Some(clock.timestamp()),
                hardware: Some(backend.hardware_label(&resources)),
                config_hash: Some(task.hash.clone()),
                ..TaskEntry::default()
            },
        )?;
        outcome.submitted.push(task.tag);
    }

    Ok(outcome)
}

/// Validate declared splits against the config and build the axes.
fn build_axes(
    alias: &str,
    splits: &[SplitSpec],
    cfg: &StepConfig,
    nodes: Option<usize>,
) -> Result<Vec<Axis>, EngineError> {
    let missing = |key: &str| EngineError::MissingSplitKey {
        step: alias.to_string(),
        key: key.to_string(),
    };
    let not_a_sequence = |key: &str| EngineError::SplitNotASequence {
        step: alias.to_string(),
        key: key.to_string(),
    };
    let empty = |key: &str| EngineError::EmptySplit {
        step: alias.to_string(),
        key: key.to_string(),
    };

    let sequence = |key: &str| -> Result<Vec<Value>, EngineError> {
        let value = cfg.get(key).ok_or_else(|| missing(key))?;
        let list = value.as_array().ok_or_else(|| not_a_sequence(key))?;
        if list.is_empty() {
            return Err(empty(key));
        }
        Ok(list.clone())
    };

    let mut axes = Vec::with_capacity(splits.len());
    for split in splits {
        match split {
            SplitSpec::Points => {
                let value = cfg
                    .get(SplitSpec::POINTS_KEY)
                    .ok_or_else(|| missing(SplitSpec::POINTS_KEY))?;
                let points = ProjectPoints::from_value(value, cfg.dir())?;
                let chunks = points.split(nodes.unwrap_or(1));
                axes.push(Axis::Points { chunks });
            }
            SplitSpec::Product(key) => {
                axes.push(Axis::Product {
                    key: key.clone(),
                    values: sequence(key)?,
                });
            }
            SplitSpec::Zipped(keys) => {
                let mut collected = Vec::with_capacity(keys.len());
                for key in keys {
                    collected.push((key.clone(), sequence(key)?));
                }
                let mut lengths = collected.iter().map(|(_, v)| v.len());
                if let Some(first) = lengths.next() {
                    if lengths.any(|len| len != first) {
                        return Err(EngineError::ZipLengthMismatch {
                            step: alias.to_string(),
                            keys: keys.join(", "),
                        });
                    }
                }
                axes.push(Axis::Zipped { keys: collected });
            }
        }
    }
    Ok(axes)
}

/// Walk the full product of the axes (declared order, last axis fastest)
/// and materialize each task's tag and config.
fn enumerate_tasks(
    alias: &str,
    axes: &[Axis],
    cfg: &StepConfig,
    accepts_tag: bool,
) -> Result<Vec<Task>, EngineError> {
    let dims: Vec<usize> = axes.iter().map(Axis::len).collect();
    let total: usize = dims.iter().product();

    let mut tasks = Vec::with_capacity(total);
    let mut seen = HashSet::with_capacity(total);
    for flat in 0..total {
        // decompose the flat index into one choice per axis
        let mut remainder = flat;
        let mut choices = vec![0usize; axes.len()];
        for (i, dim) in dims.iter().enumerate().rev() {
            choices[i] = remainder % dim;
            remainder /= dim;
        }

        let mut tag = String::new();
        let mut config = cfg.data.clone();
        for (axis, &choice) in axes.iter().zip(&choices) {
            match axis {
                Axis::Points { chunks } => {
                    tag.push_str(&points_fragment(choice));
                    let gids: Vec<Value> = chunks[choice]
                        .iter()
                        .map(|gid| Value::from(*gid))
                        .collect();
                    config.insert(SplitSpec::POINTS_KEY.to_string(), Value::Array(gids));
                    // the chunk is this task's whole point set
                    if let Some(Value::Object(control)) = config.get_mut("execution_control") {
                        control.remove("nodes");
                    }
                }
                Axis::Zipped { keys } => {
                    for (key, values) in keys {
                        tag.push_str(&fragment(key, &values[choice]));
                        config.insert(key.clone(), values[choice].clone());
                    }
                }
                Axis::Product { key, values } => {
                    tag.push_str(&fragment(key, &values[choice]));
                    config.insert(key.clone(), values[choice].clone());
                }
            }
        }

        if accepts_tag {
            config.insert("tag".to_string(), Value::String(tag.clone()));
        }
        if !seen.insert(tag.clone()) {
            return Err(EngineError::DuplicateTag {
                step: alias.to_string(),
                tag,
            });
        }

        let hash = config_hash(&Value::Object(config.clone()));
        tasks.push(Task { tag, config, hash });
    }
    Ok(tasks)
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
