// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Aggregated status snapshot plus the single-record fold.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use swath_core::{Clock, TaskEntry, TaskState};

/// Aggregated status file name inside a project directory.
pub const STATUS_FILE: &str = "swath_status.json";
/// Directory of pending single-record files dropped by running jobs.
pub const PENDING_DIR: &str = ".swath-status";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("status I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("status file corrupt at {path}: {source}")]
    Corrupt {
        path: String,
        source: serde_json::Error,
    },
    #[error("illegal state transition for {step}/{tag}: {from} -> {to}")]
    IllegalTransition {
        step: String,
        tag: String,
        from: TaskState,
        to: TaskState,
    },
}

/// One single-record file: a partial update for exactly one task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingRecord {
    pub step: String,
    pub tag: String,
    pub entry: TaskEntry,
}

/// The aggregate: step alias -> task tag -> entry, plus the monitor token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Status {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    monitor_pid: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    monitor_heartbeat: Option<String>,
    #[serde(flatten)]
    steps: IndexMap<String, IndexMap<String, TaskEntry>>,
}

/// The per-project status store.
///
/// Owned and written only by the driver process; jobs communicate through
/// [`record_pending`] files that [`StatusStore::open`] folds in.
#[derive(Debug)]
pub struct StatusStore {
    project_dir: PathBuf,
    status: Status,
}

impl StatusStore {
    /// Open (or create) the store for a project directory, folding any
    /// pending single-record files into the aggregate first.
    pub fn open(project_dir: &Path) -> Result<Self, StoreError> {
        let status_path = project_dir.join(STATUS_FILE);
        let status = if status_path.exists() {
            let text = std::fs::read_to_string(&status_path).map_err(|source| StoreError::Io {
                path: status_path.display().to_string(),
                source,
            })?;
            serde_json::from_str(&text).map_err(|source| StoreError::Corrupt {
                path: status_path.display().to_string(),
                source,
            })?
        } else {
            Status::default()
        };

        let mut store = StatusStore {
            project_dir: project_dir.to_path_buf(),
            status,
        };
        store.fold_pending()?;
        Ok(store)
    }

    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Read-only bulk view of all steps.
    pub fn steps(&self) -> impl Iterator<Item = (&str, &IndexMap<String, TaskEntry>)> {
        self.status
            .steps
            .iter()
            .map(|(alias, tasks)| (alias.as_str(), tasks))
    }

    pub fn step(&self, alias: &str) -> Option<&IndexMap<String, TaskEntry>> {
        self.status.steps.get(alias)
    }

    pub fn entry(&self, step: &str, tag: &str) -> Option<&TaskEntry> {
        self.status.steps.get(step).and_then(|tasks| tasks.get(tag))
    }

    /// Aggregated rows for tabulation, optionally restricted to one step.
    pub fn summary(&self, step: Option<&str>) -> Vec<(&str, &str, &TaskEntry)> {
        self.status
            .steps
            .iter()
            .filter(|(alias, _)| step.map(|s| s == alias.as_str()).unwrap_or(true))
            .flat_map(|(alias, tasks)| {
                tasks
                    .iter()
                    .map(move |(tag, entry)| (alias.as_str(), tag.as_str(), entry))
            })
            .collect()
    }

    /// Merge fields into one task's entry and persist the aggregate.
    pub fn record(&mut self, step: &str, tag: &str, update: &TaskEntry) -> Result<(), StoreError> {
        self.status
            .steps
            .entry(step.to_string())
            .or_default()
            .entry(tag.to_string())
            .or_default()
            .merge(update);
        self.persist()
    }

    /// Replace one task's entry wholesale (submission and re-submission).
    ///
    /// Unlike [`record`](Self::record) this drops stale fields from the
    /// previous attempt, and it refuses illegal transitions, so a
    /// successful task can never be silently re-submitted.
    pub fn replace(&mut self, step: &str, tag: &str, entry: TaskEntry) -> Result<(), StoreError> {
        let tasks = self.status.steps.entry(step.to_string()).or_default();
        if let Some(existing) = tasks.get(tag) {
            if !existing.state.can_transition(entry.state) {
                return Err(StoreError::IllegalTransition {
                    step: step.to_string(),
                    tag: tag.to_string(),
                    from: existing.state,
                    to: entry.state,
                });
            }
        }
        tasks.insert(tag.to_string(), entry);
        self.persist()
    }

    /// Fail every live entry whose job is gone from the scheduler queue.
    ///
    /// `live_job_ids` is the scheduler's current queue (one bulk query);
    /// an entry in `submitted`/`running` with no end time and a job id
    /// outside that set transitions to `failed` with a reconciliation
    /// stamp. Returns the (step, tag) pairs that were failed.
    pub fn reconcile(
        &mut self,
        live_job_ids: &HashSet<String>,
        clock: &impl Clock,
    ) -> Result<Vec<(String, String)>, StoreError> {
        let stamp = clock.timestamp();
        let mut failed = Vec::new();
        for (step, tasks) in &mut self.status.steps {
            for (tag, entry) in tasks {
                if !entry.state.is_live() || entry.time_end.is_some() {
                    continue;
                }
                let gone = match &entry.job_id {
                    Some(id) => !live_job_ids.contains(id),
                    None => true,
                };
                if gone {
                    tracing::warn!(%step, %tag, job_id = ?entry.job_id, "job gone from queue, marking failed");
                    entry.state = TaskState::Failed;
                    entry.reconciled_at = Some(stamp.clone());
                    failed.push((step.clone(), tag.clone()));
                }
            }
        }
        if !failed.is_empty() {
            self.persist()?;
        }
        Ok(failed)
    }

    /// Reset entries to `not_submitted`: all of them, or only the steps
    /// strictly after `after` in `step_order`. Artifact files on disk are
    /// untouched. Returns the number of entries reset.
    pub fn reset(
        &mut self,
        step_order: &[String],
        after: Option<&str>,
    ) -> Result<usize, StoreError> {
        let targets: Vec<String> = match after {
            None => self.status.steps.keys().cloned().collect(),
            Some(alias) => {
                let position = step_order.iter().position(|s| s == alias);
                match position {
                    Some(i) => step_order[i + 1..].to_vec(),
                    None => Vec::new(),
                }
            }
        };

        let mut count = 0;
        for step in &targets {
            if let Some(tasks) = self.status.steps.get_mut(step) {
                for entry in tasks.values_mut() {
                    *entry = TaskEntry::default();
                    count += 1;
                }
            }
        }
        if count > 0 {
            self.persist()?;
        }
        Ok(count)
    }

    /// The monitor's liveness token.
    pub fn monitor_pid(&self) -> Option<u32> {
        self.status.monitor_pid
    }

    pub fn set_monitor(
        &mut self,
        pid: Option<u32>,
        clock: &impl Clock,
    ) -> Result<(), StoreError> {
        self.status.monitor_pid = pid;
        self.status.monitor_heartbeat = pid.map(|_| clock.timestamp());
        self.persist()
    }

    /// Refresh the heartbeat beside an existing pid token.
    pub fn touch_monitor(&mut self, clock: &impl Clock) -> Result<(), StoreError> {
        if self.status.monitor_pid.is_some() {
            self.status.monitor_heartbeat = Some(clock.timestamp());
            self.persist()?;
        }
        Ok(())
    }

    /// Fold pending single-record files into the aggregate, then remove
    /// them. Files are applied in name order; the entry merge enforces
    /// transition legality, so a stale start marker can never undo a
    /// terminal record.
    fn fold_pending(&mut self) -> Result<(), StoreError> {
        let pending_dir = self.project_dir.join(PENDING_DIR);
        if !pending_dir.is_dir() {
            return Ok(());
        }

        let io_err = |path: &Path, source: std::io::Error| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        let mut paths = Vec::new();
        for dirent in std::fs::read_dir(&pending_dir).map_err(|e| io_err(&pending_dir, e))? {
            let path = dirent.map_err(|e| io_err(&pending_dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                paths.push(path);
            }
        }
        if paths.is_empty() {
            return Ok(());
        }
        paths.sort();

        let mut folded = Vec::new();
        for path in &paths {
            let text = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
            match serde_json::from_str::<PendingRecord>(&text) {
                Ok(record) => {
                    self.status
                        .steps
                        .entry(record.step)
                        .or_default()
                        .entry(record.tag)
                        .or_default()
                        .merge(&record.entry);
                    folded.push(path.clone());
                }
                Err(error) => {
                    // a writer mid-rename cannot produce this; a truncated
                    // file would, so leave it for inspection
                    tracing::warn!(path = %path.display(), %error, "skipping unreadable status record");
                }
            }
        }

        // only drop the inputs once the fold is durable
        self.persist()?;
        for path in folded {
            if let Err(error) = std::fs::remove_file(&path) {
                tracing::warn!(path = %path.display(), %error, "could not remove folded record");
            }
        }
        Ok(())
    }

    /// Atomically replace the aggregate snapshot: write a temp file, fsync,
    /// rename into place, fsync the directory.
    fn persist(&self) -> Result<(), StoreError> {
        let final_path = self.project_dir.join(STATUS_FILE);
        let tmp_path = self
            .project_dir
            .join(format!("{}.tmp.{}", STATUS_FILE, std::process::id()));
        let io_err = |path: &Path, source: std::io::Error| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        let mut text = serde_json::to_string_pretty(&self.status).map_err(|source| {
            StoreError::Corrupt {
                path: final_path.display().to_string(),
                source,
            }
        })?;
        text.push('\n');

        let mut file = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
        file.write_all(text.as_bytes())
            .map_err(|e| io_err(&tmp_path, e))?;
        file.sync_all().map_err(|e| io_err(&tmp_path, e))?;
        std::fs::rename(&tmp_path, &final_path).map_err(|e| io_err(&final_path, e))?;
        if let Ok(dir) = File::open(&self.project_dir) {
            let _ = dir.sync_all();
        }
        Ok(())
    }
}

/// Drop a single-record status file for one task, safe under any number of
/// concurrent writers: write to a temp name, fsync, rename into the pending
/// directory. `event` distinguishes the start and end markers of one job so
/// neither overwrites the other before a fold.
pub fn record_pending(
    project_dir: &Path,
    step: &str,
    tag: &str,
    event: &str,
    entry: &TaskEntry,
) -> Result<(), StoreError> {
    let pending_dir = project_dir.join(PENDING_DIR);
    let io_err = |path: &Path, source: std::io::Error| StoreError::Io {
        path: path.display().to_string(),
        source,
    };
    std::fs::create_dir_all(&pending_dir).map_err(|e| io_err(&pending_dir, e))?;

    let record = PendingRecord {
        step: step.to_string(),
        tag: tag.to_string(),
        entry: entry.clone(),
    };
    let text = serde_json::to_string_pretty(&record).map_err(|source| StoreError::Corrupt {
        path: pending_dir.display().to_string(),
        source,
    })?;

    let file_tag = if tag.is_empty() { "solo" } else { tag };
    let final_path = pending_dir.join(format!("{}.{}.{}.json", step, file_tag, event));
    let tmp_path = pending_dir.join(format!(
        ".{}.{}.{}.{}.tmp",
        step,
        file_tag,
        event,
        std::process::id()
    ));

    let mut file = File::create(&tmp_path).map_err(|e| io_err(&tmp_path, e))?;
    file.write_all(text.as_bytes())
        .map_err(|e| io_err(&tmp_path, e))?;
    file.sync_all().map_err(|e| io_err(&tmp_path, e))?;
    std::fs::rename(&tmp_path, &final_path).map_err(|e| io_err(&final_path, e))?;
    Ok(())
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
