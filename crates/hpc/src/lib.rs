// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swath-hpc: the submission backend
//!
//! A closed enum over the supported execution targets: `local` runs the
//! submission script synchronously in a child process, `slurm` hands it to
//! `sbatch` and watches it through `squeue`. New schedulers are added by
//! extending [`Backend`] and its match arms.

mod local;
mod resources;
mod script;
mod slurm;
mod subprocess;

pub use resources::{format_walltime, Resources};
pub use script::{script_path, submit_script, SubmitSpec, SCRIPT_DIR};

use std::collections::HashSet;
use std::path::Path;
use swath_config::ExecutionControl;
use thiserror::Error;

/// Errors from the submission backend.
#[derive(Debug, Error)]
pub enum HpcError {
    #[error("unknown execution option: {option} (expected local or slurm)")]
    UnknownOption { option: String },
    #[error("{backend} does not support execution_control key: {key}")]
    UnsupportedResource { backend: &'static str, key: &'static str },
    #[error("{backend} requires execution_control key: {key}")]
    MissingResource { backend: &'static str, key: &'static str },
    #[error("submission failed for {job_name}: {message}")]
    SubmitFailed { job_name: String, message: String },
    #[error("scheduler command failed: {command}: {message}")]
    SchedulerCommand { command: String, message: String },
    #[error("script I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// What the scheduler currently knows about a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueState {
    Queued,
    Running,
    /// Not in the queue: finished, cancelled, or never existed
    Unknown,
}

/// A submission target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Local,
    Slurm,
}

impl Backend {
    /// Resolve the `execution_control.option` value.
    pub fn from_option(option: &str) -> Result<Self, HpcError> {
        match option {
            "local" => Ok(Backend::Local),
            "slurm" => Ok(Backend::Slurm),
            other => Err(HpcError::UnknownOption {
                option: other.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Backend::Local => "local",
            Backend::Slurm => "slurm",
        }
    }

    /// Label recorded in the status store's `hardware` field.
    pub fn hardware_label(&self, resources: &Resources) -> String {
        match (self, &resources.queue) {
            (Backend::Local, _) => "local".to_string(),
            (Backend::Slurm, Some(queue)) => format!("slurm/{}", queue),
            (Backend::Slurm, None) => "slurm".to_string(),
        }
    }

    /// Validate an `execution_control` block against this backend.
    pub fn resources(&self, control: &ExecutionControl) -> Result<Resources, HpcError> {
        Resources::for_backend(*self, control)
    }

    /// Write the submission script and hand it to the target.
    ///
    /// Returns the scheduler job id (a generated id for local runs) once
    /// the job is accepted. Local jobs run to completion before this
    /// returns. Failure here is a submission error, never a task state.
    pub async fn submit(&self, spec: &SubmitSpec<'_>) -> Result<String, HpcError> {
        let script = submit_script(self, spec)?;
        match self {
            Backend::Local => local::run(spec, &script).await,
            Backend::Slurm => slurm::sbatch(spec, &script).await,
        }
    }

    /// Ask the scheduler about one job.
    pub async fn query(&self, job_id: &str) -> Result<QueueState, HpcError> {
        match self {
            // local jobs are gone from the "queue" the moment submit returns
            Backend::Local => Ok(QueueState::Unknown),
            Backend::Slurm => slurm::query(job_id).await,
        }
    }

    /// The scheduler's whole live queue, one round-trip. Used by
    /// reconciliation and dedupe.
    pub async fn live_jobs(&self) -> Result<HashSet<String>, HpcError> {
        match self {
            Backend::Local => Ok(HashSet::new()),
            Backend::Slurm => slurm::live_jobs().await,
        }
    }

    /// Best-effort cancellation.
    pub async fn cancel(&self, job_id: &str) -> Result<(), HpcError> {
        match self {
            Backend::Local => Ok(()),
            Backend::Slurm => slurm::cancel(job_id).await,
        }
    }
}

/// Remove a task's submission script once the task has completed.
pub fn cleanup_script(project_dir: &Path, job_name: &str) {
    let path = script_path(project_dir, job_name);
    if path.exists() {
        if let Err(error) = std::fs::remove_file(&path) {
            tracing::debug!(path = %path.display(), %error, "could not remove submission script");
        }
    }
}
