// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Submission-script generation.
//!
//! One shell script per task, written under `.swath-scripts/` in the
//! project directory. The backend owns the file; the dispatcher removes it
//! once the task completes successfully.

use crate::resources::{format_walltime, Resources};
use crate::{Backend, HpcError};
use std::path::{Path, PathBuf};

/// Directory for generated submission scripts, inside the project dir.
pub const SCRIPT_DIR: &str = ".swath-scripts";

/// Everything needed to write and submit one task's script.
#[derive(Debug, Clone)]
pub struct SubmitSpec<'a> {
    /// `<step-alias><tag>`, unique within the project
    pub job_name: &'a str,
    /// The command line the node runs: `<program> <alias> -c <config> [-v]`
    pub command: &'a str,
    /// Working directory for the job
    pub project_dir: &'a Path,
    /// Where scheduler stdout/stderr land
    pub stdout_dir: &'a Path,
    pub resources: &'a Resources,
}

/// Path of the submission script for a job name.
pub fn script_path(project_dir: &Path, job_name: &str) -> PathBuf {
    project_dir.join(SCRIPT_DIR).join(format!("{}.sh", job_name))
}

/// Render and write the submission script, returning its path.
pub fn submit_script(backend: &Backend, spec: &SubmitSpec<'_>) -> Result<PathBuf, HpcError> {
    let path = script_path(spec.project_dir, spec.job_name);
    let io_err = |p: &Path, source: std::io::Error| HpcError::Io {
        path: p.display().to_string(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    std::fs::create_dir_all(spec.stdout_dir).map_err(|e| io_err(spec.stdout_dir, e))?;

    std::fs::write(&path, render(backend, spec)).map_err(|e| io_err(&path, e))?;
    Ok(path)
}

/// The script text: scheduler directives, environment activation, the
/// optional preamble, then the command from the project directory. The
/// command's run guard records the end-of-job status itself, so the script
/// just propagates the exit code.
pub fn render(backend: &Backend, spec: &SubmitSpec<'_>) -> String {
    let mut lines = vec!["#!/bin/bash".to_string()];
    let resources = spec.resources;

    if *backend == Backend::Slurm {
        lines.push(format!("#SBATCH --job-name={}", spec.job_name));
        if let Some(allocation) = &resources.allocation {
            lines.push(format!("#SBATCH --account={}", allocation));
        }
        if let Some(walltime) = resources.walltime {
            lines.push(format!("#SBATCH --time={}", format_walltime(walltime)));
        }
        if let Some(qos) = &resources.qos {
            lines.push(format!("#SBATCH --qos={}", qos));
        }
        if let Some(memory) = &resources.memory {
            lines.push(format!("#SBATCH --mem={}G", memory));
        }
        if let Some(queue) = &resources.queue {
            lines.push(format!("#SBATCH --partition={}", queue));
        }
        if let Some(feature) = &resources.feature {
            lines.push(format!("#SBATCH {}", feature));
        }
        lines.push(format!(
            "#SBATCH --output={}/{}_%j.o",
            spec.stdout_dir.display(),
            spec.job_name
        ));
        lines.push(format!(
            "#SBATCH --error={}/{}_%j.e",
            spec.stdout_dir.display(),
            spec.job_name
        ));
    }

    lines.push(String::new());
    lines.push("set -eo pipefail".to_string());

    if let Some(module) = &resources.module {
        lines.push(format!("module load {}", module));
    }
    if let Some(conda_env) = &resources.conda_env {
        lines.push(format!("source activate {}", conda_env));
    }
    if let Some(sh_script) = &resources.sh_script {
        lines.push(sh_script.clone());
    }

    lines.push(format!("cd {}", spec.project_dir.display()));
    lines.push(spec.command.to_string());
    lines.push(String::new());
    lines.join("\n")
}

#[cfg(test)]
#[path = "script_tests.rs"]
mod tests;
