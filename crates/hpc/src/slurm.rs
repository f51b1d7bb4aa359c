// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SLURM backend: `sbatch` submission, `squeue` queries, `scancel`.

use crate::script::SubmitSpec;
use crate::subprocess::run_scheduler_command;
use crate::{HpcError, QueueState};
use std::collections::HashSet;
use std::path::Path;
use tokio::process::Command;

/// Submit the script with `sbatch` and parse the accepted job id.
pub async fn sbatch(spec: &SubmitSpec<'_>, script: &Path) -> Result<String, HpcError> {
    let mut cmd = Command::new("sbatch");
    cmd.arg(script).current_dir(spec.project_dir);

    let output = run_scheduler_command(cmd, "sbatch")
        .await
        .map_err(|e| HpcError::SubmitFailed {
            job_name: spec.job_name.to_string(),
            message: e.to_string(),
        })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let job_id = parse_sbatch_output(&stdout).ok_or_else(|| HpcError::SubmitFailed {
        job_name: spec.job_name.to_string(),
        message: format!("sbatch accepted the job but printed no id: {}", stdout.trim()),
    })?;
    tracing::info!(job_name = spec.job_name, %job_id, "sbatch accepted");
    Ok(job_id)
}

/// Ask `squeue` about one job.
pub async fn query(job_id: &str) -> Result<QueueState, HpcError> {
    let mut cmd = Command::new("squeue");
    cmd.args(["-j", job_id, "-h", "-o", "%T"]);

    // squeue exits non-zero for unknown job ids; that is an answer, not an
    // error
    match run_scheduler_command(cmd, "squeue").await {
        Ok(output) => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            Ok(parse_queue_state(stdout.trim()))
        }
        Err(HpcError::SchedulerCommand { message, .. }) if message.contains("Invalid job id") => {
            Ok(QueueState::Unknown)
        }
        Err(e) => Err(e),
    }
}

/// All of this user's live job ids, one round-trip.
pub async fn live_jobs() -> Result<HashSet<String>, HpcError> {
    let mut cmd = Command::new("squeue");
    cmd.args(["--me", "-h", "-o", "%A"]);

    let output = run_scheduler_command(cmd, "squeue").await?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_live_jobs(&stdout))
}

/// Best-effort `scancel`.
pub async fn cancel(job_id: &str) -> Result<(), HpcError> {
    let mut cmd = Command::new("scancel");
    cmd.arg(job_id);
    run_scheduler_command(cmd, "scancel").await?;
    Ok(())
}

/// `sbatch` prints `Submitted batch job <id>` on success.
fn parse_sbatch_output(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("Submitted batch job "))
        .map(|id| id.trim().to_string())
        .find(|id| !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()))
}

fn parse_queue_state(state: &str) -> QueueState {
    match state {
        "PENDING" | "CONFIGURING" | "REQUEUED" | "SUSPENDED" => QueueState::Queued,
        "RUNNING" | "COMPLETING" => QueueState::Running,
        _ => QueueState::Unknown,
    }
}

fn parse_live_jobs(stdout: &str) -> HashSet<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "slurm_tests.rs"]
mod tests;
