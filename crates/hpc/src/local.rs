// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local execution: the submission script runs synchronously in a child
//! process, inheriting the driver's stdio.

use crate::script::SubmitSpec;
use crate::HpcError;
use std::path::Path;
use tokio::process::Command;

/// Run the script to completion and return a generated job id.
///
/// The exit status is deliberately ignored here: the run guard inside the
/// command records success or failure in the status store, which is the
/// source of truth the executor reads.
pub async fn run(spec: &SubmitSpec<'_>, script: &Path) -> Result<String, HpcError> {
    let job_id = format!("local-{}", &uuid::Uuid::new_v4().to_string()[..8]);
    tracing::info!(job_name = spec.job_name, %job_id, "running locally");

    let status = Command::new("bash")
        .arg(script)
        .current_dir(spec.project_dir)
        .status()
        .await
        .map_err(|e| HpcError::SubmitFailed {
            job_name: spec.job_name.to_string(),
            message: format!("could not spawn bash: {}", e),
        })?;

    tracing::debug!(job_name = spec.job_name, code = status.code().unwrap_or(-1), "local run finished");
    Ok(job_id)
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
