// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timeout-wrapped scheduler command execution.

use crate::HpcError;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;

/// Scheduler round-trips (`sbatch`, `squeue`, `scancel`) finish in seconds
/// on a healthy cluster; a hung control daemon should not hang the driver.
pub const SCHEDULER_TIMEOUT: Duration = Duration::from_secs(30);

/// Run a scheduler command, bounding how long the driver can be suspended.
///
/// The child is killed when the timeout elapses (tokio's `Child` kills on
/// drop). A non-zero exit is reported with captured stderr.
pub async fn run_scheduler_command(
    mut cmd: Command,
    description: &str,
) -> Result<Output, HpcError> {
    let command_err = |message: String| HpcError::SchedulerCommand {
        command: description.to_string(),
        message,
    };

    let output = match tokio::time::timeout(SCHEDULER_TIMEOUT, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(io_err)) => return Err(command_err(io_err.to_string())),
        Err(_elapsed) => {
            return Err(command_err(format!(
                "timed out after {}s",
                SCHEDULER_TIMEOUT.as_secs()
            )))
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(command_err(format!(
            "exit {}: {}",
            output.status.code().unwrap_or(-1),
            stderr.trim()
        )));
    }
    Ok(output)
}
