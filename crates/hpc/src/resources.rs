// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Backend resource validation and rendering.

use crate::{Backend, HpcError};
use swath_config::ExecutionControl;

/// The subset of `execution_control` the submission backend consumes,
/// validated for the chosen backend.
///
/// `nodes` never appears here (the dispatcher consumes it) and
/// `max_workers` / `sites_per_worker` pass through to the entry point in
/// the task config.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Resources {
    pub allocation: Option<String>,
    /// Hours, already validated; rendered `HH:MM:SS` for the scheduler
    pub walltime: Option<f64>,
    pub qos: Option<String>,
    /// Gigabytes or a scheduler-native string
    pub memory: Option<String>,
    pub queue: Option<String>,
    /// Extra scheduler directive, emitted verbatim (`--exclusive`)
    pub feature: Option<String>,
    pub conda_env: Option<String>,
    pub module: Option<String>,
    pub sh_script: Option<String>,
}

impl Resources {
    /// Validate the block for `backend`, failing fast on keys the target
    /// cannot honor and on scheduler requirements left unset.
    pub fn for_backend(
        backend: Backend,
        control: &ExecutionControl,
    ) -> Result<Self, HpcError> {
        if backend == Backend::Local {
            let scheduler_only: [(&'static str, bool); 5] = [
                ("allocation", control.allocation.is_some()),
                ("walltime", control.walltime.is_some()),
                ("qos", control.qos.is_some()),
                ("queue", control.queue.is_some()),
                ("feature", control.feature.is_some()),
            ];
            for (key, set) in scheduler_only {
                if set {
                    return Err(HpcError::UnsupportedResource {
                        backend: backend.name(),
                        key,
                    });
                }
            }
        } else {
            for (key, set) in [
                ("allocation", control.allocation.is_some()),
                ("walltime", control.walltime.is_some()),
            ] {
                if !set {
                    return Err(HpcError::MissingResource {
                        backend: backend.name(),
                        key,
                    });
                }
            }
        }

        Ok(Resources {
            allocation: control.allocation.clone(),
            walltime: control.walltime,
            qos: control.qos.clone(),
            memory: control.memory.clone(),
            queue: control.queue.clone(),
            feature: control.feature.clone(),
            conda_env: control.conda_env.clone(),
            module: control.module.clone(),
            sh_script: control.sh_script.clone(),
        })
    }
}

/// Render fractional hours as the `HH:MM:SS` walltime schedulers expect.
/// Sub-minute remainders round up to a whole minute so a requested budget
/// is never shortened.
pub fn format_walltime(hours: f64) -> String {
    let total_minutes = (hours.max(0.0) * 60.0).ceil() as u64;
    format!("{:02}:{:02}:00", total_minutes / 60, total_minutes % 60)
}

#[cfg(test)]
#[path = "resources_tests.rs"]
mod tests;
