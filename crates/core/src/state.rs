// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task and step state machines.

use serde::{Deserialize, Serialize};
use std::fmt;

/// State of a single submitted task.
///
/// The full lifecycle is `not_submitted → submitted → running →
/// {successful|failed}`. A failed task re-enters `submitted` when the
/// pipeline is re-invoked; an explicit reset returns any task to
/// `not_submitted`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// No submission recorded yet
    #[default]
    NotSubmitted,
    /// Accepted by the scheduler, not yet started
    Submitted,
    /// Start marker observed
    Running,
    /// Finished with exit status zero
    Successful,
    /// Finished with a recorded error, or reconciled as gone
    Failed,
}

impl TaskState {
    /// Terminal states never change except via reset or re-submission.
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Successful | TaskState::Failed)
    }

    /// Whether the task occupies a scheduler slot (queued or executing).
    pub fn is_live(&self) -> bool {
        matches!(self, TaskState::Submitted | TaskState::Running)
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition(&self, next: TaskState) -> bool {
        use TaskState::*;
        match (*self, next) {
            // explicit reset
            (_, NotSubmitted) => true,
            (NotSubmitted, Submitted) => true,
            // local jobs can finish before a start marker lands
            (Submitted, Running) | (Submitted, Successful) | (Submitted, Failed) => true,
            (Running, Successful) | (Running, Failed) => true,
            // a failed task re-submits
            (Failed, Submitted) => true,
            _ => false,
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "not_submitted" | "not-submitted" => Ok(TaskState::NotSubmitted),
            "submitted" => Ok(TaskState::Submitted),
            "running" => Ok(TaskState::Running),
            "successful" => Ok(TaskState::Successful),
            "failed" => Ok(TaskState::Failed),
            other => Err(format!("unknown task state: {}", other)),
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::NotSubmitted => write!(f, "not_submitted"),
            TaskState::Submitted => write!(f, "submitted"),
            TaskState::Running => write!(f, "running"),
            TaskState::Successful => write!(f, "successful"),
            TaskState::Failed => write!(f, "failed"),
        }
    }
}

/// Aggregated state of one pipeline step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    /// Nothing dispatched yet
    Pending,
    /// At least one task is submitted or running
    Active,
    /// Every task finished successfully
    Done,
    /// No task is live and at least one failed
    Failed,
}

impl StepState {
    /// Fold task states into a step state.
    ///
    /// `Done` iff every task is successful; `Active` iff any task is live;
    /// `Failed` iff none is live and at least one failed. Zero tasks
    /// aggregate to `Pending` (dispatch rejects empty steps upstream).
    pub fn aggregate<'a>(states: impl IntoIterator<Item = &'a TaskState>) -> StepState {
        let mut total = 0usize;
        let mut successful = 0usize;
        let mut failed = 0usize;
        let mut live = 0usize;
        for state in states {
            total += 1;
            match state {
                TaskState::Successful => successful += 1,
                TaskState::Failed => failed += 1,
                TaskState::Submitted | TaskState::Running => live += 1,
                TaskState::NotSubmitted => {}
            }
        }
        if total == 0 {
            StepState::Pending
        } else if successful == total {
            StepState::Done
        } else if live > 0 {
            StepState::Active
        } else if failed > 0 {
            StepState::Failed
        } else {
            StepState::Pending
        }
    }
}

impl fmt::Display for StepState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepState::Pending => write!(f, "pending"),
            StepState::Active => write!(f, "active"),
            StepState::Done => write!(f, "done"),
            StepState::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
