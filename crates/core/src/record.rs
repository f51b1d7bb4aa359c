// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-task status record.

use crate::state::TaskState;
use serde::{Deserialize, Serialize};

/// Everything the status store knows about one task.
///
/// All fields except `state` are optional so that partial records (a start
/// marker, an end marker) can be merged into the aggregate as they arrive.
/// Key names are stable; the file is read by humans.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskEntry {
    #[serde(default)]
    pub state: TaskState,
    /// Scheduler job id, or a generated id for local runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// RFC 3339 submission time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_submitted: Option<String>,
    /// RFC 3339 start-marker time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start: Option<String>,
    /// RFC 3339 end-marker time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_end: Option<String>,
    /// Wall seconds between start and end markers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_runtime: Option<f64>,
    /// Backend label, `<scheduler>` or `<scheduler>/<queue>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<String>,
    /// Output artifact path reported by the entry point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_out: Option<String>,
    /// Error text captured by the run guard when the entry point failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Hash of the task config this entry was submitted with
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    /// Set when reconciliation failed the task (job gone from the queue)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reconciled_at: Option<String>,
}

impl TaskEntry {
    /// A fresh entry in the given state.
    pub fn with_state(state: TaskState) -> Self {
        TaskEntry {
            state,
            ..TaskEntry::default()
        }
    }

    /// Fold `update` into this entry.
    ///
    /// Present fields overwrite absent or stale ones. The state only moves
    /// along legal transitions, so a late-arriving `running` marker cannot
    /// regress a terminal entry, and a merge never performs a reset
    /// (`not_submitted` updates are ignored; reset is an explicit store
    /// operation).
    pub fn merge(&mut self, update: &TaskEntry) {
        if update.state != self.state
            && update.state != TaskState::NotSubmitted
            && self.state.can_transition(update.state)
        {
            self.state = update.state;
        }
        merge_field(&mut self.job_id, &update.job_id);
        merge_field(&mut self.time_submitted, &update.time_submitted);
        merge_field(&mut self.time_start, &update.time_start);
        merge_field(&mut self.time_end, &update.time_end);
        merge_field(&mut self.total_runtime, &update.total_runtime);
        merge_field(&mut self.hardware, &update.hardware);
        merge_field(&mut self.job_out, &update.job_out);
        merge_field(&mut self.error, &update.error);
        merge_field(&mut self.config_hash, &update.config_hash);
        merge_field(&mut self.reconciled_at, &update.reconciled_at);
    }
}

fn merge_field<T: Clone>(slot: &mut Option<T>, update: &Option<T>) {
    if let Some(value) = update {
        *slot = Some(value.clone());
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
