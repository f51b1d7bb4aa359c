// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swath status` - tabulate the status store.

use crate::table;
use anyhow::Result;
use clap::Args;
use swath_core::{format_runtime, TaskState};
use swath_store::StatusStore;

#[derive(Args)]
pub struct StatusArgs {
    /// Only show these steps
    #[arg(value_name = "STEP")]
    steps: Vec<String>,

    /// Only show tasks in these states
    #[arg(short = 's', long = "state", value_name = "STATE")]
    states: Vec<TaskState>,

    /// Raw JSON instead of a table
    #[arg(long)]
    json: bool,
}

pub fn run(args: StatusArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let store = StatusStore::open(&cwd)?;

    let mut rows = Vec::new();
    let mut json_steps = serde_json::Map::new();
    for (step, tag, entry) in store.summary(None) {
        if !args.steps.is_empty() && !args.steps.iter().any(|s| s == step) {
            continue;
        }
        if !args.states.is_empty() && !args.states.contains(&entry.state) {
            continue;
        }
        if args.json {
            let tasks = json_steps
                .entry(step.to_string())
                .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
            if let Some(tasks) = tasks.as_object_mut() {
                tasks.insert(tag.to_string(), serde_json::to_value(entry)?);
            }
            continue;
        }
        rows.push(vec![
            step.to_string(),
            tag.to_string(),
            entry.job_id.clone().unwrap_or_else(|| "-".to_string()),
            entry.state.to_string(),
            entry
                .total_runtime
                .map(format_runtime)
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::Value::Object(json_steps))?
        );
        return Ok(());
    }

    if rows.is_empty() {
        println!("no status recorded in {}", cwd.display());
        return Ok(());
    }
    print!(
        "{}",
        table::render(&["step", "tag", "job_id", "state", "runtime"], &rows)
    );
    if let Some(pid) = store.monitor_pid() {
        println!("\nmonitor active (pid {})", pid);
    }
    Ok(())
}
