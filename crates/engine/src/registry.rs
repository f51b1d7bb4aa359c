// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry-point registration.
//!
//! Every compute entry point is described by an explicit descriptor: its
//! command name, the split keys it declares (and how they combine), the
//! platform parameters it wants injected, and the functions the driver and
//! the node run. The descriptor is the whole contract; nothing is
//! introspected.

use crate::EngineError;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use swath_config::StepConfig;

/// How one declared split enters the task product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SplitSpec {
    /// Full cartesian axis over one config key
    Product(String),
    /// Keys that advance together; their lists must share a length
    Zipped(Vec<String>),
    /// The `project_points` axis, chunked across `execution_control.nodes`
    Points,
}

impl SplitSpec {
    /// The config key the points axis reads.
    pub const POINTS_KEY: &'static str = "project_points";
}

/// Platform parameters handed to a config pre-processor.
#[derive(Debug, Clone)]
pub struct PlatformParams<'a> {
    /// The step alias being dispatched
    pub job_name: &'a str,
    pub log_directory: &'a Path,
    pub verbose: bool,
}

/// Driver-side config pre-processor: may mutate the step config in place;
/// an `Err` aborts dispatch before any submission.
pub type PreprocessFn = fn(&mut StepConfig, &PlatformParams<'_>) -> Result<(), String>;

/// Node-side compute function. Returns the output artifact path, if any.
pub type RunFn = fn(&StepConfig) -> Result<Option<PathBuf>, String>;

/// The explicit contract for one registered entry point.
#[derive(Clone)]
pub struct EntryPoint {
    pub name: String,
    pub description: String,
    /// Declared splits, in the order their tag fragments concatenate
    pub splits: Vec<SplitSpec>,
    /// Whether the task tag is injected into the task config
    pub accepts_tag: bool,
    /// `execution_control` extension keys this entry point understands
    pub extra_exec_keys: Vec<String>,
    /// Step-config keys template emission marks `[REQUIRED]`
    pub required_keys: Vec<String>,
    pub preprocess: Option<PreprocessFn>,
    pub run: RunFn,
}

impl std::fmt::Debug for EntryPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryPoint")
            .field("name", &self.name)
            .field("splits", &self.splits)
            .field("accepts_tag", &self.accepts_tag)
            .finish_non_exhaustive()
    }
}

impl EntryPoint {
    pub fn splits_on_points(&self) -> bool {
        self.splits.iter().any(|s| matches!(s, SplitSpec::Points))
    }

    /// Extension keys as the slice `ExecutionControl::parse` wants.
    pub fn extra_exec_keys(&self) -> Vec<&str> {
        self.extra_exec_keys.iter().map(String::as_str).collect()
    }
}

/// The set of entry points a driver binary exposes.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    entries: IndexMap<String, EntryPoint>,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn register(&mut self, entry: EntryPoint) {
        self.entries.insert(entry.name.clone(), entry);
    }

    pub fn get(&self, command: &str) -> Result<&EntryPoint, EngineError> {
        self.entries
            .get(command)
            .ok_or_else(|| EngineError::UnknownCommand {
                command: command.to_string(),
            })
    }

    pub fn contains(&self, command: &str) -> bool {
        self.entries.contains_key(command)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntryPoint> {
        self.entries.values()
    }
}

/// The registry the shipped binary exposes: the generic `script` runner.
/// Library users add their own compute entry points beside it.
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    registry.register(EntryPoint {
        name: "script".to_string(),
        description: "Run the shell command in the `cmd` config key".to_string(),
        splits: Vec::new(),
        accepts_tag: false,
        extra_exec_keys: Vec::new(),
        required_keys: vec!["cmd".to_string()],
        preprocess: None,
        run: run_script,
    });
    registry
}

/// The built-in `script` entry point: run `cmd` through the shell from the
/// config's directory.
fn run_script(config: &StepConfig) -> Result<Option<PathBuf>, String> {
    let cmd = config
        .get("cmd")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "script step needs a string `cmd` key".to_string())?;

    let status = Command::new("bash")
        .args(["-c", cmd])
        .current_dir(config.dir())
        .status()
        .map_err(|e| format!("could not spawn shell: {}", e))?;

    if status.success() {
        Ok(None)
    } else {
        Err(format!("command exited with {}", status.code().unwrap_or(-1)))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
