// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step config: the `execution_control` block plus free-form parameters.

use crate::error::ConfigError;
use crate::format::load_mapping;
use crate::value;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Keys the platform itself understands inside `execution_control`.
const KNOWN_EXEC_KEYS: &[&str] = &[
    "option",
    "allocation",
    "walltime",
    "qos",
    "memory",
    "nodes",
    "queue",
    "feature",
    "conda_env",
    "module",
    "sh_script",
    "max_workers",
    "sites_per_worker",
];

/// The parsed `execution_control` block of a step config.
///
/// `max_workers` and `sites_per_worker` are passed through to the entry
/// point untouched; `nodes` is consumed by the dispatcher, everything else
/// by the submission backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionControl {
    /// `local` or a cluster backend name
    pub option: String,
    pub allocation: Option<String>,
    /// Hours, integer or fractional
    pub walltime: Option<f64>,
    pub qos: Option<String>,
    pub memory: Option<String>,
    pub nodes: Option<usize>,
    pub queue: Option<String>,
    pub feature: Option<String>,
    pub conda_env: Option<String>,
    pub module: Option<String>,
    pub sh_script: Option<String>,
    pub max_workers: Option<u64>,
    pub sites_per_worker: Option<u64>,
    /// Entry-point-declared extensions, in declaration order
    pub extra: IndexMap<String, Value>,
}

impl ExecutionControl {
    /// Parse and validate an `execution_control` mapping.
    ///
    /// `declared_extra` lists the extension keys the step's entry point
    /// accepts; anything else unrecognized fails fast before submission.
    pub fn parse(
        block: &Map<String, Value>,
        declared_extra: &[&str],
    ) -> Result<Self, ConfigError> {
        for key in block.keys() {
            if !KNOWN_EXEC_KEYS.contains(&key.as_str())
                && !declared_extra.contains(&key.as_str())
            {
                return Err(ConfigError::UnknownExecKey { key: key.clone() });
            }
        }

        let nodes = match value::opt_u64(block, "nodes")? {
            Some(0) => {
                return Err(ConfigError::InvalidValue {
                    key: "execution_control.nodes".to_string(),
                    message: "must be >= 1".to_string(),
                })
            }
            Some(n) => Some(n as usize),
            None => None,
        };

        let mut extra = IndexMap::new();
        for key in declared_extra {
            if let Some(val) = block.get(*key) {
                extra.insert((*key).to_string(), val.clone());
            }
        }

        Ok(ExecutionControl {
            option: value::require_str(block, "option")?.to_ascii_lowercase(),
            allocation: value::opt_str(block, "allocation")?.map(str::to_string),
            walltime: value::opt_f64(block, "walltime")?,
            qos: value::opt_str(block, "qos")?.map(str::to_string),
            memory: value::opt_stringy(block, "memory")?,
            nodes,
            queue: value::opt_str(block, "queue")?.map(str::to_string),
            feature: value::opt_str(block, "feature")?.map(str::to_string),
            conda_env: value::opt_str(block, "conda_env")?.map(str::to_string),
            module: value::opt_str(block, "module")?.map(str::to_string),
            sh_script: value::opt_str(block, "sh_script")?.map(str::to_string),
            max_workers: value::opt_u64(block, "max_workers")?,
            sites_per_worker: value::opt_u64(block, "sites_per_worker")?,
            extra,
        })
    }
}

/// A loaded step config file.
#[derive(Debug, Clone, PartialEq)]
pub struct StepConfig {
    pub path: PathBuf,
    pub data: Map<String, Value>,
}

impl StepConfig {
    /// Load a step config, rejecting placeholder values up front.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = load_mapping(path)?;
        value::reject_placeholders(&Value::Object(data.clone()))?;
        Ok(StepConfig {
            path: path.to_path_buf(),
            data,
        })
    }

    /// Build directly from a value tree (derived task configs).
    pub fn from_map(path: &Path, data: Map<String, Value>) -> Self {
        StepConfig {
            path: path.to_path_buf(),
            data,
        }
    }

    /// Directory the step config lives in; relative paths inside the config
    /// resolve against it.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Parse the `execution_control` block, which every step must carry.
    pub fn execution_control(
        &self,
        declared_extra: &[&str],
    ) -> Result<ExecutionControl, ConfigError> {
        let block = value::opt_mapping(&self.data, "execution_control")?.ok_or(
            ConfigError::MissingKey {
                key: "execution_control".to_string(),
            },
        )?;
        ExecutionControl::parse(block, declared_extra)
    }

    /// The step's log directory, `./logs` beside the config by default.
    pub fn log_directory(&self) -> Result<PathBuf, ConfigError> {
        Ok(match value::opt_str(&self.data, "log_directory")? {
            Some(dir) => self.dir().join(dir),
            None => self.dir().join("logs"),
        })
    }

    pub fn log_level(&self) -> Result<Option<String>, ConfigError> {
        Ok(value::opt_str(&self.data, "log_level")?.map(str::to_string))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// The whole config as a value tree (hashing, dumping).
    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
