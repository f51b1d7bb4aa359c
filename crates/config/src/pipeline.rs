// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pipeline config: the ordered step list and logging block.

use crate::error::ConfigError;
use crate::format::{load_mapping, ConfigFormat};
use crate::value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One entry of the `pipeline` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRef {
    /// Alias unique within the pipeline; keys the status store and logs
    pub alias: String,
    /// Step config path, relative paths resolved against the pipeline file
    pub config_path: PathBuf,
    /// Registered entry point to run; defaults to the alias
    pub command: Option<String>,
}

impl StepRef {
    /// The entry-point name this step runs.
    pub fn command_name(&self) -> &str {
        self.command.as_deref().unwrap_or(&self.alias)
    }
}

/// The `logging` block of a pipeline config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSpec {
    pub log_file: Option<PathBuf>,
    pub log_level: Option<String>,
}

/// A parsed pipeline config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineSpec {
    pub path: PathBuf,
    pub steps: Vec<StepRef>,
    pub logging: LoggingSpec,
}

impl PipelineSpec {
    /// Load and validate a pipeline config file.
    ///
    /// The `pipeline` key holds an ordered list of single-entry mappings
    /// `{alias: step-config-path}`, each optionally carrying a second
    /// `command` key naming a different entry point. An empty list is legal
    /// (the executor no-ops).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let map = load_mapping(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let raw_steps = value::require_sequence(&map, "pipeline")?;
        let mut steps = Vec::with_capacity(raw_steps.len());
        let mut seen = HashSet::new();
        for (i, raw) in raw_steps.iter().enumerate() {
            let entry = raw.as_object().ok_or(ConfigError::WrongType {
                key: format!("pipeline[{}]", i),
                expected: "mapping",
            })?;

            let mut alias = None;
            let mut config_path = None;
            let mut command = None;
            for (key, val) in entry {
                if key == "command" {
                    command = Some(
                        val.as_str()
                            .ok_or(ConfigError::WrongType {
                                key: format!("pipeline[{}].command", i),
                                expected: "string",
                            })?
                            .to_string(),
                    );
                } else if alias.is_none() {
                    let rel = val.as_str().ok_or(ConfigError::WrongType {
                        key: format!("pipeline[{}].{}", i, key),
                        expected: "string path",
                    })?;
                    alias = Some(key.clone());
                    config_path = Some(dir.join(rel));
                } else {
                    return Err(ConfigError::InvalidValue {
                        key: format!("pipeline[{}]", i),
                        message: format!("more than one step alias in entry: {}", key),
                    });
                }
            }

            let alias = alias.ok_or(ConfigError::InvalidValue {
                key: format!("pipeline[{}]", i),
                message: "entry names no step".to_string(),
            })?;
            if !seen.insert(alias.clone()) {
                return Err(ConfigError::DuplicateAlias { alias });
            }
            steps.push(StepRef {
                alias,
                // config_path is set whenever alias is
                config_path: config_path.unwrap_or_default(),
                command,
            });
        }

        let logging = match value::opt_mapping(&map, "logging")? {
            Some(block) => LoggingSpec {
                log_file: value::opt_str(block, "log_file")?.map(|s| dir.join(s)),
                log_level: value::opt_str(block, "log_level")?.map(str::to_string),
            },
            None => LoggingSpec::default(),
        };

        Ok(PipelineSpec {
            path: path.to_path_buf(),
            steps,
            logging,
        })
    }

    /// The project directory owning this pipeline.
    pub fn project_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    pub fn step(&self, alias: &str) -> Option<&StepRef> {
        self.steps.iter().find(|s| s.alias == alias)
    }
}

/// Whether a file name looks like a pipeline config (used by recursive
/// execution and batch discovery): a supported extension and a stem that
/// contains `pipeline`.
pub fn is_pipeline_config(file_name: &str) -> bool {
    let path = Path::new(file_name);
    if ConfigFormat::from_path(path).is_err() {
        return false;
    }
    path.file_stem()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase().contains("pipeline"))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
