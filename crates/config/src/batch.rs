// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch config: parameter sets that multiply a pipeline into sibling
//! project directories.

use crate::error::ConfigError;
use crate::format::load_mapping;
use crate::value;
use indexmap::IndexMap;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Name of the index CSV the expander writes beside the batch config.
pub const BATCH_INDEX_FILE: &str = "batch_jobs.csv";

/// One parameter set: a zipped sweep over `args`, substituted into `files`,
/// generating one subdirectory per tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSet {
    /// Argument lists, zipped in declaration order (all the same length)
    pub args: IndexMap<String, Vec<Value>>,
    /// Config files (relative to the batch dir) to substitute into
    pub files: Vec<PathBuf>,
    /// Prefix for generated subdirectory names
    pub set_tag: String,
}

impl BatchSet {
    /// Number of subdirectories this set generates.
    pub fn len(&self) -> usize {
        self.args.values().next().map(Vec::len).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self, key: &str) -> Result<(), ConfigError> {
        let mut lengths = self.args.values().map(Vec::len);
        let first = lengths.next().ok_or(ConfigError::InvalidValue {
            key: key.to_string(),
            message: "set has no args".to_string(),
        })?;
        if first == 0 {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "arg lists are empty".to_string(),
            });
        }
        if lengths.any(|len| len != first) {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "zipped arg lists have mismatched lengths".to_string(),
            });
        }
        if self.files.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: "set names no files".to_string(),
            });
        }
        Ok(())
    }
}

/// A parsed batch config: the pipeline it multiplies and its sets.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSpec {
    pub path: PathBuf,
    /// Pipeline config inside the source project directory
    pub pipeline_config: PathBuf,
    pub sets: Vec<BatchSet>,
}

impl BatchSpec {
    /// Load either form of batch config: a mapping with `pipeline_config` +
    /// `sets`, or a CSV table with one row per generated subdirectory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if path.extension().and_then(|e| e.to_str()) == Some("csv") {
            Self::load_table(path)
        } else {
            Self::load_sets(path)
        }
    }

    fn load_sets(path: &Path) -> Result<Self, ConfigError> {
        let map = load_mapping(path)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));

        let pipeline_config = dir.join(value::require_str(&map, "pipeline_config")?);
        let raw_sets = value::require_sequence(&map, "sets")?;

        let mut sets = Vec::with_capacity(raw_sets.len());
        for (i, raw) in raw_sets.iter().enumerate() {
            let key = format!("sets[{}]", i);
            let entry = raw.as_object().ok_or(ConfigError::WrongType {
                key: key.clone(),
                expected: "mapping",
            })?;

            let args_block = value::opt_mapping(entry, "args")?.ok_or(ConfigError::MissingKey {
                key: format!("{}.args", key),
            })?;
            let mut args = IndexMap::new();
            for (name, lists) in args_block {
                let values = lists.as_array().ok_or(ConfigError::WrongType {
                    key: format!("{}.args.{}", key, name),
                    expected: "sequence",
                })?;
                args.insert(name.clone(), values.clone());
            }

            let files = value::require_sequence(entry, "files")?
                .iter()
                .map(|f| {
                    f.as_str().map(PathBuf::from).ok_or(ConfigError::WrongType {
                        key: format!("{}.files", key),
                        expected: "string path",
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let set = BatchSet {
                args,
                files,
                set_tag: value::opt_str(entry, "set_tag")?.unwrap_or_default().to_string(),
            };
            set.validate(&key)?;
            sets.push(set);
        }

        Ok(BatchSpec {
            path: path.to_path_buf(),
            pipeline_config,
            sets,
        })
    }

    /// Tabular form: reserved columns `set_tag`, `pipeline_config`, `files`;
    /// every other column is a parameter. Each row generates exactly one
    /// subdirectory, so it becomes a one-tuple set.
    fn load_table(path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let table_err = |message: String| ConfigError::BatchIndex {
            path: display.clone(),
            message,
        };

        let mut reader =
            csv::Reader::from_path(path).map_err(|e| table_err(e.to_string()))?;
        let headers = reader
            .headers()
            .map_err(|e| table_err(e.to_string()))?
            .clone();

        for required in ["set_tag", "pipeline_config", "files"] {
            if !headers.iter().any(|h| h == required) {
                return Err(table_err(format!("missing reserved column: {}", required)));
            }
        }

        let mut pipeline_config = None;
        let mut sets = Vec::new();
        for (row_idx, row) in reader.records().enumerate() {
            let row = row.map_err(|e| table_err(e.to_string()))?;
            let field = |name: &str| -> &str {
                headers
                    .iter()
                    .position(|h| h == name)
                    .and_then(|i| row.get(i))
                    .unwrap_or_default()
                    .trim()
            };

            let row_pipeline = dir.join(field("pipeline_config"));
            match &pipeline_config {
                None => pipeline_config = Some(row_pipeline),
                Some(existing) if *existing != row_pipeline => {
                    return Err(table_err(format!(
                        "row {}: pipeline_config differs from earlier rows",
                        row_idx + 1
                    )));
                }
                Some(_) => {}
            }

            let mut args = IndexMap::new();
            for (i, header) in headers.iter().enumerate() {
                if matches!(header, "set_tag" | "pipeline_config" | "files") {
                    continue;
                }
                let raw = row.get(i).unwrap_or_default().trim();
                args.insert(header.to_string(), vec![parse_cell(raw)]);
            }

            let set = BatchSet {
                args,
                files: parse_files_cell(field("files")),
                set_tag: field("set_tag").to_string(),
            };
            set.validate(&format!("row {}", row_idx + 1))?;
            sets.push(set);
        }

        Ok(BatchSpec {
            path: path.to_path_buf(),
            pipeline_config: pipeline_config
                .ok_or_else(|| table_err("table has no rows".to_string()))?,
            sets,
        })
    }

    /// Directory the batch config lives in; subdirectories are created here.
    pub fn dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }
}

/// Cells are JSON scalars when they parse as such, strings otherwise.
fn parse_cell(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// The `files` cell is a JSON list, or a `;`-separated path list.
fn parse_files_cell(raw: &str) -> Vec<PathBuf> {
    if let Ok(list) = serde_json::from_str::<Vec<String>>(raw) {
        return list.into_iter().map(PathBuf::from).collect();
    }
    raw.split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(PathBuf::from)
        .collect()
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
