// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The batch expander: materialize a parameter sweep into sibling project
//! directories and drive the pipeline across all of them.
//!
//! Subdirectory names and contents are deterministic: the same batch
//! config always generates the same tree, so re-running an interrupted
//! expansion is safe.

use crate::executor::{run_once, spawn_background_monitor, CycleOutcome, ExecOptions};
use crate::registry::Registry;
use crate::EngineError;
use indexmap::IndexMap;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use swath_config::{dump, load, BatchSpec, BATCH_INDEX_FILE};
use swath_core::{canonical_json, fragment, Clock};
use swath_store::STATUS_FILE;

/// Batch driver settings.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Expand directories and write the index, but submit nothing
    pub dry_run: bool,
    /// Detach one background monitor per generated pipeline
    pub monitor_background: bool,
    /// Program path for background monitors
    pub program: PathBuf,
    pub verbose: bool,
}

/// One generated sub-project.
#[derive(Debug, Clone)]
pub struct BatchJob {
    /// Subdirectory name: `set_tag` + one fragment per argument
    pub name: String,
    pub dir: PathBuf,
    pub set_tag: String,
    /// Scalar values substituted into this job's config files
    pub values: IndexMap<String, Value>,
    /// Files (relative names) the values were substituted into
    pub files: Vec<PathBuf>,
}

/// Enumerate and materialize every sub-project: create the directory, copy
/// the source project's files verbatim, substitute the set's scalars into
/// the listed files, and write the index CSV.
pub fn expand_batch(spec: &BatchSpec) -> Result<Vec<BatchJob>, EngineError> {
    let jobs = enumerate_jobs(spec)?;
    let source_dir = spec.dir();

    let skip: HashSet<&str> = [
        spec.path.file_name().and_then(|n| n.to_str()).unwrap_or(""),
        BATCH_INDEX_FILE,
        STATUS_FILE,
    ]
    .into_iter()
    .collect();

    for job in &jobs {
        std::fs::create_dir_all(&job.dir).map_err(|e| EngineError::io(&job.dir, e))?;

        for dirent in std::fs::read_dir(source_dir).map_err(|e| EngineError::io(source_dir, e))? {
            let dirent = dirent.map_err(|e| EngineError::io(source_dir, e))?;
            let path = dirent.path();
            let name = dirent.file_name();
            if !path.is_file() || skip.contains(name.to_string_lossy().as_ref()) {
                continue;
            }
            let dest = job.dir.join(&name);
            std::fs::copy(&path, &dest).map_err(|e| EngineError::io(&dest, e))?;
        }

        for file in &job.files {
            let target = job.dir.join(file);
            let mut tree = load(&target)?;
            for (key, value) in &job.values {
                substitute(&mut tree, key, value);
            }
            dump(&target, &tree)?;
        }
        tracing::info!(job = %job.name, "batch directory ready");
    }

    write_index(spec, &jobs)?;
    Ok(jobs)
}

/// Expand, then drive the pipeline across the generated directories
/// (unless dry-running). Returns the per-directory outcomes; background
/// monitors report no outcome.
pub async fn run_batch(
    spec: &BatchSpec,
    registry: &Registry,
    opts: &BatchOptions,
    clock: &impl Clock,
) -> Result<Vec<(PathBuf, Option<CycleOutcome>)>, EngineError> {
    let jobs = expand_batch(spec)?;
    if opts.dry_run {
        return Ok(jobs.into_iter().map(|job| (job.dir, None)).collect());
    }

    let pipeline_name = spec
        .pipeline_config
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("config_pipeline.json"));

    let exec_opts = ExecOptions {
        program: opts.program.display().to_string(),
        verbose: opts.verbose,
    };

    let mut results = Vec::with_capacity(jobs.len());
    for job in jobs {
        let pipeline_config = job.dir.join(&pipeline_name);
        if opts.monitor_background {
            spawn_background_monitor(&opts.program, &pipeline_config, opts.verbose)?;
            results.push((job.dir, None));
        } else {
            let pipeline = swath_config::PipelineSpec::load(&pipeline_config)?;
            let outcome = run_once(&pipeline, registry, &exec_opts, clock, None).await?;
            results.push((job.dir, Some(outcome)));
        }
    }
    Ok(results)
}

/// Remove the index CSV and every subdirectory it names.
pub fn delete_batch(spec: &BatchSpec) -> Result<usize, EngineError> {
    let index_path = spec.dir().join(BATCH_INDEX_FILE);
    if !index_path.is_file() {
        return Err(EngineError::BatchIndexMissing {
            path: index_path.display().to_string(),
        });
    }

    let mut reader = csv::Reader::from_path(&index_path)
        .map_err(|e| EngineError::Io(format!("cannot read batch index: {}", e)))?;
    let name_idx = reader
        .headers()
        .map_err(|e| EngineError::Io(format!("cannot read batch index: {}", e)))?
        .iter()
        .position(|h| h == "job")
        .unwrap_or(0);

    let mut removed = 0;
    for row in reader.records() {
        let row = row.map_err(|e| EngineError::Io(format!("cannot read batch index: {}", e)))?;
        let Some(name) = row.get(name_idx).map(str::trim).filter(|n| !n.is_empty()) else {
            continue;
        };
        let dir = spec.dir().join(name);
        if dir.is_dir() {
            std::fs::remove_dir_all(&dir).map_err(|e| EngineError::io(&dir, e))?;
            removed += 1;
            tracing::info!(job = name, "batch directory removed");
        }
    }
    std::fs::remove_file(&index_path).map_err(|e| EngineError::io(&index_path, e))?;
    Ok(removed)
}

/// Zip each set's argument lists into per-directory scalar tuples.
fn enumerate_jobs(spec: &BatchSpec) -> Result<Vec<BatchJob>, EngineError> {
    let mut jobs = Vec::new();
    let mut seen = HashSet::new();
    for set in &spec.sets {
        for i in 0..set.len() {
            let mut name = set.set_tag.clone();
            let mut values = IndexMap::new();
            for (key, list) in &set.args {
                name.push_str(&fragment(key, &list[i]));
                values.insert(key.clone(), list[i].clone());
            }
            if !seen.insert(name.clone()) {
                return Err(EngineError::DuplicateBatchDir { name });
            }
            jobs.push(BatchJob {
                dir: spec.dir().join(&name),
                name,
                set_tag: set.set_tag.clone(),
                values,
                files: set.files.clone(),
            });
        }
    }
    Ok(jobs)
}

/// Replace every mapping entry named `key`, at any depth, with `value`.
fn substitute(tree: &mut Value, key: &str, value: &Value) {
    match tree {
        Value::Object(map) => {
            for (name, child) in map.iter_mut() {
                if name == key {
                    *child = value.clone();
                } else {
                    substitute(child, key, value);
                }
            }
        }
        Value::Array(items) => {
            for child in items {
                substitute(child, key, value);
            }
        }
        _ => {}
    }
}

/// One index row per generated directory, written beside the batch config.
fn write_index(spec: &BatchSpec, jobs: &[BatchJob]) -> Result<(), EngineError> {
    let index_path = spec.dir().join(BATCH_INDEX_FILE);
    let mut writer = csv::Writer::from_path(&index_path)
        .map_err(|e| EngineError::Io(format!("cannot write batch index: {}", e)))?;

    let pipeline_name = spec
        .pipeline_config
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    writer
        .write_record(["job", "set_tag", "pipeline_config", "args"])
        .map_err(|e| EngineError::Io(format!("cannot write batch index: {}", e)))?;
    for job in jobs {
        let args = canonical_json(&Value::Object(
            job.values
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        ));
        writer
            .write_record([
                job.name.as_str(),
                job.set_tag.as_str(),
                pipeline_name.as_str(),
                args.as_str(),
            ])
            .map_err(|e| EngineError::Io(format!("cannot write batch index: {}", e)))?;
    }
    writer
        .flush()
        .map_err(|e| EngineError::Io(format!("cannot write batch index: {}", e)))?;
    Ok(())
}

#[cfg(test)]
#[path = "batch_tests.rs"]
mod tests;
