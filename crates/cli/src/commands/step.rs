// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entry-point subcommands: `swath <step-alias> -c <config> [-v]`.
//!
//! This is the command line the submission scripts run on a node. The
//! alias resolves to a registered entry point either directly or through
//! the project's pipeline config when the step uses a distinct command
//! name.

use crate::commands::find_pipeline_config;
use crate::exit_error::ExitError;
use crate::logging;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use swath_config::{PipelineSpec, StepConfig};
use swath_core::SystemClock;
use swath_engine::{run_step, tag_from_config_path, EngineError, Registry};

pub fn run(argv: Vec<String>, registry: &Registry, verbose: bool) -> Result<()> {
    let (alias, config_path, flag_verbose) = parse(argv)?;
    let verbose = verbose || flag_verbose;
    let project_dir = std::env::current_dir().context("cannot resolve current directory")?;

    let command = resolve_command(&alias, registry, &project_dir)?;
    let tag = tag_from_config_path(&alias, &config_path);

    // per-task log file under the step's log directory
    let cfg = StepConfig::load(&config_path)?;
    let log_file = cfg
        .log_directory()
        .map(|dir| dir.join(format!("{}{}.log", alias, tag)))
        .ok();
    let level = cfg.log_level().unwrap_or(None);
    let _guard = logging::init(log_file.as_deref(), level.as_deref(), verbose);

    match run_step(
        registry,
        &project_dir,
        &alias,
        &command,
        &config_path,
        &SystemClock,
    ) {
        Ok(()) => Ok(()),
        // the run guard already recorded the failure; exit non-zero so the
        // submission script's status reflects it
        Err(EngineError::Run { step, message }) => {
            Err(ExitError::new(1, format!("step {} failed: {}", step, message)).into())
        }
        Err(e) => Err(e.into()),
    }
}

/// An alias is its own command unless the pipeline config maps it to one.
fn resolve_command(alias: &str, registry: &Registry, project_dir: &Path) -> Result<String> {
    if registry.contains(alias) {
        return Ok(alias.to_string());
    }
    if let Ok(config) = find_pipeline_config(project_dir) {
        if let Ok(pipeline) = PipelineSpec::load(&config) {
            if let Some(step) = pipeline.step(alias) {
                let command = step.command_name().to_string();
                if registry.contains(&command) {
                    return Ok(command);
                }
            }
        }
    }
    bail!("no registered entry point or pipeline step named: {}", alias)
}

/// The fixed node-side argument shape: `<alias> -c <config> [-v]`.
fn parse(argv: Vec<String>) -> Result<(String, PathBuf, bool)> {
    let mut iter = argv.into_iter();
    let alias = match iter.next() {
        Some(alias) => alias,
        None => bail!("missing step alias"),
    };

    let mut config = None;
    let mut verbose = false;
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                config = match iter.next() {
                    Some(path) => Some(PathBuf::from(path)),
                    None => bail!("{}: -c needs a config path", alias),
                };
            }
            "-v" | "--verbose" => verbose = true,
            other => bail!("{}: unexpected argument: {}", alias, other),
        }
    }

    match config {
        Some(config) => Ok((alias, config, verbose)),
        None => bail!("{}: a step config is required (-c <file>)", alias),
    }
}

#[cfg(test)]
#[path = "step_tests.rs"]
mod tests;
