// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swath pipeline` - one-shot, monitor, background, and recursive modes.

use crate::commands::find_pipeline_config;
use crate::logging;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use swath_config::PipelineSpec;
use swath_core::SystemClock;
use swath_engine::{
    monitor, run_once, run_recursive, spawn_background_monitor, CycleOutcome, ExecOptions,
    Registry, DEFAULT_POLL,
};

#[derive(Args)]
pub struct PipelineArgs {
    /// Pipeline config file (discovered in the current directory by default)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Run every sub-pipeline under the current directory instead
    #[arg(short = 'r', long)]
    recursive: bool,

    /// Poll until the final step is done or a step fails
    #[arg(long, conflicts_with = "background")]
    monitor: bool,

    /// Detach a monitor process that survives this shell
    #[arg(long)]
    background: bool,
}

pub async fn run(args: PipelineArgs, registry: &Registry, verbose: bool) -> Result<()> {
    let cwd = std::env::current_dir().context("cannot resolve current directory")?;
    let clock = SystemClock;
    let opts = ExecOptions {
        program: program_name()?,
        verbose,
    };

    if args.recursive {
        let _guard = logging::init(None, None, verbose);
        let results = run_recursive(&cwd, registry, &opts, &clock).await?;
        if results.is_empty() {
            println!("no pipelines found under {}", cwd.display());
        }
        for (config, outcome) in results {
            println!("{}: {}", config.display(), describe(&outcome));
        }
        return Ok(());
    }

    let config = match args.config {
        Some(path) => path,
        None => find_pipeline_config(&cwd)?,
    };
    let pipeline = PipelineSpec::load(&config)?;
    let _guard = logging::init(
        pipeline.logging.log_file.as_deref(),
        pipeline.logging.log_level.as_deref(),
        verbose,
    );

    if args.background {
        let program = std::env::current_exe().context("cannot resolve the swath binary")?;
        let pid = spawn_background_monitor(&program, &config, verbose)?;
        println!("background monitor started (pid {})", pid);
        return Ok(());
    }

    let outcome = if args.monitor {
        monitor(&pipeline, registry, &opts, poll_interval(), &clock).await?
    } else {
        run_once(&pipeline, registry, &opts, &clock, None).await?
    };
    println!("{}", describe(&outcome));
    Ok(())
}

fn describe(outcome: &CycleOutcome) -> String {
    match outcome {
        CycleOutcome::Empty => "pipeline has no steps".to_string(),
        CycleOutcome::Done => "pipeline is done".to_string(),
        CycleOutcome::Active { step } => format!("step {} is still running", step),
        CycleOutcome::Dispatched { step, outcome } => format!(
            "step {}: submitted {} task(s), skipped {}",
            step,
            outcome.submitted.len(),
            outcome.skipped.len()
        ),
        CycleOutcome::Resubmitted { step, outcome } => format!(
            "step {}: re-submitted {} failed task(s)",
            step,
            outcome.submitted.len()
        ),
    }
}

/// Sleep between monitor polls; `SWATH_POLL_SECS` overrides for tests and
/// impatient clusters.
fn poll_interval() -> std::time::Duration {
    std::env::var("SWATH_POLL_SECS")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|s| *s > 0.0)
        .map(std::time::Duration::from_secs_f64)
        .unwrap_or(DEFAULT_POLL)
}

/// The name dispatched command lines start with: the running binary when
/// resolvable, the plain program name otherwise.
fn program_name() -> Result<String> {
    Ok(std::env::current_exe()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|_| "swath".to_string()))
}
