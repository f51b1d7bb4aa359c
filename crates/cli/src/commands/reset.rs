// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swath reset-status` - return task records to not-submitted.

use crate::commands::find_pipeline_config;
use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use swath_config::PipelineSpec;
use swath_store::{StatusStore, PENDING_DIR};

#[derive(Args)]
pub struct ResetArgs {
    /// Pipeline config (for step order; discovered by default)
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Reset only the steps after this alias
    #[arg(long = "after-step", value_name = "ALIAS")]
    after_step: Option<String>,

    /// Also discard pending single-record files
    #[arg(short = 'f', long)]
    force: bool,
}

pub fn run(args: ResetArgs) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let config = match args.config {
        Some(path) => path,
        None => find_pipeline_config(&cwd)?,
    };
    let pipeline = PipelineSpec::load(&config)?;
    let order: Vec<String> = pipeline.steps.iter().map(|s| s.alias.clone()).collect();

    if let Some(alias) = &args.after_step {
        if !order.iter().any(|s| s == alias) {
            bail!("pipeline has no step aliased: {}", alias);
        }
    }

    if args.force {
        let pending = cwd.join(PENDING_DIR);
        if pending.is_dir() {
            std::fs::remove_dir_all(&pending)?;
        }
    }

    let mut store = StatusStore::open(&cwd)?;
    let count = store.reset(&order, args.after_step.as_deref())?;
    println!("reset {} task record(s)", count);
    println!("note: artifact files on disk are untouched");
    Ok(())
}
