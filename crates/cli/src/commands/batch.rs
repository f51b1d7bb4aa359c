// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swath batch` - expand a parameter sweep and drive it.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use swath_config::BatchSpec;
use swath_core::SystemClock;
use swath_engine::{delete_batch, run_batch, BatchOptions, Registry};

use crate::logging;

#[derive(Args)]
pub struct BatchArgs {
    /// Batch config file (sets mapping or CSV table)
    #[arg(short = 'c', long = "config", value_name = "FILE", required = true)]
    config: PathBuf,

    /// Expand directories and write the index without submitting
    #[arg(long = "dry")]
    dry: bool,

    /// Remove the index CSV and every directory it names
    #[arg(long, conflicts_with_all = ["dry", "monitor_background"])]
    delete: bool,

    /// Detach one background monitor per generated pipeline
    #[arg(long = "monitor-background")]
    monitor_background: bool,
}

pub async fn run(args: BatchArgs, registry: &Registry, verbose: bool) -> Result<()> {
    let _guard = logging::init(None, None, verbose);
    let spec = BatchSpec::load(&args.config)?;

    if args.delete {
        let removed = delete_batch(&spec)?;
        println!("removed {} batch directories", removed);
        return Ok(());
    }

    let opts = BatchOptions {
        dry_run: args.dry,
        monitor_background: args.monitor_background,
        program: std::env::current_exe().context("cannot resolve the swath binary")?,
        verbose,
    };
    let results = run_batch(&spec, registry, &opts, &SystemClock).await?;

    if args.dry {
        println!("dry run: {} directories ready, nothing submitted", results.len());
    } else if args.monitor_background {
        println!("{} background monitors started", results.len());
    } else {
        println!("batch of {} pipelines invoked", results.len());
    }
    for (dir, _) in &results {
        println!("  {}", dir.display());
    }
    Ok(())
}
