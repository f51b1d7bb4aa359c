// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swath - pipeline driver for geospatial HPC workloads

mod commands;
mod exit_error;
mod logging;
mod table;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{batch, pipeline, reset, status, step, template};
use std::path::PathBuf;
use swath_engine::builtin_registry;

#[derive(Parser)]
#[command(
    name = "swath",
    version,
    about = "swath - run geospatial pipelines on an HPC cluster"
)]
struct Cli {
    /// Change to <dir> before doing anything
    #[arg(short = 'C', global = true, value_name = "DIR")]
    directory: Option<PathBuf>,

    /// Verbose (debug) logging
    #[arg(short = 'v', long = "verbose", global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline in the current project directory
    Pipeline(pipeline::PipelineArgs),
    /// Expand a parameter sweep into sibling projects and run them
    Batch(batch::BatchArgs),
    /// Show the status of every step and task
    Status(status::StatusArgs),
    /// Reset task records to not-submitted
    ResetStatus(reset::ResetArgs),
    /// Write template step configs for registered entry points
    TemplateConfigs(template::TemplateArgs),
    /// A registered entry point: `<step-alias> -c <config> [-v]`
    #[command(external_subcommand)]
    Step(Vec<String>),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        let code = e
            .downcast_ref::<exit_error::ExitError>()
            .map_or(1, |c| c.code);
        let msg = format_error(&e);
        if !msg.is_empty() {
            eprintln!("Error: {}", msg);
        }
        std::process::exit(code);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir)
            .map_err(|e| anyhow::anyhow!("cannot change to {}: {}", dir.display(), e))?;
    }

    let registry = builtin_registry();
    match cli.command {
        Commands::Pipeline(args) => pipeline::run(args, &registry, cli.verbose).await,
        Commands::Batch(args) => batch::run(args, &registry, cli.verbose).await,
        Commands::Status(args) => status::run(args),
        Commands::ResetStatus(args) => reset::run(args),
        Commands::TemplateConfigs(args) => template::run(args, &registry),
        Commands::Step(argv) => step::run(argv, &registry, cli.verbose),
    }
}

/// Format an anyhow error, deduplicating the chain.
///
/// If the top-level Display already contains every source message, the
/// "Caused by" chain is redundant noise (thiserror `#[error("... {0}")]`
/// with `#[from]` produces exactly that shape); otherwise render it.
fn format_error(err: &anyhow::Error) -> String {
    let top = err.to_string();
    let chain_redundant = err
        .chain()
        .skip(1)
        .all(|cause| top.contains(&cause.to_string()));
    if chain_redundant {
        return top;
    }

    let mut buf = top;
    for (i, cause) in err.chain().skip(1).enumerate() {
        buf.push_str(&format!("\n\nCaused by:\n    {}: {}", i, cause));
    }
    buf
}
