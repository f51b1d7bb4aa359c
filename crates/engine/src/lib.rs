// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! swath-engine: dispatcher, pipeline executor, and batch expander

mod batch;
mod dispatch;
mod error;
mod executor;
mod process;
mod registry;
mod run_guard;

pub use batch::{delete_batch, expand_batch, run_batch, BatchJob, BatchOptions};
pub use dispatch::{dispatch_step, task_config_path, DispatchOptions, DispatchOutcome};
pub use error::EngineError;
pub use executor::{
    discover_pipelines, monitor, run_once, run_recursive, spawn_background_monitor,
    CycleOutcome, ExecOptions, DEFAULT_POLL,
};
pub use process::process_exists;
pub use registry::{
    builtin_registry, EntryPoint, PlatformParams, PreprocessFn, Registry, RunFn, SplitSpec,
};
pub use run_guard::{run_step, tag_from_config_path};
