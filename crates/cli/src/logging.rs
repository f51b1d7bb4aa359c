// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tracing setup driven by the pipeline config's `logging` block.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize the global subscriber. `level` comes from the config
/// (`logging.log_level` / `log_level`), `-v` forces debug. With a log file
/// the output goes there without ANSI colors; otherwise to stderr.
///
/// Returns the appender guard; dropping it flushes the file writer, so the
/// caller holds it for the life of the process. Safe to call twice (the
/// second init loses and is ignored), which background monitors rely on.
pub fn init(log_file: Option<&Path>, level: Option<&str>, verbose: bool) -> Option<WorkerGuard> {
    let level = if verbose {
        "debug".to_string()
    } else {
        level.unwrap_or("info").to_ascii_lowercase()
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("swath={0},swath_engine={0},swath_store={0},swath_hpc={0},swath_config={0},swath_core={0}", level)));

    match log_file {
        Some(path) => {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path.file_name().map(|n| n.to_os_string()).unwrap_or_else(|| "swath.log".into());
            if std::fs::create_dir_all(dir).is_err() {
                return init_stderr(filter);
            }
            let appender = tracing_appender::rolling::never(dir, name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .try_init();
            Some(guard)
        }
        None => init_stderr(filter),
    }
}

fn init_stderr(filter: EnvFilter) -> Option<WorkerGuard> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    None
}
