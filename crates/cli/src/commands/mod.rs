// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod batch;
pub mod pipeline;
pub mod reset;
pub mod status;
pub mod step;
pub mod template;

use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use swath_config::is_pipeline_config;

/// Locate the single pipeline config in a directory, for commands invoked
/// without `-c`.
pub fn find_pipeline_config(dir: &Path) -> Result<PathBuf> {
    let mut matches = Vec::new();
    for dirent in std::fs::read_dir(dir)? {
        let dirent = dirent?;
        let path = dirent.path();
        if path.is_file() && is_pipeline_config(&dirent.file_name().to_string_lossy()) {
            matches.push(path);
        }
    }
    matches.sort();

    match matches.len() {
        1 => Ok(matches.remove(0)),
        0 => bail!(
            "no pipeline config found in {}; pass one with -c",
            dir.display()
        ),
        _ => bail!(
            "multiple pipeline configs in {} ({}); pass one with -c",
            dir.display(),
            matches
                .iter()
                .filter_map(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}
