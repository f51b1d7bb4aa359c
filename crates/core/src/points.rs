// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Project-points table and node partitioning.
//!
//! The real geospatial partitioner is an external collaborator; this module
//! carries its interface and the one contract the dispatcher depends on:
//! splitting an ordered site table into contiguous chunks, one per node.

use serde_json::Value;
use std::path::Path;
use thiserror::Error;

/// Errors loading or splitting a project-points table.
#[derive(Debug, Error)]
pub enum PointsError {
    #[error("project_points file not readable: {path}: {source}")]
    Unreadable {
        path: String,
        source: std::io::Error,
    },
    #[error("project_points csv error in {path}: {source}")]
    Csv { path: String, source: csv::Error },
    #[error("project_points file {path} has no `gid` column")]
    MissingGidColumn { path: String },
    #[error("project_points gid is not an integer: {0}")]
    BadGid(String),
    #[error("project_points must be a gid list or a csv path, got {0}")]
    BadValue(String),
    #[error("project_points table is empty")]
    Empty,
}

/// An ordered table of project sites, keyed by gid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPoints {
    gids: Vec<i64>,
}

impl ProjectPoints {
    pub fn new(gids: Vec<i64>) -> Result<Self, PointsError> {
        if gids.is_empty() {
            return Err(PointsError::Empty);
        }
        Ok(ProjectPoints { gids })
    }

    /// Build from a step-config value: an inline gid list, or a path
    /// (relative to `base_dir`) to a CSV site table with a `gid` column.
    pub fn from_value(value: &Value, base_dir: &Path) -> Result<Self, PointsError> {
        match value {
            Value::Array(items) => {
                let mut gids = Vec::with_capacity(items.len());
                for item in items {
                    let gid = item
                        .as_i64()
                        .ok_or_else(|| PointsError::BadGid(item.to_string()))?;
                    gids.push(gid);
                }
                ProjectPoints::new(gids)
            }
            Value::String(path) => ProjectPoints::from_csv(&base_dir.join(path)),
            other => Err(PointsError::BadValue(other.to_string())),
        }
    }

    /// Load the site table from a CSV file with a `gid` column.
    pub fn from_csv(path: &Path) -> Result<Self, PointsError> {
        let display = path.display().to_string();
        let mut reader = csv::Reader::from_path(path).map_err(|source| {
            if matches!(source.kind(), csv::ErrorKind::Io(_)) {
                PointsError::Unreadable {
                    path: display.clone(),
                    source: std::io::Error::other(source.to_string()),
                }
            } else {
                PointsError::Csv {
                    path: display.clone(),
                    source,
                }
            }
        })?;

        let gid_idx = reader
            .headers()
            .map_err(|source| PointsError::Csv {
                path: display.clone(),
                source,
            })?
            .iter()
            .position(|h| h.trim() == "gid")
            .ok_or_else(|| PointsError::MissingGidColumn {
                path: display.clone(),
            })?;

        let mut gids = Vec::new();
        for row in reader.records() {
            let row = row.map_err(|source| PointsError::Csv {
                path: display.clone(),
                source,
            })?;
            let field = row.get(gid_idx).unwrap_or_default().trim();
            let gid = field
                .parse::<i64>()
                .map_err(|_| PointsError::BadGid(field.to_string()))?;
            gids.push(gid);
        }
        ProjectPoints::new(gids)
    }

    pub fn len(&self) -> usize {
        self.gids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gids.is_empty()
    }

    pub fn gids(&self) -> &[i64] {
        &self.gids
    }

    /// Split into `nodes` contiguous chunks.
    ///
    /// Sizes are balanced: with `n` sites the first `n % nodes` chunks get
    /// one extra site (10 sites over 3 nodes gives 4, 3, 3). Requesting more
    /// nodes than sites clamps to one site per chunk, so no chunk is ever
    /// empty.
    pub fn split(&self, nodes: usize) -> Vec<Vec<i64>> {
        let n = self.gids.len();
        let nodes = nodes.clamp(1, n);
        let base = n / nodes;
        let extra = n % nodes;

        let mut chunks = Vec::with_capacity(nodes);
        let mut offset = 0;
        for i in 0..nodes {
            let size = base + usize::from(i < extra);
            chunks.push(self.gids[offset..offset + size].to_vec());
            offset += size;
        }
        chunks
    }
}

#[cfg(test)]
#[path = "points_tests.rs"]
mod tests;
