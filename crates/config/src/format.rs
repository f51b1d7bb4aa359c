// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Format detection and load/dump for config files.
//!
//! Everything parses into `serde_json::Value` (with `preserve_order`, so
//! mapping order survives round-trips). Load-dump-load is identity modulo
//! comments, which only JSON5 carries and which are not preserved.

use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::path::Path;

/// Supported config file formats, detected by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    /// JSON with comments (`.json5` / `.jsonc`)
    Json5,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "json5" | "jsonc" => Ok(ConfigFormat::Json5),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnsupportedFormat {
                path: path.display().to_string(),
            }),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Json5 => "json5",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
        }
    }

    /// Canonical extension for template emission.
    pub fn extension(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Json5 => "json5",
            ConfigFormat::Yaml => "yaml",
            ConfigFormat::Toml => "toml",
        }
    }

    /// Parse `text` into a value tree. `path` is only used in errors.
    pub fn parse(&self, text: &str, path: &Path) -> Result<Value, ConfigError> {
        let parse_err = |message: String| ConfigError::Parse {
            path: path.display().to_string(),
            format: self.name(),
            message,
        };
        match self {
            ConfigFormat::Json => serde_json::from_str(text).map_err(|e| parse_err(e.to_string())),
            ConfigFormat::Json5 => json5::from_str(text).map_err(|e| parse_err(e.to_string())),
            ConfigFormat::Yaml => serde_yaml::from_str(text).map_err(|e| parse_err(e.to_string())),
            ConfigFormat::Toml => {
                let table: toml::Value =
                    toml::from_str(text).map_err(|e| parse_err(e.to_string()))?;
                serde_json::to_value(table).map_err(|e| parse_err(e.to_string()))
            }
        }
    }

    /// Render a value tree in this format.
    pub fn render(&self, value: &Value) -> Result<String, ConfigError> {
        let render_err = |message: String| ConfigError::Render {
            format: self.name(),
            message,
        };
        match self {
            // comments are not preserved, so json5 renders as plain json
            ConfigFormat::Json | ConfigFormat::Json5 => {
                let mut text =
                    serde_json::to_string_pretty(value).map_err(|e| render_err(e.to_string()))?;
                text.push('\n');
                Ok(text)
            }
            ConfigFormat::Yaml => serde_yaml::to_string(value).map_err(|e| render_err(e.to_string())),
            ConfigFormat::Toml => {
                toml::to_string_pretty(value).map_err(|e| render_err(e.to_string()))
            }
        }
    }
}

/// Load any supported config file into a value tree.
pub fn load(path: &Path) -> Result<Value, ConfigError> {
    let format = ConfigFormat::from_path(path)?;
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    format.parse(&text, path)
}

/// Load a config file that must be a mapping at the top level.
pub fn load_mapping(path: &Path) -> Result<Map<String, Value>, ConfigError> {
    match load(path)? {
        Value::Object(map) => Ok(map),
        _ => Err(ConfigError::NotAMapping {
            path: path.display().to_string(),
        }),
    }
}

/// Write a value tree to `path` in the format its extension names.
pub fn dump(path: &Path, value: &Value) -> Result<(), ConfigError> {
    let format = ConfigFormat::from_path(path)?;
    let text = format.render(value)?;
    std::fs::write(path, text).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
