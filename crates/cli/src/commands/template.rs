// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `swath template-configs` - emit starter step configs.

use anyhow::{bail, Result};
use clap::Args;
use serde_json::{json, Map, Value};
use std::path::Path;
use swath_config::{dump, ConfigFormat, value::{REQUIRED, REQUIRED_IF_HPC}};
use swath_engine::{Registry, SplitSpec};

#[derive(Args)]
pub struct TemplateArgs {
    /// Entry points to template (all registered by default)
    #[arg(value_name = "STEP")]
    steps: Vec<String>,

    /// Config format to emit
    #[arg(short = 't', long = "type", value_name = "FORMAT", default_value = "json")]
    format: String,
}

pub fn run(args: TemplateArgs, registry: &Registry) -> Result<()> {
    let format = parse_format(&args.format)?;
    for name in &args.steps {
        if !registry.contains(name) {
            bail!("no registered entry point named: {}", name);
        }
    }

    for entry in registry.iter() {
        if !args.steps.is_empty() && !args.steps.iter().any(|s| s == &entry.name) {
            continue;
        }
        let path = std::env::current_dir()?.join(format!(
            "config_{}.{}",
            entry.name,
            format.extension()
        ));
        if path.exists() {
            eprintln!("skipping existing {}", path.display());
            continue;
        }
        dump(&path, &template(entry))?;
        println!("wrote {}", path.display());
    }
    Ok(())
}

/// A starter config derived from the descriptor: the execution block, the
/// declared split keys, and the keys the entry point requires.
fn template(entry: &swath_engine::EntryPoint) -> Value {
    let mut root = Map::new();
    let mut control = Map::new();
    control.insert("option".to_string(), json!("local"));
    control.insert("allocation".to_string(), json!(REQUIRED_IF_HPC));
    control.insert("walltime".to_string(), json!(REQUIRED_IF_HPC));

    for split in &entry.splits {
        match split {
            SplitSpec::Points => {
                root.insert(SplitSpec::POINTS_KEY.to_string(), json!(REQUIRED));
                control.insert("nodes".to_string(), json!(1));
            }
            SplitSpec::Product(key) => {
                root.insert(key.clone(), json!([REQUIRED]));
            }
            SplitSpec::Zipped(keys) => {
                for key in keys {
                    root.insert(key.clone(), json!([REQUIRED]));
                }
            }
        }
    }
    for key in &entry.required_keys {
        root.entry(key.clone()).or_insert_with(|| json!(REQUIRED));
    }

    let mut out = Map::new();
    out.insert("execution_control".to_string(), Value::Object(control));
    out.insert("log_directory".to_string(), json!("./logs"));
    out.insert("log_level".to_string(), json!("INFO"));
    out.extend(root);
    Value::Object(out)
}

fn parse_format(name: &str) -> Result<ConfigFormat> {
    let probe = format!("template.{}", name.to_ascii_lowercase());
    match ConfigFormat::from_path(Path::new(&probe)) {
        Ok(format) => Ok(format),
        Err(_) => bail!("unsupported template format: {} (expected json, json5, yaml, or toml)", name),
    }
}
