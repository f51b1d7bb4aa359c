// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Locate the swath binary beside the test executable
/// (`target/debug/deps/specs-<hash>` → `target/debug/swath`), falling back
/// to the manifest-relative target directory.
fn swath_binary() -> PathBuf {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let candidate = debug_dir.join("swath");
            if candidate.exists() {
                return candidate;
            }
        }
    }
    Path::new(env!("CARGO_MANIFEST_DIR")).join("target/debug/swath")
}

/// A scratch project directory with a fluent CLI runner.
pub struct Project {
    temp: tempfile::TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Project {
            temp: tempfile::tempdir().expect("create temp project"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write a file, creating parent directories as needed.
    pub fn file(&self, name: &str, body: &str) -> &Self {
        let path = self.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dirs");
        }
        std::fs::write(&path, body).expect("write fixture");
        self
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.path().join(name).exists()
    }

    pub fn read(&self, name: &str) -> String {
        std::fs::read_to_string(self.path().join(name)).expect("read project file")
    }

    /// The parsed aggregate status file.
    pub fn status_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.read("swath_status.json")).expect("status json")
    }

    /// A swath invocation rooted in this project.
    pub fn swath(&self) -> CliBuilder {
        CliBuilder {
            dir: self.path().to_path_buf(),
            args: Vec::new(),
            envs: Vec::new(),
        }
    }

    /// Write the standard one-step pipeline: alias `runner`, built-in
    /// `script` entry point, local backend, running `cmd`.
    pub fn single_step(&self, cmd: &str) -> &Self {
        self.file(
            "config_runner.json",
            &format!(
                "{{\"execution_control\": {{\"option\": \"local\"}}, \"cmd\": \"{}\"}}",
                cmd
            ),
        );
        self.file(
            "config_pipeline.json",
            r#"{"pipeline": [{"runner": "./config_runner.json", "command": "script"}]}"#,
        )
    }
}

/// Fluent builder for one CLI invocation.
pub struct CliBuilder {
    dir: PathBuf,
    args: Vec<String>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.envs.push((key.to_string(), value.to_string()));
        self
    }

    fn run(self) -> Output {
        Command::new(swath_binary())
            .args(&self.args)
            .envs(self.envs)
            .current_dir(&self.dir)
            .output()
            .expect("run swath")
    }

    /// Run and assert exit 0.
    pub fn passes(self) -> RunResult {
        let args = self.args.clone();
        let output = self.run();
        let result = RunResult::from(output);
        assert!(
            result.success,
            "expected `swath {}` to pass\nstdout:\n{}\nstderr:\n{}",
            args.join(" "),
            result.stdout,
            result.stderr
        );
        result
    }

    /// Run and assert a non-zero exit.
    pub fn fails(self) -> RunResult {
        let args = self.args.clone();
        let output = self.run();
        let result = RunResult::from(output);
        assert!(
            !result.success,
            "expected `swath {}` to fail\nstdout:\n{}",
            args.join(" "),
            result.stdout
        );
        result
    }
}

/// Captured output with containment assertions.
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl From<Output> for RunResult {
    fn from(output: Output) -> Self {
        RunResult {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

impl RunResult {
    pub fn stdout_has(&self, needle: &str) -> &Self {
        assert!(
            self.stdout.contains(needle),
            "stdout missing {:?}:\n{}",
            needle,
            self.stdout
        );
        self
    }

    pub fn stderr_has(&self, needle: &str) -> &Self {
        assert!(
            self.stderr.contains(needle),
            "stderr missing {:?}:\n{}",
            needle,
            self.stderr
        );
        self
    }
}
