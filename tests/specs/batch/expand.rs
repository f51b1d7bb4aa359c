// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Batch expansion specs

use crate::prelude::*;

fn batch_project(project: &Project) {
    project.file(
        "config_runner.json",
        r#"{"execution_control": {"option": "local"}, "cmd": "echo done > ran.txt", "a": 0, "b": 0}"#,
    );
    project.file(
        "config_pipeline.json",
        r#"{"pipeline": [{"runner": "./config_runner.json", "command": "script"}]}"#,
    );
    project.file(
        "config_batch.json",
        r#"{
            "pipeline_config": "./config_pipeline.json",
            "sets": [
                {"args": {"a": [1, 2], "b": [3, 4]}, "files": ["./config_runner.json"], "set_tag": "s1"}
            ]
        }"#,
    );
}

#[test]
fn dry_run_expands_without_submitting() {
    let project = Project::empty();
    batch_project(&project);

    project
        .swath()
        .args(&["batch", "-c", "config_batch.json", "--dry"])
        .passes()
        .stdout_has("nothing submitted");

    for (name, a, b) in [("s1_a1_b3", "1", "3"), ("s1_a2_b4", "2", "4")] {
        let cfg: serde_json::Value =
            serde_json::from_str(&project.read(&format!("{}/config_runner.json", name))).unwrap();
        assert_eq!(cfg["a"].to_string(), a);
        assert_eq!(cfg["b"].to_string(), b);
        // pipeline file copied verbatim, nothing submitted
        assert!(project.has_file(&format!("{}/config_pipeline.json", name)));
        assert!(!project.has_file(&format!("{}/swath_status.json", name)));
    }
    assert!(project.has_file("batch_jobs.csv"));
}

#[test]
fn full_run_drives_every_generated_pipeline() {
    let project = Project::empty();
    batch_project(&project);

    project
        .swath()
        .args(&["batch", "-c", "config_batch.json"])
        .passes();

    for name in ["s1_a1_b3", "s1_a2_b4"] {
        assert!(project.has_file(&format!("{}/ran.txt", name)));
        assert!(project.has_file(&format!("{}/swath_status.json", name)));
    }
}

#[test]
fn delete_removes_the_index_and_every_directory_it_names() {
    let project = Project::empty();
    batch_project(&project);

    project
        .swath()
        .args(&["batch", "-c", "config_batch.json", "--dry"])
        .passes();
    assert!(project.has_file("s1_a1_b3/config_runner.json"));

    project
        .swath()
        .args(&["batch", "-c", "config_batch.json", "--delete"])
        .passes()
        .stdout_has("removed 2 batch directories");
    assert!(!project.has_file("s1_a1_b3"));
    assert!(!project.has_file("s1_a2_b4"));
    assert!(!project.has_file("batch_jobs.csv"));
    // the source project is untouched
    assert!(project.has_file("config_runner.json"));
}

#[test]
fn expansion_is_deterministic_across_runs() {
    let project = Project::empty();
    batch_project(&project);

    project
        .swath()
        .args(&["batch", "-c", "config_batch.json", "--dry"])
        .passes();
    let first = project.read("s1_a1_b3/config_runner.json");
    let index_first = project.read("batch_jobs.csv");

    project
        .swath()
        .args(&["batch", "-c", "config_batch.json", "--dry"])
        .passes();
    assert_eq!(project.read("s1_a1_b3/config_runner.json"), first);
    assert_eq!(project.read("batch_jobs.csv"), index_first);
}
