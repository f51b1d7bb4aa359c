// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Single-step local pipeline specs

use crate::prelude::*;

#[test]
fn single_step_local_pipeline_runs_to_done() {
    let project = Project::empty();
    project.single_step("echo ok > out.txt");

    // first invocation dispatches and (locally) runs the one task
    project
        .swath()
        .args(&["pipeline"])
        .passes()
        .stdout_has("submitted 1 task(s)");
    assert!(project.has_file("out.txt"));
    assert!(project.has_file("runner.task.json"));

    // second invocation folds the end marker and reports done
    project
        .swath()
        .args(&["pipeline"])
        .passes()
        .stdout_has("pipeline is done");

    let status = project.status_json();
    let entry = &status["runner"][""];
    assert_eq!(entry["state"], "successful");
    assert!(entry["job_id"].as_str().unwrap().starts_with("local-"));
    assert!(entry["time_submitted"].is_string());
    assert!(entry["time_start"].is_string());
    assert!(entry["time_end"].is_string());
    assert!(entry["total_runtime"].is_number());
}

#[test]
fn pipeline_invocations_are_idempotent_once_done() {
    let project = Project::empty();
    project.single_step("true");

    project.swath().args(&["pipeline"]).passes();
    project.swath().args(&["pipeline"]).passes();
    let before = project.read("swath_status.json");

    project
        .swath()
        .args(&["pipeline"])
        .passes()
        .stdout_has("pipeline is done");
    assert_eq!(project.read("swath_status.json"), before);
}

#[test]
fn empty_pipeline_is_a_successful_noop() {
    let project = Project::empty();
    project.file("config_pipeline.json", r#"{"pipeline": []}"#);

    project
        .swath()
        .args(&["pipeline"])
        .passes()
        .stdout_has("no steps");
    assert!(!project.has_file("swath_status.json"));
}

#[test]
fn placeholder_values_abort_before_any_submission() {
    let project = Project::empty();
    project.file(
        "config_runner.json",
        r#"{"execution_control": {"option": "local"}, "cmd": "true", "resource_file": "[REQUIRED]"}"#,
    );
    project.file(
        "config_pipeline.json",
        r#"{"pipeline": [{"runner": "./config_runner.json", "command": "script"}]}"#,
    );

    project
        .swath()
        .args(&["pipeline"])
        .fails()
        .stderr_has("resource_file");
    assert!(!project.has_file("swath_status.json"));
}

#[test]
fn unknown_execution_control_key_aborts() {
    let project = Project::empty();
    project.file(
        "config_runner.json",
        r#"{"execution_control": {"option": "local", "walltme": 1}, "cmd": "true"}"#,
    );
    project.file(
        "config_pipeline.json",
        r#"{"pipeline": [{"runner": "./config_runner.json", "command": "script"}]}"#,
    );

    project
        .swath()
        .args(&["pipeline"])
        .fails()
        .stderr_has("walltme");
}

#[test]
fn direct_step_invocation_records_into_the_store() {
    let project = Project::empty();
    project.file(
        "config_script.json",
        r#"{"execution_control": {"option": "local"}, "cmd": "true"}"#,
    );

    project
        .swath()
        .args(&["script", "-c", "config_script.json"])
        .passes();

    assert_eq!(project.status_json()["script"][""]["state"], "successful");
}

#[test]
fn missing_pipeline_config_is_a_clear_error() {
    let project = Project::empty();
    project
        .swath()
        .args(&["pipeline"])
        .fails()
        .stderr_has("no pipeline config found");
}
