// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Step ordering and recursive-mode specs

use crate::prelude::*;

#[test]
fn two_steps_run_strictly_in_order() {
    let project = Project::empty();
    project.file(
        "config_first.json",
        r#"{"execution_control": {"option": "local"}, "cmd": "echo 1 > first.txt"}"#,
    );
    project.file(
        "config_second.json",
        r#"{"execution_control": {"option": "local"}, "cmd": "cp first.txt second.txt"}"#,
    );
    project.file(
        "config_pipeline.json",
        r#"{
            "pipeline": [
                {"first": "./config_first.json", "command": "script"},
                {"second": "./config_second.json", "command": "script"}
            ]
        }"#,
    );

    // one step per invocation
    project.swath().args(&["pipeline"]).passes();
    assert!(project.has_file("first.txt"));
    assert!(!project.has_file("second.txt"));

    project.swath().args(&["pipeline"]).passes();
    assert!(project.has_file("second.txt"));

    project
        .swath()
        .args(&["pipeline"])
        .passes()
        .stdout_has("pipeline is done");
}

#[test]
fn monitor_mode_drives_the_whole_pipeline_in_one_invocation() {
    let project = Project::empty();
    project.file(
        "config_first.json",
        r#"{"execution_control": {"option": "local"}, "cmd": "echo 1 > first.txt"}"#,
    );
    project.file(
        "config_second.json",
        r#"{"execution_control": {"option": "local"}, "cmd": "cp first.txt second.txt"}"#,
    );
    project.file(
        "config_pipeline.json",
        r#"{
            "pipeline": [
                {"first": "./config_first.json", "command": "script"},
                {"second": "./config_second.json", "command": "script"}
            ]
        }"#,
    );

    project
        .swath()
        .args(&["pipeline", "--monitor"])
        .env("SWATH_POLL_SECS", "0.05")
        .passes()
        .stdout_has("pipeline is done");
    assert!(project.has_file("second.txt"));

    // the monitor token is cleared on exit
    assert!(project.status_json().get("monitor_pid").is_none());
}

#[test]
fn recursive_mode_runs_each_subproject() {
    let project = Project::empty();
    for name in ["proj_a", "proj_b"] {
        project.file(
            &format!("{}/config_runner.json", name),
            r#"{"execution_control": {"option": "local"}, "cmd": "true"}"#,
        );
        project.file(
            &format!("{}/config_pipeline.json", name),
            r#"{"pipeline": [{"runner": "./config_runner.json", "command": "script"}]}"#,
        );
    }
    // a subdirectory without a pipeline config is skipped
    project.file("not_a_project/readme.txt", "nothing here");

    let result = project.swath().args(&["pipeline", "-r"]).passes();
    result.stdout_has("proj_a").stdout_has("proj_b");

    assert!(project.has_file("proj_a/swath_status.json"));
    assert!(project.has_file("proj_b/swath_status.json"));
    assert!(!project.has_file("not_a_project/swath_status.json"));
}
