// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Status and template command specs

use crate::prelude::*;

#[test]
fn status_tabulates_steps_and_tasks() {
    let project = Project::empty();
    project.single_step("true");
    project.swath().args(&["pipeline"]).passes();

    project
        .swath()
        .args(&["status"])
        .passes()
        .stdout_has("runner")
        .stdout_has("successful");
}

#[test]
fn status_filters_by_state() {
    let project = Project::empty();
    project.single_step("true");
    project.swath().args(&["pipeline"]).passes();

    project
        .swath()
        .args(&["status", "-s", "failed"])
        .passes()
        .stdout_has("no status");
}

#[test]
fn status_json_round_trips() {
    let project = Project::empty();
    project.single_step("true");
    project.swath().args(&["pipeline"]).passes();

    let result = project.swath().args(&["status", "--json"]).passes();
    let value: serde_json::Value = serde_json::from_str(&result.stdout).unwrap();
    assert_eq!(value["runner"][""]["state"], "successful");
}

#[test]
fn status_with_no_records_says_so() {
    let project = Project::empty();
    project
        .swath()
        .args(&["status"])
        .passes()
        .stdout_has("no status recorded");
}

#[test]
fn template_configs_emits_placeholders() {
    let project = Project::empty();
    project
        .swath()
        .args(&["template-configs", "script"])
        .passes()
        .stdout_has("config_script.json");

    let text = project.read("config_script.json");
    assert!(text.contains("[REQUIRED]"));
    assert!(text.contains("execution_control"));

    // existing files are never overwritten
    project
        .swath()
        .args(&["template-configs", "script"])
        .passes();
}

#[test]
fn template_configs_rejects_unknown_entry_points() {
    let project = Project::empty();
    project
        .swath()
        .args(&["template-configs", "nope"])
        .fails()
        .stderr_has("no registered entry point");
}
