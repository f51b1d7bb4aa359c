// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failure recording and re-submission specs

use crate::prelude::*;

#[test]
fn failed_task_is_recorded_with_error_text() {
    let project = Project::empty();
    project.single_step("exit 3");

    project.swath().args(&["pipeline"]).passes();
    // `status` folds the end marker without driving the pipeline further
    project.swath().args(&["status"]).passes();

    let status = project.status_json();
    let entry = &status["runner"][""];
    assert_eq!(entry["state"], "failed");
    assert!(entry["error"].as_str().unwrap().contains("3"));
    assert!(entry["time_end"].is_string());
}

#[test]
fn failed_task_is_resubmitted_on_the_next_invocation() {
    let project = Project::empty();
    // fails until flag.txt appears
    project.single_step("test -f flag.txt");

    project.swath().args(&["pipeline"]).passes();
    project.swath().args(&["status"]).passes();
    assert_eq!(project.status_json()["runner"][""]["state"], "failed");

    // the fix arrives; the next invocations re-submit and finish
    project.file("flag.txt", "");
    project
        .swath()
        .args(&["pipeline"])
        .passes()
        .stdout_has("re-submitted 1 failed task(s)");
    project
        .swath()
        .args(&["pipeline"])
        .passes()
        .stdout_has("pipeline is done");
    assert_eq!(project.status_json()["runner"][""]["state"], "successful");
}

#[test]
fn reset_status_returns_tasks_to_not_submitted() {
    let project = Project::empty();
    project.single_step("true");
    project.swath().args(&["pipeline"]).passes();
    project.swath().args(&["pipeline"]).passes();

    project
        .swath()
        .args(&["reset-status"])
        .passes()
        .stdout_has("reset 1 task record(s)");
    assert_eq!(
        project.status_json()["runner"][""]["state"],
        "not_submitted"
    );

    // the pipeline runs again from scratch
    project
        .swath()
        .args(&["pipeline"])
        .passes()
        .stdout_has("submitted 1 task(s)");
}

#[test]
fn reset_after_unknown_step_is_rejected() {
    let project = Project::empty();
    project.single_step("true");

    project
        .swath()
        .args(&["reset-status", "--after-step", "nope"])
        .fails()
        .stderr_has("no step aliased");
}
