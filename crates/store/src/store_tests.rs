// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use swath_core::FakeClock;

fn submitted(job_id: &str) -> TaskEntry {
    TaskEntry {
        state: TaskState::Submitted,
        job_id: Some(job_id.to_string()),
        time_submitted: Some("2026-01-10T08:00:00Z".to_string()),
        config_hash: Some("hash-1".to_string()),
        ..TaskEntry::default()
    }
}

#[test]
fn open_creates_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let store = StatusStore::open(dir.path()).unwrap();
    assert_eq!(store.steps().count(), 0);
    // nothing persisted until something is recorded
    assert!(!dir.path().join(STATUS_FILE).exists());
}

#[test]
fn record_persists_and_reloads() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = StatusStore::open(dir.path()).unwrap();
        store.record("generation", "_j0", &submitted("101")).unwrap();
    }
    let store = StatusStore::open(dir.path()).unwrap();
    let entry = store.entry("generation", "_j0").unwrap();
    assert_eq!(entry.state, TaskState::Submitted);
    assert_eq!(entry.job_id.as_deref(), Some("101"));
}

#[test]
fn replace_refuses_reopening_successful_tasks() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StatusStore::open(dir.path()).unwrap();
    store.record("run", "_j0", &submitted("1")).unwrap();
    store
        .record("run", "_j0", &TaskEntry::with_state(TaskState::Successful))
        .unwrap();

    let err = store.replace("run", "_j0", submitted("2")).unwrap_err();
    assert!(matches!(err, StoreError::IllegalTransition { .. }));
}

#[test]
fn replace_resubmits_failed_tasks_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StatusStore::open(dir.path()).unwrap();
    let mut failed = submitted("1");
    failed.state = TaskState::Failed;
    failed.time_end = Some("2026-01-10T09:00:00Z".to_string());
    store.replace("run", "_j1", failed).unwrap();

    store.replace("run", "_j1", submitted("2")).unwrap();
    let entry = store.entry("run", "_j1").unwrap();
    assert_eq!(entry.state, TaskState::Submitted);
    assert_eq!(entry.job_id.as_deref(), Some("2"));
    // stale fields from the failed attempt are gone
    assert!(entry.time_end.is_none());
}

#[test]
fn pending_records_fold_on_open() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = StatusStore::open(dir.path()).unwrap();
        store.record("run", "_j0", &submitted("55")).unwrap();
    }

    // a job on another host drops start and end markers
    let start = TaskEntry {
        state: TaskState::Running,
        time_start: Some("2026-01-10T08:05:00Z".to_string()),
        ..TaskEntry::default()
    };
    record_pending(dir.path(), "run", "_j0", "start", &start).unwrap();
    let end = TaskEntry {
        state: TaskState::Successful,
        time_end: Some("2026-01-10T08:25:00Z".to_string()),
        total_runtime: Some(1200.0),
        ..TaskEntry::default()
    };
    record_pending(dir.path(), "run", "_j0", "end", &end).unwrap();

    let store = StatusStore::open(dir.path()).unwrap();
    let entry = store.entry("run", "_j0").unwrap();
    assert_eq!(entry.state, TaskState::Successful);
    assert_eq!(entry.time_start.as_deref(), Some("2026-01-10T08:05:00Z"));
    assert_eq!(entry.total_runtime, Some(1200.0));
    // the job id from submission survives the fold
    assert_eq!(entry.job_id.as_deref(), Some("55"));

    // folded files are gone
    let pending: Vec<_> = std::fs::read_dir(dir.path().join(PENDING_DIR))
        .unwrap()
        .collect();
    assert!(pending.is_empty());
}

#[test]
fn fold_is_idempotent_across_opens() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = StatusStore::open(dir.path()).unwrap();
        store.record("run", "_j0", &submitted("55")).unwrap();
    }
    let end = TaskEntry {
        state: TaskState::Successful,
        time_end: Some("2026-01-10T08:25:00Z".to_string()),
        ..TaskEntry::default()
    };
    record_pending(dir.path(), "run", "_j0", "end", &end).unwrap();

    let first = StatusStore::open(dir.path()).unwrap();
    let after_first = first.entry("run", "_j0").unwrap().clone();
    drop(first);
    let second = StatusStore::open(dir.path()).unwrap();
    assert_eq!(second.entry("run", "_j0").unwrap(), &after_first);
}

#[test]
fn reconcile_fails_vanished_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StatusStore::open(dir.path()).unwrap();
    store.record("run", "_j0", &submitted("100")).unwrap();
    store.record("run", "_j1", &submitted("101")).unwrap();

    let live: std::collections::HashSet<String> = ["100".to_string()].into_iter().collect();
    let clock = FakeClock::new();
    let failed = store.reconcile(&live, &clock).unwrap();

    assert_eq!(failed, vec![("run".to_string(), "_j1".to_string())]);
    assert_eq!(store.entry("run", "_j0").unwrap().state, TaskState::Submitted);
    let gone = store.entry("run", "_j1").unwrap();
    assert_eq!(gone.state, TaskState::Failed);
    assert!(gone.reconciled_at.is_some());
}

#[test]
fn reconcile_leaves_terminal_entries_alone() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StatusStore::open(dir.path()).unwrap();
    store.record("run", "_j0", &submitted("1")).unwrap();
    store
        .record("run", "_j0", &TaskEntry::with_state(TaskState::Successful))
        .unwrap();

    let failed = store
        .reconcile(&std::collections::HashSet::new(), &FakeClock::new())
        .unwrap();
    assert!(failed.is_empty());
    assert_eq!(store.entry("run", "_j0").unwrap().state, TaskState::Successful);
}

#[test]
fn successful_set_is_monotonic_across_reconciles() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StatusStore::open(dir.path()).unwrap();
    store.record("run", "_j0", &submitted("1")).unwrap();
    store
        .record("run", "_j0", &TaskEntry::with_state(TaskState::Successful))
        .unwrap();
    store.record("run", "_j1", &submitted("2")).unwrap();

    let clock = FakeClock::new();
    let empty = std::collections::HashSet::new();
    for _ in 0..3 {
        store.reconcile(&empty, &clock).unwrap();
        assert_eq!(store.entry("run", "_j0").unwrap().state, TaskState::Successful);
    }
}

#[test]
fn reset_all_clears_every_entry() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StatusStore::open(dir.path()).unwrap();
    store.record("gen", "_j0", &submitted("1")).unwrap();
    store.record("collect", "", &submitted("2")).unwrap();

    let order = vec!["gen".to_string(), "collect".to_string()];
    let count = store.reset(&order, None).unwrap();
    assert_eq!(count, 2);
    assert_eq!(store.entry("gen", "_j0").unwrap().state, TaskState::NotSubmitted);
    assert!(store.entry("gen", "_j0").unwrap().job_id.is_none());
}

#[test]
fn reset_after_step_only_touches_later_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StatusStore::open(dir.path()).unwrap();
    store.record("gen", "_j0", &submitted("1")).unwrap();
    store.record("collect", "", &submitted("2")).unwrap();

    let order = vec!["gen".to_string(), "collect".to_string()];
    let count = store.reset(&order, Some("gen")).unwrap();
    assert_eq!(count, 1);
    assert_eq!(store.entry("gen", "_j0").unwrap().state, TaskState::Submitted);
    assert_eq!(store.entry("collect", "").unwrap().state, TaskState::NotSubmitted);
}

#[test]
fn monitor_token_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let clock = FakeClock::new();
    {
        let mut store = StatusStore::open(dir.path()).unwrap();
        store.set_monitor(Some(4242), &clock).unwrap();
    }
    let mut store = StatusStore::open(dir.path()).unwrap();
    assert_eq!(store.monitor_pid(), Some(4242));
    store.set_monitor(None, &clock).unwrap();
    assert_eq!(store.monitor_pid(), None);
}

#[test]
fn status_file_is_a_plain_mapping_of_steps() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = StatusStore::open(dir.path()).unwrap();
    store.record("generation", "_j0", &submitted("9")).unwrap();

    let text = std::fs::read_to_string(dir.path().join(STATUS_FILE)).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert!(value["generation"]["_j0"]["state"].is_string());
    assert_eq!(value["generation"]["_j0"]["job_id"], "9");
}
