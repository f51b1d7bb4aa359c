// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fake_clock_starts_at_a_fixed_instant() {
    let one = FakeClock::new();
    let two = FakeClock::new();
    assert_eq!(one.now(), two.now());
}

#[test]
fn fake_clock_advances_by_seconds() {
    let clock = FakeClock::new();
    let start = clock.now();
    clock.advance_secs(90);
    assert_eq!(clock.now() - start, chrono::Duration::seconds(90));
    clock.advance_secs(-30);
    assert_eq!(clock.now() - start, chrono::Duration::seconds(60));
}

#[test]
fn fake_clock_timestamp_is_rfc3339_seconds_utc() {
    let clock = FakeClock::new();
    assert_eq!(clock.timestamp(), "2026-01-01T00:00:00Z");
    clock.advance_secs(3661);
    assert_eq!(clock.timestamp(), "2026-01-01T01:01:01Z");
}

#[test]
fn system_clock_timestamp_shape() {
    let stamp = SystemClock.timestamp();
    // seconds precision, UTC suffix, no fractional part
    assert!(stamp.ends_with('Z'));
    assert!(!stamp.contains('.'));
    let parsed = chrono::DateTime::parse_from_rfc3339(&stamp).unwrap();
    assert_eq!(parsed.offset().local_minus_utc(), 0);
}

#[test]
fn system_clock_is_monotonic_enough_for_status_stamps() {
    let clock = SystemClock;
    let first = clock.now();
    let second = clock.now();
    assert!(second >= first);
}
