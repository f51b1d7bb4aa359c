// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction so status timestamps are testable.

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use std::sync::Mutex;

/// Source of wall-clock time for status records.
pub trait Clock {
    fn now(&self) -> DateTime<Utc>;

    /// RFC 3339 rendering used in status files.
    fn timestamp(&self) -> String {
        self.now().to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests.
pub struct FakeClock {
    now: Mutex<DateTime<Utc>>,
}

impl FakeClock {
    /// Starts at a fixed, arbitrary instant.
    pub fn new() -> Self {
        FakeClock {
            now: Mutex::new(Utc.timestamp_opt(1_767_225_600, 0).single().unwrap_or_default()),
        }
    }

    pub fn advance_secs(&self, secs: i64) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now = *now + chrono::Duration::seconds(secs);
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        FakeClock::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
