// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Modification timestamps for local mutations.
//!
//! Last-writer-wins only works if a local edit is stamped later than every
//! version it was derived from. [`Stamper`] hands out millisecond timestamps
//! that never go backwards, even when the wall clock does, and advances past
//! any remote timestamp it has observed.

use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicI64, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for getting the current wall clock time.
///
/// This allows injecting a mock clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> i64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// Clock with manually controlled time.
#[derive(Debug, Default)]
pub struct ManualClock {
    time_ms: AtomicI64,
}

impl ManualClock {
    pub fn new(initial_ms: i64) -> Self {
        ManualClock { time_ms: AtomicI64::new(initial_ms) }
    }

    pub fn set(&self, ms: i64) {
        self.time_ms.store(ms, AtomicOrdering::SeqCst);
    }

    pub fn advance(&self, ms: i64) {
        self.time_ms.fetch_add(ms, AtomicOrdering::SeqCst);
    }
}

impl ClockSource for ManualClock {
    fn now_ms(&self) -> i64 {
        self.time_ms.load(AtomicOrdering::SeqCst)
    }
}

/// Converts milliseconds since the epoch to a UTC timestamp.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}

/// Produces strictly increasing modification timestamps.
pub struct Stamper {
    clock: Box<dyn ClockSource>,
    last_ms: Mutex<i64>,
}

impl Stamper {
    pub fn new(clock: impl ClockSource + 'static) -> Self {
        Stamper { clock: Box::new(clock), last_ms: Mutex::new(i64::MIN) }
    }

    /// Returns a timestamp later than every timestamp issued or observed so far.
    pub fn stamp(&self) -> DateTime<Utc> {
        let physical = self.clock.now_ms();
        let mut last = self.last_ms.lock().unwrap_or_else(|e| e.into_inner());
        let next = if physical > *last { physical } else { *last + 1 };
        *last = next;
        from_millis(next)
    }

    /// Records a timestamp that came from elsewhere (remote or disk).
    pub fn observe(&self, seen: DateTime<Utc>) {
        let seen_ms = seen.timestamp_millis();
        let mut last = self.last_ms.lock().unwrap_or_else(|e| e.into_inner());
        if seen_ms > *last {
            *last = seen_ms;
        }
    }
}

impl Default for Stamper {
    fn default() -> Self {
        Stamper::new(SystemClock)
    }
}

impl std::fmt::Debug for Stamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let last = *self.last_ms.lock().unwrap_or_else(|e| e.into_inner());
        f.debug_struct("Stamper").field("last_ms", &last).finish()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
