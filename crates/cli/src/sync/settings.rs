// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-facing auto-sync settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default interval between periodic sync passes.
pub const DEFAULT_INTERVAL_SECONDS: u64 = 300;

/// Default quiet period after a local change before a sync is triggered.
pub const DEFAULT_DEBOUNCE_MILLIS: u64 = 1000;

/// Default upper bound on a single remote call.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Settings read by the scheduler on every decision.
///
/// Every field has a default so a partial `[sync]` table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Master switch for automatic triggers. Manual syncs ignore it.
    pub auto_sync_enabled: bool,
    /// Seconds between periodic passes.
    pub auto_sync_interval_seconds: u64,
    /// Allow automatic passes on metered connections.
    pub allow_metered_sync: bool,
    /// Quiet period after local changes, in milliseconds.
    pub debounce_millis: u64,
    /// Upper bound on one remote call, in seconds.
    pub request_timeout_seconds: u64,
}

impl Default for SyncSettings {
    fn default() -> Self {
        SyncSettings {
            auto_sync_enabled: true,
            auto_sync_interval_seconds: DEFAULT_INTERVAL_SECONDS,
            allow_metered_sync: false,
            debounce_millis: DEFAULT_DEBOUNCE_MILLIS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }
}

impl SyncSettings {
    /// Periodic interval, never shorter than one second.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.auto_sync_interval_seconds.max(1))
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_millis)
    }

    /// Timeout for one remote call, never shorter than one second.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }

    /// Check values that would make the scheduler misbehave.
    pub fn validate(&self) -> Result<(), String> {
        if self.auto_sync_interval_seconds == 0 {
            return Err("auto_sync_interval_seconds must be at least 1".to_string());
        }
        if self.request_timeout_seconds == 0 {
            return Err("request_timeout_seconds must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
