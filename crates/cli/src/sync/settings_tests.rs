// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

#[test]
fn defaults() {
    let settings = SyncSettings::default();
    assert!(settings.auto_sync_enabled);
    assert!(!settings.allow_metered_sync);
    assert_eq!(settings.interval(), Duration::from_secs(300));
    assert_eq!(settings.debounce(), Duration::from_millis(1000));
    assert_eq!(settings.request_timeout(), Duration::from_secs(30));
    assert!(settings.validate().is_ok());
}

#[test]
fn partial_table_fills_defaults() {
    let settings: SyncSettings = toml::from_str("allow_metered_sync = true").unwrap();
    assert!(settings.allow_metered_sync);
    assert!(settings.auto_sync_enabled);
    assert_eq!(settings.auto_sync_interval_seconds, 300);
}

#[test]
fn zero_interval_is_clamped_and_rejected() {
    let settings = SyncSettings { auto_sync_interval_seconds: 0, ..Default::default() };
    assert_eq!(settings.interval(), Duration::from_secs(1));
    let err = settings.validate().unwrap_err();
    assert!(err.contains("auto_sync_interval_seconds"));
}

#[test]
fn zero_timeout_rejected() {
    let settings = SyncSettings { request_timeout_seconds: 0, ..Default::default() };
    assert!(settings.validate().unwrap_err().contains("request_timeout_seconds"));
}
