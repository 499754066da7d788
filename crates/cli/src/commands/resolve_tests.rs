// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use crate::error::Error;
use serde_json::json;
use ts_core::SyncStatus;

fn parked() -> TestContext {
    let mut ctx = TestContext::new();
    ctx.put("a", "notes", json!({"v": "local"}))
        .conflict("a", json!({"v": "remote"}))
        .advance(10);
    ctx
}

#[test]
fn test_keep_local_queues_upload() {
    let mut ctx = parked();
    let record = run_impl(&mut ctx.store, "a", ResolutionSide::Local, None).unwrap();
    assert_eq!(record.sync_status, SyncStatus::PendingUpload);
    assert_eq!(record.payload, json!({"v": "local"}));
    assert!(!record.conflict_resolution_needed);
}

#[test]
fn test_keep_remote_applies_stored_version() {
    let mut ctx = parked();
    let record = run_impl(&mut ctx.store, "a", ResolutionSide::Remote, None).unwrap();
    assert_eq!(record.sync_status, SyncStatus::Synced);
    assert_eq!(record.payload, json!({"v": "remote"}));
}

#[test]
fn test_keep_merged_stores_payload() {
    let mut ctx = parked();
    let merged = json!({"v": "both"});
    let record =
        run_impl(&mut ctx.store, "a", ResolutionSide::Merged, Some(merged.clone())).unwrap();
    assert_eq!(record.sync_status, SyncStatus::PendingUpload);
    assert_eq!(record.payload, merged);
}

#[test]
fn test_resolve_record_not_in_conflict() {
    let mut ctx = TestContext::new();
    ctx.put("a", "notes", json!({}));
    let err = run_impl(&mut ctx.store, "a", ResolutionSide::Local, None).unwrap_err();
    assert!(matches!(err, Error::NotInConflict(_)));
}
