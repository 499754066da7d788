// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use serde_json::json;
use ts_core::SyncStatus;

#[test]
fn test_put_generates_id_in_default_scope() {
    let mut ctx = TestContext::new();
    let record = run_impl(&mut ctx.store, json!({"title": "milk"}), None, None).unwrap();

    assert!(record.id.starts_with("default-"));
    assert_eq!(record.scope, DEFAULT_SCOPE);
    assert_eq!(record.sync_status, SyncStatus::PendingUpload);
    assert_eq!(ctx.store.count_pending().unwrap(), 1);
}

#[test]
fn test_put_generated_ids_do_not_collide() {
    let mut ctx = TestContext::new();
    let a = run_impl(&mut ctx.store, json!({}), None, Some("notes")).unwrap();
    let b = run_impl(&mut ctx.store, json!({}), None, Some("notes")).unwrap();

    assert_ne!(a.id, b.id);
    assert_eq!(ctx.store.list(Some("notes"), None).unwrap().len(), 2);
}

#[test]
fn test_put_update_keeps_scope() {
    let mut ctx = TestContext::new();
    ctx.put("n-1", "notes", json!({"v": 1})).synced("n-1").advance(10);

    let record = run_impl(&mut ctx.store, json!({"v": 2}), Some("n-1"), None).unwrap();
    assert_eq!(record.scope, "notes");
    assert_eq!(record.revision, 2);
    assert_eq!(record.sync_status, SyncStatus::PendingUpload);
    assert_eq!(record.payload, json!({"v": 2}));
}

#[test]
fn test_put_update_of_conflict_stays_in_conflict() {
    let mut ctx = TestContext::new();
    ctx.put("n-1", "notes", json!({"v": 1}))
        .conflict("n-1", json!({"v": "remote"}));

    let record = run_impl(&mut ctx.store, json!({"v": 2}), Some("n-1"), None).unwrap();
    assert_eq!(record.sync_status, SyncStatus::Conflict);
}

#[test]
fn test_put_rejects_invalid_scope() {
    let mut ctx = TestContext::new();
    let err = run_impl(&mut ctx.store, json!({}), None, Some("My Notes")).unwrap_err();
    assert!(err.to_string().contains("invalid scope 'My Notes'"));
    assert_eq!(ctx.store.count_pending().unwrap(), 0);
}

#[test]
fn test_put_update_rejects_different_scope() {
    let mut ctx = TestContext::new();
    ctx.put("n-1", "notes", json!({"v": 1})).synced("n-1");

    let err = run_impl(&mut ctx.store, json!({"v": 2}), Some("n-1"), Some("tasks")).unwrap_err();
    assert!(err.to_string().contains("record 'n-1' is in scope 'notes', not 'tasks'"));

    let stored = ctx.store.get_required("n-1").unwrap();
    assert_eq!(stored.scope, "notes");
    assert_eq!(stored.payload, json!({"v": 1}));
    assert_eq!(stored.sync_status, SyncStatus::Synced);
}

#[test]
fn test_put_update_accepts_matching_scope() {
    let mut ctx = TestContext::new();
    ctx.put("n-1", "notes", json!({"v": 1}));

    let record = run_impl(&mut ctx.store, json!({"v": 2}), Some("n-1"), Some("notes")).unwrap();
    assert_eq!(record.scope, "notes");
    assert_eq!(record.revision, 2);
}
