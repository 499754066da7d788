// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::commands::testing::TestContext;
use crate::error::Error;
use serde_json::json;
use ts_core::EventAction;

#[test]
fn test_details_include_audit_trail() {
    let mut ctx = TestContext::new();
    ctx.put("n-1", "notes", json!({"v": 1})).advance(5);
    ctx.store.delete_local("n-1").unwrap();

    let details = build_record_details(&ctx.store, "n-1").unwrap();
    let actions: Vec<_> = details.events.iter().map(|e| e.action).collect();
    assert_eq!(actions, [EventAction::LocalWrite, EventAction::LocalDelete]);
    assert!(details.conflict_remote.is_none());
}

#[test]
fn test_details_include_conflict_remote() {
    let mut ctx = TestContext::new();
    ctx.put("n-1", "notes", json!({"v": "local"}))
        .conflict("n-1", json!({"v": "remote"}));

    let details = build_record_details(&ctx.store, "n-1").unwrap();
    assert_eq!(details.conflict_remote.unwrap().payload, json!({"v": "remote"}));
}

#[test]
fn test_details_json_flattens_record() {
    let mut ctx = TestContext::new();
    ctx.put("n-1", "notes", json!({"v": 1}));

    let details = build_record_details(&ctx.store, "n-1").unwrap();
    let value = serde_json::to_value(&details).unwrap();
    assert_eq!(value["id"], "n-1");
    assert_eq!(value["sync_status"], "pending_upload");
    assert!(value.get("conflict_remote").is_none());
    assert_eq!(value["events"].as_array().unwrap().len(), 1);
}

#[test]
fn test_details_unknown_record() {
    let ctx = TestContext::new();
    let err = build_record_details(&ctx.store, "missing").unwrap_err();
    assert!(matches!(err, Error::RecordNotFound(_)));
}
