// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::clock::from_millis;
use serde_json::json;
use yare::parameterized;

fn local(ms: i64, payload: Value) -> Record {
    Record::new("r1".into(), "reports".into(), payload, from_millis(ms))
}

fn remote(ms: i64, payload: Value) -> RemoteRecord {
    RemoteRecord {
        id: "r1".into(),
        scope: "reports".into(),
        last_modified: from_millis(ms),
        deleted: false,
        payload,
    }
}

#[parameterized(
    local_newer = { 2_000, 1_000, "local" },
    remote_newer = { 1_000, 2_000, "remote" },
    five_seconds_apart = { 10_000, 15_000, "remote" },
)]
fn newer_timestamp_wins(local_ms: i64, remote_ms: i64, expected: &str) {
    let resolver = LastWriterWins::new();
    let outcome = resolver.resolve(&local(local_ms, json!({"a": 1})), &remote(remote_ms, json!({"a": 2})));
    assert_eq!(outcome.label(), expected);
}

#[test]
fn outcome_does_not_depend_on_sync_order() {
    let resolver = LastWriterWins::new();
    let device_a = local(10_000, json!({"title": "a"}));
    let device_b = local(15_000, json!({"title": "b"}));

    // Device A sees B's version as remote, B sees A's version as remote.
    let on_a = resolver.resolve(&device_a, &device_b.to_remote());
    let on_b = resolver.resolve(&device_b, &device_a.to_remote());

    assert_eq!(on_a, Resolution::UseRemote);
    assert_eq!(on_b, Resolution::UseLocal);
}

#[test]
fn identical_versions_take_remote() {
    let resolver = LastWriterWins::new();
    let outcome = resolver.resolve(&local(1_000, json!({"a": 1})), &remote(1_000, json!({"a": 1})));
    assert_eq!(outcome, Resolution::UseRemote);
}

#[test]
fn tie_with_disjoint_fields_merges() {
    let resolver = LastWriterWins::new();
    let outcome = resolver.resolve(&local(1_000, json!({"a": 1})), &remote(1_000, json!({"b": 2})));

    assert_eq!(outcome, Resolution::Merge(remote(1_000, json!({"a": 1, "b": 2}))));
}

#[test]
fn tie_with_agreeing_shared_fields_merges() {
    let resolver = LastWriterWins::new();
    let outcome = resolver.resolve(
        &local(1_000, json!({"a": 1, "b": 2})),
        &remote(1_000, json!({"a": 1, "c": 3})),
    );
    assert_eq!(outcome.label(), "merged");
}

#[parameterized(
    divergent_field = { json!({"a": 1}), json!({"a": 2}) },
    scalar_payloads = { json!(1), json!(2) },
    object_and_array = { json!({"a": 1}), json!([1]) },
)]
fn tie_that_cannot_merge_is_manual(ours: Value, theirs: Value) {
    let resolver = LastWriterWins::new();
    assert_eq!(resolver.resolve(&local(1_000, ours), &remote(1_000, theirs)), Resolution::Manual);
}

#[test]
fn tie_against_tombstone_is_manual() {
    let resolver = LastWriterWins::new();
    let mut theirs = remote(1_000, json!({"b": 2}));
    theirs.deleted = true;
    assert_eq!(resolver.resolve(&local(1_000, json!({"a": 1})), &theirs), Resolution::Manual);
}

#[test]
fn no_merge_policy_turns_ties_manual() {
    let resolver = LastWriterWins::with_policy(NoMerge);
    let outcome = resolver.resolve(&local(1_000, json!({"a": 1})), &remote(1_000, json!({"b": 2})));
    assert_eq!(outcome, Resolution::Manual);
}

#[test]
fn newer_tombstone_wins() {
    let resolver = LastWriterWins::new();
    let mut theirs = remote(2_000, json!(null));
    theirs.deleted = true;
    assert_eq!(resolver.resolve(&local(1_000, json!({"a": 1})), &theirs), Resolution::UseRemote);
}
