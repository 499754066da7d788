// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;
use yare::parameterized;

#[test]
fn put_then_show() {
    let temp = init_temp();
    let id = put(&temp, "notes", r#"{"title":"milk"}"#);
    assert!(id.starts_with("notes-"));

    tsync()
        .args(["show", &id])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("[notes] {id}")))
        .stdout(predicate::str::contains("Status: pending_upload"))
        .stdout(predicate::str::contains("\"title\": \"milk\""))
        .stdout(predicate::str::contains("local_write"));
}

#[test]
fn show_json_is_single_line() {
    let temp = init_temp();
    let id = put(&temp, "notes", r#"{"n":1}"#);

    let output = tsync()
        .args(["show", &id, "-o", "json"])
        .current_dir(temp.path())
        .output()
        .unwrap();
    let text = String::from_utf8(output.stdout).unwrap();
    let value: serde_json::Value = serde_json::from_str(text.trim()).unwrap();
    assert_eq!(value["id"], id.as_str());
    assert_eq!(value["payload"]["n"], 1);
}

#[test]
fn list_and_pending_follow_writes() {
    let temp = init_temp();
    put(&temp, "notes", r#"{"n":1}"#);
    let id = put(&temp, "tasks", r#"{"n":2}"#);

    tsync()
        .args(["list", "-s", "tasks", "-o", "id"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(format!("{id}\n"));

    tsync()
        .arg("pending")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("(pending_upload)").count(2));
}

#[test]
fn rm_leaves_tombstone_visible_with_all() {
    let temp = init_temp();
    let id = put(&temp, "notes", "{}");

    tsync()
        .args(["rm", &id])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    tsync()
        .args(["list", "-o", "id"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("");

    tsync()
        .args(["list", "--all"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("pending_upload, deleted"));
}

#[parameterized(
    show = { &["show", "missing"] },
    rm = { &["rm", "missing"] },
)]
fn unknown_record_fails(args: &[&str]) {
    let temp = init_temp();
    tsync()
        .args(args)
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("record not found: missing"));
}

#[test]
fn resolve_requires_conflict() {
    let temp = init_temp();
    let id = put(&temp, "notes", "{}");

    tsync()
        .args(["resolve", &id, "--keep", "local"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("not in conflict"));

    tsync()
        .arg("conflicts")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("No conflicts.\n");
}

#[test]
fn invalid_status_filter_has_hint() {
    let temp = init_temp();
    tsync()
        .args(["list", "--status", "lost"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("hint: valid statuses are"));
}
