// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

#[test]
fn creates_work_dir() {
    let temp = TempDir::new().unwrap();

    tsync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized tidesync store"));

    assert!(temp.path().join(".tidesync").exists());
    assert!(temp.path().join(".tidesync/config.toml").exists());
    assert!(temp.path().join(".tidesync/records.db").exists());
}

#[test]
fn fails_if_already_initialized() {
    let temp = init_temp();

    tsync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("already initialized"));
}

#[test]
fn rejects_non_websocket_remote() {
    let temp = TempDir::new().unwrap();

    tsync()
        .args(["init", "--remote", "http://example.com"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("must start with ws://"));
}

#[test]
fn commands_outside_work_dir_fail() {
    let temp = TempDir::new().unwrap();

    tsync()
        .arg("list")
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("run 'tsync init' first"));
}

#[test]
fn tidesync_dir_env_points_at_work_dir() {
    let temp = init_temp();
    let elsewhere = TempDir::new().unwrap();

    tsync()
        .args(["put", "--id", "n-1", "{}"])
        .env("TIDESYNC_DIR", temp.path().join(".tidesync"))
        .current_dir(elsewhere.path())
        .assert()
        .success();

    tsync()
        .args(["list", "-o", "id"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout("n-1\n");
}

#[test]
fn config_set_and_show() {
    let temp = init_temp();

    tsync()
        .args(["config", "set", "remote.url", "ws://localhost:7070"])
        .current_dir(temp.path())
        .assert()
        .success();

    tsync()
        .args(["config", "show"])
        .current_dir(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("url = \"ws://localhost:7070\""));

    tsync()
        .args(["config", "set", "sync.bogus", "1"])
        .current_dir(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"));
}
