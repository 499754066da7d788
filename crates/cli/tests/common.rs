// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// The tsync binary with a clean environment.
pub fn tsync() -> Command {
    let mut cmd = cargo_bin_cmd!("tsync");
    cmd.env_remove("TIDESYNC_DIR")
        .env_remove("TIDESYNC_REMOTE")
        .env("RUST_LOG", "off");
    cmd
}

/// Helper to create an initialized temp directory without a remote
pub fn init_temp() -> TempDir {
    let temp = TempDir::new().unwrap();
    tsync()
        .arg("init")
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to create an initialized temp directory pointing at `url`
pub fn init_temp_with_remote(url: &str) -> TempDir {
    let temp = TempDir::new().unwrap();
    tsync()
        .args(["init", "--remote", url])
        .current_dir(temp.path())
        .assert()
        .success();
    temp
}

/// Helper to create a record and return its ID
pub fn put(temp: &TempDir, scope: &str, payload: &str) -> String {
    let output = tsync()
        .args(["put", "-s", scope, "-o", "id", payload])
        .current_dir(temp.path())
        .output()
        .unwrap();
    assert!(output.status.success(), "put failed: {output:?}");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// A `ws://` URL on a local port nothing listens on.
pub fn dead_remote_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("ws://{addr}")
}
