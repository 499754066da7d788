// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::path::PathBuf;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::TIDESYNC_DIR, "TIDESYNC_DIR");
    assert_eq!(vars::TIDESYNC_REMOTE, "TIDESYNC_REMOTE");
    assert_eq!(vars::RUST_LOG, "RUST_LOG");
}

#[test]
fn test_work_dir_set_and_unset() {
    std::env::set_var("TIDESYNC_DIR", "/tmp/app/.tidesync");
    assert_eq!(work_dir(), Some(PathBuf::from("/tmp/app/.tidesync")));

    std::env::set_var("TIDESYNC_DIR", "");
    assert_eq!(work_dir(), None);

    std::env::remove_var("TIDESYNC_DIR");
    assert_eq!(work_dir(), None);
}

#[test]
fn test_remote_url_set_and_unset() {
    std::env::set_var("TIDESYNC_REMOTE", "ws://localhost:7070");
    assert_eq!(remote_url().as_deref(), Some("ws://localhost:7070"));

    std::env::remove_var("TIDESYNC_REMOTE");
    assert_eq!(remote_url(), None);
}
