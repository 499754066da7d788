// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::config::init_work_dir;
use tempfile::TempDir;

#[test]
fn test_set_persists() {
    let temp = TempDir::new().unwrap();
    let work_dir = init_work_dir(temp.path(), None).unwrap();

    set_impl(&work_dir, "remote.url", "ws://localhost:7070").unwrap();
    set_impl(&work_dir, "sync.auto_sync_interval_seconds", "60").unwrap();

    let config = Config::load(&work_dir).unwrap();
    assert_eq!(config.remote.unwrap().url, "ws://localhost:7070");
    assert_eq!(config.sync.auto_sync_interval_seconds, 60);
}

#[test]
fn test_set_invalid_value_leaves_file_untouched() {
    let temp = TempDir::new().unwrap();
    let work_dir = init_work_dir(temp.path(), None).unwrap();
    let before = std::fs::read_to_string(get_config_path(&work_dir)).unwrap();

    assert!(set_impl(&work_dir, "sync.auto_sync_interval_seconds", "0").is_err());
    assert!(set_impl(&work_dir, "nope", "1").is_err());

    let after = std::fs::read_to_string(get_config_path(&work_dir)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn test_render_includes_sections() {
    let config = Config::with_remote("ws://localhost:7070").unwrap();
    let text = render(&config).unwrap();
    assert!(text.contains("[sync]"));
    assert!(text.contains("[remote]"));
    assert!(text.contains("[network]"));
    assert!(text.contains("auto_sync_interval_seconds = 300"));
}
