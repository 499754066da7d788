// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables used by the CLI are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `TIDESYNC_DIR` if set and non-empty.
///
/// Points at a `.tidesync` directory and bypasses the upward search.
pub fn work_dir() -> Option<PathBuf> {
    std::env::var(vars::TIDESYNC_DIR)
        .ok()
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Returns the value of `TIDESYNC_REMOTE` if set and non-empty.
///
/// Overrides `[remote] url` from the config file.
pub fn remote_url() -> Option<String> {
    std::env::var(vars::TIDESYNC_REMOTE)
        .ok()
        .filter(|v| !v.is_empty())
}

/// Returns the value of `RUST_LOG` if set.
pub fn log_filter() -> Option<String> {
    std::env::var(vars::RUST_LOG).ok()
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
