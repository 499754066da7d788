// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::{Path, PathBuf};

use ts_core::RecordStore;

use crate::config::{get_db_path, init_work_dir};
use crate::error::Result;

pub fn run(path: Option<String>, remote: Option<String>) -> Result<()> {
    let target_path = match path {
        Some(p) => PathBuf::from(p),
        None => std::env::current_dir()?,
    };

    let work_dir = run_impl(&target_path, remote.as_deref())?;

    println!("Initialized tidesync store at {}", work_dir.display());
    match remote {
        Some(url) => println!("Remote: {}", url),
        None => println!("No remote yet: run 'tsync config set remote.url ws://host:port'"),
    }
    Ok(())
}

/// Create the work dir and an empty, migrated record store.
pub(crate) fn run_impl(target_path: &Path, remote: Option<&str>) -> Result<PathBuf> {
    let work_dir = init_work_dir(target_path, remote)?;
    RecordStore::open(&get_db_path(&work_dir))?;
    Ok(work_dir)
}

#[cfg(test)]
#[path = "init_tests.rs"]
mod tests;
