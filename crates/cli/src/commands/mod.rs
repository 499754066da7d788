// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod conflicts;
pub mod init;
pub mod list;
pub mod pending;
pub mod put;
pub mod resolve;
pub mod rm;
pub mod show;
pub mod sync;
#[cfg(test)]
#[path = "mod_tests.rs"]
pub mod testing;
pub mod watch;

use std::path::PathBuf;

use ts_core::RecordStore;

use crate::config::{find_work_dir, get_db_path, Config};
use crate::error::{Error, Result};
use crate::sync::WebSocketAdapter;

/// Helper to open the record store from the current context.
pub fn open_store() -> Result<(RecordStore, Config, PathBuf)> {
    let work_dir = find_work_dir()?;
    let config = Config::load(&work_dir)?;
    let store = RecordStore::open(&get_db_path(&work_dir))?;
    Ok((store, config, work_dir))
}

/// Runtime for the commands that talk to the remote.
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::Io)
}

/// Adapter for the configured remote.
pub(crate) fn remote_adapter(config: &Config) -> Result<WebSocketAdapter> {
    let url = config.remote_url().ok_or(Error::NoRemote)?;
    Ok(WebSocketAdapter::new(url))
}
