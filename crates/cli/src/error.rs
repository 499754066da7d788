// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All possible errors that can occur in the tsync library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("not initialized: run 'tsync init' first")]
    NotInitialized,

    #[error("already initialized at {0}")]
    AlreadyInitialized(String),

    #[error("record not found: {0}")]
    RecordNotFound(String),

    #[error("invalid sync status: '{0}'\n  hint: valid statuses are: synced, pending_upload, pending_download, conflict")]
    InvalidSyncStatus(String),

    #[error("invalid resolution: '{0}'\n  hint: valid sides are: local, remote, merged")]
    InvalidResolution(String),

    #[error("record is not in conflict: {0}\n  hint: only records listed by 'tsync conflicts' need a decision")]
    NotInConflict(String),

    #[error("record is in conflict: {0}\n  hint: pick a side with 'tsync resolve {0} --keep local|remote'")]
    InConflict(String),

    #[error("no remote configured\n  hint: run 'tsync config set remote.url ws://host:port' or set TIDESYNC_REMOTE")]
    NoRemote,

    #[error("unknown config key: '{0}'\n  hint: valid keys are: {keys}", keys = crate::config::SETTABLE_KEYS.join(", "))]
    UnknownConfigKey(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidConfigValue { key: String, reason: String },

    #[error("unknown format: '{format}'\n  hint: valid formats are: text, json")]
    UnknownFormat { format: String },

    #[error("{0}")]
    InvalidInput(String),

    #[error("sync failed: {0}")]
    SyncFailed(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("corrupted data in database: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for tsync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<ts_core::Error> for Error {
    fn from(e: ts_core::Error) -> Self {
        match e {
            ts_core::Error::RecordNotFound(id) => Error::RecordNotFound(id),
            ts_core::Error::InvalidSyncStatus(s) => Error::InvalidSyncStatus(s),
            ts_core::Error::InvalidResolution(s) => Error::InvalidResolution(s),
            ts_core::Error::NotInConflict(id) => Error::NotInConflict(id),
            ts_core::Error::InConflict(id) => Error::InConflict(id),
            ts_core::Error::InvalidInput(s) => Error::InvalidInput(s),
            ts_core::Error::Database(e) => Error::Database(e),
            ts_core::Error::Io(e) => Error::Io(e),
            ts_core::Error::Json(e) => Error::Json(e),
            ts_core::Error::CorruptedData(s) => Error::CorruptedData(s),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
