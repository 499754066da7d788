// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ts-core operations.

use thiserror::Error;

/// All possible errors that can occur in ts-core operations.
#[derive(Debug, Error)]
pub enum Error {
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

    #[error("{0}")]
    InvalidInput(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for ts-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
