// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Contract between the sync engine and a remote record store.
//!
//! The coordinator only talks to the backend through [`RemoteSyncAdapter`].
//! Implementations report transport-level trouble as [`AdapterError`] and
//! per-record verdicts inside a [`PushOutcome`], so one bad record never
//! fails the whole batch.

use std::future::Future;
use std::pin::Pin;

use chrono::{DateTime, Utc};
use ts_core::{Cursor, RemoteRecord};

use super::state::ErrorKind;

/// Boxed future returned by adapter operations.
pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AdapterError>> + Send + 'a>>;

/// Failure of a whole adapter call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdapterError {
    #[error("remote unreachable: {0}")]
    Unreachable(String),

    #[error("remote call timed out")]
    Timeout,

    #[error("remote rejected the request: {0}")]
    Rejected(String),

    #[error("protocol error: {0}")]
    Protocol(String),
}

impl AdapterError {
    /// How the failure is reported in a sync result.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AdapterError::Unreachable(_) => ErrorKind::NetworkUnavailable,
            AdapterError::Timeout => ErrorKind::Timeout,
            AdapterError::Rejected(_) | AdapterError::Protocol(_) => ErrorKind::RemoteRejected,
        }
    }
}

/// Why one pushed record was not accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushRejection {
    /// The record never reached the remote.
    Unreachable,
    /// The remote did not answer for this record in time.
    Timeout,
    /// The remote refused the record.
    Rejected { reason: String, retryable: bool },
    /// The remote holds a newer or divergent version.
    Superseded,
}

/// Per-record outcome of a push.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PushOutcome {
    pub succeeded: Vec<String>,
    pub failed: Vec<(String, PushRejection)>,
}

/// One page of remote changes.
#[derive(Debug, Clone, PartialEq)]
pub struct PullBatch {
    pub records: Vec<RemoteRecord>,
    pub next_cursor: Cursor,
    pub has_more: bool,
}

/// Backend operations the coordinator depends on.
pub trait RemoteSyncAdapter: Send + Sync {
    /// Upload records, oldest mutation first.
    fn push_pending(&mut self, records: Vec<RemoteRecord>) -> AdapterFuture<'_, PushOutcome>;

    /// Fetch changes after a checkpoint. `None` starts from the beginning.
    fn pull_changes(&mut self, since: Option<Cursor>) -> AdapterFuture<'_, PullBatch>;

    /// Fetch the latest versions in one scope modified strictly after `since`.
    fn fetch_latest_since(
        &mut self,
        scope: &str,
        since: Option<DateTime<Utc>>,
    ) -> AdapterFuture<'_, Vec<RemoteRecord>>;

    /// Register interest in remote changes to a scope.
    fn setup_subscription(&mut self, scope: &str) -> AdapterFuture<'_, ()>;

    /// Withdraw interest in a scope.
    fn teardown_subscription(&mut self, scope: &str) -> AdapterFuture<'_, ()>;

    /// Drain the subscribed scopes the remote announced as changed since the
    /// last call. Adapters without change notifications never report any.
    fn changed_scopes(&mut self) -> AdapterFuture<'_, Vec<String>> {
        Box::pin(async { Ok(Vec::new()) })
    }
}
