// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Observable sync outcome types.
//!
//! [`SyncState`] is the only surface through which the rest of the
//! application learns about sync progress. Failures never escape the engine
//! as errors; they are carried as [`SyncFailure`] values inside an immutable
//! [`SyncResult`] or as the kind attached to [`SyncState::Failed`].

use serde::Serialize;
use std::fmt;

/// Classification of everything that can go wrong during a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The remote could not be reached.
    NetworkUnavailable,
    /// The remote refused the request (quota, auth, validation).
    RemoteRejected,
    /// The resolver could not decide and the record was parked.
    ConflictUnresolved,
    /// An adapter call did not finish in time.
    Timeout,
    /// The record store failed to persist a transition.
    LocalStoreFailure,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NetworkUnavailable => "network_unavailable",
            ErrorKind::RemoteRejected => "remote_rejected",
            ErrorKind::ConflictUnresolved => "conflict_unresolved",
            ErrorKind::Timeout => "timeout",
            ErrorKind::LocalStoreFailure => "local_store_failure",
        }
    }

    /// Errors that the next scheduled pass retries without special handling.
    pub fn is_transient(&self) -> bool {
        matches!(self, ErrorKind::NetworkUnavailable | ErrorKind::Timeout)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One failure collected during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncFailure {
    pub kind: ErrorKind,
    /// The record the failure concerns, if it is record-specific.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<String>,
    pub detail: String,
    /// The record will not be retried until something changes locally.
    pub permanent: bool,
}

impl SyncFailure {
    /// A failure that concerns the whole pass.
    pub fn pass(kind: ErrorKind, detail: impl Into<String>) -> Self {
        SyncFailure { kind, record_id: None, detail: detail.into(), permanent: false }
    }

    /// A failure that concerns one record.
    pub fn record(kind: ErrorKind, id: impl Into<String>, detail: impl Into<String>) -> Self {
        SyncFailure { kind, record_id: Some(id.into()), detail: detail.into(), permanent: false }
    }

    pub fn permanent(mut self) -> Self {
        self.permanent = true;
        self
    }
}

impl fmt::Display for SyncFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.record_id {
            Some(id) => write!(f, "{} [{}]: {}", self.kind, id, self.detail)?,
            None => write!(f, "{}: {}", self.kind, self.detail)?,
        }
        if self.permanent {
            write!(f, " (permanent)")?;
        }
        Ok(())
    }
}

/// Immutable summary of one coordinator run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncResult {
    uploaded: usize,
    downloaded: usize,
    conflicts_detected: usize,
    errors: Vec<SyncFailure>,
}

impl SyncResult {
    pub fn uploaded(&self) -> usize {
        self.uploaded
    }

    pub fn downloaded(&self) -> usize {
        self.downloaded
    }

    pub fn conflicts_detected(&self) -> usize {
        self.conflicts_detected
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn errors(&self) -> &[SyncFailure] {
        &self.errors
    }

    /// The kinds of all collected failures, in the order they happened.
    pub fn error_kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(|e| e.kind).collect()
    }

    /// Number of records that moved between local and remote.
    pub fn synced_count(&self) -> usize {
        self.uploaded + self.downloaded
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "uploaded {}, downloaded {}, conflicts {}, errors {}",
            self.uploaded,
            self.downloaded,
            self.conflicts_detected,
            self.errors.len()
        )
    }
}

/// Mutable tally used while a pass is running.
#[derive(Debug, Default)]
pub(crate) struct ResultBuilder {
    pub uploaded: usize,
    pub downloaded: usize,
    pub conflicts_detected: usize,
    pub errors: Vec<SyncFailure>,
}

impl ResultBuilder {
    pub fn fail(&mut self, failure: SyncFailure) {
        self.errors.push(failure);
    }

    /// True when nothing moved and nothing was decided.
    pub fn is_untouched(&self) -> bool {
        self.uploaded == 0 && self.downloaded == 0 && self.conflicts_detected == 0
    }

    pub fn finish(self) -> SyncResult {
        SyncResult {
            uploaded: self.uploaded,
            downloaded: self.downloaded,
            conflicts_detected: self.conflicts_detected,
            errors: self.errors,
        }
    }
}

/// Public sync state observed by the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "result", rename_all = "snake_case")]
pub enum SyncState {
    #[default]
    Idle,
    Syncing,
    Success(SyncResult),
    PartialSuccess(SyncResult),
    Failed(ErrorKind),
}

impl SyncState {
    pub fn is_syncing(&self) -> bool {
        matches!(self, SyncState::Syncing)
    }

    /// The result of the last finished pass, if it produced one.
    pub fn result(&self) -> Option<&SyncResult> {
        match self {
            SyncState::Success(r) | SyncState::PartialSuccess(r) => Some(r),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SyncState::Idle => "idle",
            SyncState::Syncing => "syncing",
            SyncState::Success(_) => "success",
            SyncState::PartialSuccess(_) => "partial_success",
            SyncState::Failed(_) => "failed",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncState::Success(r) | SyncState::PartialSuccess(r) => {
                write!(f, "{} ({})", self.label(), r)
            }
            SyncState::Failed(kind) => write!(f, "failed ({kind})"),
            _ => write!(f, "{}", self.label()),
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
