// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Syncable record types.
//!
//! A [`Record`] is the local copy of a domain entity plus the metadata the
//! sync engine needs: status, modification time, conflict flag, tombstone
//! marker and a local revision counter. [`RemoteRecord`] is the shape that
//! crosses the adapter boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Sync state of a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    /// Local state matches the last confirmed remote state.
    Synced,
    /// Local mutation waiting to be pushed.
    ///
    /// A row the remote rejected permanently keeps this status with
    /// `rejected_reason` set, but is not pushed again (and not counted as
    /// pending) until the next local mutation clears the reason.
    PendingUpload,
    /// Remote signalled a newer version that has not been fetched yet.
    PendingDownload,
    /// Parked until an external decision picks a side.
    Conflict,
}

impl SyncStatus {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Synced => "synced",
            SyncStatus::PendingUpload => "pending_upload",
            SyncStatus::PendingDownload => "pending_download",
            SyncStatus::Conflict => "conflict",
        }
    }

    /// Returns true for the statuses returned by `fetch_pending`.
    ///
    /// Rows flagged as rejected are the exception; see [`SyncStatus::PendingUpload`].
    pub fn is_pending(&self) -> bool {
        matches!(self, SyncStatus::PendingUpload | SyncStatus::PendingDownload)
    }
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for SyncStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "synced" => Ok(SyncStatus::Synced),
            "pending_upload" | "pendingupload" => Ok(SyncStatus::PendingUpload),
            "pending_download" | "pendingdownload" => Ok(SyncStatus::PendingDownload),
            "conflict" => Ok(SyncStatus::Conflict),
            _ => Err(Error::InvalidSyncStatus(s.to_string())),
        }
    }
}

/// Which version won when a conflict left the `conflict` status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionSide {
    /// The local version was kept and will be pushed again.
    Local,
    /// The remote version overwrote the local copy.
    Remote,
    /// A combination of both versions was stored.
    Merged,
}

impl ResolutionSide {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionSide::Local => "local",
            ResolutionSide::Remote => "remote",
            ResolutionSide::Merged => "merged",
        }
    }
}

impl fmt::Display for ResolutionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResolutionSide {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ResolutionSide::Local),
            "remote" => Ok(ResolutionSide::Remote),
            "merged" | "merge" => Ok(ResolutionSide::Merged),
            _ => Err(Error::InvalidResolution(s.to_string())),
        }
    }
}

/// A locally stored record with its sync metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Stable identifier shared with the remote store.
    pub id: String,
    /// Collection the record belongs to (used for scoped refresh).
    pub scope: String,
    /// Opaque domain data.
    pub payload: serde_json::Value,
    /// Time of the most recent mutation.
    pub last_modified: DateTime<Utc>,
    pub sync_status: SyncStatus,
    /// True only while `sync_status` is `Conflict`.
    pub conflict_resolution_needed: bool,
    /// Tombstone marker for a local deletion.
    pub deleted: bool,
    /// Incremented on every local mutation.
    pub revision: i64,
    /// Set when the remote refused the record permanently.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejected_reason: Option<String>,
}

impl Record {
    /// Creates a fresh local record waiting to be uploaded.
    pub fn new(
        id: String,
        scope: String,
        payload: serde_json::Value,
        last_modified: DateTime<Utc>,
    ) -> Self {
        Record {
            id,
            scope,
            payload,
            last_modified,
            sync_status: SyncStatus::PendingUpload,
            conflict_resolution_needed: false,
            deleted: false,
            revision: 1,
            rejected_reason: None,
        }
    }

    /// The version of this record that is sent to the remote store.
    pub fn to_remote(&self) -> RemoteRecord {
        RemoteRecord {
            id: self.id.clone(),
            scope: self.scope.clone(),
            last_modified: self.last_modified,
            deleted: self.deleted,
            payload: self.payload.clone(),
        }
    }

    /// Returns true if the remote version carries exactly this content.
    pub fn matches_remote(&self, remote: &RemoteRecord) -> bool {
        self.last_modified == remote.last_modified
            && self.deleted == remote.deleted
            && self.payload == remote.payload
    }
}

/// A record as seen by the remote store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub id: String,
    pub scope: String,
    pub last_modified: DateTime<Utc>,
    #[serde(default)]
    pub deleted: bool,
    pub payload: serde_json::Value,
}

/// Kind of entry in the sync audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    LocalWrite,
    LocalDelete,
    Uploaded,
    Rejected,
    AppliedRemote,
    Conflict,
    Resolved,
}

impl EventAction {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventAction::LocalWrite => "local_write",
            EventAction::LocalDelete => "local_delete",
            EventAction::Uploaded => "uploaded",
            EventAction::Rejected => "rejected",
            EventAction::AppliedRemote => "applied_remote",
            EventAction::Conflict => "conflict",
            EventAction::Resolved => "resolved",
        }
    }
}

impl fmt::Display for EventAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for EventAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "local_write" => Ok(EventAction::LocalWrite),
            "local_delete" => Ok(EventAction::LocalDelete),
            "uploaded" => Ok(EventAction::Uploaded),
            "rejected" => Ok(EventAction::Rejected),
            "applied_remote" => Ok(EventAction::AppliedRemote),
            "conflict" => Ok(EventAction::Conflict),
            "resolved" => Ok(EventAction::Resolved),
            _ => Err(Error::CorruptedData(format!("unknown event action '{s}'"))),
        }
    }
}

/// One entry of the per-record sync audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncEvent {
    pub id: i64,
    pub record_id: String,
    pub action: EventAction,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Opaque checkpoint token returned by an incremental pull.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Cursor(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
