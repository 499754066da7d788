// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages between the sync client and ts-remote.
//!
//! The protocol is request/response:
//! - Client pushes records, pulls by cursor, and fetches scoped refreshes
//! - Server answers each request in order, and may interleave `Changed`
//!   notifications for scopes the connection subscribed to

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::{Cursor, RemoteRecord};

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Upload local versions, oldest mutation first.
    Push { records: Vec<RemoteRecord> },

    /// Request changes after a checkpoint.
    Pull {
        /// `None` pulls from the beginning.
        #[serde(default)]
        since: Option<Cursor>,
        /// Page size.
        limit: u32,
    },

    /// Request the latest versions in one scope.
    FetchScope {
        scope: String,
        /// Only records modified strictly after this time.
        #[serde(default)]
        since: Option<DateTime<Utc>>,
    },

    /// Ask for `Changed` notifications about a scope.
    Subscribe { scope: String },

    /// Stop `Changed` notifications about a scope.
    Unsubscribe { scope: String },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Per-record verdict on a push.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PushStatus {
    /// Stored as the current remote version.
    Accepted,
    /// The remote holds a newer or divergent version; pull it to resolve.
    Superseded,
    /// Refused by validation, quota or authorization.
    Rejected { reason: String, retryable: bool },
}

/// Verdict for one pushed record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushResult {
    pub id: String,
    #[serde(flatten)]
    pub status: PushStatus,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Response to a Push request, one entry per pushed record.
    PushResponse { results: Vec<PushResult> },

    /// Response to a Pull request.
    PullResponse {
        /// Changed records in server order.
        records: Vec<RemoteRecord>,
        /// Checkpoint to send with the next pull.
        next_cursor: Cursor,
        /// More changes are waiting after `next_cursor`.
        has_more: bool,
    },

    /// Response to a FetchScope request.
    ScopeResponse { scope: String, records: Vec<RemoteRecord> },

    /// Subscription confirmed.
    Subscribed { scope: String },

    /// Unsubscription confirmed.
    Unsubscribed { scope: String },

    /// Records in a subscribed scope changed.
    Changed { scope: String },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// Error message.
    Error {
        /// Human-readable error description.
        message: String,
    },
}

impl ClientMessage {
    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error { message: message.into() }
    }

    /// Returns true for unsolicited notifications that answer no request.
    pub fn is_notification(&self) -> bool {
        matches!(self, ServerMessage::Changed { .. })
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
