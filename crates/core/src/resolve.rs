// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Conflict resolution between a pending local record and a remote version.
//!
//! Resolution rules of [`LastWriterWins`]:
//! 1. The newer `last_modified` wins
//! 2. Equal timestamps with identical content resolve to the remote copy
//! 3. Equal timestamps with different content go to the [`MergePolicy`]
//! 4. If the merge policy gives up, the outcome is [`Resolution::Manual`]
//!
//! Both versions share the record id, so the id cannot order them further.

use serde_json::{Map, Value};

use crate::record::{Record, RemoteRecord};

/// Outcome of comparing a local and a remote version of one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Keep the local version; it stays pending upload.
    UseLocal,
    /// Overwrite the local copy with the remote version.
    UseRemote,
    /// Store the combined version and upload it.
    Merge(RemoteRecord),
    /// Automatic policy cannot decide; park the record for an external decision.
    Manual,
}

impl Resolution {
    /// Short label used in logs and the audit trail.
    pub fn label(&self) -> &'static str {
        match self {
            Resolution::UseLocal => "local",
            Resolution::UseRemote => "remote",
            Resolution::Merge(_) => "merged",
            Resolution::Manual => "manual",
        }
    }
}

/// Decides how a collision between local and remote versions is settled.
pub trait ConflictResolver: Send + Sync {
    fn resolve(&self, local: &Record, remote: &RemoteRecord) -> Resolution;
}

/// Combines two versions whose timestamps are equal.
pub trait MergePolicy: Send + Sync {
    /// Returns the merged payload, or `None` when the versions cannot be combined.
    fn merge(&self, local: &Record, remote: &RemoteRecord) -> Option<Value>;
}

/// Unions two JSON objects whose shared fields agree.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldUnion;

impl MergePolicy for FieldUnion {
    fn merge(&self, local: &Record, remote: &RemoteRecord) -> Option<Value> {
        if local.deleted || remote.deleted {
            return None;
        }
        let (Value::Object(ours), Value::Object(theirs)) = (&local.payload, &remote.payload) else {
            return None;
        };

        let mut merged: Map<String, Value> = ours.clone();
        for (key, value) in theirs {
            match merged.get(key) {
                Some(existing) if existing != value => return None,
                Some(_) => {}
                None => {
                    merged.insert(key.clone(), value.clone());
                }
            }
        }
        Some(Value::Object(merged))
    }
}

/// Never merges; every equal-timestamp divergence becomes manual.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoMerge;

impl MergePolicy for NoMerge {
    fn merge(&self, _local: &Record, _remote: &RemoteRecord) -> Option<Value> {
        None
    }
}

/// Default resolver: newest modification wins.
#[derive(Debug, Default, Clone)]
pub struct LastWriterWins<M: MergePolicy = FieldUnion> {
    policy: M,
}

impl LastWriterWins<FieldUnion> {
    pub fn new() -> Self {
        LastWriterWins { policy: FieldUnion }
    }
}

impl<M: MergePolicy> LastWriterWins<M> {
    /// Creates a resolver with a custom merge policy for timestamp ties.
    pub fn with_policy(policy: M) -> Self {
        LastWriterWins { policy }
    }
}

impl<M: MergePolicy> ConflictResolver for LastWriterWins<M> {
    fn resolve(&self, local: &Record, remote: &RemoteRecord) -> Resolution {
        if local.last_modified > remote.last_modified {
            return Resolution::UseLocal;
        }
        if remote.last_modified > local.last_modified {
            return Resolution::UseRemote;
        }
        if local.matches_remote(remote) {
            return Resolution::UseRemote;
        }
        match self.policy.merge(local, remote) {
            Some(payload) => Resolution::Merge(RemoteRecord {
                id: local.id.clone(),
                scope: local.scope.clone(),
                last_modified: local.last_modified,
                deleted: false,
                payload,
            }),
            None => Resolution::Manual,
        }
    }
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
