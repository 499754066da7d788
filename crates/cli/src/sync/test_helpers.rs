// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use ts_core::clock::from_millis;
use ts_core::{Cursor, RemoteRecord};

use super::adapter::{
    AdapterError, AdapterFuture, PullBatch, PushOutcome, PushRejection, RemoteSyncAdapter,
};

/// In-memory remote store with the same last-writer-wins rules as ts-remote.
#[derive(Default)]
pub struct MockRemote {
    /// Current version per id, with the sequence number of its last change.
    pub records: HashMap<String, (u64, RemoteRecord)>,
    pub seq: u64,
    /// Every call fails with `Unreachable`.
    pub unreachable: bool,
    /// Delay applied to every call.
    pub delay: Duration,
    /// Scripted per-record push failures. Consumed once.
    pub push_failures: HashMap<String, PushRejection>,
    pub page_size: usize,
    pub subscriptions: BTreeSet<String>,
    pub subscription_fails: bool,
    /// Subscribed scopes written since the last `changed_scopes` call.
    pub notices: BTreeSet<String>,
    /// Ids of every push batch, in call order.
    pub pushes: Vec<Vec<String>>,
    pub pulls: usize,
    pub fetches: Vec<String>,
    pub active: usize,
    pub max_active: usize,
}

impl MockRemote {
    /// Store a version the way a push from another device would.
    pub fn write(&mut self, id: &str, scope: &str, payload: Value, ms: i64) {
        self.seq += 1;
        let record = RemoteRecord {
            id: id.to_string(),
            scope: scope.to_string(),
            last_modified: from_millis(ms),
            deleted: false,
            payload,
        };
        self.records.insert(id.to_string(), (self.seq, record));
        self.announce(scope);
    }

    fn announce(&mut self, scope: &str) {
        if self.subscriptions.contains(scope) {
            self.notices.insert(scope.to_string());
        }
    }

    pub fn get(&self, id: &str) -> Option<&RemoteRecord> {
        self.records.get(id).map(|(_, r)| r)
    }

    fn accept(&mut self, record: RemoteRecord) -> Option<PushRejection> {
        if let Some(failure) = self.push_failures.remove(&record.id) {
            return Some(failure);
        }
        if let Some((_, current)) = self.records.get(&record.id) {
            if current == &record {
                return None;
            }
            if current.last_modified >= record.last_modified {
                return Some(PushRejection::Superseded);
            }
        }
        self.seq += 1;
        self.announce(&record.scope);
        self.records.insert(record.id.clone(), (self.seq, record));
        None
    }
}

/// Fault-injecting adapter backed by a shared [`MockRemote`].
#[derive(Clone)]
pub struct MockAdapter {
    pub remote: Arc<Mutex<MockRemote>>,
}

impl MockAdapter {
    pub fn new() -> Self {
        let remote = MockRemote { page_size: 100, ..Default::default() };
        MockAdapter { remote: Arc::new(Mutex::new(remote)) }
    }

    /// A second device talking to the same remote.
    pub fn connected_to(other: &MockAdapter) -> Self {
        MockAdapter { remote: Arc::clone(&other.remote) }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockRemote) -> R) -> R {
        f(&mut self.remote.lock().unwrap())
    }

    async fn enter(&self) -> Result<(), AdapterError> {
        let delay = self.with(|r| {
            r.active += 1;
            r.max_active = r.max_active.max(r.active);
            r.delay
        });
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        self.with(|r| {
            r.active -= 1;
            if r.unreachable {
                Err(AdapterError::Unreachable("mock remote offline".into()))
            } else {
                Ok(())
            }
        })
    }
}

impl RemoteSyncAdapter for MockAdapter {
    fn push_pending(&mut self, records: Vec<RemoteRecord>) -> AdapterFuture<'_, PushOutcome> {
        Box::pin(async move {
            self.enter().await?;
            self.with(|remote| {
                remote.pushes.push(records.iter().map(|r| r.id.clone()).collect());
                let mut outcome = PushOutcome::default();
                for record in records {
                    let id = record.id.clone();
                    match remote.accept(record) {
                        None => outcome.succeeded.push(id),
                        Some(rejection) => outcome.failed.push((id, rejection)),
                    }
                }
                Ok(outcome)
            })
        })
    }

    fn pull_changes(&mut self, since: Option<Cursor>) -> AdapterFuture<'_, PullBatch> {
        Box::pin(async move {
            self.enter().await?;
            self.with(|remote| {
                remote.pulls += 1;
                let after: u64 = since.map(|c| c.as_str().parse().unwrap()).unwrap_or(0);
                let mut changed: Vec<&(u64, RemoteRecord)> =
                    remote.records.values().filter(|(seq, _)| *seq > after).collect();
                changed.sort_by_key(|(seq, _)| *seq);
                let has_more = changed.len() > remote.page_size;
                changed.truncate(remote.page_size);
                let next = changed.last().map(|(seq, _)| *seq).unwrap_or(after);
                Ok(PullBatch {
                    records: changed.into_iter().map(|(_, r)| r.clone()).collect(),
                    next_cursor: Cursor::new(next.to_string()),
                    has_more,
                })
            })
        })
    }

    fn fetch_latest_since(
        &mut self,
        scope: &str,
        since: Option<DateTime<Utc>>,
    ) -> AdapterFuture<'_, Vec<RemoteRecord>> {
        let scope = scope.to_string();
        Box::pin(async move {
            self.enter().await?;
            self.with(|remote| {
                remote.fetches.push(scope.clone());
                let mut records: Vec<RemoteRecord> = remote
                    .records
                    .values()
                    .map(|(_, r)| r)
                    .filter(|r| r.scope == scope && since.is_none_or(|s| r.last_modified > s))
                    .cloned()
                    .collect();
                records.sort_by(|a, b| a.id.cmp(&b.id));
                Ok(records)
            })
        })
    }

    fn setup_subscription(&mut self, scope: &str) -> AdapterFuture<'_, ()> {
        let scope = scope.to_string();
        Box::pin(async move {
            self.enter().await?;
            self.with(|remote| {
                if remote.subscription_fails {
                    return Err(AdapterError::Rejected("subscriptions disabled".into()));
                }
                remote.subscriptions.insert(scope);
                Ok(())
            })
        })
    }

    fn teardown_subscription(&mut self, scope: &str) -> AdapterFuture<'_, ()> {
        let scope = scope.to_string();
        Box::pin(async move {
            self.enter().await?;
            self.with(|remote| {
                if remote.subscription_fails {
                    return Err(AdapterError::Rejected("subscriptions disabled".into()));
                }
                remote.subscriptions.remove(&scope);
                Ok(())
            })
        })
    }

    fn changed_scopes(&mut self) -> AdapterFuture<'_, Vec<String>> {
        Box::pin(async move {
            self.enter().await?;
            self.with(|remote| Ok(std::mem::take(&mut remote.notices).into_iter().collect()))
        })
    }
}
