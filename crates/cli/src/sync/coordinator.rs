// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sync coordinator: the state machine that drives one sync pass.
//!
//! A pass pushes pending uploads, pulls remote changes page by page from
//! the persisted checkpoint, reconciles every pulled record against the
//! local row, and finally refreshes records that still wait for a newer
//! remote version. The outcome is published on a `watch` channel as
//! [`SyncState`]; nothing in here returns an error to the caller.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info, warn};
use ts_core::{
    ConflictResolver, EventAction, Record, RecordStore, RemoteRecord, Resolution, SyncStatus,
};

use super::adapter::{AdapterError, AdapterFuture, PushRejection, RemoteSyncAdapter};
use super::local::LocalStore;
use super::network::NetworkStatus;
use super::settings::SyncSettings;
use super::state::{ErrorKind, ResultBuilder, SyncFailure, SyncState};

/// Failure that ends a pass early.
#[derive(Debug)]
struct Abort(SyncFailure);

impl From<ts_core::Error> for Abort {
    fn from(e: ts_core::Error) -> Self {
        Abort(SyncFailure::pass(ErrorKind::LocalStoreFailure, e.to_string()))
    }
}

impl From<AdapterError> for Abort {
    fn from(e: AdapterError) -> Self {
        Abort(SyncFailure::pass(e.kind(), e.to_string()))
    }
}

/// What a push left for the rest of the pass.
#[derive(Debug, Default)]
struct Pushed {
    /// Records the remote holds a newer version of.
    superseded: Vec<Record>,
    /// Accepted uploads whose local row was edited while the push was in flight.
    overtaken: HashMap<String, RemoteRecord>,
}

/// Run an adapter call under the request timeout.
async fn call<T>(timeout: Duration, fut: AdapterFuture<'_, T>) -> Result<T, AdapterError> {
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout),
    }
}

/// Clears the running flag when a pass ends, including when it is dropped.
struct RunGuard<'a> {
    running: &'a AtomicBool,
    state: &'a watch::Sender<SyncState>,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.state.send_if_modified(|state| {
            if state.is_syncing() {
                *state = SyncState::Idle;
                return true;
            }
            false
        });
        self.running.store(false, Ordering::Release);
    }
}

/// Orchestrates sync passes against one remote adapter.
pub struct SyncCoordinator<A: RemoteSyncAdapter> {
    store: LocalStore,
    adapter: Mutex<A>,
    resolver: Box<dyn ConflictResolver>,
    network: watch::Receiver<NetworkStatus>,
    settings: watch::Receiver<SyncSettings>,
    state: watch::Sender<SyncState>,
    running: AtomicBool,
}

impl<A: RemoteSyncAdapter> SyncCoordinator<A> {
    pub fn new(
        store: LocalStore,
        adapter: A,
        resolver: Box<dyn ConflictResolver>,
        network: watch::Receiver<NetworkStatus>,
        settings: watch::Receiver<SyncSettings>,
    ) -> Self {
        SyncCoordinator {
            store,
            adapter: Mutex::new(adapter),
            resolver,
            network,
            settings,
            state: watch::Sender::new(SyncState::Idle),
            running: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SyncState> {
        self.state.subscribe()
    }

    /// The last published state. Terminal states stay until the next pass.
    pub fn state(&self) -> SyncState {
        self.state.borrow().clone()
    }

    pub fn is_syncing(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Run one pass.
    ///
    /// Returns `None` without doing anything when a pass is already running.
    pub async fn run(&self) -> Option<SyncState> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("sync already running, trigger ignored");
            return None;
        }
        let _guard = RunGuard { running: &self.running, state: &self.state };

        self.state.send_replace(SyncState::Syncing);
        info!("sync started");
        let terminal = self.pass().await;
        match &terminal {
            SyncState::Failed(kind) => warn!(kind = %kind, "sync failed"),
            other => info!(state = %other, "sync finished"),
        }
        self.state.send_replace(terminal.clone());
        Some(terminal)
    }

    async fn pass(&self) -> SyncState {
        if *self.network.borrow() == NetworkStatus::Disconnected {
            return SyncState::Failed(ErrorKind::NetworkUnavailable);
        }
        let timeout = self.settings.borrow().request_timeout();

        let mut adapter = self.adapter.lock().await;
        let mut tally = ResultBuilder::default();
        let aborted = match self.drive(&mut *adapter, timeout, &mut tally).await {
            Ok(()) => None,
            Err(Abort(failure)) => {
                if failure.kind == ErrorKind::LocalStoreFailure {
                    error!(detail = %failure.detail, "local store failure, pass aborted");
                } else {
                    warn!(failure = %failure, "pass aborted");
                }
                let kind = failure.kind;
                tally.fail(failure);
                Some(kind)
            }
        };

        match aborted {
            Some(kind) if tally.is_untouched() => SyncState::Failed(kind),
            None if tally.errors.is_empty() => SyncState::Success(tally.finish()),
            _ => SyncState::PartialSuccess(tally.finish()),
        }
    }

    async fn drive(
        &self,
        adapter: &mut A,
        timeout: Duration,
        tally: &mut ResultBuilder,
    ) -> Result<(), Abort> {
        let pushed = self.push(adapter, timeout, tally).await?;
        let seen = self.pull(adapter, timeout, tally, &pushed.overtaken).await?;
        self.refresh(adapter, timeout, tally, &seen, pushed.superseded).await
    }

    /// Push every pending upload.
    async fn push(
        &self,
        adapter: &mut A,
        timeout: Duration,
        tally: &mut ResultBuilder,
    ) -> Result<Pushed, Abort> {
        let uploads: Vec<Record> = self
            .store
            .lock()
            .await
            .fetch_pending()?
            .into_iter()
            .filter(|r| r.sync_status == SyncStatus::PendingUpload)
            .collect();
        if uploads.is_empty() {
            return Ok(Pushed::default());
        }

        debug!(count = uploads.len(), "pushing pending records");
        let batch = uploads.iter().map(Record::to_remote).collect();
        let outcome = call(timeout, adapter.push_pending(batch)).await?;

        let accepted: HashSet<String> = outcome.succeeded.into_iter().collect();
        let mut rejected: HashMap<String, PushRejection> = outcome.failed.into_iter().collect();
        let mut pushed = Pushed::default();

        let mut store = self.store.lock().await;
        for record in uploads {
            let id = record.id.clone();
            if accepted.contains(&id) {
                tally.uploaded += 1;
                if !store.mark_synced_at(&id, record.revision)? {
                    debug!(id, "changed during push, stays pending");
                    pushed.overtaken.insert(id, record.to_remote());
                }
                continue;
            }
            match rejected.remove(&id) {
                Some(PushRejection::Unreachable) => tally.fail(SyncFailure::record(
                    ErrorKind::NetworkUnavailable,
                    id,
                    "record did not reach the remote",
                )),
                Some(PushRejection::Timeout) => {
                    tally.fail(SyncFailure::record(ErrorKind::Timeout, id, "push timed out"))
                }
                Some(PushRejection::Rejected { reason, retryable: true }) => {
                    tally.fail(SyncFailure::record(ErrorKind::RemoteRejected, id, reason))
                }
                Some(PushRejection::Rejected { reason, retryable: false }) => {
                    store.flag_rejected(&id, record.revision, &reason)?;
                    warn!(id, reason, "record permanently rejected");
                    tally.fail(SyncFailure::record(ErrorKind::RemoteRejected, id, reason).permanent());
                }
                Some(PushRejection::Superseded) => {
                    debug!(id, "remote holds a newer version");
                    pushed.superseded.push(record);
                }
                None => tally.fail(SyncFailure::record(
                    ErrorKind::RemoteRejected,
                    id,
                    "remote returned no verdict",
                )),
            }
        }
        Ok(pushed)
    }

    /// Pull all pages after the stored cursor. Returns the ids seen.
    ///
    /// `overtaken` holds uploads accepted earlier in this pass whose local
    /// row has moved on; their echo is not a competing write.
    async fn pull(
        &self,
        adapter: &mut A,
        timeout: Duration,
        tally: &mut ResultBuilder,
        overtaken: &HashMap<String, RemoteRecord>,
    ) -> Result<HashSet<String>, Abort> {
        let mut seen = HashSet::new();
        let mut cursor = self.store.lock().await.get_cursor()?;

        loop {
            let batch = call(timeout, adapter.pull_changes(cursor.clone())).await?;
            debug!(count = batch.records.len(), cursor = %batch.next_cursor, "pulled page");
            {
                let mut store = self.store.lock().await;
                for remote in &batch.records {
                    seen.insert(remote.id.clone());
                    if overtaken.get(&remote.id) == Some(remote) {
                        debug!(id = %remote.id, "echo of own upload, newer edit stays pending");
                        continue;
                    }
                    self.reconcile(&mut store, remote, tally)?;
                }
                store.set_cursor(&batch.next_cursor)?;
            }

            let advanced = cursor.as_ref() != Some(&batch.next_cursor);
            cursor = Some(batch.next_cursor);
            if !batch.has_more {
                break;
            }
            if !advanced {
                warn!("remote reported more changes without advancing the cursor");
                break;
            }
        }
        Ok(seen)
    }

    /// Fetch the latest version of records the pull did not settle.
    async fn refresh(
        &self,
        adapter: &mut A,
        timeout: Duration,
        tally: &mut ResultBuilder,
        seen: &HashSet<String>,
        superseded: Vec<Record>,
    ) -> Result<(), Abort> {
        let downloads: Vec<Record> = self
            .store
            .lock()
            .await
            .fetch_pending()?
            .into_iter()
            .filter(|r| r.sync_status == SyncStatus::PendingDownload && !seen.contains(&r.id))
            .collect();

        let mut by_scope: BTreeMap<String, Vec<Record>> = BTreeMap::new();
        for record in downloads {
            by_scope.entry(record.scope.clone()).or_default().push(record);
        }
        for (scope, records) in by_scope {
            self.refresh_scope(adapter, timeout, tally, &scope, records).await?;
        }

        for record in superseded.into_iter().filter(|r| !seen.contains(&r.id)) {
            // A superseding version may carry the same timestamp.
            let since = record.last_modified - chrono::Duration::milliseconds(1);
            let fetched = call(timeout, adapter.fetch_latest_since(&record.scope, Some(since))).await;
            let latest = match fetched {
                Ok(records) => records.into_iter().find(|r| r.id == record.id),
                Err(e) => {
                    tally.fail(SyncFailure::record(e.kind(), record.id, e.to_string()));
                    continue;
                }
            };

            let mut store = self.store.lock().await;
            match latest {
                Some(remote) => self.reconcile(&mut store, &remote, tally)?,
                None => tally.fail(SyncFailure::record(
                    ErrorKind::RemoteRejected,
                    record.id,
                    "superseded but no newer remote version found",
                )),
            }
        }
        Ok(())
    }

    /// One scoped fetch for every record of `scope` waiting on a download.
    async fn refresh_scope(
        &self,
        adapter: &mut A,
        timeout: Duration,
        tally: &mut ResultBuilder,
        scope: &str,
        records: Vec<Record>,
    ) -> Result<(), Abort> {
        let since = records.iter().map(|r| r.last_modified).min();
        let latest: HashMap<String, RemoteRecord> =
            match call(timeout, adapter.fetch_latest_since(scope, since)).await {
                Ok(fetched) => fetched.into_iter().map(|r| (r.id.clone(), r)).collect(),
                Err(e) => {
                    for record in records {
                        tally.fail(SyncFailure::record(e.kind(), record.id, e.to_string()));
                    }
                    return Ok(());
                }
            };

        let mut store = self.store.lock().await;
        for record in records {
            match latest.get(&record.id) {
                Some(remote) if remote.last_modified > record.last_modified => {
                    self.reconcile(&mut store, remote, tally)?
                }
                _ => {
                    if store.status_of(&record.id)? == SyncStatus::PendingDownload {
                        debug!(id = %record.id, "no newer remote version");
                        store.mark_synced(&record.id)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Settle one remote version against the local row.
    fn reconcile(
        &self,
        store: &mut RecordStore,
        remote: &RemoteRecord,
        tally: &mut ResultBuilder,
    ) -> Result<(), Abort> {
        let Some(local) = store.get(&remote.id)? else {
            store.apply_remote(remote)?;
            tally.downloaded += 1;
            return Ok(());
        };

        match local.sync_status {
            SyncStatus::Synced if local.matches_remote(remote) => {
                debug!(id = %remote.id, "echo of confirmed version");
            }
            SyncStatus::Synced if local.last_modified > remote.last_modified => {
                debug!(id = %remote.id, "older remote version ignored");
            }
            SyncStatus::PendingDownload if local.matches_remote(remote) => {
                store.mark_synced(&remote.id)?;
            }
            SyncStatus::Synced | SyncStatus::PendingDownload => {
                store.apply_remote(remote)?;
                tally.downloaded += 1;
            }
            SyncStatus::PendingUpload if local.matches_remote(remote) => {
                store.apply_remote(remote)?;
            }
            SyncStatus::PendingUpload => {
                tally.conflicts_detected += 1;
                let resolution = self.resolver.resolve(&local, remote);
                debug!(id = %remote.id, resolution = resolution.label(), "conflict resolved");
                self.apply_resolution(store, &local, remote, resolution, tally)?;
            }
            SyncStatus::Conflict => {
                debug!(id = %remote.id, "updating remote side of parked conflict");
                store.refresh_conflict(&remote.id, remote)?;
            }
        }
        Ok(())
    }

    fn apply_resolution(
        &self,
        store: &mut RecordStore,
        local: &Record,
        remote: &RemoteRecord,
        resolution: Resolution,
        tally: &mut ResultBuilder,
    ) -> Result<(), Abort> {
        match resolution {
            Resolution::UseLocal => {
                store.record_event(&local.id, EventAction::Resolved, Some("local (auto)"))?;
            }
            Resolution::UseRemote => {
                store.apply_remote(remote)?;
                store.record_event(&local.id, EventAction::Resolved, Some("remote (auto)"))?;
                tally.downloaded += 1;
            }
            Resolution::Merge(merged) => {
                store.apply_merged(&merged)?;
            }
            Resolution::Manual => {
                store.park_conflict(&local.id, remote)?;
                info!(id = %local.id, "conflict needs a manual decision");
                tally.fail(
                    SyncFailure::record(
                        ErrorKind::ConflictUnresolved,
                        local.id.clone(),
                        "needs a manual decision",
                    )
                    .permanent(),
                );
            }
        }
        Ok(())
    }

    /// Pick up change notifications and flag the announced scopes for a
    /// download. Returns the scopes the remote reported as changed.
    ///
    /// Does nothing while a pass runs or the network is down.
    pub async fn poll_remote_changes(&self) -> Vec<String> {
        if self.is_syncing() || !self.network.borrow().is_connected() {
            return Vec::new();
        }
        let timeout = self.settings.borrow().request_timeout();
        let scopes = {
            let Ok(mut adapter) = self.adapter.try_lock() else {
                return Vec::new();
            };
            match call(timeout, adapter.changed_scopes()).await {
                Ok(scopes) => scopes,
                Err(e) => {
                    debug!(error = %e, "could not check for remote changes");
                    return Vec::new();
                }
            }
        };

        let mut store = self.store.lock().await;
        for scope in &scopes {
            match store.mark_scope_pending_download(scope) {
                Ok(flagged) => debug!(scope, flagged, "remote change announced"),
                Err(e) => error!(scope, error = %e, "could not flag records for download"),
            }
        }
        scopes
    }

    /// Register change subscriptions. Failures are logged, never returned.
    pub async fn setup_subscriptions(&self, scopes: &[String]) {
        let timeout = self.settings.borrow().request_timeout();
        let mut adapter = self.adapter.lock().await;
        for scope in scopes {
            match call(timeout, adapter.setup_subscription(scope)).await {
                Ok(()) => debug!(scope, "subscribed"),
                Err(e) => warn!(scope, error = %e, "subscription setup failed"),
            }
        }
    }

    /// Withdraw change subscriptions. Failures are logged, never returned.
    pub async fn teardown_subscriptions(&self, scopes: &[String]) {
        let timeout = self.settings.borrow().request_timeout();
        let mut adapter = self.adapter.lock().await;
        for scope in scopes {
            match call(timeout, adapter.teardown_subscription(scope)).await {
                Ok(()) => debug!(scope, "unsubscribed"),
                Err(e) => warn!(scope, error = %e, "subscription teardown failed"),
            }
        }
    }
}

#[cfg(test)]
#[path = "coordinator_tests.rs"]
mod tests;
