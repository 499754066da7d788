// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared handle to the record store.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::debug;
use ts_core::{Record, RecordStore, ResolutionSide};

/// Capacity of the local change signal channel.
pub const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// Cloneable store handle that signals local mutations to the scheduler.
///
/// Mutations made through [`LocalStore::put`], [`LocalStore::delete`] and
/// [`LocalStore::resolve`] send one change signal each. When the channel is
/// full a trigger is already queued, so the signal is dropped.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<Mutex<RecordStore>>,
    changes: mpsc::Sender<()>,
}

impl LocalStore {
    /// Wrap a store and return the receiving end of its change signal.
    pub fn new(store: RecordStore) -> (Self, mpsc::Receiver<()>) {
        let (changes, rx) = mpsc::channel(CHANGE_CHANNEL_CAPACITY);
        (LocalStore { inner: Arc::new(Mutex::new(store)), changes }, rx)
    }

    /// Exclusive access for multi-step operations. Does not signal.
    pub async fn lock(&self) -> MutexGuard<'_, RecordStore> {
        self.inner.lock().await
    }

    pub async fn put(
        &self,
        id: &str,
        scope: &str,
        payload: serde_json::Value,
    ) -> ts_core::Result<Record> {
        let record = self.inner.lock().await.put_local(id, scope, payload)?;
        self.notify();
        Ok(record)
    }

    pub async fn delete(&self, id: &str) -> ts_core::Result<Record> {
        let record = self.inner.lock().await.delete_local(id)?;
        self.notify();
        Ok(record)
    }

    pub async fn resolve(
        &self,
        id: &str,
        side: ResolutionSide,
        merged: Option<serde_json::Value>,
    ) -> ts_core::Result<Record> {
        let record = self.inner.lock().await.resolve_conflict(id, side, merged)?;
        self.notify();
        Ok(record)
    }

    pub async fn count_pending(&self) -> ts_core::Result<usize> {
        self.inner.lock().await.count_pending()
    }

    /// Signal a change that did not go through this handle, such as a
    /// commit from another process.
    pub fn notify(&self) {
        if let Err(mpsc::error::TrySendError::Closed(())) = self.changes.try_send(()) {
            debug!("no scheduler listening for local changes");
        }
    }
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
