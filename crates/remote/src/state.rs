// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the canonical ledger for shared access and fans change
//! notifications out to every connection.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;

use ts_core::protocol::{PushResult, ServerMessage};
use ts_core::{Cursor, RemoteRecord, Result};

use crate::ledger::{Ledger, PullPage};

/// File name of the ledger database inside the data directory.
pub const LEDGER_FILE: &str = "ledger.db";

/// Shared server state containing the canonical ledger.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    ledger: Mutex<Ledger>,
    /// `Changed` notifications; each connection filters by its own subscriptions.
    broadcast_tx: broadcast::Sender<ServerMessage>,
}

impl ServerState {
    /// Creates server state with the ledger stored in `data_dir`.
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let ledger = Ledger::open(&data_dir.join(LEDGER_FILE))?;
        Ok(Self::with_ledger(ledger))
    }

    pub fn with_ledger(ledger: Ledger) -> Self {
        let (broadcast_tx, _) = broadcast::channel(1024);
        ServerState {
            inner: Arc::new(ServerStateInner { ledger: Mutex::new(ledger), broadcast_tx }),
        }
    }

    /// Applies pushed records and notifies subscribers of every changed scope.
    pub async fn push(&self, records: &[RemoteRecord]) -> Result<Vec<PushResult>> {
        let outcome = {
            let mut ledger = self.inner.ledger.lock().await;
            ledger.push(records)?
        };

        for scope in outcome.changed_scopes {
            debug!(%scope, "broadcasting change");
            // No receivers is fine.
            let _ = self.inner.broadcast_tx.send(ServerMessage::Changed { scope });
        }

        Ok(outcome.results)
    }

    pub async fn pull(&self, since: Option<&Cursor>, limit: u32) -> Result<PullPage> {
        self.inner.ledger.lock().await.pull(since, limit)
    }

    pub async fn fetch_scope(
        &self,
        scope: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteRecord>> {
        self.inner.ledger.lock().await.fetch_scope(scope, since)
    }

    /// Highest sequence number in the ledger.
    pub async fn head(&self) -> Result<i64> {
        self.inner.ledger.lock().await.head()
    }

    /// Latest stored version of a record.
    #[cfg(test)]
    pub async fn get(&self, id: &str) -> Result<Option<RemoteRecord>> {
        self.inner.ledger.lock().await.get(id)
    }

    /// Subscribe to broadcast messages.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerMessage> {
        self.inner.broadcast_tx.subscribe()
    }
}
