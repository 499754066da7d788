// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use ts_core::SyncStatus;

fn handle() -> (LocalStore, mpsc::Receiver<()>) {
    LocalStore::new(RecordStore::open_in_memory().unwrap())
}

#[tokio::test]
async fn mutations_signal_changes() {
    let (store, mut rx) = handle();
    store.put("r1", "notes", json!({"t": 1})).await.unwrap();
    store.delete("r1").await.unwrap();
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn write_is_pending_immediately() {
    let (store, _rx) = handle();
    store.put("r1", "notes", json!({"t": 1})).await.unwrap();
    assert_eq!(store.count_pending().await.unwrap(), 1);
    let pending = store.lock().await.fetch_pending().unwrap();
    assert_eq!(pending[0].id, "r1");
    assert_eq!(pending[0].sync_status, SyncStatus::PendingUpload);
}

#[tokio::test]
async fn full_channel_drops_extra_signals() {
    let (store, mut rx) = handle();
    for i in 0..(CHANGE_CHANNEL_CAPACITY + 10) {
        store.put(&format!("r{i}"), "notes", json!({})).await.unwrap();
    }
    let mut received = 0;
    while rx.try_recv().is_ok() {
        received += 1;
    }
    assert_eq!(received, CHANGE_CHANNEL_CAPACITY);
    assert_eq!(store.count_pending().await.unwrap(), CHANGE_CHANNEL_CAPACITY + 10);
}

#[tokio::test]
async fn writes_succeed_without_listener() {
    let (store, rx) = handle();
    drop(rx);
    let record = store.put("r1", "notes", json!({})).await.unwrap();
    assert_eq!(record.sync_status, SyncStatus::PendingUpload);
}

#[tokio::test]
async fn failed_mutation_does_not_signal() {
    let (store, mut rx) = handle();
    assert!(store.delete("missing").await.is_err());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn external_notify_signals_once_per_call() {
    let (store, mut rx) = handle();
    store.notify();
    assert!(rx.try_recv().is_ok());
    assert!(rx.try_recv().is_err());
}
