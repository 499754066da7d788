// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use super::*;
use crate::config::RemoteConfig;
use crate::sync::test_helpers::MockAdapter;
use crate::sync::ErrorKind;
use serde_json::json;
use tokio::net::TcpListener;

fn store_with(ids: &[&str]) -> RecordStore {
    let mut store = RecordStore::open_in_memory().unwrap();
    for id in ids {
        store.put_local(id, "notes", json!({"id": id})).unwrap();
    }
    store
}

#[tokio::test]
async fn test_run_once_uploads_pending_records() {
    let remote = MockAdapter::new();
    let state = run_once(
        store_with(&["a", "b"]),
        remote.clone(),
        SyncSettings::default(),
        NetworkStatus::UnmeteredConnected,
    )
    .await;

    let result = match &state {
        SyncState::Success(result) => result,
        other => unreachable!("expected success, got {other:?}"),
    };
    assert_eq!(result.uploaded(), 2);
    assert!(remote.with(|r| r.get("a").is_some()));
}

#[tokio::test]
async fn test_run_once_offline_fails_without_touching_remote() {
    let remote = MockAdapter::new();
    let state = run_once(
        store_with(&["a"]),
        remote.clone(),
        SyncSettings::default(),
        NetworkStatus::Disconnected,
    )
    .await;

    assert_eq!(state, SyncState::Failed(ErrorKind::NetworkUnavailable));
    assert!(remote.with(|r| r.pushes.is_empty()));
}

#[tokio::test]
async fn test_probe_network_without_remote_is_unknown() {
    let config = Config::default();
    assert_eq!(probe_network(&config).await, NetworkStatus::Unknown);
}

#[tokio::test]
async fn test_probe_network_classifies_reachable_remote() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let mut config = Config::default();
    config.remote = Some(RemoteConfig::new(format!("ws://{addr}")));

    assert_eq!(
        probe_network(&config).await,
        NetworkStatus::UnmeteredConnected
    );

    config.network.metered = true;
    assert_eq!(probe_network(&config).await, NetworkStatus::MeteredConnected);
}

#[tokio::test]
async fn test_probe_network_unreachable_remote_is_disconnected() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let mut config = Config::default();
    config.remote = Some(RemoteConfig::new(format!("ws://{addr}")));

    assert_eq!(probe_network(&config).await, NetworkStatus::Disconnected);
}
