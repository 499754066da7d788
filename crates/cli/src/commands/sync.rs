// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use tokio::sync::watch;
use tracing::info;
use ts_core::{LastWriterWins, RecordStore};

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::display::format_sync_state;
use crate::error::{Error, Result};
use crate::sync::{
    classify, LocalStore, NetworkStatus, PathUpdate, ReachabilityProbe, RemoteSyncAdapter,
    SyncCoordinator, SyncSettings, SyncState, TcpProbe,
};

use super::{open_store, remote_adapter, runtime};

pub fn run(output: OutputFormat) -> Result<()> {
    let (store, config, _) = open_store()?;
    let adapter = remote_adapter(&config)?;

    let state = runtime()?.block_on(async {
        let network = probe_network(&config).await;
        info!(network = %network, "starting manual sync");
        run_once(store, adapter, config.sync.clone(), network).await
    });

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(&state)?),
        OutputFormat::Id => println!("{}", state.label()),
        OutputFormat::Text => println!("{}", format_sync_state(&state)),
    }

    match state {
        SyncState::Failed(kind) => Err(Error::SyncFailed(kind.to_string())),
        _ => Ok(()),
    }
}

/// One-off reachability check standing in for a long-lived monitor.
pub(crate) async fn probe_network(config: &Config) -> NetworkStatus {
    let Some(addr) = config.probe_addr() else {
        return NetworkStatus::Unknown;
    };
    let update = if TcpProbe::new(addr).is_reachable().await {
        PathUpdate::online(config.network.interface, config.network.metered)
    } else {
        PathUpdate::offline()
    };
    classify(&update)
}

/// Run a single coordinator pass over `store`.
pub(crate) async fn run_once<A: RemoteSyncAdapter>(
    store: RecordStore,
    adapter: A,
    settings: SyncSettings,
    network: NetworkStatus,
) -> SyncState {
    let (store, _changes) = LocalStore::new(store);
    let (_network_tx, network_rx) = watch::channel(network);
    let (_settings_tx, settings_rx) = watch::channel(settings);
    let coordinator = SyncCoordinator::new(
        store,
        adapter,
        Box::new(LastWriterWins::new()),
        network_rx,
        settings_rx,
    );
    // A fresh coordinator is never already running.
    coordinator.run().await.unwrap_or_default()
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
