// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Foreground auto-sync: the one place the whole engine is wired together.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use ts_core::{LastWriterWins, RecordStore};

use crate::config::{get_config_path, Config};
use crate::display::format_sync_state;
use crate::error::{Error, Result};
use crate::sync::{
    poll_path, validate_probe_addr, LocalStore, NetworkMonitor, RemoteSyncAdapter, Scheduler,
    SyncCoordinator, SyncSettings, SyncState, TcpProbe,
};

use super::{open_store, remote_adapter, runtime};

/// How often the config file and the database are checked for outside changes.
const HOUSEKEEPING_INTERVAL: Duration = Duration::from_secs(1);

pub fn run() -> Result<()> {
    let (store, config, work_dir) = open_store()?;
    let adapter = remote_adapter(&config)?;
    let probe_addr = config.probe_addr().ok_or(Error::NoRemote)?;
    validate_probe_addr(&probe_addr).map_err(Error::Config)?;

    runtime()?.block_on(watch_loop(store, adapter, config, work_dir, probe_addr))
}

async fn watch_loop<A: RemoteSyncAdapter + 'static>(
    store: RecordStore,
    adapter: A,
    config: Config,
    work_dir: PathBuf,
    probe_addr: String,
) -> Result<()> {
    let cancel = CancellationToken::new();

    let monitor = Arc::new(
        NetworkMonitor::with_tcp_probe(TcpProbe::new(probe_addr.clone()))
            .with_probe_interval(config.network.probe_interval()),
    );
    let (path_tx, path_rx) = mpsc::channel(8);
    let monitor_task = tokio::spawn({
        let monitor = Arc::clone(&monitor);
        let cancel = cancel.clone();
        async move { monitor.run(path_rx, cancel).await }
    });
    let poll_task = tokio::spawn(poll_path(
        probe_addr,
        config.network.interface,
        config.network.metered,
        config.network.poll_interval(),
        path_tx,
        cancel.clone(),
    ));

    let (settings_tx, settings_rx) = watch::channel(config.sync.clone());
    let (local, changes) = LocalStore::new(store);
    let coordinator = Arc::new(SyncCoordinator::new(
        local.clone(),
        adapter,
        Box::new(LastWriterWins::new()),
        monitor.subscribe(),
        settings_rx.clone(),
    ));
    let mut scopes = config.scopes().to_vec();
    coordinator.setup_subscriptions(&scopes).await;

    let scheduler =
        Scheduler::new(Arc::clone(&coordinator), monitor.subscribe(), settings_rx, changes)
            .spawn();

    println!("Watching {} (Ctrl-C to stop)", work_dir.display());

    let mut states = coordinator.subscribe_state();
    let mut config_watcher = ConfigWatcher::new(&work_dir);
    let mut external = ExternalWrites::default();
    let mut housekeeping = tokio::time::interval(HOUSEKEEPING_INTERVAL);
    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            changed = states.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = states.borrow_and_update().clone();
                if !matches!(state, SyncState::Idle | SyncState::Syncing) {
                    println!("{}", format_sync_state(&state));
                }
            }

            _ = housekeeping.tick() => {
                if external.check(&local).await {
                    local.notify();
                }
                if let Some(updated) = config_watcher.poll() {
                    apply_settings(&settings_tx, &updated.sync);
                    let new_scopes = updated.scopes().to_vec();
                    if new_scopes != scopes {
                        coordinator.teardown_subscriptions(&scopes).await;
                        coordinator.setup_subscriptions(&new_scopes).await;
                        scopes = new_scopes;
                    }
                    if updated.remote_url() != config.remote_url() {
                        warn!("remote changed; restart watch to use it");
                    }
                }
            }
        }
    }

    scheduler.stop();
    scheduler.join().await;
    coordinator.teardown_subscriptions(&scopes).await;
    cancel.cancel();
    for task in [monitor_task, poll_task] {
        if let Err(e) = task.await {
            warn!(error = %e, "background task failed");
        }
    }
    info!("watch stopped");
    Ok(())
}

/// Publish changed settings to the scheduler and coordinator.
pub(crate) fn apply_settings(tx: &watch::Sender<SyncSettings>, updated: &SyncSettings) -> bool {
    let changed = tx.send_if_modified(|current| {
        if current == updated {
            return false;
        }
        *current = updated.clone();
        true
    });
    if changed {
        info!(
            interval = updated.auto_sync_interval_seconds,
            enabled = updated.auto_sync_enabled,
            "settings reloaded"
        );
    }
    changed
}

/// Reloads `config.toml` when its modification time moves.
pub(crate) struct ConfigWatcher {
    work_dir: PathBuf,
    modified: Option<SystemTime>,
}

impl ConfigWatcher {
    pub fn new(work_dir: &Path) -> Self {
        ConfigWatcher {
            work_dir: work_dir.to_path_buf(),
            modified: modified_time(&get_config_path(work_dir)),
        }
    }

    /// The new config if the file changed since the last poll and still parses.
    pub fn poll(&mut self) -> Option<Config> {
        let modified = modified_time(&get_config_path(&self.work_dir));
        if modified == self.modified {
            return None;
        }
        self.modified = modified;
        match Config::load(&self.work_dir) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!(error = %e, "ignoring config change");
                None
            }
        }
    }
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Detects commits made to the database by other processes.
#[derive(Default)]
pub(crate) struct ExternalWrites {
    last: Option<i64>,
}

impl ExternalWrites {
    /// True if another connection committed since the previous check.
    pub async fn check(&mut self, store: &LocalStore) -> bool {
        let version = match store.lock().await.data_version() {
            Ok(v) => v,
            Err(e) => {
                warn!(error = %e, "could not read database version");
                return false;
            }
        };
        let changed = self.last.is_some_and(|last| last != version);
        self.last = Some(version);
        changed
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, stopping"),
        _ = terminate => info!("received SIGTERM, stopping"),
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
