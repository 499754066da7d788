// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Auto-sync scheduler.
//!
//! Decides when to ask the coordinator for a pass: on a recurring timer, when
//! the network comes back, after a debounced burst of local changes, when the
//! remote announces a change to a subscribed scope, or on an explicit request. The gating rules live in [`should_trigger`] so they
//! can be tested without timers.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::adapter::RemoteSyncAdapter;
use super::coordinator::SyncCoordinator;
use super::debounce::Debounce;
use super::network::NetworkStatus;
use super::settings::SyncSettings;
use super::state::SyncState;

/// How often the remote is checked for change notifications.
pub const REMOTE_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What asked for a sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Timer,
    NetworkRestored,
    LocalChange,
    RemoteChange,
    Manual,
}

/// Outcome of the gating rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Run,
    Skip(&'static str),
}

/// Gate a trigger.
///
/// Manual requests skip the enable switch, the metered check and the
/// pending-count check, but never run offline or on top of a running pass.
/// A remote change notification skips only the pending-count check.
pub fn should_trigger(
    trigger: Trigger,
    settings: &SyncSettings,
    network: NetworkStatus,
    pending: usize,
    syncing: bool,
) -> Decision {
    let manual = trigger == Trigger::Manual;
    if syncing {
        return Decision::Skip("sync already running");
    }
    if !manual && !settings.auto_sync_enabled {
        return Decision::Skip("auto sync disabled");
    }
    if !network.is_connected() {
        return Decision::Skip("network not connected");
    }
    if !manual && network.is_metered() && !settings.allow_metered_sync {
        return Decision::Skip("metered connection");
    }
    if !manual && trigger != Trigger::RemoteChange && pending == 0 {
        return Decision::Skip("nothing pending");
    }
    Decision::Run
}

type ManualRequest = oneshot::Sender<Option<SyncState>>;

/// Control handle for a spawned scheduler.
pub struct SchedulerHandle {
    cancel: CancellationToken,
    requests: mpsc::Sender<ManualRequest>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Stop scheduling. A pass already running is allowed to finish.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Ask for a pass now and wait for its outcome.
    ///
    /// Returns `None` if the pass was gated off or the scheduler stopped.
    pub async fn sync_now(&self) -> Option<SyncState> {
        let (tx, rx) = oneshot::channel();
        self.requests.send(tx).await.ok()?;
        rx.await.ok().flatten()
    }

    /// Wait for the scheduler task to exit.
    pub async fn join(self) {
        if let Err(e) = self.task.await {
            error!(error = %e, "scheduler task failed");
        }
    }
}

/// Timer- and event-driven trigger source for one coordinator.
pub struct Scheduler<A: RemoteSyncAdapter> {
    coordinator: Arc<SyncCoordinator<A>>,
    network: watch::Receiver<NetworkStatus>,
    settings: watch::Receiver<SyncSettings>,
    changes: Debounce<()>,
}

impl<A: RemoteSyncAdapter + 'static> Scheduler<A> {
    pub fn new(
        coordinator: Arc<SyncCoordinator<A>>,
        network: watch::Receiver<NetworkStatus>,
        settings: watch::Receiver<SyncSettings>,
        changes: mpsc::Receiver<()>,
    ) -> Self {
        let window = settings.borrow().debounce();
        Scheduler { coordinator, network, settings, changes: Debounce::new(changes, window) }
    }

    /// Start the scheduler loop on the runtime.
    pub fn spawn(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let (requests, rx) = mpsc::channel(8);
        let task = tokio::spawn(self.run(rx, cancel.clone()));
        SchedulerHandle { cancel, requests, task }
    }

    async fn attempt(&self, trigger: Trigger) -> Option<SyncState> {
        let settings = self.settings.borrow().clone();
        let network = *self.network.borrow();
        let pending = match self.coordinator.store().count_pending().await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "could not count pending records");
                return None;
            }
        };
        match should_trigger(trigger, &settings, network, pending, self.coordinator.is_syncing()) {
            Decision::Skip(reason) => {
                debug!(?trigger, reason, "sync skipped");
                None
            }
            Decision::Run => {
                info!(?trigger, pending, network = %network, "triggering sync");
                self.coordinator.run().await
            }
        }
    }

    async fn run(mut self, mut requests: mpsc::Receiver<ManualRequest>, cancel: CancellationToken) {
        let mut interval = self.settings.borrow().interval();
        let mut next_tick = Instant::now() + interval;
        let mut last_network = *self.network.borrow_and_update();
        let mut network_open = true;
        let mut settings_open = true;
        let mut changes_open = true;
        let mut remote_poll = tokio::time::interval(REMOTE_POLL_INTERVAL);
        remote_poll.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(interval_secs = interval.as_secs(), "scheduler started");
        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                Some(reply) = requests.recv() => {
                    let outcome = self.attempt(Trigger::Manual).await;
                    let _ = reply.send(outcome);
                }

                _ = sleep_until(next_tick) => {
                    self.attempt(Trigger::Timer).await;
                    next_tick = Instant::now() + interval;
                }

                _ = remote_poll.tick() => {
                    let scopes = self.coordinator.poll_remote_changes().await;
                    if !scopes.is_empty() {
                        debug!(?scopes, "remote changes announced");
                        self.attempt(Trigger::RemoteChange).await;
                    }
                }

                changed = self.network.changed(), if network_open => {
                    if changed.is_err() {
                        network_open = false;
                        continue;
                    }
                    let status = *self.network.borrow_and_update();
                    let restored = status.is_connected() && !last_network.is_connected();
                    last_network = status;
                    if restored {
                        self.attempt(Trigger::NetworkRestored).await;
                    }
                }

                burst = self.changes.recv(), if changes_open => {
                    match burst {
                        Some(count) => {
                            debug!(count, "local changes settled");
                            self.attempt(Trigger::LocalChange).await;
                        }
                        None => changes_open = false,
                    }
                }

                changed = self.settings.changed(), if settings_open => {
                    if changed.is_err() {
                        settings_open = false;
                        continue;
                    }
                    let settings = self.settings.borrow_and_update().clone();
                    if settings.interval() != interval {
                        interval = settings.interval();
                        next_tick = Instant::now() + interval;
                        info!(interval_secs = interval.as_secs(), "sync timer rescheduled");
                    }
                    self.changes.set_window(settings.debounce());
                }
            }
        }
        info!("scheduler stopped");
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
