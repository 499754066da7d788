// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Network monitor: turns raw path updates into a coarse [`NetworkStatus`].
//!
//! Path updates arrive on an mpsc channel. Each update is classified right
//! away; a connected classification is only published after a reachability
//! probe confirms it, and `Unknown` is published while the probe runs so
//! observers never block on it. A periodic probe refines the advisory
//! [`ConnectionQuality`] and re-checks reachability.

use std::fmt;
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Default period of the quality probe.
pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// Default timeout of a single probe.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Interface type carried by a path update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InterfaceKind {
    Wifi,
    Cellular,
    Ethernet,
    Other,
}

impl InterfaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterfaceKind::Wifi => "wifi",
            InterfaceKind::Cellular => "cellular",
            InterfaceKind::Ethernet => "ethernet",
            InterfaceKind::Other => "other",
        }
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterfaceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "wifi" | "wi-fi" => Ok(InterfaceKind::Wifi),
            "cellular" | "mobile" => Ok(InterfaceKind::Cellular),
            "ethernet" | "wired" => Ok(InterfaceKind::Ethernet),
            "other" => Ok(InterfaceKind::Other),
            _ => Err(format!("unknown interface '{s}'")),
        }
    }
}

/// Raw connectivity signal from the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathUpdate {
    /// The path can carry traffic.
    pub satisfied: bool,
    pub interface: InterfaceKind,
    /// The platform flagged the path as costly.
    pub expensive: bool,
}

impl PathUpdate {
    pub fn offline() -> Self {
        PathUpdate { satisfied: false, interface: InterfaceKind::Other, expensive: false }
    }

    pub fn online(interface: InterfaceKind, expensive: bool) -> Self {
        PathUpdate { satisfied: true, interface, expensive }
    }
}

/// Coarse connectivity as seen by the scheduler and coordinator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkStatus {
    #[default]
    Unknown,
    Disconnected,
    Connected,
    MeteredConnected,
    UnmeteredConnected,
}

impl NetworkStatus {
    pub fn is_connected(&self) -> bool {
        matches!(
            self,
            NetworkStatus::Connected
                | NetworkStatus::MeteredConnected
                | NetworkStatus::UnmeteredConnected
        )
    }

    pub fn is_metered(&self) -> bool {
        matches!(self, NetworkStatus::MeteredConnected)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NetworkStatus::Unknown => "unknown",
            NetworkStatus::Disconnected => "disconnected",
            NetworkStatus::Connected => "connected",
            NetworkStatus::MeteredConnected => "metered_connected",
            NetworkStatus::UnmeteredConnected => "unmetered_connected",
        }
    }
}

impl fmt::Display for NetworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Advisory link quality. Never used for gating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionQuality {
    #[default]
    Unknown,
    Poor,
    Moderate,
    Good,
    Excellent,
}

impl ConnectionQuality {
    /// Bucket a measured round-trip time.
    pub fn from_rtt(rtt: Duration) -> Self {
        match rtt.as_millis() {
            0..=49 => ConnectionQuality::Excellent,
            50..=149 => ConnectionQuality::Good,
            150..=399 => ConnectionQuality::Moderate,
            _ => ConnectionQuality::Poor,
        }
    }
}

/// Classify a path update without probing.
pub fn classify(update: &PathUpdate) -> NetworkStatus {
    if !update.satisfied {
        return NetworkStatus::Disconnected;
    }
    if update.expensive || update.interface == InterfaceKind::Cellular {
        return NetworkStatus::MeteredConnected;
    }
    match update.interface {
        InterfaceKind::Wifi | InterfaceKind::Ethernet => NetworkStatus::UnmeteredConnected,
        _ => NetworkStatus::Connected,
    }
}

/// Boxed future returned by probes.
pub type ProbeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Lightweight check that a known-stable endpoint answers.
pub trait ReachabilityProbe: Send + Sync {
    fn is_reachable(&self) -> ProbeFuture<'_, bool>;
}

/// Round-trip measurement; `None` means the endpoint did not answer.
pub trait QualityProbe: Send + Sync {
    fn measure(&self) -> ProbeFuture<'_, Option<Duration>>;
}

/// Probe that opens a TCP connection and times the handshake.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    addr: String,
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(addr: impl Into<String>) -> Self {
        TcpProbe { addr: addr.into(), timeout: DEFAULT_PROBE_TIMEOUT }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn connect(&self) -> Option<Duration> {
        let started = Instant::now();
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => Some(started.elapsed()),
            Ok(Err(e)) => {
                debug!(addr = %self.addr, error = %e, "probe connect failed");
                None
            }
            Err(_) => {
                debug!(addr = %self.addr, "probe timed out");
                None
            }
        }
    }
}

impl ReachabilityProbe for TcpProbe {
    fn is_reachable(&self) -> ProbeFuture<'_, bool> {
        Box::pin(async move { self.connect().await.is_some() })
    }
}

impl QualityProbe for TcpProbe {
    fn measure(&self) -> ProbeFuture<'_, Option<Duration>> {
        Box::pin(self.connect())
    }
}

/// Probe target derived from a `ws://host:port/...` URL.
pub fn probe_addr_from_url(url: &str) -> Option<String> {
    let (scheme, rest) = url.split_once("://")?;
    let authority = rest.split('/').next()?;
    let authority = authority.rsplit('@').next()?;
    if authority.is_empty() {
        return None;
    }
    let has_port = match authority.rfind(']') {
        Some(end) => authority[end..].contains(':'),
        None => authority.contains(':'),
    };
    if has_port {
        return Some(authority.to_string());
    }
    let port = match scheme {
        "wss" | "https" => 443,
        _ => 80,
    };
    Some(format!("{authority}:{port}"))
}

/// Outcome of a spawned probe, tagged with the generation that started it.
enum ProbeReport {
    Reachability { generation: u64, reachable: bool },
    Quality { generation: u64, rtt: Option<Duration> },
}

/// Publishes [`NetworkStatus`] and [`ConnectionQuality`] from path updates.
pub struct NetworkMonitor {
    status: watch::Sender<NetworkStatus>,
    quality: watch::Sender<ConnectionQuality>,
    reachability: Arc<dyn ReachabilityProbe>,
    quality_probe: Arc<dyn QualityProbe>,
    probe_interval: Duration,
}

impl NetworkMonitor {
    pub fn new(
        reachability: Arc<dyn ReachabilityProbe>,
        quality_probe: Arc<dyn QualityProbe>,
    ) -> Self {
        NetworkMonitor {
            status: watch::Sender::new(NetworkStatus::Unknown),
            quality: watch::Sender::new(ConnectionQuality::Unknown),
            reachability,
            quality_probe,
            probe_interval: DEFAULT_PROBE_INTERVAL,
        }
    }

    /// Monitor that uses one TCP probe for both reachability and quality.
    pub fn with_tcp_probe(probe: TcpProbe) -> Self {
        let probe = Arc::new(probe);
        Self::new(probe.clone(), probe)
    }

    pub fn with_probe_interval(mut self, interval: Duration) -> Self {
        self.probe_interval = interval.max(Duration::from_millis(1));
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<NetworkStatus> {
        self.status.subscribe()
    }

    pub fn subscribe_quality(&self) -> watch::Receiver<ConnectionQuality> {
        self.quality.subscribe()
    }

    pub fn status(&self) -> NetworkStatus {
        *self.status.borrow()
    }

    fn publish(&self, status: NetworkStatus) {
        let changed = self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
        if changed {
            info!(status = %status, "network status changed");
        }
    }

    fn publish_quality(&self, quality: ConnectionQuality) {
        self.quality.send_if_modified(|current| {
            if *current == quality {
                return false;
            }
            *current = quality;
            true
        });
    }

    fn spawn_reachability(&self, generation: u64, tx: &mpsc::Sender<ProbeReport>) {
        let probe = Arc::clone(&self.reachability);
        let tx = tx.clone();
        tokio::spawn(async move {
            let reachable = probe.is_reachable().await;
            let _ = tx.send(ProbeReport::Reachability { generation, reachable }).await;
        });
    }

    fn spawn_quality(&self, generation: u64, tx: &mpsc::Sender<ProbeReport>) {
        let probe = Arc::clone(&self.quality_probe);
        let tx = tx.clone();
        tokio::spawn(async move {
            let rtt = probe.measure().await;
            let _ = tx.send(ProbeReport::Quality { generation, rtt }).await;
        });
    }

    /// Process path updates until cancelled or the update source closes.
    ///
    /// Probes run on spawned tasks; this loop only classifies and publishes,
    /// so a slow probe never delays the status stream.
    pub async fn run(&self, mut updates: mpsc::Receiver<PathUpdate>, cancel: CancellationToken) {
        let (probe_tx, mut probe_rx) = mpsc::channel::<ProbeReport>(8);
        let mut generation: u64 = 0;
        let mut path: Option<PathUpdate> = None;

        let start = Instant::now() + self.probe_interval;
        let mut ticker = interval_at(start, self.probe_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    debug!("network monitor cancelled");
                    break;
                }

                update = updates.recv() => {
                    let Some(update) = update else {
                        debug!("path update source closed");
                        break;
                    };
                    generation += 1;
                    path = Some(update);
                    let classified = classify(&update);
                    debug!(?update, classified = %classified, "path update");
                    if classified.is_connected() {
                        self.publish(NetworkStatus::Unknown);
                        self.spawn_reachability(generation, &probe_tx);
                    } else {
                        self.publish(classified);
                        self.publish_quality(ConnectionQuality::Unknown);
                    }
                }

                Some(report) = probe_rx.recv() => {
                    let Some(current) = path else { continue };
                    let classified = classify(&current);
                    match report {
                        ProbeReport::Reachability { generation: g, .. }
                        | ProbeReport::Quality { generation: g, .. } if g != generation => {
                            debug!(generation = g, "discarding stale probe result");
                        }
                        ProbeReport::Reachability { reachable: true, .. } => {
                            self.publish(classified);
                        }
                        ProbeReport::Reachability { reachable: false, .. } => {
                            warn!("reachability probe failed, status unknown");
                            self.publish(NetworkStatus::Unknown);
                        }
                        ProbeReport::Quality { rtt: Some(rtt), .. } => {
                            self.publish(classified);
                            self.publish_quality(ConnectionQuality::from_rtt(rtt));
                        }
                        ProbeReport::Quality { rtt: None, .. } => {
                            warn!("quality probe failed, status unknown");
                            self.publish(NetworkStatus::Unknown);
                            self.publish_quality(ConnectionQuality::Unknown);
                        }
                    }
                }

                _ = ticker.tick() => {
                    if path.as_ref().is_some_and(|p| classify(p).is_connected()) {
                        generation += 1;
                        self.spawn_quality(generation, &probe_tx);
                    }
                }
            }
        }
    }
}

/// Poll a TCP endpoint and turn reachability flips into path updates.
///
/// Stands in for a platform path observer on hosts without one. The
/// interface kind and cost flag come from configuration.
pub async fn poll_path(
    addr: String,
    interface: InterfaceKind,
    expensive: bool,
    every: Duration,
    tx: mpsc::Sender<PathUpdate>,
    cancel: CancellationToken,
) {
    let probe = TcpProbe::new(addr).with_timeout(every.min(DEFAULT_PROBE_TIMEOUT));
    let mut last: Option<bool> = None;
    let mut ticker = tokio::time::interval(every.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        let satisfied = probe.is_reachable().await;
        if last == Some(satisfied) {
            continue;
        }
        last = Some(satisfied);
        let update = if satisfied {
            PathUpdate::online(interface, expensive)
        } else {
            PathUpdate::offline()
        };
        if tx.send(update).await.is_err() {
            break;
        }
    }
}

/// Resolve `host:port` eagerly so configuration errors show up at startup.
pub fn validate_probe_addr(addr: &str) -> Result<(), String> {
    if addr.parse::<SocketAddr>().is_ok() {
        return Ok(());
    }
    match addr.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => Ok(()),
        _ => Err(format!("probe address '{addr}' must be host:port")),
    }
}

#[cfg(test)]
#[path = "network_tests.rs"]
mod tests;
