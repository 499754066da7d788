// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use yare::parameterized;

/// Probe with scripted answers and an artificial delay.
struct FakeProbe {
    reachable: AtomicBool,
    rtt: Mutex<Option<Duration>>,
    delay: Duration,
}

impl FakeProbe {
    fn new(reachable: bool, delay: Duration) -> Arc<Self> {
        Arc::new(FakeProbe {
            reachable: AtomicBool::new(reachable),
            rtt: Mutex::new(reachable.then_some(Duration::from_millis(20))),
            delay,
        })
    }

    fn set(&self, rtt: Option<Duration>) {
        self.reachable.store(rtt.is_some(), Ordering::SeqCst);
        *self.rtt.lock().unwrap() = rtt;
    }
}

impl ReachabilityProbe for FakeProbe {
    fn is_reachable(&self) -> ProbeFuture<'_, bool> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            self.reachable.load(Ordering::SeqCst)
        })
    }
}

impl QualityProbe for FakeProbe {
    fn measure(&self) -> ProbeFuture<'_, Option<Duration>> {
        Box::pin(async move {
            tokio::time::sleep(self.delay).await;
            *self.rtt.lock().unwrap()
        })
    }
}

struct Harness {
    monitor: Arc<NetworkMonitor>,
    updates: mpsc::Sender<PathUpdate>,
    cancel: CancellationToken,
}

impl Harness {
    fn start(probe: Arc<FakeProbe>, interval: Duration) -> Self {
        let monitor =
            Arc::new(NetworkMonitor::new(probe.clone(), probe).with_probe_interval(interval));
        let (updates, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let runner = Arc::clone(&monitor);
        let token = cancel.clone();
        tokio::spawn(async move { runner.run(rx, token).await });
        Harness { monitor, updates, cancel }
    }

    async fn send(&self, update: PathUpdate) {
        self.updates.send(update).await.unwrap();
    }
}

async fn wait(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[parameterized(
    unsatisfied = { PathUpdate::offline(), NetworkStatus::Disconnected },
    wifi = { PathUpdate::online(InterfaceKind::Wifi, false), NetworkStatus::UnmeteredConnected },
    ethernet = { PathUpdate::online(InterfaceKind::Ethernet, false), NetworkStatus::UnmeteredConnected },
    cellular = { PathUpdate::online(InterfaceKind::Cellular, false), NetworkStatus::MeteredConnected },
    expensive_wifi = { PathUpdate::online(InterfaceKind::Wifi, true), NetworkStatus::MeteredConnected },
    other = { PathUpdate::online(InterfaceKind::Other, false), NetworkStatus::Connected },
)]
fn classify_path(update: PathUpdate, expected: NetworkStatus) {
    assert_eq!(classify(&update), expected);
}

#[parameterized(
    fast = { 10, ConnectionQuality::Excellent },
    good = { 80, ConnectionQuality::Good },
    moderate = { 200, ConnectionQuality::Moderate },
    slow = { 1200, ConnectionQuality::Poor },
)]
fn quality_buckets(ms: u64, expected: ConnectionQuality) {
    assert_eq!(ConnectionQuality::from_rtt(Duration::from_millis(ms)), expected);
}

#[parameterized(
    explicit_port = { "ws://127.0.0.1:7890/sync", Some("127.0.0.1:7890") },
    default_ws = { "ws://sync.example.com", Some("sync.example.com:80") },
    default_wss = { "wss://sync.example.com/a/b", Some("sync.example.com:443") },
    ipv6 = { "ws://[::1]:9000", Some("[::1]:9000") },
    ipv6_no_port = { "ws://[::1]/x", Some("[::1]:80") },
    no_scheme = { "sync.example.com", None },
    empty_host = { "ws:///path", None },
)]
fn probe_addr_parsing(url: &str, expected: Option<&str>) {
    assert_eq!(probe_addr_from_url(url).as_deref(), expected);
}

#[test]
fn status_predicates() {
    assert!(NetworkStatus::MeteredConnected.is_connected());
    assert!(NetworkStatus::MeteredConnected.is_metered());
    assert!(!NetworkStatus::UnmeteredConnected.is_metered());
    assert!(!NetworkStatus::Unknown.is_connected());
    assert!(!NetworkStatus::Disconnected.is_connected());
}

#[test]
fn interface_from_str() {
    assert_eq!("WiFi".parse::<InterfaceKind>().unwrap(), InterfaceKind::Wifi);
    assert_eq!("cellular".parse::<InterfaceKind>().unwrap(), InterfaceKind::Cellular);
    assert!("carrier-pigeon".parse::<InterfaceKind>().is_err());
}

#[test]
fn probe_addr_validation() {
    assert!(validate_probe_addr("127.0.0.1:80").is_ok());
    assert!(validate_probe_addr("sync.example.com:443").is_ok());
    assert!(validate_probe_addr("sync.example.com").is_err());
}

#[tokio::test(start_paused = true)]
async fn disconnect_is_published_without_probing() {
    let harness = Harness::start(FakeProbe::new(true, Duration::from_secs(5)), DEFAULT_PROBE_INTERVAL);
    harness.send(PathUpdate::offline()).await;
    wait(1).await;
    assert_eq!(harness.monitor.status(), NetworkStatus::Disconnected);
    harness.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn connected_only_after_probe() {
    let harness =
        Harness::start(FakeProbe::new(true, Duration::from_millis(500)), DEFAULT_PROBE_INTERVAL);
    harness.send(PathUpdate::offline()).await;
    wait(1).await;
    harness.send(PathUpdate::online(InterfaceKind::Wifi, false)).await;
    wait(10).await;
    assert_eq!(harness.monitor.status(), NetworkStatus::Unknown);

    wait(600).await;
    assert_eq!(harness.monitor.status(), NetworkStatus::UnmeteredConnected);
    harness.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn failed_probe_stays_unknown() {
    let harness =
        Harness::start(FakeProbe::new(false, Duration::from_millis(100)), DEFAULT_PROBE_INTERVAL);
    harness.send(PathUpdate::online(InterfaceKind::Cellular, false)).await;
    wait(500).await;
    assert_eq!(harness.monitor.status(), NetworkStatus::Unknown);
    harness.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn stale_probe_result_is_discarded() {
    let harness =
        Harness::start(FakeProbe::new(true, Duration::from_secs(2)), DEFAULT_PROBE_INTERVAL);
    harness.send(PathUpdate::online(InterfaceKind::Wifi, false)).await;
    wait(10).await;
    harness.send(PathUpdate::offline()).await;
    wait(3_000).await;
    assert_eq!(harness.monitor.status(), NetworkStatus::Disconnected);
    harness.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn subscribers_see_transitions() {
    let harness =
        Harness::start(FakeProbe::new(true, Duration::from_millis(50)), DEFAULT_PROBE_INTERVAL);
    let mut rx = harness.monitor.subscribe();
    harness.send(PathUpdate::online(InterfaceKind::Ethernet, false)).await;
    rx.changed().await.unwrap();
    assert_eq!(*rx.borrow_and_update(), NetworkStatus::UnmeteredConnected);
    harness.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn periodic_probe_refines_quality_and_degrades() {
    let probe = FakeProbe::new(true, Duration::from_millis(10));
    let harness = Harness::start(probe.clone(), Duration::from_secs(30));
    harness.send(PathUpdate::online(InterfaceKind::Wifi, false)).await;
    wait(100).await;
    assert_eq!(harness.monitor.status(), NetworkStatus::UnmeteredConnected);
    assert_eq!(*harness.monitor.subscribe_quality().borrow(), ConnectionQuality::Unknown);

    wait(30_000).await;
    assert_eq!(*harness.monitor.subscribe_quality().borrow(), ConnectionQuality::Excellent);

    probe.set(None);
    wait(30_000).await;
    assert_eq!(harness.monitor.status(), NetworkStatus::Unknown);
    assert_eq!(*harness.monitor.subscribe_quality().borrow(), ConnectionQuality::Unknown);

    probe.set(Some(Duration::from_millis(200)));
    wait(30_000).await;
    assert_eq!(harness.monitor.status(), NetworkStatus::UnmeteredConnected);
    assert_eq!(*harness.monitor.subscribe_quality().borrow(), ConnectionQuality::Moderate);
    harness.cancel.cancel();
}

#[tokio::test(start_paused = true)]
async fn monitor_stops_on_cancel() {
    let probe = FakeProbe::new(true, Duration::from_millis(10));
    let monitor = NetworkMonitor::new(probe.clone(), probe);
    let (_tx, rx) = mpsc::channel(1);
    let cancel = CancellationToken::new();
    cancel.cancel();
    monitor.run(rx, cancel).await;
    assert_eq!(monitor.status(), NetworkStatus::Unknown);
}
