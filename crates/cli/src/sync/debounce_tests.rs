// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

const WINDOW: Duration = Duration::from_secs(1);

#[tokio::test(start_paused = true)]
async fn burst_coalesces_into_one_trigger() {
    let (tx, rx) = mpsc::channel(16);
    let mut debounce = Debounce::new(rx, WINDOW);
    let started = Instant::now();

    for _ in 0..5 {
        tx.send(()).await.unwrap();
    }
    assert_eq!(debounce.recv().await, Some(5));
    assert_eq!(started.elapsed(), WINDOW);
}

#[tokio::test(start_paused = true)]
async fn each_event_restarts_window() {
    let (tx, rx) = mpsc::channel(16);
    let mut debounce = Debounce::new(rx, WINDOW);
    let started = Instant::now();

    let sender = tx.clone();
    tokio::spawn(async move {
        for _ in 0..3 {
            sender.send(()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(600)).await;
        }
    });

    assert_eq!(debounce.recv().await, Some(3));
    // Last event at 1200ms, then a full quiet window.
    assert_eq!(started.elapsed(), Duration::from_millis(2200));
    drop(tx);
}

#[tokio::test(start_paused = true)]
async fn separate_bursts_trigger_separately() {
    let (tx, rx) = mpsc::channel(16);
    let mut debounce = Debounce::new(rx, WINDOW);

    tx.send(()).await.unwrap();
    assert_eq!(debounce.recv().await, Some(1));
    tx.send(()).await.unwrap();
    tx.send(()).await.unwrap();
    assert_eq!(debounce.recv().await, Some(2));
}

#[tokio::test(start_paused = true)]
async fn closed_channel_flushes_then_ends() {
    let (tx, rx) = mpsc::channel(16);
    let mut debounce = Debounce::new(rx, WINDOW);
    tx.send(()).await.unwrap();
    drop(tx);

    assert_eq!(debounce.recv().await, Some(1));
    assert_eq!(debounce.recv().await, None);
}

#[tokio::test(start_paused = true)]
async fn dropped_recv_keeps_pending_events() {
    let (tx, rx) = mpsc::channel(16);
    let mut debounce = Debounce::new(rx, WINDOW);
    tx.send(()).await.unwrap();

    let early = tokio::time::timeout(Duration::from_millis(100), debounce.recv()).await;
    assert!(early.is_err());

    assert_eq!(debounce.recv().await, Some(1));
}

#[tokio::test(start_paused = true)]
async fn window_change_applies_to_next_event() {
    let (tx, rx) = mpsc::channel(16);
    let mut debounce = Debounce::new(rx, WINDOW);
    debounce.set_window(Duration::from_millis(100));
    assert_eq!(debounce.window(), Duration::from_millis(100));

    let started = Instant::now();
    tx.send(()).await.unwrap();
    assert_eq!(debounce.recv().await, Some(1));
    assert_eq!(started.elapsed(), Duration::from_millis(100));
}
