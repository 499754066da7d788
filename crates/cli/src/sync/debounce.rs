// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Trailing-edge debounce over a change-signal channel.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

/// Coalesces bursts of events into one trigger after a quiet window.
///
/// Every event restarts the window. State lives in the struct, so a
/// `recv()` future dropped by `select!` loses nothing.
pub struct Debounce<T> {
    rx: mpsc::Receiver<T>,
    window: Duration,
    pending: usize,
    deadline: Option<Instant>,
    closed: bool,
}

impl<T> Debounce<T> {
    pub fn new(rx: mpsc::Receiver<T>, window: Duration) -> Self {
        Debounce { rx, window, pending: 0, deadline: None, closed: false }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Change the window. Applies from the next event on.
    pub fn set_window(&mut self, window: Duration) {
        self.window = window;
    }

    /// Wait for the next burst to go quiet and return how many events it held.
    ///
    /// Returns `None` once the sender side is gone and nothing is pending.
    pub async fn recv(&mut self) -> Option<usize> {
        loop {
            if self.closed {
                return self.take();
            }
            match self.deadline {
                None => match self.rx.recv().await {
                    Some(_) => self.bump(),
                    None => self.closed = true,
                },
                Some(deadline) => {
                    tokio::select! {
                        biased;
                        event = self.rx.recv() => match event {
                            Some(_) => self.bump(),
                            None => self.closed = true,
                        },
                        _ = sleep_until(deadline) => return self.take(),
                    }
                }
            }
        }
    }

    fn bump(&mut self) {
        self.pending += 1;
        self.deadline = Some(Instant::now() + self.window);
    }

    fn take(&mut self) -> Option<usize> {
        self.deadline = None;
        let count = std::mem::take(&mut self.pending);
        (count > 0).then_some(count)
    }
}

#[cfg(test)]
#[path = "debounce_tests.rs"]
mod tests;
