// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline-first sync engine.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐  status  ┌─────────────┐   run    ┌─────────────┐  push/pull  ┌─────────────┐
//! │   Network   │─────────►│  Scheduler  │─────────►│ Coordinator │────────────►│   Remote    │
//! │   Monitor   │          │ (debounce,  │          │ (state      │◄────────────│   Adapter   │
//! └─────────────┘          │  timer)     │          │  machine)   │             └─────────────┘
//!                          └─────────────┘          └─────────────┘
//!                                 ▲                        │
//!                                 │ change signal          ▼
//!                          ┌──────────────────────────────────────┐
//!                          │        LocalStore (RecordStore)      │
//!                          └──────────────────────────────────────┘
//! ```
//!
//! - Local writes always succeed and are queued as `pending_upload`
//! - At most one pass runs at a time; extra triggers are dropped
//! - Pull progress is checkpointed in the record store
//! - Failures are reported through [`SyncState`], never as errors

mod adapter;
mod coordinator;
mod debounce;
mod local;
mod network;
mod scheduler;
mod settings;
mod state;
mod transport;
mod ws_adapter;

pub use adapter::{
    AdapterError, AdapterFuture, PullBatch, PushOutcome, PushRejection, RemoteSyncAdapter,
};
pub use coordinator::SyncCoordinator;
pub use debounce::Debounce;
pub use local::LocalStore;
pub use network::{
    classify, poll_path, probe_addr_from_url, validate_probe_addr, ConnectionQuality,
    InterfaceKind, NetworkMonitor, NetworkStatus, PathUpdate, QualityProbe, ReachabilityProbe,
    TcpProbe,
};
pub use scheduler::{should_trigger, Decision, Scheduler, SchedulerHandle, Trigger};
pub use settings::SyncSettings;
pub use state::{ErrorKind, SyncFailure, SyncResult, SyncState};
pub use transport::{Transport, TransportError, WebSocketTransport};
pub use ws_adapter::WebSocketAdapter;

#[cfg(test)]
pub(crate) mod test_helpers;
