// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ts-core: Shared library for the tidesync offline-first sync engine
//!
//! This crate provides the syncable record model, the SQLite record store
//! with its sync metadata, conflict resolution, and the wire protocol used
//! by both the tsync client and the ts-remote server.

pub mod clock;
pub mod error;
pub mod protocol;
pub mod record;
pub mod resolve;
pub mod store;

pub use clock::{ClockSource, ManualClock, Stamper, SystemClock};
pub use error::{Error, Result};
pub use record::{
    Cursor, EventAction, Record, RemoteRecord, ResolutionSide, SyncEvent, SyncStatus,
};
pub use resolve::{ConflictResolver, FieldUnion, LastWriterWins, MergePolicy, NoMerge, Resolution};
pub use store::{ConflictEntry, RecordStore};
