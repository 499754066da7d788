// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ts_core::{Record, RecordStore, ResolutionSide};

use crate::cli::KeepSide;
use crate::error::Result;

use super::open_store;

pub fn run(id: &str, keep: KeepSide, merged: Option<serde_json::Value>) -> Result<()> {
    let (mut store, _, _) = open_store()?;
    let record = run_impl(&mut store, id, keep.into(), merged)?;
    println!(
        "Resolved {} keeping {} ({})",
        record.id,
        ResolutionSide::from(keep),
        record.sync_status
    );
    Ok(())
}

pub(crate) fn run_impl(
    store: &mut RecordStore,
    id: &str,
    side: ResolutionSide,
    merged: Option<serde_json::Value>,
) -> Result<Record> {
    Ok(store.resolve_conflict(id, side, merged)?)
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod tests;
