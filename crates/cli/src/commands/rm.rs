// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ts_core::{Record, RecordStore};

use crate::error::Result;

use super::open_store;

pub fn run(id: &str) -> Result<()> {
    let (mut store, _, _) = open_store()?;
    let record = run_impl(&mut store, id)?;
    println!("Deleted {} ({})", record.id, record.sync_status);
    Ok(())
}

pub(crate) fn run_impl(store: &mut RecordStore, id: &str) -> Result<Record> {
    Ok(store.delete_local(id)?)
}

#[cfg(test)]
#[path = "rm_tests.rs"]
mod tests;
