// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ts_core::{Record, RecordStore};

use crate::cli::OutputFormat;
use crate::error::Result;

use super::list::print_records;
use super::open_store;

pub fn run(output: OutputFormat) -> Result<()> {
    let (store, _, _) = open_store()?;
    let (pending, rejected) = run_impl(&store)?;

    print_records(&pending, output)?;
    if output == OutputFormat::Text {
        if pending.is_empty() {
            println!("Nothing pending.");
        }
        for record in &rejected {
            println!(
                "rejected: {} ({}); edit it to retry",
                record.id,
                record.rejected_reason.as_deref().unwrap_or("no reason given")
            );
        }
    }
    Ok(())
}

/// Records the next pass will process, and those held back after a rejection.
pub(crate) fn run_impl(store: &RecordStore) -> Result<(Vec<Record>, Vec<Record>)> {
    let pending = store.fetch_pending()?;
    let rejected = store
        .list(None, None)?
        .into_iter()
        .filter(|r| r.rejected_reason.is_some())
        .collect();
    Ok((pending, rejected))
}

#[cfg(test)]
#[path = "pending_tests.rs"]
mod tests;
