// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ts_core::{Record, RecordStore, SyncStatus};

use crate::cli::OutputFormat;
use crate::display::format_record_line;
use crate::error::Result;

use super::open_store;

pub fn run(
    scope: Option<String>,
    status: Option<String>,
    all: bool,
    output: OutputFormat,
) -> Result<()> {
    let (store, _, _) = open_store()?;
    let records = run_impl(&store, scope.as_deref(), status.as_deref(), all)?;
    print_records(&records, output)
}

pub(crate) fn run_impl(
    store: &RecordStore,
    scope: Option<&str>,
    status: Option<&str>,
    all: bool,
) -> Result<Vec<Record>> {
    let status = status.map(str::parse::<SyncStatus>).transpose()?;
    let records = store
        .list(scope, status)?
        .into_iter()
        .filter(|r| all || !r.deleted)
        .collect();
    Ok(records)
}

/// Print records in the requested format, one per line.
pub(crate) fn print_records(records: &[Record], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Text => {
            for record in records {
                println!("{}", format_record_line(record));
            }
        }
        OutputFormat::Id => {
            for record in records {
                println!("{}", record.id);
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string(records)?),
    }
    Ok(())
}

#[cfg(test)]
#[path = "list_tests.rs"]
mod tests;
