// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use ts_core::{Record, RecordStore, RemoteRecord, SyncEvent, SyncStatus};

use crate::cli::OutputFormat;
use crate::display::format_record_details;
use crate::error::Result;

use super::open_store;

#[derive(Debug, Serialize)]
pub(crate) struct RecordDetails {
    #[serde(flatten)]
    pub record: Record,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict_remote: Option<RemoteRecord>,
    pub events: Vec<SyncEvent>,
}

pub fn run(id: &str, output: OutputFormat) -> Result<()> {
    let (store, _, _) = open_store()?;
    let details = build_record_details(&store, id)?;

    match output {
        OutputFormat::Json => println!("{}", serde_json::to_string(&details)?),
        OutputFormat::Id => println!("{}", details.record.id),
        OutputFormat::Text => println!(
            "{}",
            format_record_details(
                &details.record,
                details.conflict_remote.as_ref(),
                &details.events
            )
        ),
    }
    Ok(())
}

pub(crate) fn build_record_details(store: &RecordStore, id: &str) -> Result<RecordDetails> {
    let record = store.get_required(id)?;
    let conflict_remote = if record.sync_status == SyncStatus::Conflict {
        store.conflict_remote(id)?
    } else {
        None
    };
    let events = store.events(id)?;
    Ok(RecordDetails {
        record,
        conflict_remote,
        events,
    })
}

#[cfg(test)]
#[path = "show_tests.rs"]
mod tests;
