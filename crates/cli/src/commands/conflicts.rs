// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use serde::Serialize;
use ts_core::{ConflictEntry, RecordStore};

use crate::cli::OutputFormat;
use crate::display::preview_payload;
use crate::error::Result;

use super::open_store;

#[derive(Serialize)]
struct ConflictView<'a> {
    #[serde(flatten)]
    local: &'a ts_core::Record,
    remote: Option<&'a ts_core::RemoteRecord>,
}

pub fn run(output: OutputFormat) -> Result<()> {
    let (store, _, _) = open_store()?;
    let entries = run_impl(&store)?;

    match output {
        OutputFormat::Id => {
            for entry in &entries {
                println!("{}", entry.local.id);
            }
        }
        OutputFormat::Json => {
            let views: Vec<_> = entries
                .iter()
                .map(|e| ConflictView {
                    local: &e.local,
                    remote: e.remote.as_ref(),
                })
                .collect();
            println!("{}", serde_json::to_string(&views)?);
        }
        OutputFormat::Text => {
            if entries.is_empty() {
                println!("No conflicts.");
            }
            for entry in &entries {
                println!("{}", format_conflict(entry));
            }
        }
    }
    Ok(())
}

pub(crate) fn run_impl(store: &RecordStore) -> Result<Vec<ConflictEntry>> {
    Ok(store.list_conflicts()?)
}

pub(crate) fn format_conflict(entry: &ConflictEntry) -> String {
    let remote = match &entry.remote {
        Some(r) if r.deleted => "(deleted)".to_string(),
        Some(r) => preview_payload(&r.payload),
        None => "(unavailable)".to_string(),
    };
    format!(
        "- [{}] {}\n    local:  {}\n    remote: {}",
        entry.local.scope,
        entry.local.id,
        preview_payload(&entry.local.payload),
        remote
    )
}

#[cfg(test)]
#[path = "conflicts_tests.rs"]
mod tests;
