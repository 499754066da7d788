// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use chrono::Utc;
use ts_core::{Record, RecordStore};

use crate::cli::OutputFormat;
use crate::error::{Error, Result};
use crate::id::{generate_unique_id, validate_scope};

use super::open_store;

/// Scope given to new records when none is named.
pub const DEFAULT_SCOPE: &str = "default";

pub fn run(
    payload: serde_json::Value,
    id: Option<String>,
    scope: Option<String>,
    output: OutputFormat,
) -> Result<()> {
    let (mut store, _, _) = open_store()?;
    let record = run_impl(&mut store, payload, id.as_deref(), scope.as_deref())?;

    match output {
        OutputFormat::Id => println!("{}", record.id),
        OutputFormat::Json => println!("{}", serde_json::to_string(&record)?),
        OutputFormat::Text => {
            if record.revision == 1 {
                println!("Created {} in {} ({})", record.id, record.scope, record.sync_status);
            } else {
                println!("Updated {} ({})", record.id, record.sync_status);
            }
        }
    }
    Ok(())
}

/// Write a record locally. Updates keep their stored scope; naming a
/// different one is an error.
pub(crate) fn run_impl(
    store: &mut RecordStore,
    payload: serde_json::Value,
    id: Option<&str>,
    scope: Option<&str>,
) -> Result<Record> {
    if let Some(scope) = scope {
        if !validate_scope(scope) {
            return Err(Error::InvalidInput(format!(
                "invalid scope '{scope}'\n  hint: scopes are lowercase letters, digits, '-' or '_', starting with a letter"
            )));
        }
    }

    let (id, scope) = match id {
        Some(id) => {
            let scope = match (scope, store.get(id)?) {
                (Some(scope), Some(existing)) if scope != existing.scope => {
                    return Err(Error::InvalidInput(format!(
                        "record '{id}' is in scope '{}', not '{scope}'\n  hint: a record keeps its scope; omit --scope when updating",
                        existing.scope
                    )));
                }
                (_, Some(existing)) => existing.scope,
                (Some(scope), None) => scope.to_string(),
                (None, None) => DEFAULT_SCOPE.to_string(),
            };
            (id.to_string(), scope)
        }
        None => {
            let scope = scope.unwrap_or(DEFAULT_SCOPE);
            let id = generate_unique_id(scope, &payload, &Utc::now(), |candidate| {
                matches!(store.get(candidate), Ok(Some(_)))
            });
            (id, scope.to_string())
        }
    };

    Ok(store.put_local(&id, &scope, payload)?)
}

#[cfg(test)]
#[path = "put_tests.rs"]
mod tests;
