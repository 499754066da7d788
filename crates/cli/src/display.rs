// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ts_core::{Record, RemoteRecord, SyncEvent, SyncStatus};

use crate::sync::{SyncFailure, SyncState};

/// Payloads longer than this are cut in list output.
const PAYLOAD_PREVIEW_WIDTH: usize = 60;

/// Shorten a single-line payload for list output.
pub fn preview_payload(payload: &serde_json::Value) -> String {
    let text = payload.to_string();
    if text.chars().count() <= PAYLOAD_PREVIEW_WIDTH {
        return text;
    }
    let cut: String = text.chars().take(PAYLOAD_PREVIEW_WIDTH - 3).collect();
    format!("{cut}...")
}

/// Status column, with the deletion and rejection markers folded in.
fn status_display(record: &Record) -> String {
    let mut status = record.sync_status.to_string();
    if record.deleted {
        status.push_str(", deleted");
    }
    if record.rejected_reason.is_some() {
        status.push_str(", rejected");
    }
    status
}

/// Format a single record line for list output
pub fn format_record_line(record: &Record) -> String {
    format!(
        "- [{}] ({}) {}: {}",
        record.scope,
        status_display(record),
        record.id,
        preview_payload(&record.payload)
    )
}

fn pretty(payload: &serde_json::Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

fn indent(text: &str) -> impl Iterator<Item = String> + '_ {
    text.lines().map(|line| format!("    {line}"))
}

/// Format record details for the show command
pub fn format_record_details(
    record: &Record,
    remote: Option<&RemoteRecord>,
    events: &[SyncEvent],
) -> String {
    let mut output = Vec::new();

    output.push(format!("[{}] {}", record.scope, record.id));
    output.push(format!("Status: {}", status_display(record)));
    output.push(format!(
        "Modified: {}",
        record.last_modified.format("%Y-%m-%d %H:%M:%S%.3f")
    ));
    output.push(format!("Revision: {}", record.revision));
    if let Some(reason) = &record.rejected_reason {
        output.push(format!("Rejected: {}", reason));
    }

    output.push(String::new());
    output.push("Payload:".to_string());
    output.extend(indent(&pretty(&record.payload)));

    if record.sync_status == SyncStatus::Conflict {
        output.push(String::new());
        match remote {
            Some(remote) => {
                output.push(format!(
                    "Remote version ({}):",
                    remote.last_modified.format("%Y-%m-%d %H:%M:%S%.3f")
                ));
                if remote.deleted {
                    output.push("    (deleted)".to_string());
                } else {
                    output.extend(indent(&pretty(&remote.payload)));
                }
            }
            None => output.push("Remote version: unavailable".to_string()),
        }
    }

    if !events.is_empty() {
        output.push(String::new());
        output.push("Log:".to_string());
        for event in events {
            output.push(format_event(event));
        }
    }

    output.join("\n")
}

/// Format a single audit trail entry.
pub fn format_event(event: &SyncEvent) -> String {
    let timestamp = event.created_at.format("%Y-%m-%d %H:%M");
    match &event.detail {
        Some(detail) => format!("  {}  {} ({})", timestamp, event.action, detail),
        None => format!("  {}  {}", timestamp, event.action),
    }
}

/// Format a finished sync pass.
pub fn format_sync_state(state: &SyncState) -> String {
    let mut output = vec![format!("sync: {}", state)];
    if let Some(result) = state.result() {
        for failure in result.errors() {
            output.push(format_failure(failure));
        }
    }
    output.join("\n")
}

fn format_failure(failure: &SyncFailure) -> String {
    format!("  - {}", failure)
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
