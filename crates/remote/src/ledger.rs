// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Canonical record ledger held by the remote server.
//!
//! Every accepted write gets the next sequence number; the sequence is the
//! pull cursor handed to clients. Conflicting writes are settled with
//! last-writer-wins on `last_modified`, and anything that loses is answered
//! as superseded so the client pulls the winner and resolves locally.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use ts_core::protocol::{PushResult, PushStatus};
use ts_core::{Cursor, Error, RemoteRecord, Result};

/// SQL schema for the ledger.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS ledger (
    id TEXT PRIMARY KEY,
    scope TEXT NOT NULL,
    payload TEXT NOT NULL,
    last_modified TEXT NOT NULL,
    deleted INTEGER NOT NULL DEFAULT 0,
    seq INTEGER NOT NULL UNIQUE
);

CREATE INDEX IF NOT EXISTS idx_ledger_scope ON ledger(scope, last_modified);
"#;

/// Largest serialized payload the ledger accepts.
pub const MAX_PAYLOAD_BYTES: usize = 64 * 1024;

/// Upper bound on a single pull page.
pub const MAX_PULL_LIMIT: u32 = 500;

/// One page of changes after a cursor.
#[derive(Debug, Clone, PartialEq)]
pub struct PullPage {
    pub records: Vec<RemoteRecord>,
    pub next_cursor: Cursor,
    pub has_more: bool,
}

/// Outcome of a push: per-record verdicts plus the scopes that changed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PushOutcome {
    pub results: Vec<PushResult>,
    pub changed_scopes: BTreeSet<String>,
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn record_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<RemoteRecord, rusqlite::Error> {
    let payload: String = row.get(2)?;
    let last_modified: String = row.get(3)?;
    let corrupt = |message: String| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(message)),
        )
    };
    Ok(RemoteRecord {
        id: row.get(0)?,
        scope: row.get(1)?,
        payload: serde_json::from_str(&payload)
            .map_err(|e| corrupt(format!("invalid payload: {e}")))?,
        last_modified: DateTime::parse_from_rfc3339(&last_modified)
            .map_err(|e| corrupt(format!("invalid last_modified '{last_modified}': {e}")))?
            .with_timezone(&Utc),
        deleted: row.get(4)?,
    })
}

fn max_seq(conn: &Connection) -> Result<i64> {
    let seq = conn.query_row("SELECT COALESCE(MAX(seq), 0) FROM ledger", [], |row| row.get(0))?;
    Ok(seq)
}

fn fetch(conn: &Connection, id: &str) -> Result<Option<RemoteRecord>> {
    let record = conn
        .query_row(
            "SELECT id, scope, payload, last_modified, deleted FROM ledger WHERE id = ?1",
            params![id],
            record_from_row,
        )
        .optional()?;
    Ok(record)
}

/// Why a pushed record is refused outright, if it is.
pub fn validate(record: &RemoteRecord) -> Option<String> {
    if record.id.trim().is_empty() {
        return Some("record id must not be empty".to_string());
    }
    if record.scope.trim().is_empty() {
        return Some("record scope must not be empty".to_string());
    }
    let size = record.payload.to_string().len();
    if size > MAX_PAYLOAD_BYTES {
        return Some(format!("payload is {size} bytes, limit is {MAX_PAYLOAD_BYTES}"));
    }
    None
}

fn parse_cursor(cursor: Option<&Cursor>) -> Result<i64> {
    match cursor {
        None => Ok(0),
        Some(c) => c
            .as_str()
            .parse::<i64>()
            .map_err(|_| Error::InvalidInput(format!("invalid cursor '{c}'"))),
    }
}

/// SQLite-backed ledger of the latest version of every record.
pub struct Ledger {
    conn: Connection,
}

impl Ledger {
    /// Opens or creates a ledger at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;")?;
        Self::from_connection(conn)
    }

    /// Opens an in-memory ledger.
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Ledger { conn })
    }

    /// Returns the latest stored version of a record.
    #[cfg(test)]
    pub fn get(&self, id: &str) -> Result<Option<RemoteRecord>> {
        fetch(&self.conn, id)
    }

    /// Highest sequence number handed out so far.
    pub fn head(&self) -> Result<i64> {
        max_seq(&self.conn)
    }

    /// Applies a batch of pushed records in order.
    pub fn push(&mut self, records: &[RemoteRecord]) -> Result<PushOutcome> {
        let tx = self.conn.transaction()?;
        let mut head = max_seq(&tx)?;
        let mut outcome = PushOutcome::default();

        for record in records {
            let status = if let Some(reason) = validate(record) {
                debug!(id = %record.id, %reason, "push rejected");
                PushStatus::Rejected { reason, retryable: false }
            } else {
                match fetch(&tx, &record.id)? {
                    Some(stored)
                        if stored.last_modified == record.last_modified
                            && stored.deleted == record.deleted
                            && stored.payload == record.payload =>
                    {
                        PushStatus::Accepted
                    }
                    Some(stored) if stored.last_modified >= record.last_modified => {
                        debug!(id = %record.id, "push superseded by stored version");
                        PushStatus::Superseded
                    }
                    _ => {
                        head += 1;
                        tx.execute(
                            "INSERT INTO ledger (id, scope, payload, last_modified, deleted, seq)
                             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                             ON CONFLICT(id) DO UPDATE SET
                                scope = excluded.scope,
                                payload = excluded.payload,
                                last_modified = excluded.last_modified,
                                deleted = excluded.deleted,
                                seq = excluded.seq",
                            params![
                                record.id,
                                record.scope,
                                serde_json::to_string(&record.payload)?,
                                format_timestamp(&record.last_modified),
                                record.deleted,
                                head,
                            ],
                        )?;
                        outcome.changed_scopes.insert(record.scope.clone());
                        PushStatus::Accepted
                    }
                }
            };
            outcome.results.push(PushResult { id: record.id.clone(), status });
        }

        tx.commit()?;
        Ok(outcome)
    }

    /// Returns up to `limit` records changed after `since`, in sequence order.
    pub fn pull(&self, since: Option<&Cursor>, limit: u32) -> Result<PullPage> {
        let after = parse_cursor(since)?;
        let limit = limit.clamp(1, MAX_PULL_LIMIT);

        let mut stmt = self.conn.prepare(
            "SELECT id, scope, payload, last_modified, deleted, seq FROM ledger
             WHERE seq > ?1 ORDER BY seq LIMIT ?2",
        )?;
        let rows = stmt
            .query_map(params![after, i64::from(limit) + 1], |row| {
                Ok((record_from_row(row)?, row.get::<_, i64>(5)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let has_more = rows.len() > limit as usize;
        let mut last = after;
        let mut records = Vec::with_capacity(rows.len().min(limit as usize));
        for (record, seq) in rows.into_iter().take(limit as usize) {
            last = seq;
            records.push(record);
        }

        Ok(PullPage { records, next_cursor: Cursor::new(last.to_string()), has_more })
    }

    /// Returns every record of `scope` modified strictly after `since`.
    pub fn fetch_scope(
        &self,
        scope: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<RemoteRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, scope, payload, last_modified, deleted FROM ledger
             WHERE scope = ?1 AND (?2 IS NULL OR last_modified > ?2)
             ORDER BY last_modified, id",
        )?;
        let since = since.as_ref().map(format_timestamp);
        let records = stmt
            .query_map(params![scope, since], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
