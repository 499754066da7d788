// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed record store with sync metadata.
//!
//! The [`RecordStore`] is the single source of mutable truth for the sync
//! engine. Pending work is always recomputed from persisted rows, so a
//! restart never loses queued uploads, and the pull checkpoint cursor lives
//! in the same database file.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tracing::debug;

use crate::clock::{ClockSource, Stamper};
use crate::error::{Error, Result};
use crate::record::{
    Cursor, EventAction, Record, RemoteRecord, ResolutionSide, SyncEvent, SyncStatus,
};

/// SQL schema for the record store.
pub const SCHEMA: &str = r#"
-- Domain records with sync metadata
CREATE TABLE IF NOT EXISTS records (
    id TEXT PRIMARY KEY,
    scope TEXT NOT NULL,
    payload TEXT NOT NULL,
    last_modified TEXT NOT NULL,
    sync_status TEXT NOT NULL DEFAULT 'pending_upload',
    conflict_resolution_needed INTEGER NOT NULL DEFAULT 0,
    deleted INTEGER NOT NULL DEFAULT 0,
    revision INTEGER NOT NULL DEFAULT 1,
    rejected_reason TEXT,
    conflict_remote TEXT
);

-- Sync audit trail
CREATE TABLE IF NOT EXISTS sync_events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    record_id TEXT NOT NULL,
    action TEXT NOT NULL,
    detail TEXT,
    created_at TEXT NOT NULL
);

-- Key/value sync bookkeeping (pull cursor)
CREATE TABLE IF NOT EXISTS sync_meta (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Indexes
CREATE INDEX IF NOT EXISTS idx_records_pending ON records(sync_status, last_modified);
CREATE INDEX IF NOT EXISTS idx_records_scope ON records(scope);
CREATE INDEX IF NOT EXISTS idx_sync_events_record ON sync_events(record_id);
"#;

const CURSOR_KEY: &str = "pull_cursor";

const RECORD_COLUMNS: &str = "id, scope, payload, last_modified, sync_status,
    conflict_resolution_needed, deleted, revision, rejected_reason";

/// Formats a timestamp with fixed millisecond width so text order is time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn conversion_error(message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(Error::CorruptedData(message)),
    )
}

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value
        .parse()
        .map_err(|_| conversion_error(format!("invalid value '{value}' in column '{column}'")))
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| conversion_error(format!("invalid timestamp '{value}' in column '{column}'")))
}

/// Parse a JSON document from the database.
fn parse_json<T: serde::de::DeserializeOwned>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    serde_json::from_str(value)
        .map_err(|e| conversion_error(format!("invalid json in column '{column}': {e}")))
}

fn record_from_row(row: &rusqlite::Row<'_>) -> std::result::Result<Record, rusqlite::Error> {
    let payload: String = row.get(2)?;
    let modified: String = row.get(3)?;
    let status: String = row.get(4)?;
    Ok(Record {
        id: row.get(0)?,
        scope: row.get(1)?,
        payload: parse_json(&payload, "payload")?,
        last_modified: parse_timestamp(&modified, "last_modified")?,
        sync_status: parse_db(&status, "sync_status")?,
        conflict_resolution_needed: row.get(5)?,
        deleted: row.get(6)?,
        revision: row.get(7)?,
        rejected_reason: row.get(8)?,
    })
}

fn fetch_record(conn: &Connection, id: &str) -> Result<Option<Record>> {
    let sql = format!("SELECT {RECORD_COLUMNS} FROM records WHERE id = ?1");
    let record = conn.query_row(&sql, params![id], record_from_row).optional()?;
    Ok(record)
}

fn fetch_conflict_remote(conn: &Connection, id: &str) -> Result<Option<RemoteRecord>> {
    let raw: Option<Option<String>> = conn
        .query_row("SELECT conflict_remote FROM records WHERE id = ?1", params![id], |row| {
            row.get(0)
        })
        .optional()?;
    match raw.flatten() {
        Some(json) => Ok(Some(serde_json::from_str(&json)?)),
        None => Ok(None),
    }
}

fn insert_event(
    conn: &Connection,
    record_id: &str,
    action: EventAction,
    detail: Option<&str>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO sync_events (record_id, action, detail, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![record_id, action.as_str(), detail, format_timestamp(&Utc::now())],
    )?;
    Ok(())
}

/// Insert or overwrite a row with a remote version, leaving it `synced`.
fn upsert_remote(conn: &Connection, remote: &RemoteRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO records (id, scope, payload, last_modified, sync_status,
             conflict_resolution_needed, deleted, revision, rejected_reason, conflict_remote)
         VALUES (?1, ?2, ?3, ?4, 'synced', 0, ?5, 1, NULL, NULL)
         ON CONFLICT(id) DO UPDATE SET
             scope = excluded.scope,
             payload = excluded.payload,
             last_modified = excluded.last_modified,
             sync_status = 'synced',
             conflict_resolution_needed = 0,
             deleted = excluded.deleted,
             revision = records.revision + 1,
             rejected_reason = NULL,
             conflict_remote = NULL",
        params![
            remote.id,
            remote.scope,
            serde_json::to_string(&remote.payload)?,
            format_timestamp(&remote.last_modified),
            remote.deleted,
        ],
    )?;
    Ok(())
}

/// Run schema creation and all migrations on a database connection.
///
/// Migrations are idempotent so older database files upgrade in place.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    migrate_add_columns(conn)?;
    Ok(())
}

/// Migration: add columns introduced after the first schema revision.
fn migrate_add_columns(conn: &Connection) -> Result<()> {
    let columns = [("rejected_reason", "TEXT"), ("conflict_remote", "TEXT")];

    for (column, kind) in columns {
        let has_column: bool = conn
            .query_row(
                "SELECT COUNT(*) > 0 FROM pragma_table_info('records') WHERE name = ?1",
                [column],
                |row| row.get(0),
            )
            .unwrap_or(false);

        if !has_column {
            let sql = format!("ALTER TABLE records ADD COLUMN {column} {kind}");
            conn.execute(&sql, [])?;
        }
    }

    Ok(())
}

/// A record parked in `conflict` together with the competing remote version.
#[derive(Debug, Clone, PartialEq)]
pub struct ConflictEntry {
    pub local: Record,
    pub remote: Option<RemoteRecord>,
}

/// SQLite connection with record store operations.
pub struct RecordStore {
    conn: Connection,
    stamper: Stamper,
}

impl RecordStore {
    /// Open a store at the given path, creating and migrating if needed.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        Self::from_connection(conn, Stamper::default())
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?, Stamper::default())
    }

    /// Replace the clock used to stamp local mutations.
    pub fn with_clock(self, clock: impl ClockSource + 'static) -> Result<Self> {
        Self::from_connection(self.conn, Stamper::new(clock))
    }

    fn from_connection(conn: Connection, stamper: Stamper) -> Result<Self> {
        run_migrations(&conn)?;
        let latest: Option<String> =
            conn.query_row("SELECT MAX(last_modified) FROM records", [], |row| row.get(0))?;
        if let Some(latest) = latest {
            stamper.observe(parse_timestamp(&latest, "last_modified")?);
        }
        Ok(RecordStore { conn, stamper })
    }

    /// Get a record by ID.
    pub fn get(&self, id: &str) -> Result<Option<Record>> {
        fetch_record(&self.conn, id)
    }

    /// Get a record by ID, failing if it does not exist.
    pub fn get_required(&self, id: &str) -> Result<Record> {
        self.get(id)?.ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    /// List records, oldest mutation first.
    pub fn list(&self, scope: Option<&str>, status: Option<SyncStatus>) -> Result<Vec<Record>> {
        let mut sql = format!("SELECT {RECORD_COLUMNS} FROM records");
        let mut conditions = Vec::new();
        let mut params_vec: Vec<String> = Vec::new();

        if let Some(s) = scope {
            conditions.push("scope = ?");
            params_vec.push(s.to_string());
        }
        if let Some(s) = status {
            conditions.push("sync_status = ?");
            params_vec.push(s.as_str().to_string());
        }
        if !conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&conditions.join(" AND "));
        }
        sql.push_str(" ORDER BY last_modified, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let params_refs: Vec<&dyn rusqlite::ToSql> =
            params_vec.iter().map(|s| s as &dyn rusqlite::ToSql).collect();
        let records = stmt
            .query_map(params_refs.as_slice(), record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Records waiting for an external decision, with their stored remote versions.
    pub fn list_conflicts(&self) -> Result<Vec<ConflictEntry>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS}, conflict_remote FROM records
             WHERE sync_status = 'conflict' ORDER BY last_modified, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], |row| {
                let remote: Option<String> = row.get(9)?;
                Ok(ConflictEntry {
                    local: record_from_row(row)?,
                    remote: remote.map(|r| parse_json(&r, "conflict_remote")).transpose()?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// The remote version stored alongside a parked conflict.
    pub fn conflict_remote(&self, id: &str) -> Result<Option<RemoteRecord>> {
        fetch_conflict_remote(&self.conn, id)
    }

    /// Create or update a record from a local mutation.
    ///
    /// The write always succeeds offline and leaves the record pending upload,
    /// except that a record parked in `conflict` stays parked.
    pub fn put_local(
        &mut self,
        id: &str,
        scope: &str,
        payload: serde_json::Value,
    ) -> Result<Record> {
        if id.trim().is_empty() {
            return Err(Error::InvalidInput("record id cannot be empty".to_string()));
        }
        if scope.trim().is_empty() {
            return Err(Error::InvalidInput("record scope cannot be empty".to_string()));
        }

        let now = self.stamper.stamp();
        let tx = self.conn.transaction()?;
        if fetch_record(&tx, id)?.is_some() {
            tx.execute(
                "UPDATE records SET scope = ?2, payload = ?3, deleted = 0, last_modified = ?4,
                     revision = revision + 1, rejected_reason = NULL,
                     sync_status = CASE WHEN sync_status = 'conflict'
                                        THEN 'conflict' ELSE 'pending_upload' END
                 WHERE id = ?1",
                params![id, scope, serde_json::to_string(&payload)?, format_timestamp(&now)],
            )?;
        } else {
            let record = Record::new(id.to_string(), scope.to_string(), payload, now);
            tx.execute(
                "INSERT INTO records (id, scope, payload, last_modified, sync_status,
                     conflict_resolution_needed, deleted, revision)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, 0, ?6)",
                params![
                    record.id,
                    record.scope,
                    serde_json::to_string(&record.payload)?,
                    format_timestamp(&record.last_modified),
                    record.sync_status.as_str(),
                    record.revision,
                ],
            )?;
        }
        insert_event(&tx, id, EventAction::LocalWrite, None)?;
        let record = fetch_record(&tx, id)?.ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        tx.commit()?;
        debug!(id, revision = record.revision, "local write");
        Ok(record)
    }

    /// Tombstone a record. The row stays so the deletion can be pushed.
    pub fn delete_local(&mut self, id: &str) -> Result<Record> {
        let now = self.stamper.stamp();
        let tx = self.conn.transaction()?;
        let affected = tx.execute(
            "UPDATE records SET deleted = 1, last_modified = ?2, revision = revision + 1,
                 rejected_reason = NULL,
                 sync_status = CASE WHEN sync_status = 'conflict'
                                    THEN 'conflict' ELSE 'pending_upload' END
             WHERE id = ?1",
            params![id, format_timestamp(&now)],
        )?;
        if affected == 0 {
            return Err(Error::RecordNotFound(id.to_string()));
        }
        insert_event(&tx, id, EventAction::LocalDelete, None)?;
        let record = fetch_record(&tx, id)?.ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        tx.commit()?;
        debug!(id, "local delete");
        Ok(record)
    }

    /// All records waiting for upload or download, oldest mutation first.
    ///
    /// Records flagged as permanently rejected are left out until the next
    /// local mutation clears the flag.
    pub fn fetch_pending(&self) -> Result<Vec<Record>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM records
             WHERE sync_status IN ('pending_upload', 'pending_download')
               AND rejected_reason IS NULL
             ORDER BY last_modified, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let records = stmt
            .query_map([], record_from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(records)
    }

    /// Number of records `fetch_pending` would return.
    pub fn count_pending(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM records
             WHERE sync_status IN ('pending_upload', 'pending_download')
               AND rejected_reason IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Counter that moves whenever another connection commits to this database.
    pub fn data_version(&self) -> Result<i64> {
        Ok(self.conn.query_row("PRAGMA data_version", [], |row| row.get(0))?)
    }

    /// Current status of a record.
    pub fn status_of(&self, id: &str) -> Result<SyncStatus> {
        let status: Option<String> = self
            .conn
            .query_row("SELECT sync_status FROM records WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        match status {
            Some(s) => s.parse(),
            None => Err(Error::RecordNotFound(id.to_string())),
        }
    }

    /// Mark a record as matching the remote state. Does not stamp `last_modified`.
    pub fn mark_synced(&mut self, id: &str) -> Result<()> {
        if self.status_of(id)? == SyncStatus::Conflict {
            return Err(Error::InConflict(id.to_string()));
        }
        self.conn.execute(
            "UPDATE records SET sync_status = 'synced', conflict_resolution_needed = 0,
                 rejected_reason = NULL
             WHERE id = ?1",
            params![id],
        )?;
        Ok(())
    }

    /// Confirm an upload of the given revision.
    ///
    /// Returns false without changing anything if the record was mutated
    /// after that revision was read, so the newer state stays pending.
    pub fn mark_synced_at(&mut self, id: &str, revision: i64) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let affected = tx.execute(
            "UPDATE records SET sync_status = 'synced', conflict_resolution_needed = 0
             WHERE id = ?1 AND revision = ?2 AND sync_status = 'pending_upload'",
            params![id, revision],
        )?;
        if affected == 0 {
            if fetch_record(&tx, id)?.is_none() {
                return Err(Error::RecordNotFound(id.to_string()));
            }
            return Ok(false);
        }
        insert_event(&tx, id, EventAction::Uploaded, Some(&format!("revision {revision}")))?;
        tx.commit()?;
        Ok(true)
    }

    /// Queue a record for upload, stamping `last_modified`.
    pub fn mark_pending_upload(&mut self, id: &str) -> Result<()> {
        if self.status_of(id)? == SyncStatus::Conflict {
            return Err(Error::InConflict(id.to_string()));
        }
        let now = self.stamper.stamp();
        self.conn.execute(
            "UPDATE records SET sync_status = 'pending_upload', conflict_resolution_needed = 0,
                 last_modified = ?2, revision = revision + 1, rejected_reason = NULL
             WHERE id = ?1",
            params![id, format_timestamp(&now)],
        )?;
        Ok(())
    }

    /// Park a record in `conflict`, stamping `last_modified`.
    pub fn mark_conflict(&mut self, id: &str) -> Result<()> {
        self.park(id, None)
    }

    /// Park a record in `conflict` and keep the competing remote version.
    pub fn park_conflict(&mut self, id: &str, remote: &RemoteRecord) -> Result<()> {
        self.park(id, Some(serde_json::to_string(remote)?))?;
        self.stamper.observe(remote.last_modified);
        Ok(())
    }

    fn park(&mut self, id: &str, remote_json: Option<String>) -> Result<()> {
        let now = self.stamper.stamp();
        let tx = self.conn.transaction()?;
        let affected = tx.execute(
            "UPDATE records SET sync_status = 'conflict', conflict_resolution_needed = 1,
                 last_modified = ?2, revision = revision + 1,
                 conflict_remote = COALESCE(?3, conflict_remote)
             WHERE id = ?1",
            params![id, format_timestamp(&now), remote_json],
        )?;
        if affected == 0 {
            return Err(Error::RecordNotFound(id.to_string()));
        }
        insert_event(&tx, id, EventAction::Conflict, None)?;
        tx.commit()?;
        Ok(())
    }

    /// Replace the stored remote version of a parked conflict.
    pub fn refresh_conflict(&mut self, id: &str, remote: &RemoteRecord) -> Result<()> {
        let affected = self.conn.execute(
            "UPDATE records SET conflict_remote = ?2
             WHERE id = ?1 AND sync_status = 'conflict'",
            params![id, serde_json::to_string(remote)?],
        )?;
        if affected == 0 {
            self.status_of(id)?;
            return Err(Error::NotInConflict(id.to_string()));
        }
        self.stamper.observe(remote.last_modified);
        Ok(())
    }

    /// Flag a `synced` record as having a newer remote version.
    ///
    /// Returns false when the record is in any other state; local pending
    /// changes and parked conflicts take precedence.
    pub fn mark_pending_download(&mut self, id: &str) -> Result<bool> {
        let affected = self.conn.execute(
            "UPDATE records SET sync_status = 'pending_download'
             WHERE id = ?1 AND sync_status = 'synced'",
            params![id],
        )?;
        if affected == 0 {
            self.status_of(id)?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Flag every `synced` record of a scope as having a newer remote version.
    ///
    /// Returns how many records were flagged.
    pub fn mark_scope_pending_download(&mut self, scope: &str) -> Result<usize> {
        let affected = self.conn.execute(
            "UPDATE records SET sync_status = 'pending_download'
             WHERE scope = ?1 AND sync_status = 'synced'",
            params![scope],
        )?;
        Ok(affected)
    }

    /// Record a permanent rejection of the given revision.
    pub fn flag_rejected(&mut self, id: &str, revision: i64, reason: &str) -> Result<bool> {
        let tx = self.conn.transaction()?;
        let affected = tx.execute(
            "UPDATE records SET rejected_reason = ?3
             WHERE id = ?1 AND revision = ?2 AND sync_status = 'pending_upload'",
            params![id, revision, reason],
        )?;
        if affected == 0 {
            if fetch_record(&tx, id)?.is_none() {
                return Err(Error::RecordNotFound(id.to_string()));
            }
            return Ok(false);
        }
        insert_event(&tx, id, EventAction::Rejected, Some(reason))?;
        tx.commit()?;
        Ok(true)
    }

    /// Upsert a remote-origin version and mark it `synced`.
    ///
    /// Refuses to touch a parked conflict; those leave `conflict` only
    /// through [`RecordStore::resolve_conflict`].
    pub fn apply_remote(&mut self, remote: &RemoteRecord) -> Result<()> {
        let tx = self.conn.transaction()?;
        if let Some(existing) = fetch_record(&tx, &remote.id)? {
            if existing.sync_status == SyncStatus::Conflict {
                return Err(Error::InConflict(remote.id.clone()));
            }
        }
        upsert_remote(&tx, remote)?;
        insert_event(&tx, &remote.id, EventAction::AppliedRemote, None)?;
        tx.commit()?;
        self.stamper.observe(remote.last_modified);
        debug!(id = %remote.id, deleted = remote.deleted, "applied remote version");
        Ok(())
    }

    /// Store a merged version of a pending record and queue it for upload.
    pub fn apply_merged(&mut self, merged: &RemoteRecord) -> Result<Record> {
        self.stamper.observe(merged.last_modified);
        let now = self.stamper.stamp();
        let tx = self.conn.transaction()?;
        if let Some(existing) = fetch_record(&tx, &merged.id)? {
            if existing.sync_status == SyncStatus::Conflict {
                return Err(Error::InConflict(merged.id.clone()));
            }
        }
        let affected = tx.execute(
            "UPDATE records SET payload = ?2, deleted = ?3, last_modified = ?4,
                 sync_status = 'pending_upload', conflict_resolution_needed = 0,
                 revision = revision + 1, rejected_reason = NULL
             WHERE id = ?1",
            params![
                merged.id,
                serde_json::to_string(&merged.payload)?,
                merged.deleted,
                format_timestamp(&now)
            ],
        )?;
        if affected == 0 {
            return Err(Error::RecordNotFound(merged.id.clone()));
        }
        insert_event(&tx, &merged.id, EventAction::Resolved, Some("merged"))?;
        let record = fetch_record(&tx, &merged.id)?
            .ok_or_else(|| Error::RecordNotFound(merged.id.clone()))?;
        tx.commit()?;
        Ok(record)
    }

    /// Apply an external decision to a parked conflict.
    ///
    /// `merged` carries the combined payload and is required for
    /// [`ResolutionSide::Merged`]. The winning side is written to the audit
    /// trail in the same transaction that leaves `conflict`.
    pub fn resolve_conflict(
        &mut self,
        id: &str,
        side: ResolutionSide,
        merged: Option<serde_json::Value>,
    ) -> Result<Record> {
        let tx = self.conn.transaction()?;
        let record = fetch_record(&tx, id)?.ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        if record.sync_status != SyncStatus::Conflict {
            return Err(Error::NotInConflict(id.to_string()));
        }

        let mut observed = None;
        match side {
            ResolutionSide::Local => {
                let now = self.stamper.stamp();
                tx.execute(
                    "UPDATE records SET sync_status = 'pending_upload',
                         conflict_resolution_needed = 0, conflict_remote = NULL,
                         rejected_reason = NULL, last_modified = ?2, revision = revision + 1
                     WHERE id = ?1",
                    params![id, format_timestamp(&now)],
                )?;
            }
            ResolutionSide::Remote => {
                let remote = fetch_conflict_remote(&tx, id)?.ok_or_else(|| {
                    Error::InvalidInput(format!(
                        "no remote version stored for {id}\n  hint: keep the local version or wait for the next sync"
                    ))
                })?;
                upsert_remote(&tx, &remote)?;
                observed = Some(remote.last_modified);
            }
            ResolutionSide::Merged => {
                let payload = merged.ok_or_else(|| {
                    Error::InvalidInput("a merged resolution needs a payload".to_string())
                })?;
                let now = self.stamper.stamp();
                tx.execute(
                    "UPDATE records SET payload = ?2, sync_status = 'pending_upload',
                         conflict_resolution_needed = 0, conflict_remote = NULL,
                         rejected_reason = NULL, last_modified = ?3, revision = revision + 1
                     WHERE id = ?1",
                    params![id, serde_json::to_string(&payload)?, format_timestamp(&now)],
                )?;
            }
        }

        insert_event(&tx, id, EventAction::Resolved, Some(side.as_str()))?;
        let resolved =
            fetch_record(&tx, id)?.ok_or_else(|| Error::RecordNotFound(id.to_string()))?;
        tx.commit()?;
        if let Some(ts) = observed {
            self.stamper.observe(ts);
        }
        debug!(id, side = %side, "conflict resolved");
        Ok(resolved)
    }

    /// Append an entry to a record's audit trail.
    pub fn record_event(&self, id: &str, action: EventAction, detail: Option<&str>) -> Result<()> {
        insert_event(&self.conn, id, action, detail)
    }

    /// Audit trail of a record, oldest first.
    pub fn events(&self, id: &str) -> Result<Vec<SyncEvent>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, record_id, action, detail, created_at
             FROM sync_events WHERE record_id = ?1 ORDER BY id",
        )?;
        let events = stmt
            .query_map(params![id], |row| {
                let action: String = row.get(2)?;
                let created: String = row.get(4)?;
                Ok(SyncEvent {
                    id: row.get(0)?,
                    record_id: row.get(1)?,
                    action: parse_db(&action, "action")?,
                    detail: row.get(3)?,
                    created_at: parse_timestamp(&created, "created_at")?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(events)
    }

    /// The persisted pull checkpoint, if any pull has completed.
    pub fn get_cursor(&self) -> Result<Option<Cursor>> {
        let value: Option<String> = self
            .conn
            .query_row("SELECT value FROM sync_meta WHERE key = ?1", params![CURSOR_KEY], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value.map(Cursor::new))
    }

    /// Persist the pull checkpoint.
    pub fn set_cursor(&self, cursor: &Cursor) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sync_meta (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![CURSOR_KEY, cursor.as_str()],
        )?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
