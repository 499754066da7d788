// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Parse a JSON document given on the command line.
fn json_value(s: &str) -> Result<serde_json::Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    #[value(alias = "ids")]
    Id,
}

/// Side picked by `tsync resolve`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeepSide {
    Local,
    Remote,
    Merged,
}

impl From<KeepSide> for ts_core::ResolutionSide {
    fn from(side: KeepSide) -> Self {
        match side {
            KeepSide::Local => ts_core::ResolutionSide::Local,
            KeepSide::Remote => ts_core::ResolutionSide::Remote,
            KeepSide::Merged => ts_core::ResolutionSide::Merged,
        }
    }
}

#[derive(Parser)]
#[command(name = "tsync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Offline-first record store that syncs with a remote when the network allows")]
#[command(
    long_about = "Offline-first record store that syncs with a remote when the network allows.\n\n\
    Writes always land locally first. `tsync sync` runs one pass; `tsync watch` keeps\n\
    syncing on a timer, on local changes, and whenever the network comes back."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a .tidesync directory
    #[command(after_help = "\
Examples:
  tsync init                              Local-only store, add a remote later
  tsync init --remote ws://host:7070      Store that syncs with a remote")]
    Init {
        /// Directory to initialize (defaults to the current directory)
        #[arg(long)]
        path: Option<String>,

        /// WebSocket URL of the remote store
        #[arg(long, value_parser = non_empty_string)]
        remote: Option<String>,
    },

    /// Create or update a record
    #[command(after_help = "\
Examples:
  tsync put '{\"title\":\"milk\"}'                   New record in scope 'default'
  tsync put -s notes '{\"title\":\"milk\"}'          New record in scope 'notes'
  tsync put --id notes-1a2b '{\"done\":true}'      Replace an existing record
  tsync put -s notes '{}' -o id                  Print only the new ID")]
    Put {
        /// Record payload as a JSON document
        #[arg(value_parser = json_value)]
        payload: serde_json::Value,

        /// Record ID (generated from scope and payload when omitted)
        #[arg(long, value_parser = non_empty_string)]
        id: Option<String>,

        /// Scope of a new record (default 'default'); updates keep their scope
        #[arg(long, short, value_parser = non_empty_string)]
        scope: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Delete a record (kept as a tombstone until synced)
    Rm {
        #[arg(value_parser = non_empty_string)]
        id: String,
    },

    /// Show a record, its audit trail, and any competing remote version
    Show {
        #[arg(value_parser = non_empty_string)]
        id: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List records
    #[command(after_help = "\
Examples:
  tsync list                              All live records
  tsync list -s notes                     Records in scope 'notes'
  tsync list --status pending_upload      Records waiting to be pushed
  tsync list --all -o json                Include tombstones, as JSON")]
    List {
        /// Only records in this scope
        #[arg(long, short)]
        scope: Option<String>,

        /// Only records with this sync status
        #[arg(long)]
        status: Option<String>,

        /// Include deleted records
        #[arg(long)]
        all: bool,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Show records waiting to be pushed or fetched
    Pending {
        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// List records parked in conflict
    Conflicts {
        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Pick a side for a record in conflict
    #[command(after_help = "\
Examples:
  tsync resolve notes-1a2b --keep local                     Push the local version again
  tsync resolve notes-1a2b --keep remote                    Take the remote version
  tsync resolve notes-1a2b --keep merged --merged '{...}'   Store a combined version")]
    Resolve {
        #[arg(value_parser = non_empty_string)]
        id: String,

        /// Which version wins
        #[arg(long, value_enum)]
        keep: KeepSide,

        /// Combined payload, required with --keep merged
        #[arg(long, value_parser = json_value, required_if_eq("keep", "merged"))]
        merged: Option<serde_json::Value>,
    },

    /// Run one sync pass against the remote
    Sync {
        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Keep syncing in the foreground until interrupted
    #[command(after_help = "\
Triggers:
  timer           every sync.auto_sync_interval_seconds while records are pending
  local change    after sync.debounce_millis of quiet following a write
  network         when the remote becomes reachable again

Set RUST_LOG=debug for per-trigger decisions.")]
    Watch,

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Set a configuration value
    #[command(after_help = "\
Examples:
  tsync config set remote.url ws://host:7070
  tsync config set remote.scopes notes,tasks
  tsync config set sync.auto_sync_interval_seconds 60
  tsync config set sync.allow_metered_sync true
  tsync config set network.interface cellular")]
    Set {
        #[arg(value_parser = non_empty_string)]
        key: String,
        value: String,
    },

    /// Print the path of the config file
    Path,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
