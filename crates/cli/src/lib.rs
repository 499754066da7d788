// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! tsync - An offline-first record store with background sync.
//!
//! This crate provides the functionality behind the `tsync` CLI tool:
//! local records live in a SQLite store and are reconciled with a remote
//! store whenever the network allows.
//!
//! # Main Components
//!
//! - [`sync`] - The sync engine: network monitor, coordinator, scheduler, adapters
//! - [`Config`] - Project configuration (`[sync]`, `[remote]`, `[network]`)
//! - [`Error`] - Error types for all operations
//!
//! # Initialization
//!
//! Use [`init_work_dir`] to create a new `.tidesync/` directory, then open the store:
//!
//! ```rust,ignore
//! use tsync::{init_work_dir, find_work_dir, get_db_path, Config};
//! use ts_core::RecordStore;
//!
//! // Initialize a new project
//! let work_dir = init_work_dir(Path::new("."), Some("ws://localhost:7070"))?;
//!
//! // Later, find and open an existing project
//! let work_dir = find_work_dir()?;
//! let config = Config::load(&work_dir)?;
//! let store = RecordStore::open(&get_db_path(&work_dir))?;
//! ```

mod cli;
mod commands;
mod display;

pub mod config;
pub mod env;
pub mod error;
pub mod id;
pub mod sync;

pub use cli::{Cli, Command, ConfigCommand, KeepSide, OutputFormat};
pub use config::{find_work_dir, get_db_path, init_work_dir, Config};
pub use error::{Error, Result};

/// Execute a CLI command. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
pub fn run(command: Command) -> Result<()> {
    match command {
        Command::Init { path, remote } => commands::init::run(path, remote),
        Command::Put {
            payload,
            id,
            scope,
            output,
        } => commands::put::run(payload, id, scope, output),
        Command::Rm { id } => commands::rm::run(&id),
        Command::Show { id, output } => commands::show::run(&id, output),
        Command::List {
            scope,
            status,
            all,
            output,
        } => commands::list::run(scope, status, all, output),
        Command::Pending { output } => commands::pending::run(output),
        Command::Conflicts { output } => commands::conflicts::run(output),
        Command::Resolve { id, keep, merged } => commands::resolve::run(&id, keep, merged),
        Command::Sync { output } => commands::sync::run(output),
        Command::Watch => commands::watch::run(),
        Command::Config { command } => commands::config::run(command),
    }
}

/// Install the global tracing subscriber.
///
/// Honors `RUST_LOG`; defaults to `info` for the tsync crates and `warn`
/// for everything else. Logs go to stderr so command output stays clean.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;

    let filter = crate::env::log_filter()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_FILTER: &str = "warn,tsync=info,ts_core=info";

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
