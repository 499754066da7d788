// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Project configuration stored in `.tidesync/config.toml`.
//!
//! ```toml
//! [sync]
//! auto_sync_enabled = true
//! auto_sync_interval_seconds = 300
//!
//! [remote]
//! url = "ws://localhost:7070"
//! scopes = ["notes"]
//!
//! [network]
//! interface = "wifi"
//! metered = false
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sync::{probe_addr_from_url, validate_probe_addr, InterfaceKind, SyncSettings};

const WORK_DIR_NAME: &str = ".tidesync";
const CONFIG_FILE_NAME: &str = "config.toml";
const DB_FILE_NAME: &str = "records.db";

/// Keys accepted by `tsync config set`.
pub const SETTABLE_KEYS: &[&str] = &[
    "sync.auto_sync_enabled",
    "sync.auto_sync_interval_seconds",
    "sync.allow_metered_sync",
    "sync.debounce_millis",
    "sync.request_timeout_seconds",
    "remote.url",
    "remote.probe_addr",
    "remote.scopes",
    "network.interface",
    "network.metered",
    "network.poll_seconds",
    "network.probe_seconds",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
    #[serde(default)]
    pub network: NetworkConfig,
}

/// Where and what to sync.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// WebSocket endpoint of the remote store, e.g. `ws://host:7070`.
    pub url: String,
    /// Reachability probe target; derived from `url` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub probe_addr: Option<String>,
    /// Scopes to subscribe to for change notifications.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl RemoteConfig {
    pub fn new(url: impl Into<String>) -> Self {
        RemoteConfig {
            url: url.into(),
            probe_addr: None,
            scopes: Vec::new(),
        }
    }

    /// Returns a reason if the URL is not a WebSocket URL.
    pub fn validate_url(&self) -> Option<String> {
        validate_remote_url(&self.url).err()
    }

    /// The `host:port` the network monitor probes.
    pub fn probe_addr(&self) -> Option<String> {
        self.probe_addr
            .clone()
            .or_else(|| probe_addr_from_url(&self.url))
    }
}

/// Stand-in for the platform path observer.
///
/// On hosts without one, the link is assumed to be of this kind and the
/// probe target is polled to detect when it comes and goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    pub interface: InterfaceKind,
    /// Treat the link as expensive (metered).
    pub metered: bool,
    /// Seconds between reachability polls.
    pub poll_seconds: u64,
    /// Seconds between quality probes.
    pub probe_seconds: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            interface: InterfaceKind::Wifi,
            metered: false,
            poll_seconds: 5,
            probe_seconds: 30,
        }
    }
}

impl NetworkConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_seconds.max(1))
    }

    pub fn probe_interval(&self) -> Duration {
        Duration::from_secs(self.probe_seconds.max(1))
    }
}

impl Config {
    /// Creates a config pointing at the given remote.
    pub fn with_remote(url: &str) -> Result<Self> {
        validate_remote_url(url).map_err(|reason| Error::InvalidConfigValue {
            key: "remote.url".to_string(),
            reason,
        })?;
        Ok(Config {
            remote: Some(RemoteConfig::new(url)),
            ..Config::default()
        })
    }

    /// Loads configuration from the given `.tidesync/` directory.
    pub fn load(work_dir: &Path) -> Result<Self> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = fs::read_to_string(&config_path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.sync.validate().map_err(Error::Config)?;
        Ok(config)
    }

    /// Saves configuration to the given `.tidesync/` directory.
    pub fn save(&self, work_dir: &Path) -> Result<()> {
        let config_path = work_dir.join(CONFIG_FILE_NAME);
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(&config_path, content)?;
        Ok(())
    }

    /// Remote URL, with `TIDESYNC_REMOTE` taking precedence over the file.
    pub fn remote_url(&self) -> Option<String> {
        crate::env::remote_url().or_else(|| self.remote.as_ref().map(|r| r.url.clone()))
    }

    /// Scopes to subscribe to in `watch` mode.
    pub fn scopes(&self) -> &[String] {
        self.remote.as_ref().map(|r| r.scopes.as_slice()).unwrap_or(&[])
    }

    /// Probe target for the network monitor.
    pub fn probe_addr(&self) -> Option<String> {
        let configured = self.remote.as_ref().and_then(|r| r.probe_addr.clone());
        configured.or_else(|| self.remote_url().and_then(|url| probe_addr_from_url(&url)))
    }

    /// Update a single dotted key from its string form.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let invalid = |reason: String| Error::InvalidConfigValue {
            key: key.to_string(),
            reason,
        };
        match key {
            "sync.auto_sync_enabled" => {
                self.sync.auto_sync_enabled = parse_bool(value).map_err(invalid)?;
            }
            "sync.auto_sync_interval_seconds" => {
                self.sync.auto_sync_interval_seconds = parse_u64(value).map_err(invalid)?;
            }
            "sync.allow_metered_sync" => {
                self.sync.allow_metered_sync = parse_bool(value).map_err(invalid)?;
            }
            "sync.debounce_millis" => {
                self.sync.debounce_millis = parse_u64(value).map_err(invalid)?;
            }
            "sync.request_timeout_seconds" => {
                self.sync.request_timeout_seconds = parse_u64(value).map_err(invalid)?;
            }
            "remote.url" => {
                validate_remote_url(value).map_err(invalid)?;
                match self.remote.as_mut() {
                    Some(remote) => remote.url = value.to_string(),
                    None => self.remote = Some(RemoteConfig::new(value)),
                }
            }
            "remote.probe_addr" => {
                validate_probe_addr(value).map_err(invalid)?;
                self.remote_mut(key)?.probe_addr = Some(value.to_string());
            }
            "remote.scopes" => {
                let scopes = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from)
                    .collect();
                self.remote_mut(key)?.scopes = scopes;
            }
            "network.interface" => self.network.interface = value.parse().map_err(invalid)?,
            "network.metered" => self.network.metered = parse_bool(value).map_err(invalid)?,
            "network.poll_seconds" => {
                self.network.poll_seconds = parse_u64(value).map_err(invalid)?;
            }
            "network.probe_seconds" => {
                self.network.probe_seconds = parse_u64(value).map_err(invalid)?;
            }
            _ => return Err(Error::UnknownConfigKey(key.to_string())),
        }
        if key.starts_with("sync.") {
            self.sync.validate().map_err(invalid)?;
        }
        Ok(())
    }

    fn remote_mut(&mut self, key: &str) -> Result<&mut RemoteConfig> {
        self.remote.as_mut().ok_or_else(|| Error::InvalidConfigValue {
            key: key.to_string(),
            reason: "set remote.url first".to_string(),
        })
    }
}

fn parse_bool(value: &str) -> std::result::Result<bool, String> {
    match value.to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        _ => Err(format!("'{value}' is not a boolean")),
    }
}

fn parse_u64(value: &str) -> std::result::Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("'{value}' is not a non-negative integer"))
}

fn validate_remote_url(url: &str) -> std::result::Result<(), String> {
    if !(url.starts_with("ws://") || url.starts_with("wss://")) {
        return Err(format!("'{url}' must start with ws:// or wss://"));
    }
    if probe_addr_from_url(url).is_none() {
        return Err(format!("'{url}' has no host"));
    }
    Ok(())
}

/// Find the .tidesync directory from `TIDESYNC_DIR` or the current directory.
pub fn find_work_dir() -> Result<PathBuf> {
    if let Some(dir) = crate::env::work_dir() {
        if dir.is_dir() {
            return Ok(dir);
        }
        return Err(Error::NotInitialized);
    }
    find_work_dir_from(&std::env::current_dir()?)
}

/// Find the .tidesync directory by walking up from `start`.
pub fn find_work_dir_from(start: &Path) -> Result<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let work_dir = current.join(WORK_DIR_NAME);
        if work_dir.is_dir() {
            return Ok(work_dir);
        }
        if !current.pop() {
            return Err(Error::NotInitialized);
        }
    }
}

/// Get the record store path inside a work dir.
pub fn get_db_path(work_dir: &Path) -> PathBuf {
    work_dir.join(DB_FILE_NAME)
}

/// Path of the config file inside a work dir.
pub fn get_config_path(work_dir: &Path) -> PathBuf {
    work_dir.join(CONFIG_FILE_NAME)
}

/// Initialize a new .tidesync directory at the given path.
pub fn init_work_dir(path: &Path, remote: Option<&str>) -> Result<PathBuf> {
    let work_dir = path.join(WORK_DIR_NAME);

    if work_dir.exists() {
        return Err(Error::AlreadyInitialized(work_dir.display().to_string()));
    }

    let config = match remote {
        Some(url) => Config::with_remote(url)?,
        None => Config::default(),
    };

    fs::create_dir_all(&work_dir)?;
    config.save(&work_dir)?;

    Ok(work_dir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
