// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::Path;

use crate::cli::ConfigCommand;
use crate::config::{find_work_dir, get_config_path, Config};
use crate::error::{Error, Result};

pub fn run(command: ConfigCommand) -> Result<()> {
    let work_dir = find_work_dir()?;
    match command {
        ConfigCommand::Show => {
            let config = Config::load(&work_dir)?;
            print!("{}", render(&config)?);
            if let Some(url) = crate::env::remote_url() {
                println!("# remote.url overridden by TIDESYNC_REMOTE={}", url);
            }
        }
        ConfigCommand::Set { key, value } => {
            set_impl(&work_dir, &key, &value)?;
            println!("Set {} = {}", key, value);
        }
        ConfigCommand::Path => println!("{}", get_config_path(&work_dir).display()),
    }
    Ok(())
}

pub(crate) fn render(config: &Config) -> Result<String> {
    toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))
}

/// Load, change one key, and save. The file is untouched on error.
pub(crate) fn set_impl(work_dir: &Path, key: &str, value: &str) -> Result<Config> {
    let mut config = Config::load(work_dir)?;
    config.set(key, value)?;
    config.save(work_dir)?;
    Ok(config)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
