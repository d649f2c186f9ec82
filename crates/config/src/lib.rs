// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use folder::DATA_LOCATION;
use log::{debug, error, info};
use serde::{Deserialize, Serialize};

pub mod download;
pub mod error;
pub mod instance;
pub mod launch;

use error::*;

/// The launcher configuration, persisted as `config.toml` under the data
/// directory. Per-instance settings live in `instance.json` instead.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    /// Launch-related defaults.
    #[serde(default)]
    pub launch: launch::LaunchConfig,

    /// Download-related configuration.
    #[serde(default)]
    pub download: download::DownloadConfig,
}

/// Reads the configuration file from disk.
///
/// If the file does not exist or cannot be parsed, a default configuration is
/// generated and saved.
pub fn load_config_file() -> Result<Config> {
    let config_file_path = &DATA_LOCATION.config;
    if !config_file_path.exists() {
        info!("No config file, using default config");
        return reset_config();
    }
    let data = match std::fs::read_to_string(config_file_path) {
        Ok(x) => x,
        Err(_) => {
            error!("Could not read config file, reset it");
            return reset_config();
        }
    };
    if let Ok(config) = toml::from_str::<Config>(&data) {
        info!("Loaded config from file");
        Ok(config)
    } else {
        error!("Config file is not a toml file, reset it");
        reset_config()
    }
}

pub fn reset_config() -> Result<Config> {
    let config_file_path = &DATA_LOCATION.config;
    let default_config = Config::default();
    let data = toml::to_string_pretty(&default_config)?;
    if let Some(parent) = config_file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(config_file_path, data)?;
    Ok(default_config)
}

/// Saves the current configuration to the configuration file.
pub fn save_config(config: &Config) -> Result<()> {
    let data = toml::to_string_pretty(config)?;
    std::fs::write(&DATA_LOCATION.config, data)?;
    debug!("Saved config to file");
    Ok(())
}
