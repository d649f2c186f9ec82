// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::{fmt, path::PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Represents supported mod loader types.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
pub enum ModLoaderType {
    /// Plain vanilla, no loader overlay
    #[default]
    None,
    /// Fabric mod loader
    Fabric,
    /// Forge mod loader
    Forge,
}

impl fmt::Display for ModLoaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Fabric => write!(f, "Fabric"),
            Self::Forge => write!(f, "Forge"),
        }
    }
}

/// Game window geometry for an instance.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
    pub maximized: bool,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 854,
            height: 480,
            maximized: false,
        }
    }
}

/// Main configuration structure for a Minecraft instance.
///
/// Persisted as `instances/<name>/instance.json`; `instance_name` must match
/// the directory name.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct InstanceConfig {
    /// Instance name (displayed to user, unique, case-sensitive)
    pub instance_name: String,

    /// Minecraft version (e.g., "1.20.1")
    pub vanilla_version: String,

    /// Mod loader overlaid on the vanilla profile
    #[serde(default)]
    pub modloader_type: ModLoaderType,

    /// Loader version; empty when `modloader_type` is `None`
    #[serde(default)]
    pub modloader_version: String,

    /// JVM binary for this instance, overriding the launcher-wide default
    #[serde(default)]
    pub jvm_path_override: Option<PathBuf>,

    /// Additional JVM arguments, whitespace separated
    #[serde(default)]
    pub additional_jvm_arguments: String,

    /// Game window geometry
    #[serde(default)]
    pub resolution: Resolution,

    /// Whether playtime is tracked for this instance
    #[serde(default)]
    pub record_playtime: bool,

    /// Whether `options.txt` is seeded from the shared template on launch
    #[serde(default)]
    pub override_options_txt: bool,

    /// Whether `servers.dat` is seeded from the shared template on launch
    #[serde(default)]
    pub override_servers_dat: bool,

    #[serde(default)]
    pub author: String,

    pub created_at: DateTime<Utc>,
}

impl InstanceConfig {
    /// Creates a new vanilla instance configuration with default settings.
    pub fn new(instance_name: &str, vanilla_version: &str) -> Self {
        Self {
            instance_name: instance_name.to_string(),
            vanilla_version: vanilla_version.to_string(),
            modloader_type: ModLoaderType::None,
            modloader_version: String::new(),
            jvm_path_override: None,
            additional_jvm_arguments: String::new(),
            resolution: Resolution::default(),
            record_playtime: true,
            override_options_txt: false,
            override_servers_dat: false,
            author: String::new(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip_is_identity() {
        let mut config = InstanceConfig::new("Minecraft 2", "1.20.1");
        config.modloader_type = ModLoaderType::Fabric;
        config.modloader_version = "0.14.21".to_string();
        config.additional_jvm_arguments = "-Xmx4G".to_string();
        config.resolution = Resolution {
            width: 1920,
            height: 1080,
            maximized: true,
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        let parsed: InstanceConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn missing_optional_fields_default() {
        let json = r#"{
            "instance_name": "T",
            "vanilla_version": "1.20.1",
            "created_at": "2024-03-01T12:00:00Z"
        }"#;
        let parsed: InstanceConfig = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.modloader_type, ModLoaderType::None);
        assert_eq!(parsed.modloader_version, "");
        assert_eq!(parsed.resolution, Resolution::default());
    }
}
