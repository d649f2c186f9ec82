// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! CRUD implementation for the on-disk instance catalog.

use std::collections::HashMap;
use std::path::Path;

use log::{debug, info, warn};
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Runtime, command};

use config::instance::InstanceConfig;
use folder::{DATA_LOCATION, DataLocation};
use platform::{OsFamily, PLATFORM_INFO};

pub mod error;
pub mod sort;

pub use error::*;
use sort::natural_cmp;

pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("instance")
        .invoke_handler(tauri::generate_handler![
            load_instances,
            open_folder,
            get_screenshots
        ])
        .build()
}

#[command]
async fn load_instances() -> Result<Vec<InstanceConfig>> {
    list_instances(&DATA_LOCATION).await
}

#[command]
async fn open_folder(instance_name: String) -> Result<()> {
    open_instance_folder(&instance_name, &DATA_LOCATION)
}

#[command]
async fn get_screenshots() -> Result<HashMap<String, Vec<String>>> {
    list_screenshots(&DATA_LOCATION).await
}

fn validate_name(instance_name: &str) -> Result<()> {
    let usable = !instance_name.is_empty()
        && !instance_name.starts_with('.')
        && !instance_name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|'));
    if usable {
        Ok(())
    } else {
        Err(Error::InvalidName(instance_name.to_string()))
    }
}

/// Creates a new instance directory tree with its `instance.json`.
///
/// The instance name doubles as the directory name and is unique,
/// case-sensitive.
pub async fn create_instance(config: &InstanceConfig, data_location: &DataLocation) -> Result<()> {
    validate_name(&config.instance_name)?;
    let instance_root = data_location.get_instance_root(&config.instance_name);
    if instance_root.exists() {
        return Err(Error::AlreadyExists(config.instance_name.clone()));
    }
    tokio::fs::create_dir_all(&instance_root).await?;
    for child in ["minecraft", "natives", "screenshots", "logs"] {
        tokio::fs::create_dir_all(instance_root.join(child)).await?;
    }
    tokio::fs::write(
        data_location.get_instance_json(&config.instance_name),
        serde_json::to_string_pretty(config)?,
    )
    .await?;
    info!("Created instance: {}", config.instance_name);
    Ok(())
}

/// Load one instance configuration by name.
pub fn get_instance(instance_name: &str, data_location: &DataLocation) -> Result<InstanceConfig> {
    validate_name(instance_name)?;
    let json_path = data_location.get_instance_json(instance_name);
    if !json_path.is_file() {
        return Err(Error::NotFound(instance_name.to_string()));
    }
    let config: InstanceConfig = serde_json::from_str(&std::fs::read_to_string(json_path)?)?;
    Ok(config)
}

/// Scan the instances directory and return every parseable configuration,
/// sorted by name with natural (numeric-aware) collation. Broken entries are
/// skipped, not fatal.
pub async fn list_instances(data_location: &DataLocation) -> Result<Vec<InstanceConfig>> {
    let instances_folder = &data_location.instances;
    tokio::fs::create_dir_all(instances_folder).await?;
    let mut folder_entries = tokio::fs::read_dir(instances_folder).await?;
    let mut instances = Vec::new();

    while let Some(entry) = folder_entries.next_entry().await? {
        let file_type = match entry.file_type().await {
            Err(_) => continue,
            Ok(file_type) => file_type,
        };
        if !file_type.is_dir() {
            continue;
        }
        let folder_name = entry.file_name().to_string_lossy().to_string();
        debug!("Checking {folder_name}");
        let config_path = entry.path().join("instance.json");
        let config_content = match tokio::fs::read_to_string(&config_path).await {
            Err(_) => continue,
            Ok(content) => content,
        };
        let config = match serde_json::from_str::<InstanceConfig>(&config_content) {
            Ok(config) => config,
            Err(error) => {
                warn!("Skipping {folder_name}: broken instance.json ({error})");
                continue;
            }
        };
        if config.instance_name != folder_name {
            warn!(
                "Skipping {folder_name}: instance.json names {:?}",
                config.instance_name
            );
            continue;
        }
        instances.push(config);
    }
    instances.sort_by(|a, b| natural_cmp(&a.instance_name, &b.instance_name));
    Ok(instances)
}

/// Screenshot paths per instance, newest first (filenames are timestamp
/// prefixed, so reverse lexicographic order is reverse chronological).
pub async fn list_screenshots(
    data_location: &DataLocation,
) -> Result<HashMap<String, Vec<String>>> {
    let mut result = HashMap::new();
    for instance in list_instances(data_location).await? {
        let screenshots_dir = data_location.get_screenshots_root(&instance.instance_name);
        let mut screenshots = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&screenshots_dir).await else {
            result.insert(instance.instance_name, screenshots);
            continue;
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|extension| extension.to_str()) == Some("png") {
                screenshots.push(path.to_string_lossy().to_string());
            }
        }
        screenshots.sort_by(|a, b| b.cmp(a));
        result.insert(instance.instance_name, screenshots);
    }
    Ok(result)
}

/// Open the OS file explorer at the instance directory.
pub fn open_instance_folder(instance_name: &str, data_location: &DataLocation) -> Result<()> {
    validate_name(instance_name)?;
    let instance_root = data_location.get_instance_root(instance_name);
    if !instance_root.is_dir() {
        return Err(Error::NotFound(instance_name.to_string()));
    }
    open_in_explorer(&instance_root)
}

fn open_in_explorer(path: &Path) -> Result<()> {
    let opener = match PLATFORM_INFO.os_family {
        OsFamily::Windows => "explorer",
        OsFamily::Macos => "open",
        OsFamily::Linux => "xdg-open",
    };
    std::process::Command::new(opener).arg(path).spawn()?;
    Ok(())
}
