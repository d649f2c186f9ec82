// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! Version installation: manifest fetching, download planning and the
//! modloader overlays.

use std::collections::HashMap;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;
use serde::{Deserialize, Serialize};
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Runtime, command};

use config::Config;
use config::instance::{InstanceConfig, ModLoaderType};
use folder::{DATA_LOCATION, DataLocation};
use task::Progress;
use version::{ResolvedVersion, Version};

pub mod error;
pub mod fabric;
pub mod forge;
pub mod vanilla;

pub use error::*;

pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("install")
        .invoke_handler(tauri::generate_handler![
            obtain_manifests,
            obtain_version,
            import_zip
        ])
        .build()
}

#[derive(Serialize)]
pub struct VanillaVersionEntry {
    pub version: String,
    #[serde(rename = "releasedDate")]
    pub released_date: String,
    #[serde(rename = "versionType")]
    pub version_type: String,
}

#[derive(Serialize)]
pub struct Manifests {
    pub vanilla_versions: Vec<VanillaVersionEntry>,
    pub fabric_versions: Vec<String>,
    pub forge_versions: HashMap<String, Vec<String>>,
}

#[command]
async fn obtain_manifests() -> Result<Manifests> {
    let (vanilla, fabric, forge) = tokio::join!(
        vanilla::VersionManifest::get(),
        fabric::loader_versions(),
        forge::forge_versions()
    );
    Ok(Manifests {
        vanilla_versions: vanilla?
            .versions
            .into_iter()
            .map(|version| VanillaVersionEntry {
                version: version.id,
                released_date: version.release_time,
                version_type: version.r#type,
            })
            .collect(),
        fabric_versions: fabric?,
        forge_versions: forge?,
    })
}

/// The UI-facing creation payload.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSettings {
    pub instance_name: String,
    pub vanilla_version: String,
    #[serde(default)]
    pub modloader_type: ModLoaderType,
    #[serde(default)]
    pub modloader_version: String,
    #[serde(default)]
    pub author: String,
}

#[command]
async fn obtain_version(settings: InstanceSettings) -> Result<()> {
    let config = config::load_config_file().map_err(|error| Error::Config(error.to_string()))?;
    let mut instance_config =
        InstanceConfig::new(&settings.instance_name, &settings.vanilla_version);
    instance_config.modloader_type = settings.modloader_type;
    instance_config.modloader_version = settings.modloader_version;
    instance_config.author = settings.author;
    instance_config.resolution.width = config.launch.default_width;
    instance_config.resolution.height = config.launch.default_height;

    instance::create_instance(&instance_config, &DATA_LOCATION).await?;
    shared::emit("new-instance", instance_config.instance_name.clone());

    ensure_instance_ready(&config, &instance_config, &DATA_LOCATION).await?;
    shared::emit("instance-done", instance_config.instance_name.clone());
    Ok(())
}

#[command]
async fn import_zip(zip_path: String) -> Result<()> {
    let instance_name = import_instance_archive(Path::new(&zip_path), &DATA_LOCATION).await?;
    shared::emit("instance-done", instance_name);
    Ok(())
}

/// Make every file the instance's profile references present and verified.
///
/// Runs the full pipeline: descriptor fetch, modloader overlay, download
/// planning and the bounded executor. On a tree that is already complete
/// this verifies hashes and performs zero network requests.
pub async fn ensure_instance_ready(
    config: &Config,
    instance_config: &InstanceConfig,
    data_location: &DataLocation,
) -> Result<ResolvedVersion> {
    let progress = Progress::default();
    let vanilla_id = &instance_config.vanilla_version;
    let raw_vanilla = vanilla::ensure_version_json(vanilla_id, data_location).await?;

    let resolved = match instance_config.modloader_type {
        ModLoaderType::None => {
            let resolved = Version::from_str(&raw_vanilla)?.resolve(data_location, &[])?;
            download_profile(&resolved, data_location, config, &progress).await?;
            resolved
        }
        ModLoaderType::Fabric => {
            let overlay_id = fabric::install_profile(
                vanilla_id,
                &instance_config.modloader_version,
                data_location,
            )
            .await?;
            let resolved = resolve_cached(&overlay_id, data_location)?;
            download_profile(&resolved, data_location, config, &progress).await?;
            resolved
        }
        ModLoaderType::Forge => {
            // Forge processors patch the vanilla client jar, so the vanilla
            // profile must be complete before the overlay is installed.
            let resolved_vanilla = Version::from_str(&raw_vanilla)?.resolve(data_location, &[])?;
            download_profile(&resolved_vanilla, data_location, config, &progress).await?;
            let java_path = instance_config
                .jvm_path_override
                .clone()
                .unwrap_or_else(|| config.launch.java_path.clone());
            let overlay_id = forge::install(
                vanilla_id,
                &instance_config.modloader_version,
                data_location,
                &java_path,
                &config.download,
                &progress,
            )
            .await?;
            let resolved = resolve_cached(&overlay_id, data_location)?;
            download_profile(&resolved, data_location, config, &progress).await?;
            resolved
        }
    };
    info!(
        "Instance {} resolved to version {}",
        instance_config.instance_name, resolved.id
    );
    Ok(resolved)
}

fn resolve_cached(version_id: &str, data_location: &DataLocation) -> Result<ResolvedVersion> {
    let raw = std::fs::read_to_string(data_location.get_version_json(version_id))?;
    Ok(Version::from_str(&raw)?.resolve(data_location, &[])?)
}

async fn download_profile(
    resolved: &ResolvedVersion,
    data_location: &DataLocation,
    config: &Config,
    progress: &Progress,
) -> Result<()> {
    let tasks = vanilla::generate_download_tasks(resolved, data_location).await?;
    download::download_concurrent(tasks, progress, &config.download).await?;
    Ok(())
}

/// Unpack an exported instance archive into the catalog.
///
/// The archive root must hold an `instance.json`; the instance takes its
/// name from it. Entries escaping the target directory are rejected.
pub async fn import_instance_archive(
    zip_path: &Path,
    data_location: &DataLocation,
) -> Result<String> {
    let zip_path = zip_path.to_path_buf();
    let data_location = data_location.clone();
    tokio::task::spawn_blocking(move || import_instance_archive_blocking(&zip_path, &data_location))
        .await
        .map_err(|join_error| {
            Error::Filesystem(std::io::Error::other(format!(
                "archive import failed: {join_error}"
            )))
        })?
}

fn import_instance_archive_blocking(
    zip_path: &Path,
    data_location: &DataLocation,
) -> Result<String> {
    let file = std::fs::File::open(zip_path)?;
    let mut archive = zip::ZipArchive::new(file)?;

    let instance_config: InstanceConfig = {
        let mut entry = archive.by_name("instance.json").map_err(|_| {
            Error::InvalidImportArchive("no instance.json at the archive root".to_string())
        })?;
        let mut content = String::new();
        entry.read_to_string(&mut content)?;
        serde_json::from_str(&content)?
    };

    let instance_root = data_location.get_instance_root(&instance_config.instance_name);
    if instance_root.exists() {
        return Err(Error::Instance(instance::Error::AlreadyExists(
            instance_config.instance_name.clone(),
        )));
    }

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            return Err(Error::InvalidImportArchive(format!(
                "entry {:?} escapes the instance directory",
                entry.name()
            )));
        };
        let target: PathBuf = instance_root.join(relative);
        if entry.is_dir() {
            std::fs::create_dir_all(&target)?;
            continue;
        }
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut output = std::fs::File::create(&target)?;
        std::io::copy(&mut entry, &mut output)?;
    }
    for child in ["minecraft", "natives", "screenshots", "logs"] {
        std::fs::create_dir_all(instance_root.join(child))?;
    }
    info!("Imported instance {}", instance_config.instance_name);
    Ok(instance_config.instance_name)
}
