// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use log::debug;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::Mutex;

use download::{Checksum, FetchTask, FileRole};
use folder::DataLocation;
use shared::HTTP_CLIENT;
use version::{AssetIndexObject, LibraryRole, ResolvedVersion};

use crate::error::*;

const VERSION_MANIFEST_URL: &str =
    "https://piston-meta.mojang.com/mc/game/version_manifest_v2.json";
const ASSET_OBJECT_BASE_URL: &str = "https://resources.download.minecraft.net";

#[derive(Clone, Deserialize, Serialize)]
pub struct VersionManifest {
    pub latest: LatestVersion,
    pub versions: Vec<VersionInfo>,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct LatestVersion {
    pub release: String,
    pub snapshot: String,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub id: String,
    pub r#type: String,
    pub url: String,
    pub time: String,
    pub release_time: String,
    pub sha1: String,
    pub compliance_level: u8,
}

static MANIFEST_CACHE: Lazy<Mutex<Option<VersionManifest>>> = Lazy::new(|| Mutex::new(None));

impl VersionManifest {
    /// The manifest index is fetched once per launcher session.
    pub async fn get() -> Result<VersionManifest> {
        let mut cache = MANIFEST_CACHE.lock().await;
        if let Some(manifest) = cache.as_ref() {
            return Ok(manifest.clone());
        }
        // Not allow custom source to avoid attack
        let manifest: VersionManifest = HTTP_CLIENT
            .get(VERSION_MANIFEST_URL)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        *cache = Some(manifest.clone());
        Ok(manifest)
    }
}

/// Fetch and cache the descriptor of a vanilla version, returning its raw
/// JSON text. Reuses the cached copy when its checksum still matches.
pub async fn ensure_version_json(
    version_id: &str,
    data_location: &DataLocation,
) -> Result<String> {
    let manifest = VersionManifest::get().await?;
    let version_info = manifest
        .versions
        .iter()
        .find(|version| version.id == version_id)
        .ok_or_else(|| Error::UnknownVersion(version_id.to_string()))?;

    let json_path = data_location.get_version_json(version_id);
    let cached = download::verify_file(&json_path, &Checksum::Sha1(version_info.sha1.clone()));
    if !cached {
        download::download_single(&FetchTask {
            url: version_info.url.clone(),
            file: json_path.clone(),
            checksum: Checksum::Sha1(version_info.sha1.clone()),
            size: None,
            role: FileRole::VersionJson,
        })
        .await?;
    }
    Ok(tokio::fs::read_to_string(&json_path).await?)
}

/// Generate the complete fetch list for a resolved version: client jar,
/// libraries and natives, the asset index with every missing object, and the
/// logging configuration.
pub async fn generate_download_tasks(
    resolved_version: &ResolvedVersion,
    data_location: &DataLocation,
) -> Result<Vec<FetchTask>> {
    let mut tasks = vec![];
    tasks.push(client_jar_task(resolved_version, data_location)?);
    tasks.extend(library_tasks(resolved_version, data_location));
    tasks.extend(asset_tasks(resolved_version, data_location).await?);
    tasks.extend(logging_config_task(resolved_version, data_location));
    Ok(tasks)
}

fn client_jar_task(
    resolved_version: &ResolvedVersion,
    data_location: &DataLocation,
) -> Result<FetchTask> {
    let client = resolved_version
        .downloads
        .get("client")
        .ok_or(Error::Version(version::Error::InvalidVersionJson(
            "downloads.client".to_string(),
        )))?;
    Ok(FetchTask {
        url: client.url.clone(),
        file: data_location.get_version_jar(resolved_version.jar_id()),
        checksum: Checksum::Sha1(client.sha1.clone()),
        size: Some(client.size),
        role: FileRole::ClientJar,
    })
}

fn library_tasks(
    resolved_version: &ResolvedVersion,
    data_location: &DataLocation,
) -> Vec<FetchTask> {
    resolved_version
        .libraries
        .iter()
        .map(|library| FetchTask {
            url: library.url.clone(),
            file: data_location.get_library_by_path(&library.path),
            checksum: library
                .sha1
                .clone()
                .map(Checksum::Sha1)
                .unwrap_or(Checksum::None),
            size: library.size,
            role: match library.role {
                LibraryRole::Native => FileRole::NativeLibrary,
                LibraryRole::Classpath => FileRole::Library,
            },
        })
        .collect()
}

async fn asset_tasks(
    resolved_version: &ResolvedVersion,
    data_location: &DataLocation,
) -> Result<Vec<FetchTask>> {
    let Some(asset_index) = resolved_version.asset_index.clone() else {
        return Ok(vec![]);
    };
    let index_path = data_location.get_assets_index(&asset_index.id);
    let index_checksum = asset_index
        .sha1
        .clone()
        .map(Checksum::Sha1)
        .unwrap_or(Checksum::None);
    if !download::verify_file(&index_path, &index_checksum) {
        download::download_single(&FetchTask {
            url: asset_index.url.clone(),
            file: index_path.clone(),
            checksum: index_checksum,
            size: asset_index.size,
            role: FileRole::AssetIndex,
        })
        .await?;
    }

    let index_json: Value = serde_json::from_str(&tokio::fs::read_to_string(&index_path).await?)?;
    let objects: AssetIndexObject = serde_json::from_value(index_json["objects"].clone())?;
    debug!("Asset index {} holds {} objects", asset_index.id, objects.len());
    Ok(objects
        .into_values()
        .map(|object| FetchTask {
            url: format!(
                "{ASSET_OBJECT_BASE_URL}/{}/{}",
                &object.hash[0..2],
                object.hash
            ),
            file: data_location.get_asset_object(&object.hash),
            checksum: Checksum::Sha1(object.hash),
            size: Some(object.size),
            role: FileRole::AssetObject,
        })
        .collect())
}

fn logging_config_task(
    resolved_version: &ResolvedVersion,
    data_location: &DataLocation,
) -> Option<FetchTask> {
    let client = resolved_version.logging.get("client")?;
    Some(FetchTask {
        url: client.file.url.clone(),
        file: data_location.get_log_config(resolved_version.jar_id()),
        checksum: Checksum::Sha1(client.file.sha1.clone()),
        size: Some(client.file.size),
        role: FileRole::LoggingConfig,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use version::{AssetIndex, DownloadInfo, ResolvedLibrary};

    fn resolved_fixture() -> ResolvedVersion {
        let mut resolved = ResolvedVersion {
            id: "1.20.1".to_string(),
            main_class: "net.minecraft.client.main.Main".to_string(),
            ..Default::default()
        };
        resolved.downloads.insert(
            "client".to_string(),
            DownloadInfo {
                sha1: "0c3ec587af28e5a785c0b4a16b8d9183cb5a07a8".to_string(),
                size: 24476480,
                url: "https://piston-data.mojang.com/v1/objects/0c3e/client.jar".to_string(),
            },
        );
        resolved.libraries.push(ResolvedLibrary {
            name: "com.mojang:brigadier:1.1.8".to_string(),
            path: "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar".to_string(),
            url: "https://libraries.minecraft.net/com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar"
                .to_string(),
            sha1: Some("bb02ef34f6dd09392ad5db8ad2d9b87f5e13734c".to_string()),
            size: Some(77392),
            role: version::LibraryRole::Classpath,
            extract_exclude: vec![],
        });
        resolved.asset_index = Some(AssetIndex {
            id: "5".to_string(),
            sha1: None,
            size: None,
            total_size: None,
            url: "https://piston-meta.mojang.com/v1/packages/x/5.json".to_string(),
        });
        resolved
    }

    #[test]
    fn client_jar_lands_under_versions() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let task = client_jar_task(&resolved_fixture(), &location).unwrap();
        assert_eq!(task.file, location.get_version_jar("1.20.1"));
        assert_eq!(task.role, FileRole::ClientJar);
        assert_eq!(task.size, Some(24476480));
    }

    #[test]
    fn library_tasks_use_canonical_paths() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let tasks = library_tasks(&resolved_fixture(), &location);
        assert_eq!(tasks.len(), 1);
        assert_eq!(
            tasks[0].file,
            location.get_library_by_path("com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar")
        );
    }
}
