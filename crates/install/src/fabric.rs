// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use log::info;
use serde::{Deserialize, Serialize};

use folder::DataLocation;
use shared::HTTP_CLIENT;
use version::Version;

use crate::error::*;

const FABRIC_META_BASE_URL: &str = "https://meta.fabricmc.net/v2/versions";

/// One entry of the Fabric loader version list.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricArtifactVersion {
    pub separator: Option<String>,
    pub build: Option<usize>,
    /// The Maven coordinate string identifying the artifact.
    pub maven: String,
    pub version: String,
    pub stable: bool,
}

/// The loader list as published for one game version: loader plus the
/// intermediary mappings it runs on.
#[derive(Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricLoaderArtifact {
    pub loader: FabricArtifactVersion,
    pub intermediary: FabricArtifactVersion,
}

/// Loader versions available globally, newest first.
pub async fn loader_versions() -> Result<Vec<String>> {
    let artifacts: Vec<FabricArtifactVersion> = HTTP_CLIENT
        .get(format!("{FABRIC_META_BASE_URL}/loader"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(artifacts
        .into_iter()
        .map(|artifact| artifact.version)
        .collect())
}

async fn supported_loaders(mcversion: &str) -> Result<Vec<FabricLoaderArtifact>> {
    Ok(HTTP_CLIENT
        .get(format!("{FABRIC_META_BASE_URL}/loader/{mcversion}"))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?)
}

/// Fetch the Fabric profile for `(mcversion, loader)` and cache it as a
/// version descriptor. The profile carries `inheritsFrom = mcversion`, so the
/// regular inheritance merge produces the overlay.
///
/// Returns the overlay's version id (e.g. `fabric-loader-0.14.21-1.20.1`).
pub async fn install_profile(
    mcversion: &str,
    loader_version: &str,
    data_location: &DataLocation,
) -> Result<String> {
    let supported = supported_loaders(mcversion).await?;
    if !supported
        .iter()
        .any(|artifact| artifact.loader.version == loader_version)
    {
        return Err(Error::ModloaderUnsupportedForVersion {
            loader: format!("Fabric {loader_version}"),
            vanilla: mcversion.to_string(),
        });
    }

    info!("Saving Fabric profile for {mcversion} loader {loader_version}");
    let profile: Version = HTTP_CLIENT
        .get(format!(
            "{FABRIC_META_BASE_URL}/loader/{mcversion}/{loader_version}/profile/json"
        ))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let overlay_id = profile.id.clone();
    let json_path = data_location.get_version_json(&overlay_id);
    if let Some(parent) = json_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(json_path, serde_json::to_string_pretty(&profile)?).await?;
    Ok(overlay_id)
}
