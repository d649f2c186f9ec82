// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! Forge overlay installation.
//!
//! The Forge installer jar carries the overlay descriptor (`version.json`),
//! an install profile with processor steps, and embedded maven artifacts.
//! Processors run exactly once per `(vanilla, forge)` pair; the marker file
//! in the Forge cache directory records a completed run.

use std::{collections::HashMap, io::Read, path::Path, path::PathBuf, process::Stdio};

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use config::download::DownloadConfig;
use download::{Checksum, FetchTask, FileRole};
use folder::DataLocation;
use platform::DELIMITER;
use shared::HTTP_CLIENT;
use task::Progress;
use version::{MavenCoordinate, RuleHost, Version};

use crate::error::*;

const FORGE_METADATA_URL: &str =
    "https://files.minecraftforge.net/net/minecraftforge/forge/maven-metadata.json";
const FORGE_MAVEN_BASE_URL: &str = "https://maven.minecraftforge.net/net/minecraftforge/forge";

const PROCESSED_MARKER: &str = ".installed";

/// Forge build numbers per vanilla version, the `<vanilla>-` prefix stripped.
pub async fn forge_versions() -> Result<HashMap<String, Vec<String>>> {
    let raw: HashMap<String, Vec<String>> = HTTP_CLIENT
        .get(FORGE_METADATA_URL)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(raw
        .into_iter()
        .map(|(vanilla, builds)| {
            let prefix = format!("{vanilla}-");
            let builds = builds
                .into_iter()
                .map(|build| {
                    build
                        .strip_prefix(&prefix)
                        .map(str::to_string)
                        .unwrap_or(build)
                })
                .collect();
            (vanilla, builds)
        })
        .collect())
}

#[derive(Clone, Deserialize, Serialize)]
struct DataEntry {
    client: String,
    #[allow(dead_code)]
    server: String,
}

#[derive(Clone, Deserialize, Serialize)]
struct Processor {
    #[serde(default)]
    sides: Vec<String>,
    jar: String,
    classpath: Vec<String>,
    args: Vec<String>,
    #[serde(default)]
    outputs: HashMap<String, String>,
}

#[derive(Clone, Deserialize, Serialize)]
struct InstallProfile {
    #[serde(default)]
    data: HashMap<String, DataEntry>,
    #[serde(default)]
    processors: Vec<Processor>,
    #[serde(default)]
    libraries: Vec<Value>,
}

/// Install the Forge overlay for `(mcversion, forge_version)`.
///
/// The vanilla client jar and descriptor must already be in place; processor
/// steps patch that jar. Returns the overlay's version id.
pub async fn install(
    mcversion: &str,
    forge_version: &str,
    data_location: &DataLocation,
    java_path: &Path,
    download_config: &DownloadConfig,
    progress: &Progress,
) -> Result<String> {
    let available = forge_versions().await?;
    let supported = available
        .get(mcversion)
        .map(|builds| builds.iter().any(|build| build == forge_version))
        .unwrap_or(false);
    if !supported {
        return Err(Error::ModloaderUnsupportedForVersion {
            loader: format!("Forge {forge_version}"),
            vanilla: mcversion.to_string(),
        });
    }

    let cache_dir = data_location.get_forge_cache(mcversion, forge_version);
    let marker_path = cache_dir.join(PROCESSED_MARKER);
    if let Ok(overlay_id) = tokio::fs::read_to_string(&marker_path).await {
        info!("Forge {mcversion}-{forge_version} already installed");
        return Ok(overlay_id.trim().to_string());
    }

    let installer_path = cache_dir.join("installer.jar");
    download::download_single(&FetchTask {
        url: format!(
            "{FORGE_MAVEN_BASE_URL}/{mcversion}-{forge_version}/forge-{mcversion}-{forge_version}-installer.jar"
        ),
        file: installer_path.clone(),
        checksum: Checksum::None,
        size: None,
        role: FileRole::Installer,
    })
    .await?;

    let extracted_dir = cache_dir.join("installer");
    extract_installer(&installer_path, &extracted_dir, data_location).await?;

    let overlay: Version = serde_json::from_str(
        &tokio::fs::read_to_string(extracted_dir.join("version.json")).await?,
    )?;
    let overlay_id = overlay.id.clone();
    let overlay_path = data_location.get_version_json(&overlay_id);
    if let Some(parent) = overlay_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(&overlay_path, serde_json::to_string_pretty(&overlay)?).await?;

    let profile: InstallProfile = serde_json::from_str(
        &tokio::fs::read_to_string(extracted_dir.join("install_profile.json")).await?,
    )?;

    download_processor_libraries(&profile, data_location, download_config, progress).await?;
    download_mojang_mappings(&profile, mcversion, data_location).await?;

    let substitution = SubstitutionContext {
        data_location,
        extracted_dir: &extracted_dir,
        cache_dir: &cache_dir,
        installer_path: &installer_path,
        mcversion,
        profile: &profile,
    };
    for (step_index, processor) in profile.processors.iter().enumerate() {
        run_processor(step_index, processor, &substitution, java_path).await?;
    }

    tokio::fs::write(&marker_path, &overlay_id).await?;
    info!("Forge {mcversion}-{forge_version} installed as {overlay_id}");
    Ok(overlay_id)
}

/// Unpack the installer archive and copy the embedded `maven/` artifacts into
/// the shared library store.
async fn extract_installer(
    installer_path: &PathBuf,
    extracted_dir: &PathBuf,
    data_location: &DataLocation,
) -> Result<()> {
    let installer_path = installer_path.clone();
    let extracted_dir = extracted_dir.clone();
    let libraries_dir = data_location.libraries.clone();
    tokio::task::spawn_blocking(move || -> Result<()> {
        let file = std::fs::File::open(&installer_path)?;
        let mut archive = zip::ZipArchive::new(file)?;
        archive.extract(&extracted_dir)?;

        let maven_dir = extracted_dir.join("maven");
        if maven_dir.is_dir() {
            copy_tree(&maven_dir, &libraries_dir)?;
        }
        Ok(())
    })
    .await
    .map_err(|join_error| {
        Error::Filesystem(std::io::Error::other(format!(
            "installer extraction failed: {join_error}"
        )))
    })?
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let target = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

async fn download_processor_libraries(
    profile: &InstallProfile,
    data_location: &DataLocation,
    download_config: &DownloadConfig,
    progress: &Progress,
) -> Result<()> {
    let resolved = version::resolve_libraries(profile.libraries.clone(), &RuleHost::current())?;
    let tasks: Vec<FetchTask> = resolved
        .into_iter()
        // Artifacts with an empty URL ship inside the installer's maven/
        // directory and were copied already.
        .filter(|library| !library.url.is_empty())
        .map(|library| FetchTask {
            url: library.url,
            file: data_location.get_library_by_path(&library.path),
            checksum: library.sha1.map(Checksum::Sha1).unwrap_or(Checksum::None),
            size: library.size,
            role: FileRole::Library,
        })
        .collect();
    download::download_concurrent(tasks, progress, download_config).await?;
    Ok(())
}

/// Modern profiles declare a `MOJMAPS` data entry whose artifact is not
/// hosted anywhere; it is the vanilla `client_mappings` download.
async fn download_mojang_mappings(
    profile: &InstallProfile,
    mcversion: &str,
    data_location: &DataLocation,
) -> Result<()> {
    let Some(mojmaps) = profile.data.get("MOJMAPS") else {
        return Ok(());
    };
    let coordinate = mojmaps.client.trim_matches(['[', ']']);
    let path = MavenCoordinate::parse(coordinate)?.path();

    let vanilla_json =
        tokio::fs::read_to_string(data_location.get_version_json(mcversion)).await?;
    let vanilla: Version = serde_json::from_str(&vanilla_json)?;
    let mappings = vanilla
        .downloads
        .as_ref()
        .and_then(|downloads| downloads.get("client_mappings"))
        .ok_or(Error::Version(version::Error::InvalidVersionJson(
            "downloads.client_mappings".to_string(),
        )))?;
    download::download_single(&FetchTask {
        url: mappings.url.clone(),
        file: data_location.get_library_by_path(&path),
        checksum: Checksum::Sha1(mappings.sha1.clone()),
        size: Some(mappings.size),
        role: FileRole::Library,
    })
    .await?;
    Ok(())
}

struct SubstitutionContext<'a> {
    data_location: &'a DataLocation,
    extracted_dir: &'a Path,
    cache_dir: &'a Path,
    installer_path: &'a Path,
    mcversion: &'a str,
    profile: &'a InstallProfile,
}

/// Expand one processor argument.
///
/// `{KEY}` looks up builtins and the profile data table, `[coordinate]` maps
/// into the library store, `'literal'` unquotes.
fn transform_argument(argument: &str, context: &SubstitutionContext) -> Result<String> {
    if argument.starts_with('{') && argument.ends_with('}') {
        let key = &argument[1..argument.len() - 1];
        return match key {
            "SIDE" => Ok("client".to_string()),
            "MINECRAFT_JAR" => Ok(context
                .data_location
                .get_version_jar(context.mcversion)
                .to_string_lossy()
                .to_string()),
            "MINECRAFT_VERSION" => Ok(context.mcversion.to_string()),
            "ROOT" => Ok(context.cache_dir.to_string_lossy().to_string()),
            "INSTALLER" => Ok(context.installer_path.to_string_lossy().to_string()),
            "LIBRARY_DIR" => Ok(context
                .data_location
                .libraries
                .to_string_lossy()
                .to_string()),
            "BINPATCH" => Ok(context
                .extracted_dir
                .join("data/client.lzma")
                .to_string_lossy()
                .to_string()),
            other => {
                let entry = context.profile.data.get(other).ok_or_else(|| {
                    Error::Version(version::Error::InvalidVersionJson(format!(
                        "install_profile data {other}"
                    )))
                })?;
                transform_argument(&entry.client, context)
            }
        };
    }
    if argument.starts_with('[') && argument.ends_with(']') {
        let coordinate = MavenCoordinate::parse(&argument[1..argument.len() - 1])?;
        return Ok(context
            .data_location
            .get_library_by_path(coordinate.path())
            .to_string_lossy()
            .to_string());
    }
    if argument.starts_with('\'') && argument.ends_with('\'') && argument.len() >= 2 {
        return Ok(argument[1..argument.len() - 1].to_string());
    }
    // Paths like `/data/client.lzma` refer to files inside the installer.
    if let Some(embedded) = argument.strip_prefix('/') {
        return Ok(context
            .extracted_dir
            .join(embedded)
            .to_string_lossy()
            .to_string());
    }
    Ok(argument.to_string())
}

fn processor_outputs_valid(processor: &Processor, context: &SubstitutionContext) -> bool {
    if processor.outputs.is_empty() {
        return false;
    }
    processor.outputs.iter().all(|(path, checksum)| {
        let (Ok(path), Ok(checksum)) = (
            transform_argument(path, context),
            transform_argument(checksum, context),
        ) else {
            return false;
        };
        download::verify_file(Path::new(&path), &Checksum::Sha1(checksum))
    })
}

async fn run_processor(
    step_index: usize,
    processor: &Processor,
    context: &SubstitutionContext<'_>,
    java_path: &Path,
) -> Result<()> {
    if !processor.sides.is_empty() && !processor.sides.iter().any(|side| side == "client") {
        return Ok(());
    }
    // The mappings were fetched directly instead.
    if processor.args.iter().any(|arg| arg == "DOWNLOAD_MOJMAPS") {
        return Ok(());
    }
    if processor_outputs_valid(processor, context) {
        info!("Processor {step_index} outputs already valid, skipping");
        return Ok(());
    }

    let jar_path = context
        .data_location
        .get_library_by_path(MavenCoordinate::parse(&processor.jar)?.path());
    let main_class = read_main_class(&jar_path)?;
    let mut classpath: Vec<String> = processor
        .classpath
        .iter()
        .map(|entry| {
            Ok(context
                .data_location
                .get_library_by_path(MavenCoordinate::parse(entry)?.path())
                .to_string_lossy()
                .to_string())
        })
        .collect::<Result<_>>()?;
    classpath.push(jar_path.to_string_lossy().to_string());

    let mut arguments = Vec::with_capacity(processor.args.len());
    for argument in &processor.args {
        arguments.push(transform_argument(argument, context)?);
    }

    info!("Running install processor {step_index}: {main_class}");
    let output = tokio::process::Command::new(java_path)
        .arg("-cp")
        .arg(classpath.join(DELIMITER))
        .arg(&main_class)
        .args(&arguments)
        .current_dir(context.cache_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr_tail: String = stderr
            .chars()
            .rev()
            .take(2000)
            .collect::<String>()
            .chars()
            .rev()
            .collect();
        warn!("Install processor {step_index} failed");
        return Err(Error::InstallProcessorFailed {
            step_index,
            exit_code: output.status.code().unwrap_or(-1),
            stderr_tail,
        });
    }
    Ok(())
}

fn read_main_class(jar_path: &Path) -> Result<String> {
    let file = std::fs::File::open(jar_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut manifest = archive.by_name("META-INF/MANIFEST.MF")?;
    let mut content = String::new();
    manifest.read_to_string(&mut content)?;
    content
        .lines()
        .find_map(|line| line.strip_prefix("Main-Class:"))
        .map(|main_class| main_class.trim().to_string())
        .ok_or(Error::Version(version::Error::InvalidVersionJson(
            "processor jar Main-Class".to_string(),
        )))
}
