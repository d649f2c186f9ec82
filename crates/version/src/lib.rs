// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! Version descriptor parsing and resolution.
//!
//! A raw [`Version`] is the JSON profile as published upstream; resolving it
//! walks the `inheritsFrom` chain, evaluates every rule against the current
//! host and flattens the result into a [`ResolvedVersion`] a launch can be
//! assembled from.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{collections::HashMap, path::PathBuf, str::FromStr};

use folder::DataLocation;

pub mod argument;
pub mod checks;
pub mod error;
pub mod library;

pub use argument::*;
pub use checks::{RuleHost, check_allowed};
pub use error::*;
pub use library::*;

/// Flat, rule-evaluated form of a version descriptor chain.
#[derive(Clone, Serialize, Default)]
pub struct ResolvedVersion {
    pub id: String,
    pub main_class: String,
    /// Resolution order; later entries supersede earlier ones by
    /// `group:artifact`, natives carry exactly one platform classifier.
    pub libraries: Vec<ResolvedLibrary>,
    pub asset_index: Option<AssetIndex>,
    pub assets: Option<String>,
    pub downloads: HashMap<String, DownloadInfo>,
    /// Argument lists with placeholders intact; substitution happens at
    /// assembly time.
    pub jvm_args: Vec<String>,
    pub game_args: Vec<String>,
    pub logging: HashMap<String, Logging>,
    pub java_version: JavaVersion,
    pub version_type: Option<String>,
    pub release_time: Option<String>,
    pub compliance_level: u8,
    pub minimum_launcher_version: i32,

    /// Ids of the inherited descriptors, nearest parent first; the last
    /// element is the root vanilla version.
    pub inheritances: Vec<String>,

    /// The json files the chain was read from, child first.
    pub path_chain: Vec<PathBuf>,
}

impl ResolvedVersion {
    /// The version whose jar goes last on the classpath: the root of the
    /// inheritance chain, or this version itself for vanilla.
    pub fn jar_id(&self) -> &str {
        self.inheritances.last().map_or(&self.id, |id| id.as_str())
    }
}

/// The raw json format provided by Minecraft (and by loader overlays, which
/// add `inheritsFrom`).
#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Version {
    pub id: String,
    pub time: Option<String>,
    pub r#type: Option<String>,
    pub release_time: Option<String>,
    pub inherits_from: Option<String>,
    pub minimum_launcher_version: Option<i32>,
    pub compliance_level: Option<u8>,
    /// Pre-1.13 argument template, a single space separated string.
    pub minecraft_arguments: Option<String>,
    pub arguments: Option<Arguments>,
    pub main_class: Option<String>,
    pub libraries: Option<Vec<Value>>,
    pub asset_index: Option<AssetIndex>,
    pub assets: Option<String>,
    pub downloads: Option<HashMap<String, DownloadInfo>>,
    pub logging: Option<HashMap<String, Logging>>,
    pub java_version: Option<JavaVersion>,
}

impl FromStr for Version {
    type Err = serde_json::Error;
    fn from_str(raw: &str) -> std::result::Result<Version, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

impl Version {
    /// Resolve this descriptor against the cached descriptor store.
    ///
    /// Every parent named by `inheritsFrom` must already sit at
    /// `versions/<id>/<id>.json`; the installer guarantees that before
    /// calling. Merging is child-over-parent: arrays concatenate with the
    /// child after the parent, scalars from the child win.
    pub fn resolve(
        &self,
        data_location: &DataLocation,
        enabled_features: &[String],
    ) -> Result<ResolvedVersion> {
        let host = RuleHost::current();
        self.resolve_with_host(data_location, enabled_features, &host)
    }

    pub fn resolve_with_host(
        &self,
        data_location: &DataLocation,
        enabled_features: &[String],
        host: &RuleHost,
    ) -> Result<ResolvedVersion> {
        let mut resolved_version = ResolvedVersion::default();
        let mut chain = vec![self.clone()];
        let mut inherits_from = self.inherits_from.clone();
        while let Some(parent_id) = inherits_from {
            // A descriptor chain is at most a handful deep; anything longer
            // is a cycle.
            if chain.len() > 8 {
                return Err(Error::InvalidVersionJson("inheritsFrom cycle".to_string()));
            }
            resolved_version.inheritances.push(parent_id.clone());
            let path = data_location.get_version_json(&parent_id);
            resolved_version.path_chain.push(path.clone());
            let parent_json = std::fs::read_to_string(path)?;
            let parent: Version = serde_json::from_str(&parent_json)?;
            inherits_from = parent.inherits_from.clone();
            chain.push(parent);
        }

        let mut libraries_raw = Libraries::new();
        let mut legacy_arguments: Option<String> = None;

        // Walk root first so children override.
        for version in chain.into_iter().rev() {
            resolved_version
                .join_id(version.id)
                .join_minimum_launcher_version(version.minimum_launcher_version)
                .join_compliance_level(version.compliance_level)
                .join_release_time(version.release_time)
                .join_logging(version.logging)
                .join_assets(version.assets)
                .join_version_type(version.r#type)
                .join_main_class(version.main_class)
                .join_java_version(version.java_version)
                .join_asset_index(version.asset_index)
                .join_downloads(version.downloads)
                .join_arguments(version.arguments, host, enabled_features);
            if version.minecraft_arguments.is_some() {
                legacy_arguments = version.minecraft_arguments;
            }
            if let Some(libraries) = version.libraries {
                libraries_raw.extend(libraries);
            }
        }
        if let Some(legacy) = legacy_arguments {
            resolved_version.game_args = legacy.split(' ').map(str::to_string).collect();
            resolved_version.jvm_args = LEGACY_JVM_ARGS.clone();
        }
        resolved_version.libraries = libraries_raw.to_resolved(host)?;

        if resolved_version.main_class.is_empty() {
            return Err(Error::InvalidVersionJson("mainClass".to_string()));
        }
        if resolved_version.asset_index.is_none() {
            return Err(Error::InvalidVersionJson("assetIndex".to_string()));
        }
        if resolved_version.downloads.is_empty() {
            return Err(Error::InvalidVersionJson("downloads".to_string()));
        }
        Ok(resolved_version)
    }
}

impl ResolvedVersion {
    fn join_arguments(
        &mut self,
        arguments: Option<Arguments>,
        host: &RuleHost,
        enabled_features: &[String],
    ) -> &mut Self {
        if let Some(arguments) = arguments {
            let resolved = arguments.to_resolved(host, enabled_features);
            self.jvm_args.extend(resolved.jvm);
            self.game_args.extend(resolved.game);
        }
        self
    }
    fn join_id(&mut self, id: String) -> &mut Self {
        if !id.is_empty() {
            self.id = id
        }
        self
    }
    fn join_minimum_launcher_version(&mut self, version: Option<i32>) -> &mut Self {
        self.minimum_launcher_version =
            std::cmp::max(version.unwrap_or(0), self.minimum_launcher_version);
        self
    }
    fn join_compliance_level(&mut self, compliance_level: Option<u8>) -> &mut Self {
        self.compliance_level = std::cmp::max(compliance_level.unwrap_or(0), self.compliance_level);
        self
    }
    fn join_release_time(&mut self, release_time: Option<String>) -> &mut Self {
        if release_time.is_some() {
            self.release_time = release_time
        }
        self
    }
    fn join_logging(&mut self, logging: Option<HashMap<String, Logging>>) -> &mut Self {
        if let Some(logging) = logging
            && !logging.is_empty()
        {
            self.logging = logging
        }
        self
    }
    fn join_assets(&mut self, assets: Option<String>) -> &mut Self {
        if assets.is_some() {
            self.assets = assets
        }
        self
    }
    fn join_version_type(&mut self, version_type: Option<String>) -> &mut Self {
        if version_type.is_some() {
            self.version_type = version_type
        }
        self
    }
    fn join_main_class(&mut self, main_class: Option<String>) -> &mut Self {
        if let Some(main_class) = main_class {
            self.main_class = main_class
        }
        self
    }
    fn join_java_version(&mut self, java_version: Option<JavaVersion>) -> &mut Self {
        if let Some(java_version) = java_version {
            self.java_version = java_version
        }
        self
    }
    fn join_asset_index(&mut self, asset_index: Option<AssetIndex>) -> &mut Self {
        if asset_index.is_some() {
            self.asset_index = asset_index
        }
        self
    }
    fn join_downloads(&mut self, downloads: Option<HashMap<String, DownloadInfo>>) -> &mut Self {
        if let Some(downloads) = downloads {
            self.downloads.extend(downloads)
        }
        self
    }
}

/// JVM arguments for descriptors that predate the `arguments` object.
static LEGACY_JVM_ARGS: Lazy<Vec<String>> = Lazy::new(|| {
    vec![
        "-Djava.library.path=${natives_directory}".to_string(),
        "-Dminecraft.launcher.brand=${launcher_name}".to_string(),
        "-Dminecraft.launcher.version=${launcher_version}".to_string(),
        "-cp".to_string(),
        "${classpath}".to_string(),
    ]
});

#[derive(Clone, Deserialize, Serialize)]
pub struct DownloadInfo {
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetIndex {
    pub id: String,
    pub sha1: Option<String>,
    pub size: Option<u64>,
    pub total_size: Option<u64>,
    pub url: String,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct AssetIndexObjectInfo {
    pub hash: String,
    pub size: u64,
}

/// Parsed `objects` table of an asset index document.
pub type AssetIndexObject = HashMap<String, AssetIndexObjectInfo>;

#[derive(Clone, Deserialize, Serialize)]
pub struct Logging {
    pub file: LoggingFileDownload,
    pub argument: String,
    pub r#type: String,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct LoggingFileDownload {
    pub id: String,
    pub sha1: String,
    pub size: u64,
    pub url: String,
}

#[derive(Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JavaVersion {
    pub component: String,
    pub major_version: i32,
}

impl Default for JavaVersion {
    fn default() -> Self {
        Self {
            component: "jre-legacy".to_string(),
            major_version: 8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::OsFamily;
    use serde_json::json;

    fn linux_host() -> RuleHost {
        RuleHost {
            os_family: OsFamily::Linux,
            os_version: "6.8.0".to_string(),
            arch: "x86_64".to_string(),
        }
    }

    fn vanilla_descriptor() -> Value {
        json!({
            "id": "1.20.1",
            "type": "release",
            "complianceLevel": 1,
            "mainClass": "net.minecraft.client.main.Main",
            "minimumLauncherVersion": 21,
            "assetIndex": {
                "id": "5",
                "sha1": "8790e42ab7a7c66df7b02529bb4a95a47bb026dd",
                "size": 413350,
                "totalSize": 633485873,
                "url": "https://piston-meta.mojang.com/v1/packages/8790e42ab7a7c66df7b02529bb4a95a47bb026dd/5.json"
            },
            "downloads": {
                "client": {
                    "sha1": "0c3ec587af28e5a785c0b4a16b8d9183cb5a07a8",
                    "size": 24476480,
                    "url": "https://piston-data.mojang.com/v1/objects/0c3ec587af28e5a785c0b4a16b8d9183cb5a07a8/client.jar"
                }
            },
            "javaVersion": {"component": "java-runtime-gamma", "majorVersion": 17},
            "libraries": [
                {"name": "com.mojang:brigadier:1.1.8", "downloads": {"artifact": {
                    "path": "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar",
                    "sha1": "bb02ef34f6dd09392ad5db8ad2d9b87f5e13734c",
                    "size": 77392,
                    "url": "https://libraries.minecraft.net/com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar"
                }}},
                {"name": "org.ow2.asm:asm:9.3", "downloads": {"artifact": {
                    "path": "org/ow2/asm/asm/9.3/asm-9.3.jar",
                    "sha1": "8e6300ef51c1d801a7ed62d07cd221aca3a90640",
                    "size": 122360,
                    "url": "https://libraries.minecraft.net/org/ow2/asm/asm/9.3/asm-9.3.jar"
                }}}
            ],
            "arguments": {
                "game": ["--username", "${auth_player_name}"],
                "jvm": ["-Djava.library.path=${natives_directory}", "-cp", "${classpath}"]
            }
        })
    }

    fn write_descriptor(location: &DataLocation, descriptor: &Value) {
        let id = descriptor["id"].as_str().unwrap();
        let path = location.get_version_json(id);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, serde_json::to_string_pretty(descriptor).unwrap()).unwrap();
    }

    #[test]
    fn vanilla_descriptor_resolves_flat() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let version: Version = serde_json::from_value(vanilla_descriptor()).unwrap();
        let resolved = version
            .resolve_with_host(&location, &[], &linux_host())
            .unwrap();
        assert_eq!(resolved.id, "1.20.1");
        assert_eq!(resolved.main_class, "net.minecraft.client.main.Main");
        assert_eq!(resolved.libraries.len(), 2);
        assert_eq!(resolved.java_version.major_version, 17);
        assert_eq!(resolved.jar_id(), "1.20.1");
        assert!(resolved.game_args.contains(&"${auth_player_name}".to_string()));
    }

    #[test]
    fn child_overlay_inherits_and_supersedes() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        write_descriptor(&location, &vanilla_descriptor());

        let overlay = json!({
            "id": "fabric-loader-0.14.21-1.20.1",
            "inheritsFrom": "1.20.1",
            "mainClass": "net.fabricmc.loader.impl.launch.knot.KnotClient",
            "libraries": [
                {"name": "org.ow2.asm:asm:9.6", "url": "https://maven.fabricmc.net/"},
                {"name": "net.fabricmc:intermediary:1.20.1", "url": "https://maven.fabricmc.net/"},
                {"name": "net.fabricmc:fabric-loader:0.14.21", "url": "https://maven.fabricmc.net/"}
            ],
            "arguments": {"jvm": ["-DFabricMcEmu= net.minecraft.client.main.Main "], "game": []}
        });
        let version: Version = serde_json::from_value(overlay).unwrap();
        let resolved = version
            .resolve_with_host(&location, &[], &linux_host())
            .unwrap();

        assert_eq!(resolved.id, "fabric-loader-0.14.21-1.20.1");
        assert_eq!(
            resolved.main_class,
            "net.fabricmc.loader.impl.launch.knot.KnotClient"
        );
        assert_eq!(resolved.inheritances, vec!["1.20.1".to_string()]);
        assert_eq!(resolved.jar_id(), "1.20.1");

        // asm 9.6 from the overlay supersedes vanilla's 9.3 and keeps its
        // later position; vanilla-only entries stay in front.
        let names: Vec<_> = resolved.libraries.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "com.mojang:brigadier:1.1.8",
                "org.ow2.asm:asm:9.6",
                "net.fabricmc:intermediary:1.20.1",
                "net.fabricmc:fabric-loader:0.14.21",
            ]
        );

        // Parent jvm args come first, overlay args after.
        let parent_position = resolved
            .jvm_args
            .iter()
            .position(|arg| arg == "-cp")
            .unwrap();
        let overlay_position = resolved
            .jvm_args
            .iter()
            .position(|arg| arg.starts_with("-DFabricMcEmu"))
            .unwrap();
        assert!(overlay_position > parent_position);
        // Asset index and client download come from the parent.
        assert!(resolved.asset_index.is_some());
        assert!(resolved.downloads.contains_key("client"));
    }

    #[test]
    fn missing_parent_is_a_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let orphan = json!({
            "id": "fabric-loader-0.14.21-1.20.1",
            "inheritsFrom": "1.20.1",
            "mainClass": "x"
        });
        let version: Version = serde_json::from_value(orphan).unwrap();
        assert!(version
            .resolve_with_host(&location, &[], &linux_host())
            .is_err());
    }

    #[test]
    fn legacy_minecraft_arguments_become_game_args() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let mut descriptor = vanilla_descriptor();
        descriptor["id"] = json!("1.7.10");
        descriptor["arguments"] = Value::Null;
        descriptor["minecraftArguments"] =
            json!("--username ${auth_player_name} --version ${version_name}");
        let version: Version = serde_json::from_value(descriptor).unwrap();
        let resolved = version
            .resolve_with_host(&location, &[], &linux_host())
            .unwrap();
        assert_eq!(
            resolved.game_args,
            vec![
                "--username",
                "${auth_player_name}",
                "--version",
                "${version_name}"
            ]
        );
        assert!(resolved.jvm_args.contains(&"${classpath}".to_string()));
    }
}
