// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::collections::HashSet;

use platform::{PLATFORM_INFO, PlatformInfo};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::checks::{RuleHost, check_allowed};
use crate::error::*;

const DEFAULT_LIBRARY_REPOSITORY: &str = "https://libraries.minecraft.net/";

/// A `group:artifact:version[:classifier][@ext]` coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MavenCoordinate {
    pub group: String,
    pub artifact: String,
    pub version: String,
    pub classifier: Option<String>,
    pub extension: String,
}

impl MavenCoordinate {
    pub fn parse(name: &str) -> Result<Self> {
        let (name, extension) = match name.split_once('@') {
            Some((name, extension)) => (name, extension.to_string()),
            None => (name, "jar".to_string()),
        };
        let parts: Vec<&str> = name.split(':').collect();
        if parts.len() < 3 || parts.len() > 4 {
            return Err(Error::InvalidLibraryName(name.to_string()));
        }
        Ok(Self {
            group: parts[0].to_string(),
            artifact: parts[1].to_string(),
            version: parts[2].to_string(),
            classifier: parts.get(3).map(|classifier| classifier.to_string()),
            extension,
        })
    }

    /// Repository-relative path:
    /// `<group-as-path>/<artifact>/<version>/<artifact>-<version>[-<classifier>].<ext>`.
    pub fn path(&self) -> String {
        let mut file_name = format!("{}-{}", self.artifact, self.version);
        if let Some(classifier) = &self.classifier {
            file_name.push('-');
            file_name.push_str(classifier);
        }
        format!(
            "{}/{}/{}/{}.{}",
            self.group.replace('.', "/"),
            self.artifact,
            self.version,
            file_name,
            self.extension
        )
    }

    /// The supersession key for modloader overlays: classifier variants
    /// (`natives-*`) coexist, everything else merges per `group:artifact`.
    pub fn merge_key(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}:{}:{}", self.group, self.artifact, classifier),
            None => format!("{}:{}", self.group, self.artifact),
        }
    }
}

/// Whether a library entry should be extracted into the natives directory
/// rather than put on the classpath.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LibraryRole {
    Classpath,
    Native,
}

/// A rule-evaluated library of the current platform.
#[derive(Clone, Serialize)]
pub struct ResolvedLibrary {
    /// The maven coordinate, possibly with a natives classifier attached.
    pub name: String,
    /// Path below the shared `libraries/` directory.
    pub path: String,
    pub url: String,
    pub sha1: Option<String>,
    pub size: Option<u64>,
    pub role: LibraryRole,
    /// Path prefixes to skip while extracting a native archive.
    pub extract_exclude: Vec<String>,
}

/// Resolve raw library entries (e.g. from a Forge install profile) against a
/// host, outside a full descriptor chain.
pub fn resolve_libraries(raw: Vec<Value>, host: &RuleHost) -> Result<Vec<ResolvedLibrary>> {
    let mut libraries = Libraries::new();
    libraries.extend(raw);
    libraries.to_resolved(host)
}

#[derive(Clone, Default)]
pub(crate) struct Libraries(Vec<Value>);

impl Libraries {
    pub(crate) fn new() -> Self {
        Self(vec![])
    }

    pub(crate) fn extend(&mut self, libraries: Vec<Value>) {
        self.0.extend(libraries);
    }

    pub(crate) fn to_resolved(&self, host: &RuleHost) -> Result<Vec<ResolvedLibrary>> {
        let mut result = Vec::new();
        for library in &self.0 {
            if let Some(rules) = library["rules"].as_array()
                && !check_allowed(rules, host, &[])
            {
                continue;
            }
            if let Some(resolved) = resolve_entry(library, &PLATFORM_INFO)? {
                result.push(resolved);
            }
        }
        Ok(dedupe_by_merge_key(result))
    }
}

/// Later duplicates supersede earlier ones but keep their later position, so
/// a loader overlay replaces vanilla libraries while staying behind them on
/// the classpath order.
pub fn dedupe_by_merge_key(libraries: Vec<ResolvedLibrary>) -> Vec<ResolvedLibrary> {
    let mut seen: HashSet<String> = HashSet::with_capacity(libraries.len());
    let mut kept: Vec<ResolvedLibrary> = libraries
        .into_iter()
        .rev()
        .filter(|library| {
            let key = MavenCoordinate::parse(&library.name)
                .map(|coordinate| coordinate.merge_key())
                .unwrap_or_else(|_| library.name.clone());
            seen.insert(key)
        })
        .collect();
    kept.reverse();
    kept
}

fn resolve_entry(library: &Value, platform: &PlatformInfo) -> Result<Option<ResolvedLibrary>> {
    let name = library["name"]
        .as_str()
        .ok_or(Error::InvalidVersionJson("library name".to_string()))?;
    let extract_exclude = library["extract"]["exclude"]
        .as_array()
        .map(|exclude| {
            exclude
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    // Explicit natives block: pick the platform classifier, `${arch}` is the
    // pointer width.
    if let Some(natives) = library["natives"].as_object() {
        let classifier_key = match natives.get(&native_os_key(platform)) {
            Some(Value::String(template)) => template.replace("${arch}", &platform.arch_bits),
            _ => return Ok(None),
        };
        let coordinate = MavenCoordinate {
            classifier: Some(classifier_key.clone()),
            ..MavenCoordinate::parse(name)?
        };
        let classifier_info = &library["downloads"]["classifiers"][&classifier_key];
        let path = classifier_info["path"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| coordinate.path());
        let url = classifier_info["url"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{DEFAULT_LIBRARY_REPOSITORY}{path}"));
        return Ok(Some(ResolvedLibrary {
            name: format!("{name}:{classifier_key}"),
            path,
            url,
            sha1: classifier_info["sha1"].as_str().map(str::to_string),
            size: classifier_info["size"].as_u64(),
            role: LibraryRole::Native,
            extract_exclude,
        }));
    }

    let coordinate = MavenCoordinate::parse(name)?;

    // Newer descriptors inline natives as plain artifacts with a
    // `natives-<os>[-<arch>]` classifier and no rules; keep the one matching
    // this host, drop the rest.
    let role = match &coordinate.classifier {
        Some(classifier) if classifier.starts_with("natives-") => {
            if !native_classifier_matches(classifier, platform) {
                return Ok(None);
            }
            LibraryRole::Native
        }
        _ => LibraryRole::Classpath,
    };

    let artifact = &library["downloads"]["artifact"];
    if artifact.is_object() {
        let path = artifact["path"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| coordinate.path());
        let url = artifact["url"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("{DEFAULT_LIBRARY_REPOSITORY}{path}"));
        return Ok(Some(ResolvedLibrary {
            name: name.to_string(),
            path,
            url,
            sha1: artifact["sha1"].as_str().map(str::to_string),
            size: artifact["size"].as_u64(),
            role,
            extract_exclude,
        }));
    }

    // Loader-style entry: bare coordinate plus a maven repository base.
    // The URL in a loader version.json does NOT include the path.
    let path = coordinate.path();
    let repository = library["url"].as_str().unwrap_or(DEFAULT_LIBRARY_REPOSITORY);
    let separator = if repository.ends_with('/') { "" } else { "/" };
    Ok(Some(ResolvedLibrary {
        name: name.to_string(),
        path: path.clone(),
        url: format!("{repository}{separator}{path}"),
        sha1: library["sha1"].as_str().map(str::to_string),
        size: library["size"].as_u64(),
        role,
        extract_exclude,
    }))
}

fn native_os_key(platform: &PlatformInfo) -> String {
    match platform.os_family {
        platform::OsFamily::Windows => "windows".to_string(),
        platform::OsFamily::Linux => "linux".to_string(),
        platform::OsFamily::Macos => "osx".to_string(),
    }
}

fn native_classifier_matches(classifier: &str, platform: &PlatformInfo) -> bool {
    let Some(rest) = classifier.strip_prefix("natives-") else {
        return false;
    };
    let (os_name, arch) = match rest.split_once('-') {
        Some((os_name, arch)) => (os_name, Some(arch)),
        None => (rest, None),
    };
    if !platform.os_family.matches_rule_name(os_name) {
        return false;
    }
    match arch {
        // No arch suffix means the default x86_64 build.
        None => platform.arch == "x86_64",
        Some(arch) => platform.arch_matches(arch.replace('_', "").replace("aarch", "arm").as_str())
            || platform.arch_matches(arch),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use platform::OsFamily;
    use serde_json::json;

    fn linux_x64() -> PlatformInfo {
        let mut platform = PlatformInfo::new();
        platform.os_family = OsFamily::Linux;
        platform.arch = "x86_64".to_string();
        platform.arch_bits = "64".to_string();
        platform
    }

    #[test]
    fn maven_coordinate_to_path() {
        let coordinate = MavenCoordinate::parse("org.ow2.asm:asm:9.6").unwrap();
        assert_eq!(coordinate.path(), "org/ow2/asm/asm/9.6/asm-9.6.jar");

        let coordinate =
            MavenCoordinate::parse("org.lwjgl:lwjgl:3.3.1:natives-linux").unwrap();
        assert_eq!(
            coordinate.path(),
            "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar"
        );

        let coordinate =
            MavenCoordinate::parse("de.oceanlabs.mcp:mcp_config:1.20.1-20230612.114412@zip")
                .unwrap();
        assert_eq!(
            coordinate.path(),
            "de/oceanlabs/mcp/mcp_config/1.20.1-20230612.114412/mcp_config-1.20.1-20230612.114412.zip"
        );
    }

    #[test]
    fn bad_coordinate_is_rejected() {
        assert!(MavenCoordinate::parse("only-one-part").is_err());
        assert!(MavenCoordinate::parse("a:b:c:d:e").is_err());
    }

    #[test]
    fn merge_key_separates_classifier_variants() {
        let plain = MavenCoordinate::parse("org.lwjgl:lwjgl:3.3.1").unwrap();
        let natives = MavenCoordinate::parse("org.lwjgl:lwjgl:3.3.1:natives-linux").unwrap();
        assert_ne!(plain.merge_key(), natives.merge_key());
        let newer = MavenCoordinate::parse("org.lwjgl:lwjgl:3.3.2").unwrap();
        assert_eq!(plain.merge_key(), newer.merge_key());
    }

    #[test]
    fn later_duplicates_supersede_earlier() {
        let library = |name: &str| ResolvedLibrary {
            name: name.to_string(),
            path: String::new(),
            url: String::new(),
            sha1: None,
            size: None,
            role: LibraryRole::Classpath,
            extract_exclude: vec![],
        };
        let deduped = dedupe_by_merge_key(vec![
            library("org.ow2.asm:asm:9.3"),
            library("net.fabricmc:fabric-loader:0.14.21"),
            library("org.ow2.asm:asm:9.6"),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].name, "net.fabricmc:fabric-loader:0.14.21");
        assert_eq!(deduped[1].name, "org.ow2.asm:asm:9.6");
    }

    #[test]
    fn explicit_natives_block_resolves_platform_classifier() {
        let entry = json!({
            "name": "org.lwjgl.lwjgl:lwjgl-platform:2.9.4",
            "natives": {
                "linux": "natives-linux",
                "windows": "natives-windows-${arch}",
                "osx": "natives-osx"
            },
            "downloads": {
                "classifiers": {
                    "natives-linux": {
                        "path": "org/lwjgl/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-linux.jar",
                        "sha1": "931074f46c795d2f7b30ed6395df5715cfd7675b",
                        "size": 579022,
                        "url": "https://libraries.minecraft.net/org/lwjgl/lwjgl/lwjgl-platform/2.9.4/lwjgl-platform-2.9.4-natives-linux.jar"
                    }
                }
            },
            "extract": {"exclude": ["META-INF/"]}
        });
        let resolved = resolve_entry(&entry, &linux_x64()).unwrap().unwrap();
        assert_eq!(resolved.role, LibraryRole::Native);
        assert!(resolved.path.ends_with("natives-linux.jar"));
        assert_eq!(resolved.extract_exclude, vec!["META-INF/"]);
        assert_eq!(
            resolved.sha1.as_deref(),
            Some("931074f46c795d2f7b30ed6395df5715cfd7675b")
        );
    }

    #[test]
    fn inline_natives_classifier_is_filtered_by_host() {
        let linux_entry = json!({
            "name": "org.lwjgl:lwjgl:3.3.1:natives-linux",
            "downloads": {"artifact": {
                "path": "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar",
                "sha1": "1de885aba434f934201b99f2f1afb142036ac189",
                "size": 110704,
                "url": "https://libraries.minecraft.net/org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar"
            }}
        });
        let windows_entry = json!({
            "name": "org.lwjgl:lwjgl:3.3.1:natives-windows",
            "downloads": {"artifact": {
                "path": "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-windows.jar",
                "sha1": "cd1a7e9b04bc33a6c3f6ea9377542233b22bc8b0",
                "size": 159361,
                "url": "https://libraries.minecraft.net/org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-windows.jar"
            }}
        });
        let platform = linux_x64();
        let resolved = resolve_entry(&linux_entry, &platform).unwrap().unwrap();
        assert_eq!(resolved.role, LibraryRole::Native);
        assert!(resolve_entry(&windows_entry, &platform).unwrap().is_none());
    }

    #[test]
    fn loader_entry_builds_maven_url() {
        let entry = json!({
            "name": "net.fabricmc:tiny-mappings-parser:0.3.0+build.17",
            "url": "https://maven.fabricmc.net/"
        });
        let resolved = resolve_entry(&entry, &linux_x64()).unwrap().unwrap();
        assert_eq!(resolved.role, LibraryRole::Classpath);
        assert_eq!(
            resolved.url,
            "https://maven.fabricmc.net/net/fabricmc/tiny-mappings-parser/0.3.0+build.17/tiny-mappings-parser-0.3.0+build.17.jar"
        );
    }

    #[test]
    fn plain_entry_falls_back_to_default_repository() {
        let entry = json!({"name": "com.mojang:brigadier:1.1.8"});
        let resolved = resolve_entry(&entry, &linux_x64()).unwrap().unwrap();
        assert_eq!(
            resolved.url,
            "https://libraries.minecraft.net/com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar"
        );
    }
}
