// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! Command line assembly: placeholder substitution, classpath ordering and
//! the final argument vector.

use std::collections::HashMap;

use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;

use folder::DataLocation;
use platform::DELIMITER;
use version::{LibraryRole, ResolvedVersion};

use crate::options::LaunchOptions;

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{(.*?)}").expect("Internal Error"));

/// Replace every `${token}` with its mapped value. Unknown tokens become the
/// empty string.
pub fn substitute(template: &str, values: &HashMap<&str, String>) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &regex::Captures| {
            values.get(&caps[1]).cloned().unwrap_or_default()
        })
        .to_string()
}

/// Classpath entries in resolution order, client jar last.
pub fn build_classpath(resolved: &ResolvedVersion, data_location: &DataLocation) -> String {
    let mut entries: Vec<String> = resolved
        .libraries
        .iter()
        .filter(|library| library.role == LibraryRole::Classpath)
        .map(|library| {
            data_location
                .get_library_by_path(&library.path)
                .to_string_lossy()
                .to_string()
        })
        .collect();
    entries.push(
        data_location
            .get_version_jar(resolved.jar_id())
            .to_string_lossy()
            .to_string(),
    );
    entries.join(DELIMITER)
}

/// The substitution table of the assembler.
pub fn build_substitution_map<'a>(
    resolved: &'a ResolvedVersion,
    options: &'a LaunchOptions,
    data_location: &DataLocation,
) -> HashMap<&'a str, String> {
    let mut values: HashMap<&str, String> = HashMap::new();
    values.insert("auth_player_name", options.player_name.clone());
    values.insert("auth_uuid", options.player_uuid.simple().to_string());
    values.insert("auth_access_token", options.access_token.clone());
    values.insert("auth_xuid", options.xbox_uhs.clone());
    values.insert("user_type", "msa".to_string());
    values.insert("user_properties", "{}".to_string());
    values.insert("clientid", String::new());
    values.insert("version_name", resolved.id.clone());
    values.insert(
        "version_type",
        resolved
            .version_type
            .clone()
            .unwrap_or_else(|| "release".to_string()),
    );
    values.insert(
        "game_directory",
        options.game_directory.to_string_lossy().to_string(),
    );
    values.insert(
        "assets_root",
        data_location.assets.to_string_lossy().to_string(),
    );
    values.insert(
        "assets_index_name",
        resolved.assets.clone().unwrap_or_default(),
    );
    values.insert(
        "game_assets",
        data_location
            .assets
            .join("virtual")
            .join(resolved.assets.clone().unwrap_or_default())
            .to_string_lossy()
            .to_string(),
    );
    values.insert(
        "natives_directory",
        options.natives_directory.to_string_lossy().to_string(),
    );
    values.insert("launcher_name", shared::LAUNCHER_NAME.to_string());
    values.insert("launcher_version", shared::APP_VERSION.to_string());
    values.insert(
        "classpath",
        build_classpath(resolved, data_location),
    );
    values.insert(
        "library_directory",
        data_location.libraries.to_string_lossy().to_string(),
    );
    values.insert("classpath_separator", DELIMITER.to_string());
    values.insert("resolution_width", options.width.to_string());
    values.insert("resolution_height", options.height.to_string());
    values
}

/// Assemble the argument vector, in order: instance JVM arguments, resolved
/// JVM arguments, the log4j configuration argument, the main class, resolved
/// game arguments. Arguments that collapse to the empty string are dropped.
pub fn assemble_arguments(
    resolved: &ResolvedVersion,
    options: &LaunchOptions,
    data_location: &DataLocation,
) -> Vec<String> {
    let values = build_substitution_map(resolved, options, data_location);
    let mut arguments: Vec<String> = Vec::new();

    arguments.extend(
        options
            .additional_jvm_arguments
            .split_whitespace()
            .map(str::to_string),
    );
    arguments.extend(
        resolved
            .jvm_args
            .iter()
            .map(|argument| substitute(argument, &values)),
    );
    if let Some(client) = resolved.logging.get("client") {
        let log_config_path = data_location.get_log_config(resolved.jar_id());
        if log_config_path.is_file() {
            arguments.push(
                client
                    .argument
                    .replace("${path}", log_config_path.to_string_lossy().as_ref()),
            );
        }
    }
    arguments.push(resolved.main_class.clone());
    arguments.extend(
        resolved
            .game_args
            .iter()
            .map(|argument| substitute(argument, &values)),
    );
    if !options.maximized && !resolved.game_args.iter().any(|arg| arg == "--width") {
        arguments.extend([
            "--width".to_string(),
            options.width.to_string(),
            "--height".to_string(),
            options.height.to_string(),
        ]);
    }

    let arguments: Vec<String> = arguments
        .into_iter()
        .filter(|argument| !argument.is_empty())
        .collect();
    debug!("Assembled {} arguments", arguments.len());
    arguments
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use uuid::Uuid;
    use version::{DownloadInfo, ResolvedLibrary};

    fn options() -> LaunchOptions {
        LaunchOptions {
            java_path: PathBuf::from("java"),
            player_name: "Player".to_string(),
            player_uuid: Uuid::parse_str("069a79f4-44e9-4726-a5be-fca90e38aaf5").unwrap(),
            access_token: "token123".to_string(),
            xbox_uhs: "uhs".to_string(),
            additional_jvm_arguments: "-Xmx4G -Xms1G".to_string(),
            game_directory: PathBuf::from("/data/instances/T/minecraft"),
            natives_directory: PathBuf::from("/data/instances/T/natives"),
            width: 854,
            height: 480,
            maximized: false,
        }
    }

    fn resolved() -> ResolvedVersion {
        let mut resolved = ResolvedVersion {
            id: "1.20.1".to_string(),
            main_class: "net.minecraft.client.main.Main".to_string(),
            assets: Some("5".to_string()),
            version_type: Some("release".to_string()),
            jvm_args: vec![
                "-Djava.library.path=${natives_directory}".to_string(),
                "-cp".to_string(),
                "${classpath}".to_string(),
            ],
            game_args: vec![
                "--username".to_string(),
                "${auth_player_name}".to_string(),
                "--unknownToken".to_string(),
                "${not_a_real_placeholder}".to_string(),
            ],
            ..Default::default()
        };
        resolved.downloads.insert(
            "client".to_string(),
            DownloadInfo {
                sha1: String::new(),
                size: 0,
                url: String::new(),
            },
        );
        resolved.libraries.push(ResolvedLibrary {
            name: "com.mojang:brigadier:1.1.8".to_string(),
            path: "com/mojang/brigadier/1.1.8/brigadier-1.1.8.jar".to_string(),
            url: String::new(),
            sha1: None,
            size: None,
            role: LibraryRole::Classpath,
            extract_exclude: vec![],
        });
        resolved.libraries.push(ResolvedLibrary {
            name: "org.lwjgl:lwjgl:3.3.1:natives-linux".to_string(),
            path: "org/lwjgl/lwjgl/3.3.1/lwjgl-3.3.1-natives-linux.jar".to_string(),
            url: String::new(),
            sha1: None,
            size: None,
            role: LibraryRole::Native,
            extract_exclude: vec![],
        });
        resolved
    }

    #[test]
    fn unknown_placeholders_become_empty() {
        let values = HashMap::from([("known", "value".to_string())]);
        assert_eq!(substitute("${known}", &values), "value");
        assert_eq!(substitute("${unknown}", &values), "");
        assert_eq!(substitute("pre-${unknown}-post", &values), "pre--post");
    }

    #[test]
    fn classpath_ends_with_client_jar_and_skips_natives() {
        let location = DataLocation::new("/data");
        let classpath = build_classpath(&resolved(), &location);
        let entries: Vec<&str> = classpath.split(DELIMITER).collect();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].ends_with("brigadier-1.1.8.jar"));
        assert!(entries[1].ends_with("1.20.1.jar"));
        assert!(!classpath.contains("natives-linux"));
    }

    #[test]
    fn assembly_order_and_empty_arguments() {
        let location = DataLocation::new("/data");
        let arguments = assemble_arguments(&resolved(), &options(), &location);

        // Instance JVM arguments first.
        assert_eq!(arguments[0], "-Xmx4G");
        assert_eq!(arguments[1], "-Xms1G");
        // Resolved JVM arguments before the main class, game args after.
        let main_position = arguments
            .iter()
            .position(|argument| argument == "net.minecraft.client.main.Main")
            .unwrap();
        let cp_position = arguments.iter().position(|a| a == "-cp").unwrap();
        let username_position = arguments.iter().position(|a| a == "--username").unwrap();
        assert!(cp_position < main_position);
        assert!(username_position > main_position);
        // ${not_a_real_placeholder} collapsed to empty and was dropped;
        // its flag remains.
        assert!(arguments.contains(&"--unknownToken".to_string()));
        assert!(!arguments.iter().any(|argument| argument.is_empty()));
        // Resolution is appended when the profile has no width argument.
        assert!(arguments.contains(&"--width".to_string()));
        assert!(arguments.contains(&"854".to_string()));
    }

    #[test]
    fn substitution_map_uses_undashed_uuid() {
        let location = DataLocation::new("/data");
        let resolved = resolved();
        let options = options();
        let values = build_substitution_map(&resolved, &options, &location);
        assert_eq!(values["auth_uuid"], "069a79f444e94726a5befca90e38aaf5");
        assert_eq!(values["user_type"], "msa");
        assert_eq!(values["version_name"], "1.20.1");
    }
}
