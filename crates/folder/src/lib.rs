// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! The application folder layout.
//!
//! Versions, libraries and assets are shared across instances; only the
//! `minecraft/` working tree, the extracted natives and the log store are
//! per-instance.

use std::{
    ffi::OsStr,
    fmt::Display,
    path::{Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};

use once_cell::sync::Lazy;
use serde::Serialize;

use platform::{OsFamily, PLATFORM_INFO};

pub static DATA_LOCATION: Lazy<DataLocation> = Lazy::new(DataLocation::default);

#[derive(Debug, Clone, Serialize)]
pub struct DataLocation {
    pub root: PathBuf,
    pub instances: PathBuf,
    pub versions: PathBuf,
    pub libraries: PathBuf,
    pub assets: PathBuf,
    pub temp: PathBuf,
    pub config: PathBuf,
}

impl DataLocation {
    pub fn new<S: AsRef<OsStr> + ?Sized>(data_folder: &S) -> Self {
        let root = Path::new(data_folder).to_path_buf();
        let temp_path = std::env::temp_dir().join(format!(
            "borealis-launcher-{}",
            uuid::Uuid::from_u128(
                SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .expect("Incorrect System Time")
                    .as_nanos(),
            )
        ));
        Self {
            instances: root.join("instances"),
            versions: root.join("versions"),
            libraries: root.join("libraries"),
            assets: root.join("assets"),
            temp: temp_path,
            config: root.join("config.toml"),
            root,
        }
    }

    pub fn init(&self) {
        std::fs::create_dir_all(&self.instances)
            .expect("Unable to create application data directory");
        std::fs::create_dir_all(&self.temp).expect("Could not create temp dir");
    }

    pub fn get_accounts_json(&self) -> PathBuf {
        self.root.join("accounts.json")
    }

    pub fn get_instance_root<P: AsRef<Path>>(&self, instance_name: P) -> PathBuf {
        self.instances.join(instance_name)
    }

    pub fn get_instance_json<P: AsRef<Path>>(&self, instance_name: P) -> PathBuf {
        self.get_instance_root(instance_name).join("instance.json")
    }

    /// The game working directory of an instance, `${game_directory}` at launch.
    pub fn get_game_root<P: AsRef<Path>>(&self, instance_name: P) -> PathBuf {
        self.get_instance_root(instance_name).join("minecraft")
    }

    /// Cleared and repopulated on every launch.
    pub fn get_natives_root<P: AsRef<Path>>(&self, instance_name: P) -> PathBuf {
        self.get_instance_root(instance_name).join("natives")
    }

    pub fn get_screenshots_root<P: AsRef<Path>>(&self, instance_name: P) -> PathBuf {
        self.get_instance_root(instance_name).join("screenshots")
    }

    pub fn get_logs_root<P: AsRef<Path>>(&self, instance_name: P) -> PathBuf {
        self.get_instance_root(instance_name).join("logs")
    }

    pub fn get_version_root<P: AsRef<Path>>(&self, version_id: P) -> PathBuf {
        self.versions.join(version_id)
    }

    pub fn get_version_json<P: AsRef<Path> + Display>(&self, version_id: P) -> PathBuf {
        self.get_version_root(&version_id)
            .join(format!("{version_id}.json"))
    }

    pub fn get_version_jar<P: AsRef<Path> + Display>(&self, version_id: P) -> PathBuf {
        self.get_version_root(&version_id)
            .join(format!("{version_id}.jar"))
    }

    pub fn get_library_by_path<P: AsRef<Path>>(&self, library_path: P) -> PathBuf {
        self.libraries.join(library_path)
    }

    pub fn get_assets_index(&self, index_id: &str) -> PathBuf {
        self.assets.join("indexes").join(format!("{index_id}.json"))
    }

    /// Content-addressed asset object path, `objects/<hash[0..2]>/<hash>`.
    pub fn get_asset_object(&self, hash: &str) -> PathBuf {
        self.assets.join("objects").join(&hash[0..2]).join(hash)
    }

    pub fn get_log_config<P: AsRef<Path>>(&self, version_id: P) -> PathBuf {
        self.get_version_root(version_id).join("log4j2.xml")
    }

    /// Forge installer work area, also where the run-once processor marker lives.
    pub fn get_forge_cache(&self, mcversion: &str, forge_version: &str) -> PathBuf {
        self.root
            .join("forge")
            .join(format!("{mcversion}-{forge_version}"))
    }
}

impl Default for DataLocation {
    fn default() -> Self {
        #[cfg(not(debug_assertions))]
        #[allow(unused_variables)]
        let application_folder_name = "borealis";
        #[cfg(debug_assertions)]
        #[allow(unused_variables)]
        let application_folder_name = "borealis-debug";
        #[cfg(test)]
        let application_folder_name = "borealis-test";
        let application_data_path = match PLATFORM_INFO.os_family {
            OsFamily::Windows => {
                PathBuf::from(std::env::var("APPDATA").expect("Could not found APP_DATA directory"))
                    .join(application_folder_name)
            }
            OsFamily::Macos => PathBuf::from(std::env::var("HOME").expect("Could not found home"))
                .join("Library/Application Support")
                .join(application_folder_name),
            OsFamily::Linux => PathBuf::from(std::env::var("HOME").expect("Could not found home"))
                .join(format!(".{application_folder_name}")),
        };
        Self::new(&application_data_path)
    }
}
