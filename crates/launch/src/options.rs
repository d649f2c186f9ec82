// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use uuid::Uuid;

use account::LaunchSession;
use config::Config;
use config::instance::InstanceConfig;
use folder::DataLocation;

/// Everything the assembler needs for one launch, flattened from the
/// launcher config, the instance config and the account session.
#[derive(Clone)]
pub struct LaunchOptions {
    pub java_path: PathBuf,
    pub player_name: String,
    pub player_uuid: Uuid,
    pub access_token: String,
    pub xbox_uhs: String,
    pub additional_jvm_arguments: String,
    pub game_directory: PathBuf,
    pub natives_directory: PathBuf,
    pub width: u32,
    pub height: u32,
    pub maximized: bool,
}

impl LaunchOptions {
    pub fn new(
        config: &Config,
        instance_config: &InstanceConfig,
        session: &LaunchSession,
        data_location: &DataLocation,
    ) -> Self {
        Self {
            java_path: instance_config
                .jvm_path_override
                .clone()
                .unwrap_or_else(|| config.launch.java_path.clone()),
            player_name: session.name.clone(),
            player_uuid: session.uuid,
            access_token: session.access_token.clone(),
            xbox_uhs: session.xbox_uhs.clone(),
            additional_jvm_arguments: instance_config.additional_jvm_arguments.clone(),
            game_directory: data_location.get_game_root(&instance_config.instance_name),
            natives_directory: data_location.get_natives_root(&instance_config.instance_name),
            width: instance_config.resolution.width,
            height: instance_config.resolution.height,
            maximized: instance_config.resolution.maximized,
        }
    }
}
