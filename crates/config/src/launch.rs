// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Launcher-wide launch defaults; instances override them individually.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LaunchConfig {
    /// JVM binary used when an instance has no `jvm_path_override`.
    /// Also runs the Forge install processors.
    #[serde(default = "default_java_path")]
    pub java_path: PathBuf,

    /// Game window width when the instance resolution is unset.
    #[serde(default = "default_width")]
    pub default_width: u32,

    /// Game window height when the instance resolution is unset.
    #[serde(default = "default_height")]
    pub default_height: u32,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            java_path: default_java_path(),
            default_width: default_width(),
            default_height: default_height(),
        }
    }
}

fn default_java_path() -> PathBuf {
    PathBuf::from("java")
}

fn default_width() -> u32 {
    854
}

fn default_height() -> u32 {
    480
}
