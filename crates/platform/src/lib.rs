// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::fmt::Display;

use once_cell::sync::Lazy;
use os_info::Version;
use serde::{Deserialize, Serialize};

pub static PLATFORM_INFO: Lazy<PlatformInfo> = Lazy::new(PlatformInfo::new);

/// Represents the high-level operating system family.
///
/// This is an abstraction over detailed OS types (e.g., Ubuntu, Windows 10) to group
/// them by family: Windows, Linux, or macOS.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
pub enum OsFamily {
    /// Microsoft Windows OS family
    Windows,

    /// Linux-based distributions (e.g., Ubuntu, Arch, Debian)
    Linux,

    /// Apple macOS family
    Macos,
}

impl Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "windows"),
            Self::Linux => write!(f, "linux"),
            Self::Macos => write!(f, "osx"),
        }
    }
}

impl OsFamily {
    /// Whether a `rules[].os.name` value from a version descriptor refers to
    /// this family. Mojang JSON uses `osx`, loader JSON sometimes `macos`.
    pub fn matches_rule_name(&self, name: &str) -> bool {
        match self {
            Self::Windows => name == "windows",
            Self::Linux => name == "linux",
            Self::Macos => name == "osx" || name == "macos",
        }
    }
}

/// Host facts the rule filter algebra is evaluated against.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct PlatformInfo {
    /// The target CPU architecture as spelled in version descriptors (e.g., "x86", "x86_64", "arm64").
    pub arch: String,

    /// Pointer-width spelling used by `${arch}` in natives classifiers ("64" or "32").
    pub arch_bits: String,

    /// The general OS family classification (Windows/Linux/macOS).
    pub os_family: OsFamily,

    /// The version of the OS (e.g., 10.15.7, 22.04, etc.).
    pub os_version: Version,
}

/// The path delimiter character used for classpath entries.
///
/// On Windows, this is `";"`, and on other systems it is `":"`.
#[cfg(windows)]
pub const DELIMITER: &str = ";";
#[cfg(not(windows))]
pub const DELIMITER: &str = ":";

impl PlatformInfo {
    /// Constructs a new [`PlatformInfo`] instance using compile-time and runtime system data.
    ///
    /// # Panics
    /// Panics if the OS is not supported by the program.
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        let os_family = if cfg!(target_os = "windows") {
            OsFamily::Windows
        } else if cfg!(target_os = "linux") {
            OsFamily::Linux
        } else if cfg!(target_os = "macos") {
            OsFamily::Macos
        } else {
            panic!("Sorry, but this program does not support your system!")
        };
        let os_info = os_info::get();
        Self {
            os_family,
            os_version: os_info.version().to_owned(),
            arch: if cfg!(target_arch = "x86_64") {
                "x86_64"
            } else if cfg!(target_arch = "x86") {
                "x86"
            } else if cfg!(target_arch = "aarch64") {
                "arm64"
            } else if cfg!(target_arch = "arm") {
                "arm32"
            } else {
                "unknown"
            }
            .to_string(),
            arch_bits: if cfg!(target_pointer_width = "64") {
                "64"
            } else {
                "32"
            }
            .to_string(),
        }
    }

    /// Whether a `rules[].os.arch` value matches this host. Descriptors mix
    /// several spellings for the same architecture.
    pub fn arch_matches(&self, arch: &str) -> bool {
        if arch.eq_ignore_ascii_case(&self.arch) {
            return true;
        }
        matches!(
            (arch, self.arch.as_str()),
            ("x86", "i386" | "i686") | ("amd64", "x86_64") | ("aarch64", "arm64")
        )
    }
}
