// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use serde::{Deserialize, Serialize};

/// Configuration for controlling download behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DownloadConfig {
    /// Maximum number of concurrent download tasks.
    ///
    /// This limits how many transfers can be in flight at the same time.
    /// A higher number increases parallelism, but may use more system/network
    /// resources. Default is `16`.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Attempts per file for transient failures (connect error, 5xx, read
    /// timeout). Backoff between attempts doubles starting at one second.
    /// Default is `4`.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_max_connections() -> usize {
    16
}

fn default_max_attempts() -> usize {
    4
}
