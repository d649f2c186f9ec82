// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::time::Duration;

use log::warn;
use once_cell::sync::{Lazy, OnceCell};
use tauri::Emitter;

pub static APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub static LAUNCHER_NAME: &str = "Borealis Launcher";

/// The main webview window, set once during application setup.
///
/// Left unset in the headless `--instance` code path.
pub static MAIN_WINDOW: OnceCell<tauri::WebviewWindow> = OnceCell::new();

pub static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    reqwest::ClientBuilder::new()
        .connect_timeout(Duration::from_secs(30))
        // Large asset objects on slow links; anything beyond this is a stuck transfer.
        .timeout(Duration::from_secs(600))
        .pool_idle_timeout(Duration::from_secs(60))
        .pool_max_idle_per_host(200)
        .use_rustls_tls()
        .user_agent(format!("BorealisLauncher/{APP_VERSION}"))
        .build()
        .expect("Failed to build HTTP client")
});

/// Emit an event to the main window, if one exists.
///
/// Event delivery is best effort; a closed window must never fail a launch
/// or a download that is already in flight.
pub fn emit<S: serde::Serialize + Clone>(event: &str, payload: S) {
    if let Some(window) = MAIN_WINDOW.get()
        && let Err(error) = window.emit(event, payload)
    {
        warn!("Could not emit {event}: {error}");
    }
}
