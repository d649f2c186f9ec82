// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]
#![deny(clippy::unwrap_used)]

use folder::DATA_LOCATION;
use log::{LevelFilter, error, info};
use tauri::{Manager, Window, WindowEvent};
use tauri_plugin_log::{Target, TargetKind};

fn main() {
    DATA_LOCATION.init();
    if let Some(instance_name) = headless_instance_from_args() {
        run_headless(&instance_name);
        return;
    }

    info!("Borealis Launcher is starting up");
    tauri::Builder::default()
        .plugin(init_log_builder().build())
        .plugin(account::init())
        .plugin(curseforge::init())
        .plugin(install::init())
        .plugin(instance::init())
        .plugin(launch::init())
        .setup(|app| {
            let window = app
                .get_webview_window("main")
                .ok_or("no main window")?;
            shared::MAIN_WINDOW
                .set(window)
                .map_err(|_| "main window registered twice")?;
            info!("Main window loaded");
            Ok(())
        })
        .on_window_event(window_event_handler)
        .run(tauri::generate_context!())
        .expect("Failed to run app");
}

/// The single recognized flag: `--instance <name>` (short `-i`) runs a
/// headless launch of the named instance.
fn headless_instance_from_args() -> Option<String> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--instance" || arg == "-i" {
            return args.next();
        }
    }
    None
}

fn run_headless(instance_name: &str) {
    init_headless_logger();
    info!("Headless launch of {instance_name}");
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build async runtime");
    runtime.block_on(async {
        if let Err(launch_error) = launch::launch(instance_name, &DATA_LOCATION).await {
            error!("Launch failed: {launch_error}");
            std::process::exit(1);
        }
        while launch::process::is_running(instance_name) {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
        }
    });
}

fn diagnostics_enabled(name: &str) -> bool {
    std::env::var(name).is_ok_and(|value| value == "1")
}

fn base_level() -> LevelFilter {
    if diagnostics_enabled("DEBUG") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn init_log_builder() -> tauri_plugin_log::Builder {
    let mut log_builder = tauri_plugin_log::Builder::new()
        .clear_targets()
        .targets([
            Target::new(TargetKind::Stdout),
            Target::new(TargetKind::Webview),
            Target::new(TargetKind::Folder {
                path: DATA_LOCATION.root.join("launcher-logs"),
                file_name: None,
            }),
        ])
        .level(base_level())
        .max_file_size(50_000)
        .rotation_strategy(tauri_plugin_log::RotationStrategy::KeepAll);
    if diagnostics_enabled("REQWEST_DEBUG") {
        log_builder = log_builder.level_for("reqwest", LevelFilter::Debug);
    }
    if diagnostics_enabled("AUTHENTICATION") {
        log_builder = log_builder.level_for("account", LevelFilter::Debug);
    }
    log_builder
}

fn init_headless_logger() {
    let mut builder = env_logger::Builder::new();
    builder.filter_level(base_level());
    if diagnostics_enabled("REQWEST_DEBUG") {
        builder.filter_module("reqwest", LevelFilter::Debug);
    }
    if diagnostics_enabled("AUTHENTICATION") {
        builder.filter_module("account", LevelFilter::Debug);
    }
    builder.init();
}

fn window_event_handler(window: &Window, event: &WindowEvent) {
    if window.label() != "main" {
        return;
    };
    if let tauri::WindowEvent::CloseRequested { .. } = event {
        // Stop children and drop the temp area before the window goes away.
        tauri::async_runtime::block_on(launch::shutdown_all());
        match std::fs::remove_dir_all(&DATA_LOCATION.temp) {
            Ok(_) => info!("Temporary files cleared"),
            Err(error) if error.kind() != std::io::ErrorKind::NotFound => {
                error!("Could not clear temp folder")
            }
            _ => (),
        };
        window.close().expect("Could not close window");
    }
}
