// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! Launch pipeline: catalog load, token refresh, file check, natives
//! extraction, command assembly and process supervision.

use std::collections::HashMap;

use log::info;
use serde::Serialize;
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Runtime, command};

use folder::{DATA_LOCATION, DataLocation};

pub mod arguments;
pub mod error;
pub mod logs;
pub mod natives;
pub mod options;
pub mod process;

pub use error::*;
use logs::{RUNNING_LOG_ID, TaggedLine};
use options::LaunchOptions;
pub use process::shutdown_all;

pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("launch")
        .invoke_handler(tauri::generate_handler![
            launch_instance,
            get_logs,
            read_log_lines
        ])
        .build()
}

#[command]
async fn launch_instance(instance_name: String) -> Result<()> {
    launch(&instance_name, &DATA_LOCATION).await
}

/// Launch an instance and supervise it until exit.
///
/// The per-instance claim is taken first: a second launch of the same
/// instance fails with `AlreadyRunning` and leaves the first untouched.
/// Everything before the spawn can still fail; the claim is dropped on the
/// way out so the instance stays launchable.
pub async fn launch(instance_name: &str, data_location: &DataLocation) -> Result<()> {
    process::try_claim(instance_name)?;
    match prepare_and_spawn(instance_name, data_location).await {
        Ok(()) => Ok(()),
        Err(error) => {
            process::release_claim(instance_name);
            Err(error)
        }
    }
}

async fn prepare_and_spawn(instance_name: &str, data_location: &DataLocation) -> Result<()> {
    let config =
        config::load_config_file().map_err(|error| Error::Config(error.to_string()))?;
    let instance_config = instance::get_instance(instance_name, data_location)?;
    info!(
        "Launching {instance_name}: Minecraft {} ({} {})",
        instance_config.vanilla_version,
        instance_config.modloader_type,
        instance_config.modloader_version
    );

    // Token refresh happens before any file work; a rejected refresh aborts
    // the launch with no child spawned.
    let session = account::acquire_launch_session(data_location).await?;

    // Near-no-op on the second launch: hashes verify, nothing downloads.
    let resolved =
        install::ensure_instance_ready(&config, &instance_config, data_location).await?;

    let launch_options = LaunchOptions::new(&config, &instance_config, &session, data_location);
    natives::extract_natives(&resolved, &launch_options.natives_directory, data_location).await?;
    let command_arguments = arguments::assemble_arguments(&resolved, &launch_options, data_location);

    process::spawn_instance(
        instance_name,
        &launch_options.java_path,
        command_arguments,
        launch_options.game_directory.clone(),
        data_location,
    )
    .await
}

#[command]
async fn get_logs() -> Result<HashMap<String, HashMap<String, Vec<String>>>> {
    collect_logs(&DATA_LOCATION).await
}

/// Every known log of every instance, as raw line text keyed by log id.
pub async fn collect_logs(
    data_location: &DataLocation,
) -> Result<HashMap<String, HashMap<String, Vec<String>>>> {
    let mut result = HashMap::new();
    for instance_config in instance::list_instances(data_location).await? {
        let name = instance_config.instance_name;
        let mut logs: HashMap<String, Vec<String>> = HashMap::new();
        if let Some(snapshot) = process::live_log_snapshot(&name) {
            logs.insert(
                RUNNING_LOG_ID.to_string(),
                snapshot.into_iter().map(|line| line.text).collect(),
            );
        }
        for log_id in logs::list_sealed_logs(&name, data_location)? {
            let path = logs::sealed_log_path(&name, &log_id, data_location);
            let lines = logs::read_sealed_log(&path)?;
            logs.insert(log_id, lines.into_iter().map(|line| line.text).collect());
        }
        result.insert(name, logs);
    }
    Ok(result)
}

#[derive(Clone, Serialize)]
pub struct LogLine {
    pub line: String,
    #[serde(rename = "lineType")]
    pub line_type: String,
}

#[command]
async fn read_log_lines(instance_name: String, log_name: String) -> Result<Vec<LogLine>> {
    read_instance_log(&instance_name, &log_name, &DATA_LOCATION)
}

/// One log of one instance: the live buffer for `running`, a sealed file
/// (reclassified with the supervisor's rules) otherwise.
pub fn read_instance_log(
    instance_name: &str,
    log_name: &str,
    data_location: &DataLocation,
) -> Result<Vec<LogLine>> {
    let lines: Vec<TaggedLine> = if log_name == RUNNING_LOG_ID {
        process::live_log_snapshot(instance_name)
            .ok_or_else(|| Error::LogNotFound(log_name.to_string()))?
    } else {
        let path = logs::sealed_log_path(instance_name, log_name, data_location);
        if !path.is_file() {
            return Err(Error::LogNotFound(log_name.to_string()));
        }
        logs::read_sealed_log(&path)?
    };
    Ok(lines
        .into_iter()
        .map(|line| LogLine {
            line_type: line.kind.as_line_type().to_string(),
            line: line.text,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sealed_logs_read_back_with_line_types() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let logs_root = location.get_logs_root("T");
        std::fs::create_dir_all(&logs_root).unwrap();
        std::fs::write(
            logs_root.join("2024-03-01T10-00-00.log"),
            "[10:00:00] [main/INFO]: fine\n[10:00:01] [main/WARN]: hmm\n[10:00:02] [main/ERROR]: bad\n",
        )
        .unwrap();

        let lines = read_instance_log("T", "2024-03-01T10-00-00", &location).unwrap();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].line_type, "");
        assert_eq!(lines[1].line_type, "warning");
        assert_eq!(lines[2].line_type, "error");
    }

    #[test]
    fn missing_log_is_log_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let error = read_instance_log("T", "nope", &location).unwrap_err();
        assert!(matches!(error, Error::LogNotFound(_)));
        let error = read_instance_log("T", "running", &location).unwrap_err();
        assert!(matches!(error, Error::LogNotFound(_)));
    }
}
