// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! The child-process supervisor.
//!
//! One supervisor task per running instance: it owns the child, tails both
//! stdio streams, tags lines, feeds the live buffer and the `latest.log`
//! appender, and reports exit. Subscribers only ever see message passing;
//! the UI never shares a buffer with the supervisor.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use log::{error, info, warn};
use once_cell::sync::Lazy;
use serde::Serialize;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::{mpsc, watch};

use folder::DataLocation;

use crate::error::*;
use crate::logs::{LogBuffer, TaggedLine, classify_line, is_initialized_sentinel, rotate_latest};

/// Pending lines flush to the UI at most this often, per instance.
const EMIT_INTERVAL: Duration = Duration::from_millis(20);

/// Grace between the terminate signal and the hard kill.
const TERMINATE_GRACE: Duration = Duration::from_secs(5);

struct RunningHandle {
    live_buffer: Arc<Mutex<LogBuffer>>,
    terminate: watch::Sender<bool>,
}

static RUNNING: Lazy<Mutex<HashMap<String, RunningHandle>>> =
    Lazy::new(|| Mutex::new(HashMap::new()));

#[derive(Clone, Serialize)]
struct LoggingPayload {
    instance_name: String,
    category: String,
    line: String,
}

#[derive(Clone, Serialize)]
struct StatePayload {
    instance_name: String,
    state: String,
}

#[derive(Clone, Serialize)]
struct ExitedPayload {
    instance_name: String,
    code: Option<i32>,
}

/// Reserve the single-writer slot of an instance.
///
/// The claim is taken before authentication and file checks so a second
/// `launch_instance` fails fast with `AlreadyRunning` and has no effect on
/// the first.
pub fn try_claim(instance_name: &str) -> Result<()> {
    let mut running = RUNNING.lock().expect("running table lock");
    if running.contains_key(instance_name) {
        return Err(Error::AlreadyRunning(instance_name.to_string()));
    }
    let (terminate, _) = watch::channel(false);
    running.insert(
        instance_name.to_string(),
        RunningHandle {
            live_buffer: Arc::new(Mutex::new(LogBuffer::default())),
            terminate,
        },
    );
    Ok(())
}

/// Drop a claim that never reached `spawn_instance` (preparation failed).
pub fn release_claim(instance_name: &str) {
    RUNNING
        .lock()
        .expect("running table lock")
        .remove(instance_name);
}

pub fn is_running(instance_name: &str) -> bool {
    RUNNING
        .lock()
        .expect("running table lock")
        .contains_key(instance_name)
}

pub fn running_instances() -> Vec<String> {
    RUNNING
        .lock()
        .expect("running table lock")
        .keys()
        .cloned()
        .collect()
}

/// Snapshot of the live buffer of a running instance.
pub fn live_log_snapshot(instance_name: &str) -> Option<Vec<TaggedLine>> {
    let running = RUNNING.lock().expect("running table lock");
    let handle = running.get(instance_name)?;
    Some(handle.live_buffer.lock().expect("live buffer lock").snapshot())
}

/// Spawn the game and hand it to a supervisor task. The claim for
/// `instance_name` must already be held.
pub async fn spawn_instance(
    instance_name: &str,
    program: &Path,
    arguments: Vec<String>,
    working_dir: PathBuf,
    data_location: &DataLocation,
) -> Result<()> {
    tokio::fs::create_dir_all(&working_dir).await?;
    let logs_root = data_location.get_logs_root(instance_name);
    tokio::fs::create_dir_all(&logs_root).await?;

    let mut child = tokio::process::Command::new(program)
        .args(&arguments)
        .current_dir(&working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|spawn_error| {
            release_claim(instance_name);
            Error::Child(spawn_error.to_string())
        })?;
    info!(
        "Spawned {} for instance {instance_name} (pid {:?})",
        program.display(),
        child.id()
    );
    shared::emit(
        "instance-state",
        StatePayload {
            instance_name: instance_name.to_string(),
            state: "Initializing".to_string(),
        },
    );

    let (live_buffer, mut terminate_rx) = {
        let running = RUNNING.lock().expect("running table lock");
        let handle = running
            .get(instance_name)
            .expect("spawn_instance without claim");
        (handle.live_buffer.clone(), handle.terminate.subscribe())
    };

    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    if let Some(stdout) = child.stdout.take() {
        tokio::spawn(forward_lines(stdout, line_tx.clone()));
    }
    if let Some(stderr) = child.stderr.take() {
        tokio::spawn(forward_lines(stderr, line_tx.clone()));
    }
    drop(line_tx);

    let instance_name = instance_name.to_string();
    let data_location = data_location.clone();
    tokio::spawn(async move {
        let latest_path = data_location
            .get_logs_root(&instance_name)
            .join("latest.log");
        let mut appender = match tokio::fs::File::create(&latest_path).await {
            Ok(file) => Some(BufWriter::new(file)),
            Err(create_error) => {
                warn!("Could not open {}: {create_error}", latest_path.display());
                None
            }
        };

        let mut initialized = false;
        let mut pending: Vec<LoggingPayload> = Vec::new();
        let mut emit_tick = tokio::time::interval(EMIT_INTERVAL);
        let mut terminating = false;

        loop {
            tokio::select! {
                received = line_rx.recv() => {
                    let Some(text) = received else { break };
                    let kind = classify_line(&text);
                    if !initialized && is_initialized_sentinel(&text) {
                        initialized = true;
                        shared::emit("instance-state", StatePayload {
                            instance_name: instance_name.clone(),
                            state: "Initialized".to_string(),
                        });
                    }
                    if let Some(appender) = appender.as_mut() {
                        let _ = appender.write_all(text.as_bytes()).await;
                        let _ = appender.write_all(b"\n").await;
                    }
                    live_buffer
                        .lock()
                        .expect("live buffer lock")
                        .push(TaggedLine { timestamp: Utc::now(), kind, text: text.clone() });
                    pending.push(LoggingPayload {
                        instance_name: instance_name.clone(),
                        category: kind.as_category().to_string(),
                        line: text,
                    });
                }
                _ = emit_tick.tick() => {
                    flush_pending(&mut pending);
                }
                changed = terminate_rx.changed() => {
                    if changed.is_ok() && *terminate_rx.borrow() && !terminating {
                        terminating = true;
                        request_termination(&mut child).await;
                    }
                }
            }
        }

        // Readers are done; the process is exiting or already gone.
        let exit_status = child.wait().await;
        if let Some(appender) = appender.as_mut() {
            let _ = appender.flush().await;
        }
        drop(appender);
        if let Err(rotate_error) = rotate_latest(&instance_name, &data_location) {
            warn!("Could not rotate latest.log for {instance_name}: {rotate_error}");
        }
        RUNNING
            .lock()
            .expect("running table lock")
            .remove(&instance_name);

        flush_pending(&mut pending);
        let code = match exit_status {
            Ok(status) => {
                if status.success() {
                    info!("Instance {instance_name} exited cleanly");
                } else {
                    error!("Instance {instance_name} exited with {status}");
                }
                status.code()
            }
            Err(wait_error) => {
                error!("Could not wait for instance {instance_name}: {wait_error}");
                None
            }
        };
        // instance-exited is the last event of a run.
        shared::emit(
            "instance-exited",
            ExitedPayload {
                instance_name: instance_name.clone(),
                code,
            },
        );
    });
    Ok(())
}

async fn forward_lines<R: tokio::io::AsyncRead + Unpin>(
    stream: R,
    sender: mpsc::UnboundedSender<String>,
) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if sender.send(line).is_err() {
            break;
        }
    }
}

fn flush_pending(pending: &mut Vec<LoggingPayload>) {
    for payload in pending.drain(..) {
        shared::emit("instance-logging", payload);
    }
}

/// Graceful stop: SIGTERM where the platform has it, wait, then kill.
async fn request_termination(child: &mut tokio::process::Child) {
    #[cfg(unix)]
    if let Some(pid) = child.id() {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
        if tokio::time::timeout(TERMINATE_GRACE, child.wait()).await.is_ok() {
            return;
        }
        warn!("Child {pid} ignored SIGTERM, killing");
    }
    let _ = child.start_kill();
}

/// Terminate every running instance; used on launcher shutdown.
pub async fn shutdown_all() {
    let names = running_instances();
    if names.is_empty() {
        return;
    }
    info!("Stopping {} running instance(s)", names.len());
    {
        let running = RUNNING.lock().expect("running table lock");
        for name in &names {
            if let Some(handle) = running.get(name) {
                let _ = handle.terminate.send(true);
            }
        }
    }
    let deadline = tokio::time::Instant::now() + TERMINATE_GRACE + Duration::from_secs(1);
    while tokio::time::Instant::now() < deadline {
        if running_instances().is_empty() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::{LineKind, list_sealed_logs, read_sealed_log, sealed_log_path};

    async fn wait_until_exited(instance_name: &str) {
        for _ in 0..200 {
            if !is_running(instance_name) {
                return;
            }
            tokio::time::sleep(Duration::from_millis(25)).await;
        }
        panic!("instance {instance_name} did not exit");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn supervises_a_short_lived_child() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let name = "SuperviseTest";
        std::fs::create_dir_all(location.get_logs_root(name)).unwrap();

        try_claim(name).unwrap();
        spawn_instance(
            name,
            Path::new("/bin/sh"),
            vec![
                "-c".to_string(),
                concat!(
                    "echo '[10:00:00] [main/INFO]: Setting user: Player'; ",
                    "echo '[10:00:01] [main/ERROR]: something broke' 1>&2; ",
                    "exit 0"
                )
                .to_string(),
            ],
            location.get_game_root(name),
            &location,
        )
        .await
        .unwrap();
        assert!(is_running(name));
        wait_until_exited(name).await;

        // latest.log rotated to a timestamped file holding both streams.
        let sealed = list_sealed_logs(name, &location).unwrap();
        assert_eq!(sealed.len(), 1);
        let lines = read_sealed_log(&sealed_log_path(name, &sealed[0], &location)).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().any(|line| line.kind == LineKind::Error));
        assert!(lines.iter().any(|line| line.text.contains("Setting user:")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn second_claim_is_rejected() {
        let name = "ClaimTest";
        try_claim(name).unwrap();
        let error = try_claim(name).unwrap_err();
        assert!(matches!(error, Error::AlreadyRunning(_)));
        release_claim(name);
        assert!(try_claim(name).is_ok());
        release_claim(name);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failed_spawn_releases_the_claim() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let name = "SpawnFailTest";
        std::fs::create_dir_all(location.get_logs_root(name)).unwrap();

        try_claim(name).unwrap();
        let error = spawn_instance(
            name,
            Path::new("/nonexistent/java"),
            vec![],
            location.get_game_root(name),
            &location,
        )
        .await
        .unwrap_err();
        assert!(matches!(error, Error::Child(_)));
        assert!(!is_running(name));
    }
}
