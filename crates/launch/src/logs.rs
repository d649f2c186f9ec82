// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! The per-instance structured log store.
//!
//! While an instance runs its lines accumulate in a bounded in-memory buffer
//! (log id `running`) and stream through a buffered appender into
//! `logs/latest.log`. On exit the file rotates to a timestamped name; sealed
//! files are re-read on demand and kept parsed in a small LRU.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;

use folder::DataLocation;

use crate::error::*;

/// Live buffers never grow past this many lines; the full stream is on disk.
const LIVE_BUFFER_CAPACITY: usize = 10_000;

/// Sealed buffers kept parsed in memory.
const SEALED_LRU_CAPACITY: usize = 4;

pub const RUNNING_LOG_ID: &str = "running";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LineKind {
    Info,
    Warn,
    Error,
}

impl LineKind {
    /// The `lineType` spelling of the RPC surface.
    pub fn as_line_type(&self) -> &'static str {
        match self {
            LineKind::Info => "",
            LineKind::Warn => "warning",
            LineKind::Error => "error",
        }
    }

    /// The `category` spelling of `instance-logging` events.
    pub fn as_category(&self) -> &'static str {
        match self {
            LineKind::Info => "info",
            LineKind::Warn => "warn",
            LineKind::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TaggedLine {
    pub timestamp: DateTime<Utc>,
    pub kind: LineKind,
    pub text: String,
}

/// Classification only tags lines; every line is retained regardless.
pub fn classify_line(line: &str) -> LineKind {
    if line.contains("/ERROR]:") {
        LineKind::Error
    } else if line.contains("/WARN]:") {
        LineKind::Warn
    } else {
        LineKind::Info
    }
}

/// Lines that mark the game as initialized in the UI.
pub fn is_initialized_sentinel(line: &str) -> bool {
    line.contains("Setting user:") || line.contains("Initializing LWJGL OpenAL")
}

#[derive(Default)]
pub struct LogBuffer {
    lines: VecDeque<TaggedLine>,
}

impl LogBuffer {
    pub fn push(&mut self, line: TaggedLine) {
        if self.lines.len() == LIVE_BUFFER_CAPACITY {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    pub fn snapshot(&self) -> Vec<TaggedLine> {
        self.lines.iter().cloned().collect()
    }
}

struct SealedEntry {
    path: PathBuf,
    lines: Vec<TaggedLine>,
}

static SEALED_LRU: Lazy<Mutex<VecDeque<SealedEntry>>> = Lazy::new(|| Mutex::new(VecDeque::new()));

/// Read a sealed log file, reclassifying each line with the same rules the
/// supervisor applies to the live stream.
pub fn read_sealed_log(path: &Path) -> Result<Vec<TaggedLine>> {
    {
        let lru = SEALED_LRU.lock().expect("sealed lru lock");
        if let Some(entry) = lru.iter().find(|entry| entry.path == path) {
            return Ok(entry.lines.clone());
        }
    }
    let content = std::fs::read_to_string(path)?;
    let timestamp = Utc::now();
    let lines: Vec<TaggedLine> = content
        .lines()
        .map(|line| TaggedLine {
            timestamp,
            kind: classify_line(line),
            text: line.to_string(),
        })
        .collect();
    let mut lru = SEALED_LRU.lock().expect("sealed lru lock");
    lru.push_back(SealedEntry {
        path: path.to_path_buf(),
        lines: lines.clone(),
    });
    if lru.len() > SEALED_LRU_CAPACITY {
        lru.pop_front();
    }
    Ok(lines)
}

fn invalidate_sealed_cache(logs_root: &Path) {
    SEALED_LRU
        .lock()
        .expect("sealed lru lock")
        .retain(|entry| !entry.path.starts_with(logs_root));
}

/// Rotate `latest.log` to a timestamped file after the process exits.
pub fn rotate_latest(instance_name: &str, data_location: &DataLocation) -> Result<()> {
    let logs_root = data_location.get_logs_root(instance_name);
    let latest = logs_root.join("latest.log");
    if !latest.is_file() {
        return Ok(());
    }
    let rotated = logs_root.join(format!(
        "{}.log",
        Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f")
    ));
    std::fs::rename(&latest, &rotated)?;
    invalidate_sealed_cache(&logs_root);
    Ok(())
}

/// Rotated log ids (file basenames without extension), newest first.
pub fn list_sealed_logs(instance_name: &str, data_location: &DataLocation) -> Result<Vec<String>> {
    let logs_root = data_location.get_logs_root(instance_name);
    let mut ids = Vec::new();
    let Ok(entries) = std::fs::read_dir(&logs_root) else {
        return Ok(ids);
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|extension| extension.to_str()) != Some("log") {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        if stem == "latest" {
            continue;
        }
        ids.push(stem.to_string());
    }
    ids.sort_by(|a, b| b.cmp(a));
    Ok(ids)
}

pub fn sealed_log_path(
    instance_name: &str,
    log_id: &str,
    data_location: &DataLocation,
) -> PathBuf {
    data_location
        .get_logs_root(instance_name)
        .join(format!("{log_id}.log"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_rules() {
        assert_eq!(
            classify_line("[12:00:00] [Render thread/ERROR]: boom"),
            LineKind::Error
        );
        assert_eq!(
            classify_line("[12:00:00] [Worker-1/WARN]: careful"),
            LineKind::Warn
        );
        assert_eq!(
            classify_line("[12:00:00] [Render thread/INFO]: hello"),
            LineKind::Info
        );
        assert_eq!(classify_line("bare line"), LineKind::Info);
    }

    #[test]
    fn line_type_spelling() {
        assert_eq!(LineKind::Info.as_line_type(), "");
        assert_eq!(LineKind::Warn.as_line_type(), "warning");
        assert_eq!(LineKind::Error.as_line_type(), "error");
    }

    #[test]
    fn sentinels() {
        assert!(is_initialized_sentinel(
            "[12:00:00] [Render thread/INFO]: Setting user: Player"
        ));
        assert!(is_initialized_sentinel(
            "[12:00:01] [Render thread/INFO]: Initializing LWJGL OpenAL"
        ));
        assert!(!is_initialized_sentinel("[12:00:02] [Render thread/INFO]: Done"));
    }

    #[test]
    fn live_buffer_is_bounded() {
        let mut buffer = LogBuffer::default();
        for index in 0..(LIVE_BUFFER_CAPACITY + 10) {
            buffer.push(TaggedLine {
                timestamp: Utc::now(),
                kind: LineKind::Info,
                text: format!("line {index}"),
            });
        }
        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.len(), LIVE_BUFFER_CAPACITY);
        assert_eq!(snapshot[0].text, "line 10");
    }

    #[test]
    fn rotation_renames_latest() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let logs_root = location.get_logs_root("T");
        std::fs::create_dir_all(&logs_root).unwrap();
        std::fs::write(logs_root.join("latest.log"), "a\nb\n").unwrap();

        rotate_latest("T", &location).unwrap();
        assert!(!logs_root.join("latest.log").exists());
        let sealed = list_sealed_logs("T", &location).unwrap();
        assert_eq!(sealed.len(), 1);

        let lines = read_sealed_log(&sealed_log_path("T", &sealed[0], &location)).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].text, "a");
    }

    #[test]
    fn sealed_reads_reclassify() {
        let dir = tempfile::tempdir().unwrap();
        let location = DataLocation::new(dir.path());
        let logs_root = location.get_logs_root("T");
        std::fs::create_dir_all(&logs_root).unwrap();
        let path = logs_root.join("2024-03-01T10-00-00.log");
        std::fs::write(
            &path,
            "[10:00:00] [main/INFO]: ok\n[10:00:01] [main/ERROR]: bad\n",
        )
        .unwrap();
        let lines = read_sealed_log(&path).unwrap();
        assert_eq!(lines[0].kind, LineKind::Info);
        assert_eq!(lines[1].kind, LineKind::Error);
    }
}
