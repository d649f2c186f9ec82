// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
    time::{Duration, Instant},
};

use serde::{Deserialize, Serialize};

/// The phase a long-running file operation is in.
#[derive(Clone, Deserialize, Serialize)]
pub enum Step {
    VerifyExistingFiles,
    DownloadFiles,
}

/// Shared download progress counters.
///
/// `completed` and `total` count tasks; the byte counters track transfer
/// volume where the upstream reported a size. `completed` only ever grows
/// within one run, so emitted events are monotone.
#[derive(Clone)]
pub struct Progress {
    pub completed: Arc<AtomicU64>,
    pub total: Arc<AtomicU64>,
    pub bytes_done: Arc<AtomicU64>,
    pub bytes_total: Arc<AtomicU64>,
    pub step: Arc<Mutex<Step>>,
    last_emit: Arc<Mutex<Instant>>,
}

/// Payload of the `download-progress` event.
#[derive(Clone, Serialize)]
pub struct ProgressPayload {
    pub total: u64,
    pub completed: u64,
    pub bytes_done: u64,
    pub bytes_total: u64,
}

const EMIT_INTERVAL: Duration = Duration::from_millis(100);

impl Default for Progress {
    fn default() -> Self {
        Self {
            completed: Arc::new(AtomicU64::new(0)),
            total: Arc::new(AtomicU64::new(0)),
            bytes_done: Arc::new(AtomicU64::new(0)),
            bytes_total: Arc::new(AtomicU64::new(0)),
            step: Arc::new(Mutex::new(Step::VerifyExistingFiles)),
            last_emit: Arc::new(Mutex::new(Instant::now() - EMIT_INTERVAL)),
        }
    }
}

impl Progress {
    pub fn set_step(&self, step: Step) {
        let mut current = self
            .step
            .lock()
            .expect("Internal error: another thread hold lock and panic");
        *current = step;
    }

    fn payload(&self) -> ProgressPayload {
        ProgressPayload {
            total: self.total.load(Ordering::SeqCst),
            completed: self.completed.load(Ordering::SeqCst),
            bytes_done: self.bytes_done.load(Ordering::SeqCst),
            bytes_total: self.bytes_total.load(Ordering::SeqCst),
        }
    }

    /// Emit `download-progress`, capped at 10 Hz. Call freely from hot loops.
    pub fn send(&self) {
        let mut last_emit = self
            .last_emit
            .lock()
            .expect("Internal error: another thread hold lock and panic");
        if last_emit.elapsed() < EMIT_INTERVAL {
            return;
        }
        *last_emit = Instant::now();
        shared::emit("download-progress", self.payload());
    }

    /// Emit the final state of a run, bypassing the rate cap.
    pub fn send_final(&self) {
        shared::emit("download-progress", self.payload());
    }

    pub fn reset(&self) {
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(0, Ordering::SeqCst);
        self.bytes_done.store(0, Ordering::SeqCst);
        self.bytes_total.store(0, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_accumulate() {
        let progress = Progress::default();
        progress.total.store(10, Ordering::SeqCst);
        progress.completed.fetch_add(3, Ordering::SeqCst);
        progress.completed.fetch_add(2, Ordering::SeqCst);
        let payload = progress.payload();
        assert_eq!(payload.total, 10);
        assert_eq!(payload.completed, 5);
    }

    #[test]
    fn reset_clears_counters() {
        let progress = Progress::default();
        progress.total.store(7, Ordering::SeqCst);
        progress.bytes_done.store(1024, Ordering::SeqCst);
        progress.reset();
        let payload = progress.payload();
        assert_eq!(payload.total, 0);
        assert_eq!(payload.bytes_done, 0);
    }
}
