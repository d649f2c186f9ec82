// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::{
    collections::HashSet,
    io::Read,
    path::PathBuf,
    sync::atomic::Ordering,
    time::Duration,
};

use futures::StreamExt;
use log::{debug, warn};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use sha2::Digest;
use tokio::io::AsyncWriteExt;

use config::download::DownloadConfig;
use shared::HTTP_CLIENT;
use task::{Progress, Step};

mod error;

pub use error::*;

/// What a fetched file is, used for logging and diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FileRole {
    Library,
    NativeLibrary,
    ClientJar,
    VersionJson,
    AssetIndex,
    AssetObject,
    LoggingConfig,
    Installer,
}

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum Checksum {
    Sha1(String),
    Sha256(String),
    None,
}

/// A single planned transfer: fetch `url`, verify, place at `file`.
#[derive(Clone, Serialize, Deserialize)]
pub struct FetchTask {
    pub url: String,
    pub file: PathBuf,
    pub checksum: Checksum,
    pub size: Option<u64>,
    pub role: FileRole,
}

enum Hasher {
    Sha1(sha1_smol::Sha1),
    Sha256(sha2::Sha256),
    None,
}

impl From<&Checksum> for Hasher {
    fn from(value: &Checksum) -> Self {
        match value {
            Checksum::Sha1(_) => Self::Sha1(sha1_smol::Sha1::new()),
            Checksum::Sha256(_) => Self::Sha256(sha2::Sha256::new()),
            Checksum::None => Self::None,
        }
    }
}

impl Hasher {
    fn update(&mut self, data: &[u8]) {
        match self {
            Self::Sha1(sha1_hasher) => sha1_hasher.update(data),
            Self::Sha256(sha256_hasher) => sha256_hasher.update(data),
            Self::None => (),
        }
    }

    fn hex_digest(self) -> Option<String> {
        match self {
            Self::Sha1(sha1_hasher) => Some(sha1_hasher.digest().to_string()),
            Self::Sha256(sha256_hasher) => Some(format!("{:02x}", sha256_hasher.finalize())),
            Self::None => None,
        }
    }
}

impl Checksum {
    fn expected_hex(&self) -> Option<&str> {
        match self {
            Self::Sha1(hex) | Self::Sha256(hex) => Some(hex),
            Self::None => None,
        }
    }

    fn matches(&self, digest: Option<&str>) -> bool {
        match (self.expected_hex(), digest) {
            (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual),
            (None, _) => true,
            (Some(_), None) => false,
        }
    }
}

/// Drop tasks that target a destination already claimed by an earlier task.
pub fn dedup_by_destination(tasks: Vec<FetchTask>) -> Vec<FetchTask> {
    let mut seen: HashSet<PathBuf> = HashSet::with_capacity(tasks.len());
    tasks
        .into_iter()
        .filter(|task| seen.insert(task.file.clone()))
        .collect()
}

/// Drop tasks whose destination already exists with a matching checksum.
///
/// Hashing existing files is CPU-bound, so the scan fans out over rayon.
/// A second run over an intact tree filters everything and performs zero
/// network requests.
pub fn filter_existing_and_verified_files(
    tasks: Vec<FetchTask>,
    progress: &Progress,
) -> Vec<FetchTask> {
    progress.set_step(Step::VerifyExistingFiles);
    let filter_op = |task: &FetchTask| {
        let mut file = match std::fs::File::open(&task.file) {
            Ok(file) => file,
            Err(_) => return true,
        };
        match verify_checksum_from_read(&mut file, &task.checksum) {
            // No checksum known: presence is the best we can check.
            None => false,
            Some(matches) => !matches,
        }
    };
    tasks.into_par_iter().filter(filter_op).collect()
}

fn verify_checksum_from_read<R: Read>(source: &mut R, checksum: &Checksum) -> Option<bool> {
    if checksum == &Checksum::None {
        return None;
    }
    let mut hasher = Hasher::from(checksum);
    let mut buffer = [0; 65536];
    loop {
        let bytes_read = source.read(&mut buffer).ok()?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }
    Some(checksum.matches(hasher.hex_digest().as_deref()))
}

/// Re-hash a file on disk against an expected checksum.
pub fn verify_file(file: &std::path::Path, checksum: &Checksum) -> bool {
    let mut file = match std::fs::File::open(file) {
        Ok(file) => file,
        Err(_) => return false,
    };
    verify_checksum_from_read(&mut file, checksum).unwrap_or(true)
}

/// Download every task, bounded by `max_connections` permits.
///
/// On success every destination exists with a verified checksum. A failed
/// task leaves at most a `.part` file next to its destination; destinations
/// are never half-written.
pub async fn download_concurrent(
    tasks: Vec<FetchTask>,
    progress: &Progress,
    download_config: &DownloadConfig,
) -> Result<()> {
    let tasks = filter_existing_and_verified_files(dedup_by_destination(tasks), progress);

    progress.reset();
    progress
        .total
        .store(tasks.len() as u64, Ordering::SeqCst);
    progress.bytes_total.store(
        tasks.iter().filter_map(|task| task.size).sum(),
        Ordering::SeqCst,
    );
    progress.set_step(Step::DownloadFiles);
    debug!("{} files to fetch", tasks.len());

    let result = futures::stream::iter(tasks)
        .map(|task| download_with_retry(task, download_config.max_attempts, progress))
        .buffer_unordered(download_config.max_connections.max(1))
        .collect::<Vec<Result<()>>>()
        .await;
    progress.send_final();
    result.into_iter().collect()
}

/// Download a single file outside the batch machinery (version JSON,
/// installer jars). Applies the same verify-and-rename discipline.
pub async fn download_single(task: &FetchTask) -> Result<()> {
    let progress = Progress::default();
    execute(task, &progress).await
}

async fn download_with_retry(
    task: FetchTask,
    max_attempts: usize,
    progress: &Progress,
) -> Result<()> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        let error = match execute(&task, progress).await {
            Ok(()) => {
                progress.completed.fetch_add(1, Ordering::SeqCst);
                progress.send();
                return Ok(());
            }
            Err(error) => error,
        };
        if !error.is_transient() || attempt >= max_attempts {
            return Err(error);
        }
        let backoff = Duration::from_secs(1 << (attempt - 1));
        warn!(
            "Download failed: {} (attempt {attempt}/{max_attempts}), retrying in {}s: {error}",
            task.url,
            backoff.as_secs()
        );
        tokio::time::sleep(backoff).await;
    }
}

fn part_path(task: &FetchTask) -> PathBuf {
    let name = task
        .file
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    task.file.with_file_name(format!("{name}.part"))
}

async fn execute(task: &FetchTask, progress: &Progress) -> Result<()> {
    if let Some(parent) = task.file.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut response = HTTP_CLIENT.get(&task.url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus(status.as_u16(), task.url.clone()));
    }

    let temp_path = part_path(task);
    let mut file = tokio::fs::File::create(&temp_path).await?;
    let mut hasher = Hasher::from(&task.checksum);
    let mut written: u64 = 0;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        hasher.update(&chunk);
        written += chunk.len() as u64;
        progress
            .bytes_done
            .fetch_add(chunk.len() as u64, Ordering::SeqCst);
        progress.send();
    }
    file.flush().await?;
    file.sync_all().await?;
    drop(file);

    // The temp file is kept on mismatch for inspection; the destination is
    // untouched either way.
    let digest = hasher.hex_digest();
    if !task.checksum.matches(digest.as_deref()) {
        return Err(Error::Integrity {
            url: task.url.clone(),
            expected: task.checksum.expected_hex().unwrap_or_default().to_string(),
            actual: digest.unwrap_or_default(),
        });
    }
    if let Some(expected) = task.size
        && expected != written
    {
        return Err(Error::SizeMismatch {
            url: task.url.clone(),
            expected,
            actual: written,
        });
    }

    tokio::fs::rename(&temp_path, &task.file).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sha1_of(data: &[u8]) -> String {
        let mut hasher = sha1_smol::Sha1::new();
        hasher.update(data);
        hasher.digest().to_string()
    }

    #[test]
    fn checksum_verification_from_stream() {
        let data = b"the quick brown fox";
        let good = Checksum::Sha1(sha1_of(data));
        assert_eq!(
            verify_checksum_from_read(&mut Cursor::new(data), &good),
            Some(true)
        );
        let bad = Checksum::Sha1("0000000000000000000000000000000000000000".to_string());
        assert_eq!(
            verify_checksum_from_read(&mut Cursor::new(data), &bad),
            Some(false)
        );
        assert_eq!(
            verify_checksum_from_read(&mut Cursor::new(data), &Checksum::None),
            None
        );
    }

    #[test]
    fn checksum_comparison_is_case_insensitive() {
        let checksum = Checksum::Sha1("ABCDEF0123".to_string());
        assert!(checksum.matches(Some("abcdef0123")));
    }

    #[test]
    fn dedup_keeps_first_task_per_destination() {
        let task = |url: &str, file: &str| FetchTask {
            url: url.to_string(),
            file: PathBuf::from(file),
            checksum: Checksum::None,
            size: None,
            role: FileRole::Library,
        };
        let deduped = dedup_by_destination(vec![
            task("https://a/1", "/tmp/x.jar"),
            task("https://a/2", "/tmp/x.jar"),
            task("https://a/3", "/tmp/y.jar"),
        ]);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].url, "https://a/1");
    }

    #[test]
    fn verified_files_are_filtered_out() {
        let dir = tempfile::tempdir().unwrap();
        let good_path = dir.path().join("good.bin");
        std::fs::write(&good_path, b"payload").unwrap();
        let corrupt_path = dir.path().join("corrupt.bin");
        std::fs::write(&corrupt_path, b"payloaX").unwrap();

        let task = |file: &PathBuf| FetchTask {
            url: "https://example.com/f".to_string(),
            file: file.clone(),
            checksum: Checksum::Sha1(sha1_of(b"payload")),
            size: None,
            role: FileRole::AssetObject,
        };
        let progress = Progress::default();
        let remaining = filter_existing_and_verified_files(
            vec![
                task(&good_path),
                task(&corrupt_path),
                task(&dir.path().join("missing.bin")),
            ],
            &progress,
        );
        let remaining_files: Vec<_> = remaining.iter().map(|t| t.file.clone()).collect();
        assert_eq!(remaining.len(), 2);
        assert!(remaining_files.contains(&corrupt_path));
        assert!(!remaining_files.contains(&good_path));
    }

    #[test]
    fn part_file_sits_next_to_destination() {
        let task = FetchTask {
            url: "https://example.com/f".to_string(),
            file: PathBuf::from("/data/libraries/a/b/c.jar"),
            checksum: Checksum::None,
            size: None,
            role: FileRole::Library,
        };
        assert_eq!(part_path(&task), PathBuf::from("/data/libraries/a/b/c.jar.part"));
    }
}
