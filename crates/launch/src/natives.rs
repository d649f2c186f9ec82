// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! Native library extraction.
//!
//! The natives directory is cleared and rebuilt on every launch: the set of
//! native archives changes with the profile, and stale files from an earlier
//! profile must not stay on `java.library.path`.

use std::io::Read;
use std::path::Path;

use log::{debug, info};

use folder::DataLocation;
use version::{LibraryRole, ResolvedVersion};

use crate::error::*;

pub async fn extract_natives(
    resolved: &ResolvedVersion,
    natives_dir: &Path,
    data_location: &DataLocation,
) -> Result<()> {
    let natives: Vec<_> = resolved
        .libraries
        .iter()
        .filter(|library| library.role == LibraryRole::Native)
        .cloned()
        .collect();

    if natives_dir.exists() {
        tokio::fs::remove_dir_all(natives_dir).await?;
    }
    tokio::fs::create_dir_all(natives_dir).await?;

    let natives_dir = natives_dir.to_path_buf();
    let data_location = data_location.clone();
    let count = natives.len();
    tokio::task::spawn_blocking(move || -> Result<()> {
        for library in natives {
            let archive_path = data_location.get_library_by_path(&library.path);
            debug!("Extracting {} into {}", library.name, natives_dir.display());
            extract_archive(&archive_path, &natives_dir, &library.extract_exclude)?;
        }
        Ok(())
    })
    .await
    .map_err(|join_error| Error::Child(format!("natives extraction failed: {join_error}")))??;
    info!("Extracted {count} native archives");
    Ok(())
}

fn is_excluded(entry_name: &str, exclude: &[String]) -> bool {
    // META-INF is never extracted.
    entry_name.starts_with("META-INF/")
        || exclude.iter().any(|prefix| entry_name.starts_with(prefix))
}

fn extract_archive(archive_path: &Path, target_dir: &Path, exclude: &[String]) -> Result<()> {
    let file = std::fs::File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        if entry.is_dir() || is_excluded(entry.name(), exclude) {
            continue;
        }
        let target = target_dir.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut content = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut content)?;
        // Write-then-rename keeps a crashed extraction from leaving a
        // half-written shared object behind.
        let temp = target.with_extension("part");
        std::fs::write(&temp, &content)?;
        std::fs::rename(&temp, &target)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn native_jar(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("native.jar");
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        for (name, content) in [
            ("libglfw.so", b"elf".as_slice()),
            ("META-INF/MANIFEST.MF", b"Manifest-Version: 1.0"),
            ("docs/readme.txt", b"docs"),
        ] {
            writer.start_file(name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content).unwrap();
        }
        writer.finish().unwrap();
        path
    }

    #[test]
    fn exclusion_rules() {
        assert!(is_excluded("META-INF/MANIFEST.MF", &[]));
        assert!(is_excluded(
            "docs/readme.txt",
            &["docs/".to_string()]
        ));
        assert!(!is_excluded("libglfw.so", &["docs/".to_string()]));
    }

    #[test]
    fn extracts_filtered_entries() {
        let dir = tempfile::tempdir().unwrap();
        let archive = native_jar(dir.path());
        let target = dir.path().join("natives");
        std::fs::create_dir_all(&target).unwrap();

        extract_archive(&archive, &target, &["docs/".to_string()]).unwrap();
        assert!(target.join("libglfw.so").is_file());
        assert!(!target.join("META-INF").exists());
        assert!(!target.join("docs").exists());
        assert!(!target.join("libglfw.part").exists());
    }
}
