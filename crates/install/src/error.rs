// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::result;

use serde::Serialize;
use serde_with::serde_as;
use thiserror::Error;

pub type Result<T> = result::Result<T, Error>;

#[serde_as]
#[derive(Debug, Error, Serialize)]
#[serde(tag = "kind", content = "message")]
pub enum Error {
    #[error(transparent)]
    Filesystem(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        std::io::Error,
    ),

    #[error(transparent)]
    Network(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        reqwest::Error,
    ),

    #[error(transparent)]
    Schema(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        serde_json::error::Error,
    ),

    #[error(transparent)]
    Download(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        download::Error,
    ),

    #[error(transparent)]
    Version(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        version::Error,
    ),

    #[error(transparent)]
    Instance(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        instance::Error,
    ),

    #[error(transparent)]
    Archive(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        zip::result::ZipError,
    ),

    #[error("unknown version {0}")]
    UnknownVersion(String),

    #[error("{0}")]
    Config(String),

    #[error("{loader} has no build for Minecraft {vanilla}")]
    ModloaderUnsupportedForVersion { loader: String, vanilla: String },

    #[error("install processor {step_index} exited with {exit_code}: {stderr_tail}")]
    InstallProcessorFailed {
        step_index: usize,
        exit_code: i32,
        stderr_tail: String,
    },

    #[error("archive is not an exported instance: {0}")]
    InvalidImportArchive(String),
}
