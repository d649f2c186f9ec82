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
    Instance(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        instance::Error,
    ),

    #[error(transparent)]
    Install(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        install::Error,
    ),

    #[error(transparent)]
    Auth(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        account::Error,
    ),

    #[error(transparent)]
    Version(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        version::Error,
    ),

    #[error(transparent)]
    Archive(
        #[from]
        #[serde_as(as = "serde_with::DisplayFromStr")]
        zip::result::ZipError,
    ),

    #[error("{0}")]
    Config(String),

    #[error("instance {0} is already running")]
    AlreadyRunning(String),

    #[error("could not spawn the game process: {0}")]
    Child(String),

    #[error("no log named {0}")]
    LogNotFound(String),
}
