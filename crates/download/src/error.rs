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

    #[error("HTTP {0} from {1}")]
    HttpStatus(u16, String),

    #[error("checksum mismatch for {url}: expected {expected}, got {actual}")]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("size mismatch for {url}: expected {expected} bytes, got {actual}")]
    SizeMismatch {
        url: String,
        expected: u64,
        actual: u64,
    },
}

impl Error {
    /// Transient failures are retried with backoff; everything else is
    /// terminal. 4xx responses and integrity mismatches never retry.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(error) => {
                error.is_connect() || error.is_timeout() || error.is_request() || error.is_body()
            }
            Error::HttpStatus(status, _) => *status >= 500,
            _ => false,
        }
    }
}
