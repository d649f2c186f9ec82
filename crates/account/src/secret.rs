// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! OS keyring adapter.
//!
//! The MSA refresh token is the only persisted secret; it is stored under
//! `account:<uuid>` and never written to `accounts.json`. Keyring backends
//! block, so every call goes through the blocking pool.

use keyring::Entry;
use uuid::Uuid;

use crate::error::*;

const SERVICE: &str = "borealis-launcher";

fn entry(uuid: Uuid) -> Result<Entry> {
    Entry::new(SERVICE, &format!("account:{uuid}"))
        .map_err(|error| Error::SecretStore(error.to_string()))
}

pub async fn store_refresh_token(uuid: Uuid, refresh_token: String) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        entry(uuid)?
            .set_password(&refresh_token)
            .map_err(|error| Error::SecretStore(error.to_string()))
    })
    .await
    .map_err(|join_error| Error::SecretStore(join_error.to_string()))?
}

pub async fn load_refresh_token(uuid: Uuid) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        entry(uuid)?
            .get_password()
            .map_err(|error| match error {
                keyring::Error::NoEntry => Error::RefreshRejected,
                other => Error::SecretStore(other.to_string()),
            })
    })
    .await
    .map_err(|join_error| Error::SecretStore(join_error.to_string()))?
}

pub async fn delete_refresh_token(uuid: Uuid) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        match entry(uuid)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(Error::SecretStore(error.to_string())),
        }
    })
    .await
    .map_err(|join_error| Error::SecretStore(join_error.to_string()))?
}
