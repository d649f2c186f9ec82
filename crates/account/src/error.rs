// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

use std::result;

use serde::Serialize;
use serde_with::serde_as;
use thiserror::Error;
use uuid::Uuid;

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

    #[error("secret store: {0}")]
    SecretStore(String),

    #[error("response is missing {0}")]
    MissingKey(String),

    #[error("account {0} not found")]
    NotFound(Uuid),

    #[error("no account is active")]
    NoActiveAccount,

    #[error("this Microsoft account has no Xbox profile")]
    NoXboxAccount,

    #[error("Xbox Live is not available in this account's region")]
    RegionBanned,

    #[error("this account is a child account and needs to join a family")]
    ChildAccount,

    #[error("Xbox token service refused the sign-in (XErr {0})")]
    XstsDenied(u64),

    #[error("the stored refresh token was rejected, sign in again")]
    RefreshRejected,

    #[error("the device code expired before the sign-in completed")]
    DeviceCodeExpired,

    #[error("the sign-in was declined")]
    DeviceCodeDeclined,

    #[error("unknown device code, start a new authentication flow")]
    UnknownDeviceCode,

    #[error("this Microsoft account does not own Minecraft")]
    NoEntitlement,
}

impl Error {
    /// Tag used by `authentication-error` events.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Filesystem(_) => "Filesystem",
            Error::Network(_) => "Network",
            Error::Schema(_) => "Schema",
            Error::SecretStore(_) => "SecretStore",
            Error::MissingKey(_) => "Schema",
            Error::NotFound(_) => "NotFound",
            Error::NoActiveAccount => "NoActiveAccount",
            Error::NoXboxAccount => "NoXboxAccount",
            Error::RegionBanned => "RegionBanned",
            Error::ChildAccount => "ChildAccount",
            Error::XstsDenied(_) => "XstsDenied",
            Error::RefreshRejected => "RefreshRejected",
            Error::DeviceCodeExpired => "DeviceCodeExpired",
            Error::DeviceCodeDeclined => "DeviceCodeDeclined",
            Error::UnknownDeviceCode => "UnknownDeviceCode",
            Error::NoEntitlement => "NoEntitlement",
        }
    }
}
