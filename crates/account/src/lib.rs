// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! Multi-account state and the authentication commands.
//!
//! `accounts.json` keeps only the non-secret account fields plus the active
//! account selection; refresh tokens live in the OS keyring and Minecraft
//! access tokens stay in memory for the lifetime of the session.

use std::collections::HashMap;

use chrono::Utc;
use log::{info, warn};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Runtime, command};
use uuid::Uuid;

use folder::{DATA_LOCATION, DataLocation};

pub mod error;
pub mod microsoft;
pub mod secret;

pub use error::*;
use microsoft::{DeviceCodeResponse, MinecraftSession};

/// Refresh ahead of expiry by this margin.
const EXPIRY_MARGIN_SECONDS: i64 = 300;

pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("account")
        .invoke_handler(tauri::generate_handler![
            get_accounts,
            start_authentication_flow,
            poll_device_code_authentication,
            login_to_account,
            get_account_skin
        ])
        .build()
}

#[derive(Clone, Serialize, Deserialize)]
pub struct StoredAccount {
    pub uuid: Uuid,
    pub name: String,
    pub skin_url: String,
}

/// The persisted, non-secret account set. Exactly one account may be active.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct AccountSet {
    pub active_account_uuid: Option<Uuid>,
    #[serde(default)]
    pub accounts: HashMap<Uuid, StoredAccount>,
}

// Single writer for accounts.json; the file is small and rewritten whole.
static ACCOUNTS_LOCK: Lazy<std::sync::Mutex<()>> = Lazy::new(|| std::sync::Mutex::new(()));

// In-memory Minecraft sessions; children launched earlier keep the token
// snapshot they were spawned with.
static SESSIONS: Lazy<std::sync::Mutex<HashMap<Uuid, MinecraftSession>>> =
    Lazy::new(|| std::sync::Mutex::new(HashMap::new()));

// Device code flows waiting for their poll command.
static PENDING_FLOWS: Lazy<std::sync::Mutex<HashMap<String, DeviceCodeResponse>>> =
    Lazy::new(|| std::sync::Mutex::new(HashMap::new()));

pub fn load_account_set(data_location: &DataLocation) -> Result<AccountSet> {
    let _guard = ACCOUNTS_LOCK.lock().expect("accounts lock");
    let path = data_location.get_accounts_json();
    if !path.exists() {
        return Ok(AccountSet::default());
    }
    Ok(serde_json::from_str(&std::fs::read_to_string(path)?)?)
}

fn save_account_set(account_set: &AccountSet, data_location: &DataLocation) -> Result<()> {
    let _guard = ACCOUNTS_LOCK.lock().expect("accounts lock");
    std::fs::write(
        data_location.get_accounts_json(),
        serde_json::to_string_pretty(account_set)?,
    )?;
    Ok(())
}

#[derive(Serialize)]
pub struct GetAccountsResponse {
    pub active_account: Option<Uuid>,
    pub accounts: HashMap<Uuid, StoredAccount>,
}

#[command]
async fn get_accounts() -> Result<GetAccountsResponse> {
    let account_set = load_account_set(&DATA_LOCATION)?;
    Ok(GetAccountsResponse {
        active_account: account_set.active_account_uuid,
        accounts: account_set.accounts,
    })
}

#[derive(Serialize)]
pub struct StartAuthenticationResponse {
    pub message: String,
    pub device_code: String,
}

#[command]
async fn start_authentication_flow() -> Result<StartAuthenticationResponse> {
    let flow = microsoft::request_device_code().await?;
    let response = StartAuthenticationResponse {
        message: flow.message.clone(),
        device_code: flow.device_code.clone(),
    };
    PENDING_FLOWS
        .lock()
        .expect("pending flows lock")
        .insert(flow.device_code.clone(), flow);
    Ok(response)
}

#[command]
async fn poll_device_code_authentication(device_code: String) -> Result<()> {
    let flow = PENDING_FLOWS
        .lock()
        .expect("pending flows lock")
        .remove(&device_code)
        .ok_or(Error::UnknownDeviceCode)?;
    match sign_in_with_flow(flow, &DATA_LOCATION).await {
        Ok(()) => Ok(()),
        Err(error) => {
            emit_authentication_error(&error);
            Err(error)
        }
    }
}

async fn sign_in_with_flow(flow: DeviceCodeResponse, data_location: &DataLocation) -> Result<()> {
    let msa_tokens = microsoft::poll_device_token(&flow).await?;
    let account = microsoft::login_with_msa_tokens(msa_tokens).await?;
    persist_account(&account, data_location).await?;
    info!("Signed in as {} ({})", account.name, account.uuid);
    Ok(())
}

/// Store a freshly authenticated account: refresh token into the keyring,
/// non-secret fields into `accounts.json`, session into memory. The new
/// account becomes active.
async fn persist_account(
    account: &microsoft::AuthenticatedAccount,
    data_location: &DataLocation,
) -> Result<()> {
    secret::store_refresh_token(account.uuid, account.msa_refresh_token.clone()).await?;
    let mut account_set = load_account_set(data_location)?;
    account_set.accounts.insert(
        account.uuid,
        StoredAccount {
            uuid: account.uuid,
            name: account.name.clone(),
            skin_url: account.skin_url.clone(),
        },
    );
    account_set.active_account_uuid = Some(account.uuid);
    save_account_set(&account_set, data_location)?;
    SESSIONS
        .lock()
        .expect("sessions lock")
        .insert(account.uuid, account.session.clone());
    Ok(())
}

#[command]
async fn login_to_account(uuid: Uuid) -> Result<()> {
    set_active_account(uuid, &DATA_LOCATION)
}

/// Activation is the only write to `active_account_uuid`.
pub fn set_active_account(uuid: Uuid, data_location: &DataLocation) -> Result<()> {
    let mut account_set = load_account_set(data_location)?;
    if !account_set.accounts.contains_key(&uuid) {
        return Err(Error::NotFound(uuid));
    }
    account_set.active_account_uuid = Some(uuid);
    save_account_set(&account_set, data_location)?;
    info!("Active account is now {uuid}");
    Ok(())
}

#[command]
async fn get_account_skin() -> Result<String> {
    let account_set = load_account_set(&DATA_LOCATION)?;
    let active = account_set
        .active_account_uuid
        .ok_or(Error::NoActiveAccount)?;
    Ok(account_set
        .accounts
        .get(&active)
        .ok_or(Error::NotFound(active))?
        .skin_url
        .clone())
}

/// Remove an account on explicit sign-out: secret, stored fields and cached
/// session. A removed active account leaves no account active.
pub async fn remove_account(uuid: Uuid, data_location: &DataLocation) -> Result<()> {
    secret::delete_refresh_token(uuid).await?;
    let mut account_set = load_account_set(data_location)?;
    account_set.accounts.remove(&uuid);
    if account_set.active_account_uuid == Some(uuid) {
        account_set.active_account_uuid = None;
    }
    save_account_set(&account_set, data_location)?;
    SESSIONS.lock().expect("sessions lock").remove(&uuid);
    Ok(())
}

/// Everything the launcher assembler needs about the player.
#[derive(Clone)]
pub struct LaunchSession {
    pub uuid: Uuid,
    pub name: String,
    pub access_token: String,
    pub xbox_uhs: String,
}

/// Produce a valid Minecraft session for the active account, refreshing
/// through the stored MSA refresh token when the cached token is within five
/// minutes of expiry.
///
/// Failures surface immediately via an `authentication-error` event; there
/// are no retries on this path.
pub async fn acquire_launch_session(data_location: &DataLocation) -> Result<LaunchSession> {
    match acquire_launch_session_inner(data_location).await {
        Ok(session) => Ok(session),
        Err(error) => {
            emit_authentication_error(&error);
            Err(error)
        }
    }
}

async fn acquire_launch_session_inner(data_location: &DataLocation) -> Result<LaunchSession> {
    let account_set = load_account_set(data_location)?;
    let uuid = account_set
        .active_account_uuid
        .ok_or(Error::NoActiveAccount)?;
    let stored = account_set
        .accounts
        .get(&uuid)
        .ok_or(Error::NotFound(uuid))?
        .clone();

    let cached = SESSIONS.lock().expect("sessions lock").get(&uuid).cloned();
    if let Some(session) = cached
        && session.expires_on > Utc::now().timestamp() + EXPIRY_MARGIN_SECONDS
    {
        return Ok(LaunchSession {
            uuid,
            name: stored.name,
            access_token: session.access_token,
            xbox_uhs: session.xbox_uhs,
        });
    }

    info!("Minecraft token for {uuid} is stale, refreshing");
    let refresh_token = secret::load_refresh_token(uuid).await?;
    let msa_tokens = microsoft::refresh_msa_tokens(&refresh_token).await?;
    let account = microsoft::login_with_msa_tokens(msa_tokens).await?;
    // The identity provider rotates refresh tokens; persist the new one.
    persist_account(&account, data_location).await?;
    Ok(LaunchSession {
        uuid: account.uuid,
        name: account.name.clone(),
        access_token: account.session.access_token.clone(),
        xbox_uhs: account.session.xbox_uhs.clone(),
    })
}

#[derive(Clone, Serialize)]
struct AuthenticationErrorPayload {
    kind: String,
    detail: String,
}

fn emit_authentication_error(error: &Error) {
    warn!("Authentication failed: {error}");
    shared::emit(
        "authentication-error",
        AuthenticationErrorPayload {
            kind: error.kind().to_string(),
            detail: error.to_string(),
        },
    );
}
