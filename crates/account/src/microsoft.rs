// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! The Microsoft → Xbox Live → XSTS → Minecraft token chain.
//!
//! See <https://minecraft.wiki/w/Microsoft_authentication>.

use std::time::Duration;

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use shared::HTTP_CLIENT;

use crate::error::*;

const MICROSOFT_CLIENT_ID: &str = "7b3d3954-cf72-4a29-9d4e-ba6e4d2b31e9";
const MICROSOFT_SCOPES: &str = "XboxLive.signin offline_access";

const DEVICE_CODE_URL: &str =
    "https://login.microsoftonline.com/consumers/oauth2/v2.0/devicecode";
const TOKEN_URL: &str = "https://login.microsoftonline.com/consumers/oauth2/v2.0/token";
const XBOX_AUTH_URL: &str = "https://user.auth.xboxlive.com/user/authenticate";
const XSTS_AUTH_URL: &str = "https://xsts.auth.xboxlive.com/xsts/authorize";
const MINECRAFT_AUTH_URL: &str =
    "https://api.minecraftservices.com/authentication/login_with_xbox";
const ENTITLEMENT_URL: &str = "https://api.minecraftservices.com/entitlements/mcstore";
const PROFILE_URL: &str = "https://api.minecraftservices.com/minecraft/profile";

/// Shown when the profile has no active skin.
pub const DEFAULT_SKIN_URL: &str =
    "https://textures.minecraft.net/texture/31f477eb1a7beee631c2ca64d06f8f68fa93a3386d04452ab27f43acdf1b60cb";

// XSTS XErr values with a meaning the UI should distinguish.
const XERR_NO_XBOX_ACCOUNT: u64 = 2148916233;
const XERR_REGION_BANNED: u64 = 2148916235;
const XERR_CHILD_ACCOUNT: u64 = 2148916238;

#[derive(Clone, Deserialize)]
pub struct DeviceCodeResponse {
    pub user_code: String,
    pub device_code: String,
    pub verification_uri: String,
    /// Seconds the code stays valid.
    pub expires_in: u64,
    /// Server-mandated polling interval in seconds.
    pub interval: u64,
    /// Human readable sign-in instruction, shown verbatim by the UI.
    pub message: String,
}

#[derive(Clone)]
pub struct MsaTokens {
    pub access_token: String,
    pub refresh_token: String,
}

/// The Minecraft session produced at the end of the chain; held in memory
/// only.
#[derive(Clone)]
pub struct MinecraftSession {
    pub access_token: String,
    /// Unix timestamp the access token expires at.
    pub expires_on: i64,
    pub xbox_uhs: String,
}

#[derive(Clone)]
pub struct AuthenticatedAccount {
    pub uuid: Uuid,
    pub name: String,
    pub skin_url: String,
    pub msa_refresh_token: String,
    pub session: MinecraftSession,
}

/// Ask the identity endpoint for a device code the user completes in a
/// browser.
pub async fn request_device_code() -> Result<DeviceCodeResponse> {
    let response: DeviceCodeResponse = HTTP_CLIENT
        .post(DEVICE_CODE_URL)
        .form(&[
            ("client_id", MICROSOFT_CLIENT_ID),
            ("scope", MICROSOFT_SCOPES),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    info!("Started device code flow, code {}", response.user_code);
    Ok(response)
}

/// Poll the token endpoint until the user finishes the web flow.
///
/// Honors the server interval, backs off on `slow_down` and gives up when
/// `expires_in` elapses.
pub async fn poll_device_token(flow: &DeviceCodeResponse) -> Result<MsaTokens> {
    let deadline = Utc::now().timestamp() + flow.expires_in as i64;
    let mut interval = flow.interval.max(1);
    loop {
        if Utc::now().timestamp() >= deadline {
            return Err(Error::DeviceCodeExpired);
        }
        tokio::time::sleep(Duration::from_secs(interval)).await;

        let response = HTTP_CLIENT
            .post(TOKEN_URL)
            .form(&[
                ("client_id", MICROSOFT_CLIENT_ID),
                ("grant_type", "urn:ietf:params:oauth:grant-type:device_code"),
                ("device_code", &flow.device_code),
            ])
            .send()
            .await?;
        let body: Value = response.json().await?;
        if let Some(error) = body["error"].as_str() {
            match error {
                "authorization_pending" => continue,
                "slow_down" => {
                    interval += 5;
                    continue;
                }
                "expired_token" => return Err(Error::DeviceCodeExpired),
                "authorization_declined" => return Err(Error::DeviceCodeDeclined),
                other => {
                    debug!("Device token endpoint returned {other}");
                    return Err(Error::MissingKey(format!("token ({other})")));
                }
            }
        }
        return Ok(MsaTokens {
            access_token: string_key(&body, "access_token")?,
            refresh_token: string_key(&body, "refresh_token")?,
        });
    }
}

/// Redeem the stored refresh token for fresh MSA tokens.
pub async fn refresh_msa_tokens(refresh_token: &str) -> Result<MsaTokens> {
    let body: Value = HTTP_CLIENT
        .post(TOKEN_URL)
        .form(&[
            ("client_id", MICROSOFT_CLIENT_ID),
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("scope", MICROSOFT_SCOPES),
        ])
        .send()
        .await?
        .json()
        .await?;
    if body["error"].is_string() {
        return Err(Error::RefreshRejected);
    }
    Ok(MsaTokens {
        access_token: string_key(&body, "access_token")?,
        refresh_token: string_key(&body, "refresh_token")?,
    })
}

/// Run the Xbox/XSTS/Minecraft exchanges and fetch the game profile.
pub async fn login_with_msa_tokens(msa: MsaTokens) -> Result<AuthenticatedAccount> {
    let xbox = xbox_authenticate(&msa.access_token).await?;
    info!("Xbox Live sign-in succeeded");
    let xsts_token = xsts_authenticate(&xbox.token).await?;
    let (minecraft_access_token, expires_in) =
        minecraft_authenticate(&xbox.uhs, &xsts_token).await?;
    info!("Minecraft token acquired");
    check_entitlement(&minecraft_access_token).await?;

    let profile = get_profile(&minecraft_access_token).await?;
    Ok(AuthenticatedAccount {
        uuid: profile.uuid,
        name: profile.name,
        skin_url: profile.skin_url,
        msa_refresh_token: msa.refresh_token,
        session: MinecraftSession {
            access_token: minecraft_access_token,
            expires_on: Utc::now().timestamp() + expires_in,
            xbox_uhs: xbox.uhs,
        },
    })
}

struct XboxAuth {
    token: String,
    uhs: String,
}

#[derive(Serialize)]
struct XboxAuthBody<'a> {
    #[serde(rename = "Properties")]
    properties: XboxAuthProperties<'a>,
    #[serde(rename = "RelyingParty")]
    relying_party: &'a str,
    #[serde(rename = "TokenType")]
    token_type: &'a str,
}

#[derive(Serialize)]
struct XboxAuthProperties<'a> {
    #[serde(rename = "AuthMethod")]
    auth_method: &'a str,
    #[serde(rename = "SiteName")]
    site_name: &'a str,
    #[serde(rename = "RpsTicket")]
    rps_ticket: String,
}

async fn xbox_authenticate(msa_access_token: &str) -> Result<XboxAuth> {
    let body = XboxAuthBody {
        properties: XboxAuthProperties {
            auth_method: "RPS",
            site_name: "user.auth.xboxlive.com",
            rps_ticket: format!("d={msa_access_token}"),
        },
        relying_party: "http://auth.xboxlive.com",
        token_type: "JWT",
    };
    let response: Value = HTTP_CLIENT
        .post(XBOX_AUTH_URL)
        .json(&body)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(XboxAuth {
        token: string_key(&response, "Token")?,
        uhs: response["DisplayClaims"]["xui"][0]["uhs"]
            .as_str()
            .ok_or(Error::MissingKey("DisplayClaims.xui.uhs".to_string()))?
            .to_string(),
    })
}

#[derive(Serialize)]
struct XstsAuthBody<'a> {
    #[serde(rename = "Properties")]
    properties: XstsAuthProperties<'a>,
    #[serde(rename = "RelyingParty")]
    relying_party: &'a str,
    #[serde(rename = "TokenType")]
    token_type: &'a str,
}

#[derive(Serialize)]
struct XstsAuthProperties<'a> {
    #[serde(rename = "SandboxId")]
    sandbox_id: &'a str,
    #[serde(rename = "UserTokens")]
    user_tokens: [&'a str; 1],
}

async fn xsts_authenticate(xbl_token: &str) -> Result<String> {
    let body = XstsAuthBody {
        properties: XstsAuthProperties {
            sandbox_id: "RETAIL",
            user_tokens: [xbl_token],
        },
        relying_party: "rp://api.minecraftservices.com/",
        token_type: "JWT",
    };
    let response = HTTP_CLIENT.post(XSTS_AUTH_URL).json(&body).send().await?;
    let status = response.status();
    let payload: Value = response.json().await?;
    if !status.is_success() {
        return Err(map_xsts_error(&payload));
    }
    string_key(&payload, "Token")
}

fn map_xsts_error(payload: &Value) -> Error {
    match payload["XErr"].as_u64() {
        Some(XERR_NO_XBOX_ACCOUNT) => Error::NoXboxAccount,
        Some(XERR_REGION_BANNED) => Error::RegionBanned,
        Some(XERR_CHILD_ACCOUNT) => Error::ChildAccount,
        Some(other) => Error::XstsDenied(other),
        None => Error::MissingKey("XErr".to_string()),
    }
}

async fn minecraft_authenticate(uhs: &str, xsts_token: &str) -> Result<(String, i64)> {
    let response: Value = HTTP_CLIENT
        .post(MINECRAFT_AUTH_URL)
        .json(&serde_json::json!({
            "identityToken": format!("XBL3.0 x={uhs}; {xsts_token}")
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let expires_in = response["expires_in"].as_i64().unwrap_or(86400);
    Ok((string_key(&response, "access_token")?, expires_in))
}

/// The account must own the game; Game Pass entitlements also show up here.
async fn check_entitlement(minecraft_access_token: &str) -> Result<()> {
    let response: Value = HTTP_CLIENT
        .get(ENTITLEMENT_URL)
        .bearer_auth(minecraft_access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let owned = response["items"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .any(|item| item["name"].as_str() == Some("game_minecraft"))
        })
        .unwrap_or(false);
    if owned { Ok(()) } else { Err(Error::NoEntitlement) }
}

struct Profile {
    uuid: Uuid,
    name: String,
    skin_url: String,
}

async fn get_profile(minecraft_access_token: &str) -> Result<Profile> {
    let response: Value = HTTP_CLIENT
        .get(PROFILE_URL)
        .bearer_auth(minecraft_access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    let uuid = Uuid::parse_str(&string_key(&response, "id")?)
        .map_err(|_| Error::MissingKey("profile id".to_string()))?;
    Ok(Profile {
        uuid,
        name: string_key(&response, "name")?,
        skin_url: active_skin_url(&response),
    })
}

fn active_skin_url(profile: &Value) -> String {
    profile["skins"]
        .as_array()
        .and_then(|skins| {
            skins
                .iter()
                .find(|skin| skin["state"].as_str() == Some("ACTIVE"))
        })
        .and_then(|skin| skin["url"].as_str())
        .unwrap_or(DEFAULT_SKIN_URL)
        .to_string()
}

fn string_key(value: &Value, key: &str) -> Result<String> {
    value[key]
        .as_str()
        .map(str::to_string)
        .ok_or(Error::MissingKey(key.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn xsts_error_codes_map_to_typed_errors() {
        assert!(matches!(
            map_xsts_error(&json!({"XErr": 2148916233u64})),
            Error::NoXboxAccount
        ));
        assert!(matches!(
            map_xsts_error(&json!({"XErr": 2148916235u64})),
            Error::RegionBanned
        ));
        assert!(matches!(
            map_xsts_error(&json!({"XErr": 2148916238u64})),
            Error::ChildAccount
        ));
        assert!(matches!(
            map_xsts_error(&json!({"XErr": 2148916236u64})),
            Error::XstsDenied(2148916236)
        ));
    }

    #[test]
    fn active_skin_is_preferred() {
        let profile = json!({"skins": [
            {"state": "INACTIVE", "url": "https://textures.minecraft.net/texture/old"},
            {"state": "ACTIVE", "url": "https://textures.minecraft.net/texture/current"}
        ]});
        assert_eq!(
            active_skin_url(&profile),
            "https://textures.minecraft.net/texture/current"
        );
    }

    #[test]
    fn missing_skin_falls_back_to_steve() {
        assert_eq!(active_skin_url(&json!({"skins": []})), DEFAULT_SKIN_URL);
        assert_eq!(active_skin_url(&json!({})), DEFAULT_SKIN_URL);
    }

    #[test]
    fn undashed_profile_ids_parse() {
        let uuid = Uuid::parse_str("069a79f444e94726a5befca90e38aaf5").unwrap();
        assert_eq!(uuid.to_string(), "069a79f4-44e9-4726-a5be-fca90e38aaf5");
    }
}
