// Borealis Launcher
// Copyright 2024-2026 Borealis Contributors. All rights reserved.
// SPDX-License-Identifier: GPL-3.0-only

//! Read-only CurseForge v1 API adapter for the modpack browser.
//!
//! Not on the launch path; the core only proxies catalog reads for the UI.

use log::debug;
use serde::{Deserialize, Serialize};
use tauri::plugin::{Builder, TauriPlugin};
use tauri::{Runtime, command};

use shared::HTTP_CLIENT;

pub mod error;

pub use error::*;

const API_BASE_URL: &str = "https://api.curseforge.com/v1";

/// CurseForge game id of Minecraft.
const GAME_ID: u32 = 432;

/// Class id of the `modpacks` section.
const MODPACKS_CLASS_ID: u32 = 4471;

const PAGE_SIZE: u32 = 20;

fn api_key() -> String {
    std::env::var("CURSEFORGE_API_KEY")
        .unwrap_or_else(|_| "$2a$10$bL4bIL5pUWqfcO7KQtnMReakwtfHbNKh6v1uTpKlzhwoueEJQnPnm".to_string())
}

pub fn init<R: Runtime>() -> TauriPlugin<R> {
    Builder::new("curseforge")
        .invoke_handler(tauri::generate_handler![
            get_curseforge_categories,
            search_curseforge
        ])
        .build()
}

#[derive(Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCategory {
    id: u32,
    name: String,
    icon_url: Option<String>,
}

#[derive(Clone, Serialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
    #[serde(rename = "iconUrl")]
    pub icon_url: String,
}

#[command]
async fn get_curseforge_categories() -> Result<Vec<Category>> {
    let envelope: DataEnvelope<Vec<RawCategory>> = HTTP_CLIENT
        .get(format!("{API_BASE_URL}/categories"))
        .query(&[("gameId", GAME_ID), ("classId", MODPACKS_CLASS_ID)])
        .header("x-api-key", api_key())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(envelope
        .data
        .into_iter()
        .map(|category| Category {
            id: category.id,
            name: category.name,
            icon_url: category.icon_url.unwrap_or_default(),
        })
        .collect())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub page: u32,
    #[serde(default)]
    pub search_filter: String,
    #[serde(default)]
    pub selected_version: String,
    #[serde(default)]
    pub selected_category: Option<u32>,
    /// CurseForge sort field (1 featured, 2 popularity, 3 last updated,
    /// 4 name, 6 total downloads).
    #[serde(default = "default_sort")]
    pub selected_sort: u8,
}

fn default_sort() -> u8 {
    2
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMod {
    id: u64,
    name: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    download_count: f64,
    logo: Option<RawLogo>,
    #[serde(default)]
    authors: Vec<RawAuthor>,
    #[serde(default)]
    latest_files_indexes: Vec<RawFileIndex>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLogo {
    thumbnail_url: Option<String>,
}

#[derive(Deserialize)]
struct RawAuthor {
    name: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFileIndex {
    game_version: String,
}

#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModpackInformation {
    pub id: u64,
    pub name: String,
    pub summary: String,
    pub download_count: u64,
    pub thumbnail_url: String,
    pub authors: Vec<String>,
    pub game_versions: Vec<String>,
}

#[command]
async fn search_curseforge(query: SearchQuery) -> Result<Vec<ModpackInformation>> {
    let mut request = HTTP_CLIENT
        .get(format!("{API_BASE_URL}/mods/search"))
        .query(&[
            ("gameId", GAME_ID.to_string()),
            ("classId", MODPACKS_CLASS_ID.to_string()),
            ("pageSize", PAGE_SIZE.to_string()),
            ("index", (query.page * PAGE_SIZE).to_string()),
            ("sortField", query.selected_sort.to_string()),
            ("sortOrder", "desc".to_string()),
        ]);
    if !query.search_filter.trim().is_empty() {
        request = request.query(&[("searchFilter", query.search_filter.trim())]);
    }
    if !query.selected_version.trim().is_empty() {
        request = request.query(&[("gameVersion", query.selected_version.trim())]);
    }
    if let Some(category) = query.selected_category {
        request = request.query(&[("categoryId", category.to_string())]);
    }

    let envelope: DataEnvelope<Vec<RawMod>> = request
        .header("x-api-key", api_key())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    debug!("CurseForge search returned {} packs", envelope.data.len());
    Ok(envelope.data.into_iter().map(to_modpack).collect())
}

fn to_modpack(raw: RawMod) -> ModpackInformation {
    ModpackInformation {
        id: raw.id,
        name: raw.name,
        summary: raw.summary,
        download_count: raw.download_count as u64,
        thumbnail_url: raw
            .logo
            .and_then(|logo| logo.thumbnail_url)
            .unwrap_or_default(),
        authors: raw.authors.into_iter().map(|author| author.name).collect(),
        game_versions: {
            let mut versions: Vec<String> = raw
                .latest_files_indexes
                .into_iter()
                .map(|index| index.game_version)
                .collect();
            versions.dedup();
            versions
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn search_payload_shape_parses() {
        let raw: DataEnvelope<Vec<RawMod>> = serde_json::from_value(json!({
            "data": [{
                "id": 520914,
                "name": "Pack",
                "summary": "A pack",
                "downloadCount": 1234.0,
                "logo": {"thumbnailUrl": "https://media.forgecdn.net/thumb.png"},
                "authors": [{"name": "someone"}],
                "latestFilesIndexes": [
                    {"gameVersion": "1.20.1"},
                    {"gameVersion": "1.20.1"},
                    {"gameVersion": "1.19.4"}
                ]
            }]
        }))
        .unwrap();
        let modpack = to_modpack(raw.data.into_iter().next().unwrap());
        assert_eq!(modpack.id, 520914);
        assert_eq!(modpack.download_count, 1234);
        assert_eq!(modpack.authors, vec!["someone"]);
        assert_eq!(modpack.game_versions, vec!["1.20.1", "1.19.4"]);
    }

    #[test]
    fn query_defaults() {
        let query: SearchQuery = serde_json::from_value(json!({"page": 0})).unwrap();
        assert_eq!(query.selected_sort, 2);
        assert!(query.search_filter.is_empty());
        assert!(query.selected_category.is_none());
    }
}
