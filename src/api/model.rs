/// Shapes exchanged with the browser extension APIs
///
/// Field names follow the `chrome.*` objects so values can be passed
/// through `serde-wasm-bindgen` without renaming on the JS side.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `chrome.windows.WINDOW_ID_NONE`
pub const WINDOW_ID_NONE: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    #[default]
    Local,
    Sync,
    /// In-memory area; only seen in change events
    Session,
    /// Policy-provided, read-only
    Managed,
}

impl StorageArea {
    pub fn as_str(self) -> &'static str {
        match self {
            StorageArea::Local => "local",
            StorageArea::Sync => "sync",
            StorageArea::Session => "session",
            StorageArea::Managed => "managed",
        }
    }

    pub fn from_sync_enabled(sync_enabled: bool) -> Self {
        if sync_enabled {
            StorageArea::Sync
        } else {
            StorageArea::Local
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StorageChange {
    #[serde(default)]
    pub old_value: Option<Value>,
    #[serde(default)]
    pub new_value: Option<Value>,
}

/// Payload of `storage.onChanged`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StorageChanged {
    pub changes: HashMap<String, StorageChange>,
    pub area: StorageArea,
}

/// Subset of `chrome.tabs.Tab` used by the extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserTab {
    pub id: Option<i32>,
    pub index: i32,
    pub window_id: i32,
    pub url: Option<String>,
    pub title: Option<String>,
    pub fav_icon_url: Option<String>,
    pub status: Option<String>,
    pub active: bool,
    pub pinned: bool,
    pub incognito: bool,
    pub last_accessed: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TabChangeInfo {
    pub status: Option<String>,
    pub url: Option<String>,
    pub title: Option<String>,
}

impl TabChangeInfo {
    pub fn is_complete(&self) -> bool {
        self.status.as_deref() == Some("complete")
    }
}

/// Payload of `tabs.onUpdated`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabUpdated {
    pub tab_id: i32,
    pub change: TabChangeInfo,
    pub tab: BrowserTab,
}

/// Payload of `tabs.onRemoved`
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabRemoved {
    pub tab_id: i32,
    pub window_id: i32,
    pub is_window_closing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TabQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_window: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CreateProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl CreateProperties {
    pub fn url(url: impl Into<String>) -> Self {
        CreateProperties {
            url: Some(url.into()),
            active: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProperties {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

/// Subset of `chrome.windows.Window`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct BrowserWindow {
    pub id: Option<i32>,
    pub focused: bool,
    pub incognito: bool,
    pub tabs: Option<Vec<BrowserTab>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WindowCreate {
    pub url: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct WindowUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focused: Option<bool>,
}

/// Subset of `chrome.history.HistoryItem`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct HistoryItem {
    pub id: String,
    pub url: Option<String>,
    pub title: Option<String>,
    pub last_visit_time: Option<f64>,
    pub visit_count: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HistoryQuery {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<u32>,
}

/// Payload of `history.onVisitRemoved`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct VisitRemoved {
    pub all_history: bool,
    pub urls: Vec<String>,
}
