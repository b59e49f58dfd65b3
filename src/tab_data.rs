/// Data structures for the tab lists
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{BrowserTab, HistoryItem};

/// One of the three lists shown in the popup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Closed,
    Opened,
    Today,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Closed, Category::Opened, Category::Today];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Closed => "closed",
            Category::Opened => "opened",
            Category::Today => "today",
        }
    }

    /// Text on the category switcher
    pub fn label(self) -> &'static str {
        match self {
            Category::Closed => "Undo",
            Category::Opened => "Opened",
            Category::Today => "Today",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A closed tab as persisted in storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClosedTab {
    /// `{closed_at}-{random}`
    pub id: String,
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub fav_icon_url: String,
    pub closed_at: f64,
}

/// What the background page remembers about a live tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabCacheEntry {
    pub url: String,
    pub title: String,
    pub fav_icon_url: String,
    pub window_id: i32,
}

impl TabCacheEntry {
    /// `None` for tabs that have no URL yet
    pub fn from_tab(tab: &BrowserTab) -> Option<TabCacheEntry> {
        let url = tab.url.clone().filter(|url| !url.is_empty())?;
        Some(TabCacheEntry {
            url,
            title: tab.title.clone().unwrap_or_else(|| "Unknown".to_string()),
            fav_icon_url: tab.fav_icon_url.clone().unwrap_or_default(),
            window_id: tab.window_id,
        })
    }
}

/// Raw record a list item was built from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "category", rename_all = "lowercase")]
pub enum TabSource {
    Closed(ClosedTab),
    Opened(BrowserTab),
    Today(HistoryItem),
}

impl TabSource {
    pub fn category(&self) -> Category {
        match self {
            TabSource::Closed(_) => Category::Closed,
            TabSource::Opened(_) => Category::Opened,
            TabSource::Today(_) => Category::Today,
        }
    }
}

/// A row in one of the popup lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabItem {
    /// Unique within a loaded list
    pub id: String,
    pub url: String,
    /// HTML-escaped
    pub title: String,
    pub fav_icon_url: String,
    pub domain: String,
    /// Relative rendering of `timestamp`
    pub time: String,
    /// closedAt, lastAccessed or lastVisitTime depending on the category
    pub timestamp: f64,
    pub source: TabSource,
}

impl TabItem {
    pub fn category(&self) -> Category {
        self.source.category()
    }
}
