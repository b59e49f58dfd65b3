/// List ordering: recent, by domain, alphabetical
use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::api::{self, Storage, StorageArea};
use crate::constants::SORT_TYPE_KEY;
use crate::domain::base_domain;
use crate::error::HostError;
use crate::tab_data::TabItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortType {
    #[default]
    Recent,
    Domain,
    Alphabetical,
}

impl SortType {
    pub const ALL: [SortType; 3] = [SortType::Recent, SortType::Domain, SortType::Alphabetical];

    pub fn as_str(self) -> &'static str {
        match self {
            SortType::Recent => "recent",
            SortType::Domain => "domain",
            SortType::Alphabetical => "alphabetical",
        }
    }

    pub fn parse(value: &str) -> Option<SortType> {
        SortType::ALL.into_iter().find(|sort| sort.as_str() == value)
    }
}

pub async fn get_sort_type(storage: &impl Storage) -> Result<SortType, HostError> {
    let stored: Option<String> = api::load(storage, SORT_TYPE_KEY, StorageArea::Local).await?;
    Ok(stored.as_deref().and_then(SortType::parse).unwrap_or_default())
}

pub async fn set_sort_type(storage: &impl Storage, sort_type: SortType) -> Result<(), HostError> {
    api::store(storage, SORT_TYPE_KEY, &sort_type, StorageArea::Local).await
}

/// Newest first
fn by_recent(a: &TabItem, b: &TabItem) -> Ordering {
    b.timestamp.total_cmp(&a.timestamp)
}

/// Sorted copy of `items`; the input order is left untouched
pub fn sort_tab_items(items: &[TabItem], sort_type: SortType) -> Vec<TabItem> {
    match sort_type {
        SortType::Recent => {
            let mut sorted = items.to_vec();
            sorted.sort_by(by_recent);
            sorted
        }
        SortType::Domain => sort_by_domain(items),
        SortType::Alphabetical => {
            let mut keyed: Vec<(String, &TabItem)> =
                items.iter().map(|item| (item.title.to_lowercase(), item)).collect();
            keyed.sort_by(|a, b| a.0.cmp(&b.0));
            keyed.into_iter().map(|(_, item)| item.clone()).collect()
        }
    }
}

/// Group by registrable domain, then full domain (subdomains stay
/// together), newest first inside a domain
fn sort_by_domain(items: &[TabItem]) -> Vec<TabItem> {
    let mut tabs_with_domain: Vec<(String, &TabItem)> = items
        .iter()
        .map(|item| (base_domain(&item.domain), item))
        .collect();

    tabs_with_domain.sort_by(|a, b| {
        a.0.cmp(&b.0)
            .then_with(|| a.1.domain.cmp(&b.1.domain))
            .then_with(|| by_recent(a.1, b.1))
    });

    tabs_with_domain.into_iter().map(|(_, item)| item.clone()).collect()
}
