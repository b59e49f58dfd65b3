/// Recently closed tabs, persisted as a list in local storage
use crate::api::{self, Clock, CreateProperties, Host, Storage, StorageArea, Tabs};
use crate::constants::CLOSED_TABS_KEY;
use crate::error::HostError;
use crate::providers::TabProvider;
use crate::sort::{SortType, sort_tab_items};
use crate::tab_data::{ClosedTab, TabCacheEntry, TabItem, TabSource};
use crate::transform::{random_id, transform_tab_item, unique_by};

pub struct ClosedProvider<'a, H: Host> {
    host: &'a H,
}

impl<'a, H: Host> ClosedProvider<'a, H> {
    pub fn new(host: &'a H) -> Self {
        ClosedProvider { host }
    }
}

impl<H: Host> TabProvider for ClosedProvider<'_, H> {
    async fn load_tabs(&self) -> Result<Vec<TabItem>, HostError> {
        let tabs = get_closed_tabs(self.host.storage()).await?;
        let items: Vec<TabItem> = tabs
            .into_iter()
            .map(|tab| transform_tab_item(TabSource::Closed(tab), self.host.clock()))
            .collect();
        Ok(sort_tab_items(&items, SortType::Recent))
    }

    async fn click_item(&self, item: &TabItem) -> Result<(), HostError> {
        if item.url.is_empty() {
            return Ok(());
        }
        self.host.tabs().create(CreateProperties::url(&item.url)).await?;
        remove_closed_tab(self.host.storage(), &item.id).await?;
        Ok(())
    }

    async fn remove_item(&self, item: &TabItem) -> Result<(), HostError> {
        remove_closed_tab(self.host.storage(), &item.id).await?;
        Ok(())
    }
}

pub async fn get_closed_tabs(storage: &impl Storage) -> Result<Vec<ClosedTab>, HostError> {
    let tabs: Option<Vec<ClosedTab>> = api::load(storage, CLOSED_TABS_KEY, StorageArea::Local).await?;
    Ok(tabs.unwrap_or_default())
}

pub async fn set_closed_tabs(storage: &impl Storage, tabs: &[ClosedTab]) -> Result<(), HostError> {
    api::store(storage, CLOSED_TABS_KEY, &tabs, StorageArea::Local).await
}

/// Drop the record with `id`, returning what is left
pub async fn remove_closed_tab(storage: &impl Storage, id: &str) -> Result<Vec<ClosedTab>, HostError> {
    let mut tabs = get_closed_tabs(storage).await?;
    tabs.retain(|tab| tab.id != id);
    set_closed_tabs(storage, &tabs).await?;
    Ok(tabs)
}

/// Persist a tab that was just closed
///
/// The new record goes to the front, the list is cut to
/// `max_stored_tabs` and then deduplicated by URL so the newest copy of a
/// page wins. Entries without a URL are skipped and return `None`.
pub async fn save_closed_tab<H: Host>(
    host: &H,
    entry: &TabCacheEntry,
    max_stored_tabs: usize,
) -> Result<Option<ClosedTab>, HostError> {
    if entry.url.is_empty() {
        return Ok(None);
    }

    let mut tabs = get_closed_tabs(host.storage()).await?;

    let now = host.clock().now();
    let closed = ClosedTab {
        id: format!("{}-{}", now, random_id()),
        title: entry.title.clone(),
        url: entry.url.clone(),
        fav_icon_url: entry.fav_icon_url.clone(),
        closed_at: now,
    };

    tabs.insert(0, closed.clone());
    tabs.truncate(max_stored_tabs);
    let tabs = unique_by(tabs, |tab| tab.url.clone());

    set_closed_tabs(host.storage(), &tabs).await?;
    log::debug!("Saved closed tab {} ({} stored)", closed.url, tabs.len());
    Ok(Some(closed))
}
