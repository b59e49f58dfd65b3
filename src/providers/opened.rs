/// Tabs currently open in any window
use crate::api::{BrowserTab, Host, TabQuery, Tabs, UpdateProperties, WINDOW_ID_NONE, WindowUpdate, Windows};
use crate::domain::is_extension_url;
use crate::error::HostError;
use crate::providers::TabProvider;
use crate::sort::{SortType, sort_tab_items};
use crate::tab_data::{TabItem, TabSource};
use crate::transform::transform_tab_item;

pub struct OpenedProvider<'a, H: Host> {
    host: &'a H,
}

impl<'a, H: Host> OpenedProvider<'a, H> {
    pub fn new(host: &'a H) -> Self {
        OpenedProvider { host }
    }
}

fn live_tab(item: &TabItem) -> Result<(&BrowserTab, i32), HostError> {
    match &item.source {
        TabSource::Opened(tab) => {
            let id = tab
                .id
                .ok_or_else(|| HostError::host(format!("Tab {} has no id", item.url)))?;
            Ok((tab, id))
        }
        other => Err(HostError::host(format!(
            "Expected an opened tab, got a {} item",
            other.category()
        ))),
    }
}

impl<H: Host> TabProvider for OpenedProvider<'_, H> {
    async fn load_tabs(&self) -> Result<Vec<TabItem>, HostError> {
        let tabs = self.host.tabs().query(TabQuery::default()).await?;
        let items: Vec<TabItem> = tabs
            .into_iter()
            .filter(|tab| !tab.url.as_deref().is_some_and(is_extension_url))
            .map(|tab| transform_tab_item(TabSource::Opened(tab), self.host.clock()))
            .collect();
        Ok(sort_tab_items(&items, SortType::Recent))
    }

    async fn click_item(&self, item: &TabItem) -> Result<(), HostError> {
        let (tab, tab_id) = live_tab(item)?;
        self.host
            .tabs()
            .update(tab_id, UpdateProperties { active: Some(true) })
            .await?;
        if tab.window_id != WINDOW_ID_NONE {
            self.host
                .windows()
                .update(tab.window_id, WindowUpdate { focused: Some(true) })
                .await?;
        }
        Ok(())
    }

    async fn remove_item(&self, item: &TabItem) -> Result<(), HostError> {
        let (_, tab_id) = live_tab(item)?;
        self.host.tabs().remove(tab_id).await
    }
}
