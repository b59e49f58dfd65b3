/// Pages visited since local midnight
use crate::api::{Clock, CreateProperties, History, HistoryItem, HistoryQuery, Host, Tabs};
use crate::constants::MAX_HISTORY_COUNT;
use crate::error::HostError;
use crate::providers::TabProvider;
use crate::sort::{SortType, sort_tab_items};
use crate::tab_data::{TabItem, TabSource};
use crate::transform::{transform_tab_item, unique_by};

pub struct TodayProvider<'a, H: Host> {
    host: &'a H,
}

impl<'a, H: Host> TodayProvider<'a, H> {
    pub fn new(host: &'a H) -> Self {
        TodayProvider { host }
    }

    async fn today_history(&self) -> Result<Vec<HistoryItem>, HostError> {
        let start_time = self.host.clock().start_of_today();
        let query = HistoryQuery {
            text: String::new(),
            start_time: Some(start_time),
            max_results: Some(MAX_HISTORY_COUNT),
        };
        let mut history: Vec<HistoryItem> = self
            .host
            .history()
            .search(query)
            .await?
            .into_iter()
            .filter(|item| item.url.as_deref().is_some_and(|url| !url.is_empty()))
            .filter(|item| item.last_visit_time.is_some_and(|at| at >= start_time))
            .collect();

        // latest visit first so the dedup below keeps it
        history.sort_by(|a, b| {
            let a = a.last_visit_time.unwrap_or_default();
            let b = b.last_visit_time.unwrap_or_default();
            b.total_cmp(&a)
        });
        Ok(unique_by(history, |item| item.url.clone()))
    }
}

impl<H: Host> TabProvider for TodayProvider<'_, H> {
    async fn load_tabs(&self) -> Result<Vec<TabItem>, HostError> {
        let items: Vec<TabItem> = self
            .today_history()
            .await?
            .into_iter()
            .map(|item| transform_tab_item(TabSource::Today(item), self.host.clock()))
            .collect();
        Ok(sort_tab_items(&items, SortType::Recent))
    }

    async fn click_item(&self, item: &TabItem) -> Result<(), HostError> {
        if item.url.is_empty() {
            return Ok(());
        }
        self.host.tabs().create(CreateProperties::url(&item.url)).await?;
        Ok(())
    }

    async fn remove_item(&self, item: &TabItem) -> Result<(), HostError> {
        self.host.history().delete_url(&item.url).await
    }
}
