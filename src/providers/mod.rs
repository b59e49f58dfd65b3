/// The three tab lists behind the popup
///
/// Each category implements the same load/click/remove contract over its
/// own backing capability. `Provider` picks the implementation for a
/// `Category` and is the no-throw boundary for clicks and deletes.
pub mod closed;
pub mod opened;
pub mod today;

use crate::api::Host;
use crate::error::HostError;
use crate::tab_data::{Category, TabItem};

pub use closed::{ClosedProvider, get_closed_tabs, remove_closed_tab, save_closed_tab, set_closed_tabs};
pub use opened::OpenedProvider;
pub use today::TodayProvider;

#[allow(async_fn_in_trait)]
pub trait TabProvider {
    /// Fetch, filter and transform the list, newest first
    async fn load_tabs(&self) -> Result<Vec<TabItem>, HostError>;

    /// Primary action: reopen, switch to or navigate
    async fn click_item(&self, item: &TabItem) -> Result<(), HostError>;

    /// Delete the entry from its backing store
    async fn remove_item(&self, item: &TabItem) -> Result<(), HostError>;
}

pub enum Provider<'a, H: Host> {
    Closed(ClosedProvider<'a, H>),
    Opened(OpenedProvider<'a, H>),
    Today(TodayProvider<'a, H>),
}

impl<'a, H: Host> Provider<'a, H> {
    pub fn for_category(category: Category, host: &'a H) -> Self {
        match category {
            Category::Closed => Provider::Closed(ClosedProvider::new(host)),
            Category::Opened => Provider::Opened(OpenedProvider::new(host)),
            Category::Today => Provider::Today(TodayProvider::new(host)),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            Provider::Closed(_) => Category::Closed,
            Provider::Opened(_) => Category::Opened,
            Provider::Today(_) => Category::Today,
        }
    }

    pub async fn load_tabs(&self) -> Result<Vec<TabItem>, HostError> {
        match self {
            Provider::Closed(provider) => provider.load_tabs().await,
            Provider::Opened(provider) => provider.load_tabs().await,
            Provider::Today(provider) => provider.load_tabs().await,
        }
    }

    /// Errors are logged, never returned
    pub async fn click_item(&self, item: &TabItem) {
        let result = match self {
            Provider::Closed(provider) => provider.click_item(item).await,
            Provider::Opened(provider) => provider.click_item(item).await,
            Provider::Today(provider) => provider.click_item(item).await,
        };
        if let Err(err) = result {
            log::error!("[{}TabItemClick]: {}", self.category(), err);
        }
    }

    /// Errors are logged, never returned
    pub async fn remove_item(&self, item: &TabItem) {
        let result = match self {
            Provider::Closed(provider) => provider.remove_item(item).await,
            Provider::Opened(provider) => provider.remove_item(item).await,
            Provider::Today(provider) => provider.remove_item(item).await,
        };
        if let Err(err) = result {
            log::error!("[{}TabItemDelete]: {}", self.category(), err);
        }
    }
}
