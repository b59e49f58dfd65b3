/// Popup list controller
///
/// Owns the active category and a per-category cache of loaded items.
/// Every read goes through the cache; a reload only happens on
/// `render_tabs`, on a cache miss, or when the browser reports a change
/// to the data behind the active category.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::api::{EventFuture, History, Host, Storage, StorageArea, StorageChanged, TabRemoved, Tabs, VisitRemoved, Windows};
use crate::constants::CLOSED_TABS_KEY;
use crate::providers::Provider;
use crate::tab_data::{Category, TabItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderKind {
    /// The whole cached list
    Full,
    /// A filtered view produced by `search_tabs`
    Search,
}

pub type RenderCallback = Box<dyn Fn(&[TabItem], RenderKind)>;

/// A row handed back by the UI, either whole or by id
#[derive(Debug, Clone, PartialEq)]
pub enum TabRef {
    Item(TabItem),
    Id(String),
}

impl From<TabItem> for TabRef {
    fn from(item: TabItem) -> Self {
        TabRef::Item(item)
    }
}

impl From<String> for TabRef {
    fn from(id: String) -> Self {
        TabRef::Id(id)
    }
}

impl From<&str> for TabRef {
    fn from(id: &str) -> Self {
        TabRef::Id(id.to_string())
    }
}

struct RenderState<H: Host> {
    host: Rc<H>,
    active: Cell<Category>,
    cache: RefCell<HashMap<Category, Vec<TabItem>>>,
    render: RenderCallback,
}

pub struct TabsRender<H: Host> {
    state: Rc<RenderState<H>>,
}

impl<H: Host> Clone for TabsRender<H> {
    fn clone(&self) -> Self {
        TabsRender {
            state: self.state.clone(),
        }
    }
}

impl<H: Host + 'static> TabsRender<H> {
    /// Register the change listeners and render `initial`
    pub async fn new(
        host: Rc<H>,
        initial: Category,
        render: impl Fn(&[TabItem], RenderKind) + 'static,
    ) -> Self {
        let state = Rc::new(RenderState {
            host,
            active: Cell::new(initial),
            cache: RefCell::new(HashMap::new()),
            render: Box::new(render),
        });
        RenderState::listen(&state);

        let controller = TabsRender { state };
        controller.render_tabs(initial).await;
        controller
    }

    pub fn active(&self) -> Category {
        self.state.active.get()
    }

    /// Last list loaded for `category`
    pub fn cached(&self, category: Category) -> Option<Vec<TabItem>> {
        self.state.cache.borrow().get(&category).cloned()
    }

    /// Switch to `category` and reload it
    pub async fn render_tabs(&self, category: Category) {
        self.state.render_tabs(category).await;
    }

    /// Render the items of `category` matching every whitespace-separated
    /// term of `keyword` in their title or URL
    pub async fn search_tabs(&self, keyword: &str, category: Category) {
        let terms: Vec<String> = keyword.split_whitespace().map(str::to_lowercase).collect();
        let items = self.state.cached_or_load(category).await;

        let matched: Vec<TabItem> = if terms.is_empty() {
            items
        } else {
            items.into_iter().filter(|item| matches_all(item, &terms)).collect()
        };
        (self.state.render)(&matched, RenderKind::Search);
    }

    pub async fn click_tab_item(&self, tab: impl Into<TabRef>, category: Category) {
        if let Some(item) = self.state.resolve(tab.into(), category).await {
            Provider::for_category(category, self.state.host.as_ref())
                .click_item(&item)
                .await;
        }
    }

    pub async fn delete_tab_item(&self, tab: impl Into<TabRef>, category: Category) {
        if let Some(item) = self.state.resolve(tab.into(), category).await {
            Provider::for_category(category, self.state.host.as_ref())
                .remove_item(&item)
                .await;
        }
    }
}

fn matches_all(item: &TabItem, terms: &[String]) -> bool {
    let title = item.title.to_lowercase();
    let url = item.url.to_lowercase();
    terms
        .iter()
        .all(|term| title.contains(term.as_str()) || url.contains(term.as_str()))
}

impl<H: Host + 'static> RenderState<H> {
    async fn load(&self, category: Category) -> Option<Vec<TabItem>> {
        match Provider::for_category(category, self.host.as_ref()).load_tabs().await {
            Ok(items) => {
                self.cache.borrow_mut().insert(category, items.clone());
                Some(items)
            }
            Err(err) => {
                log::error!("[{}LoadTabs]: {}", category, err);
                None
            }
        }
    }

    async fn render_tabs(&self, category: Category) {
        self.active.set(category);
        let items = match self.load(category).await {
            Some(items) => items,
            None => self.cache.borrow().get(&category).cloned().unwrap_or_default(),
        };
        (self.render)(&items, RenderKind::Full);
    }

    /// Cached list for `category`, loading it on a miss without switching
    async fn cached_or_load(&self, category: Category) -> Vec<TabItem> {
        let cached = self.cache.borrow().get(&category).cloned();
        match cached {
            Some(items) => items,
            None => self.load(category).await.unwrap_or_default(),
        }
    }

    async fn resolve(&self, tab: TabRef, category: Category) -> Option<TabItem> {
        match tab {
            TabRef::Item(item) => Some(item),
            TabRef::Id(id) => {
                let found = self
                    .cached_or_load(category)
                    .await
                    .into_iter()
                    .find(|item| item.id == id);
                if found.is_none() {
                    log::warn!("[{}TabItemResolve]: no item with id {}", category, id);
                }
                found
            }
        }
    }

    fn on_active<E: 'static>(
        state: &Rc<Self>,
        category: Category,
        filter: impl Fn(&E) -> bool + 'static,
    ) -> Box<dyn Fn(E) -> EventFuture> {
        let weak: Weak<Self> = Rc::downgrade(state);
        Box::new(move |event: E| -> EventFuture {
            let weak = weak.clone();
            let wanted = filter(&event);
            Box::pin(async move {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                if wanted && state.active.get() == category {
                    state.render_tabs(category).await;
                }
            })
        })
    }

    fn listen(state: &Rc<Self>) {
        let host = state.host.clone();

        host.storage().on_changed(Self::on_active(
            state,
            Category::Closed,
            |event: &StorageChanged| {
                event.area == StorageArea::Local && event.changes.contains_key(CLOSED_TABS_KEY)
            },
        ));
        host.history()
            .on_visit_removed(Self::on_active(state, Category::Today, |_: &VisitRemoved| true));
        host.tabs()
            .on_removed(Self::on_active(state, Category::Opened, |_: &TabRemoved| true));
        host.windows()
            .on_removed(Self::on_active(state, Category::Opened, |_: &i32| true));
    }
}
