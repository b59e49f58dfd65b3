/// In-memory browser used by the unit tests
///
/// Each capability records the calls it receives and keeps the listeners
/// registered on it so tests can fire browser events by hand.
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use serde_json::{Map, Value};

use crate::api::*;
use crate::error::HostError;

pub use pollster::block_on;

async fn fire<E: Clone>(listeners: &RefCell<Vec<Listener<E>>>, event: E) {
    let pending: Vec<EventFuture> = listeners
        .borrow()
        .iter()
        .map(|listener| listener(event.clone()))
        .collect();
    for future in pending {
        future.await;
    }
}

/// Pending on the first poll, ready on the next
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            return Poll::Ready(());
        }
        self.0 = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

fn check(failing: &Cell<bool>, op: &str) -> Result<(), HostError> {
    if failing.get() {
        Err(HostError::host(format!("{} failed", op)))
    } else {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStorage {
    areas: RefCell<HashMap<StorageArea, Map<String, Value>>>,
    listeners: RefCell<Vec<Listener<StorageChanged>>>,
    pub failing: Cell<bool>,
    /// Suspend once inside every `get`, letting other futures run
    pub yielding: Cell<bool>,
    pub get_calls: Cell<usize>,
    pub set_calls: Cell<usize>,
}

impl MemoryStorage {
    pub fn put(&self, key: &str, value: Value) {
        self.put_in(StorageArea::Local, key, value);
    }

    pub fn put_in(&self, area: StorageArea, key: &str, value: Value) {
        self.areas.borrow_mut().entry(area).or_default().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.value_in(StorageArea::Local, key)
    }

    pub fn value_in(&self, area: StorageArea, key: &str) -> Option<Value> {
        self.areas.borrow().get(&area).and_then(|values| values.get(key).cloned())
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub async fn fire_changed(&self, keys: &[&str], area: StorageArea) {
        let changes = keys
            .iter()
            .map(|key| (key.to_string(), StorageChange::default()))
            .collect();
        fire(&self.listeners, StorageChanged { changes, area }).await;
    }
}

impl Storage for MemoryStorage {
    async fn get(&self, key: &str, area: StorageArea) -> Result<Option<Value>, HostError> {
        self.get_calls.set(self.get_calls.get() + 1);
        if self.yielding.get() {
            YieldOnce(false).await;
        }
        check(&self.failing, "storage.get")?;
        Ok(self.value_in(area, key))
    }

    async fn get_all(&self, area: StorageArea) -> Result<Map<String, Value>, HostError> {
        check(&self.failing, "storage.get")?;
        Ok(self.areas.borrow().get(&area).cloned().unwrap_or_default())
    }

    async fn set(&self, key: &str, value: Value, area: StorageArea) -> Result<(), HostError> {
        self.set_calls.set(self.set_calls.get() + 1);
        check(&self.failing, "storage.set")?;
        self.put_in(area, key, value);
        Ok(())
    }

    async fn remove(&self, key: &str, area: StorageArea) -> Result<(), HostError> {
        check(&self.failing, "storage.remove")?;
        if let Some(values) = self.areas.borrow_mut().get_mut(&area) {
            values.remove(key);
        }
        Ok(())
    }

    async fn clear(&self, area: StorageArea) -> Result<(), HostError> {
        check(&self.failing, "storage.clear")?;
        self.areas.borrow_mut().remove(&area);
        Ok(())
    }

    fn on_changed(&self, listener: Listener<StorageChanged>) {
        self.listeners.borrow_mut().push(listener);
    }
}

#[derive(Default)]
pub struct FakeTabs {
    pub open: RefCell<Vec<BrowserTab>>,
    pub created: RefCell<Vec<CreateProperties>>,
    pub updated: RefCell<Vec<(i32, UpdateProperties)>>,
    pub removed: RefCell<Vec<i32>>,
    pub query_calls: Cell<usize>,
    pub failing: Cell<bool>,
    created_listeners: RefCell<Vec<Listener<BrowserTab>>>,
    updated_listeners: RefCell<Vec<Listener<TabUpdated>>>,
    removed_listeners: RefCell<Vec<Listener<TabRemoved>>>,
}

impl FakeTabs {
    pub fn listener_count(&self) -> usize {
        self.created_listeners.borrow().len()
            + self.updated_listeners.borrow().len()
            + self.removed_listeners.borrow().len()
    }

    pub async fn fire_created(&self, tab: BrowserTab) {
        fire(&self.created_listeners, tab).await;
    }

    pub async fn fire_updated(&self, tab_id: i32, change: TabChangeInfo, tab: BrowserTab) {
        fire(&self.updated_listeners, TabUpdated { tab_id, change, tab }).await;
    }

    pub async fn fire_removed(&self, tab_id: i32, window_id: i32) {
        let event = TabRemoved {
            tab_id,
            window_id,
            is_window_closing: false,
        };
        fire(&self.removed_listeners, event).await;
    }
}

impl Tabs for FakeTabs {
    async fn create(&self, props: CreateProperties) -> Result<BrowserTab, HostError> {
        check(&self.failing, "tabs.create")?;
        self.created.borrow_mut().push(props.clone());
        let id = 1000 + self.created.borrow().len() as i32;
        let tab = BrowserTab {
            id: Some(id),
            url: props.url,
            active: props.active.unwrap_or(true),
            ..BrowserTab::default()
        };
        self.open.borrow_mut().push(tab.clone());
        Ok(tab)
    }

    async fn query(&self, _query: TabQuery) -> Result<Vec<BrowserTab>, HostError> {
        self.query_calls.set(self.query_calls.get() + 1);
        check(&self.failing, "tabs.query")?;
        Ok(self.open.borrow().clone())
    }

    async fn update(&self, tab_id: i32, props: UpdateProperties) -> Result<BrowserTab, HostError> {
        check(&self.failing, "tabs.update")?;
        self.updated.borrow_mut().push((tab_id, props.clone()));
        let mut open = self.open.borrow_mut();
        let tab = open
            .iter_mut()
            .find(|tab| tab.id == Some(tab_id))
            .ok_or_else(|| HostError::host(format!("No tab with id: {}.", tab_id)))?;
        if let Some(active) = props.active {
            tab.active = active;
        }
        Ok(tab.clone())
    }

    async fn remove(&self, tab_id: i32) -> Result<(), HostError> {
        check(&self.failing, "tabs.remove")?;
        self.removed.borrow_mut().push(tab_id);
        self.open.borrow_mut().retain(|tab| tab.id != Some(tab_id));
        Ok(())
    }

    fn on_created(&self, listener: Listener<BrowserTab>) {
        self.created_listeners.borrow_mut().push(listener);
    }

    fn on_updated(&self, listener: Listener<TabUpdated>) {
        self.updated_listeners.borrow_mut().push(listener);
    }

    fn on_removed(&self, listener: Listener<TabRemoved>) {
        self.removed_listeners.borrow_mut().push(listener);
    }
}

#[derive(Default)]
pub struct FakeWindows {
    pub created: RefCell<Vec<WindowCreate>>,
    pub updated: RefCell<Vec<(i32, WindowUpdate)>>,
    pub removed: RefCell<Vec<i32>>,
    pub failing: Cell<bool>,
    removed_listeners: RefCell<Vec<Listener<i32>>>,
}

impl FakeWindows {
    pub fn listener_count(&self) -> usize {
        self.removed_listeners.borrow().len()
    }

    pub async fn fire_removed(&self, window_id: i32) {
        fire(&self.removed_listeners, window_id).await;
    }
}

impl Windows for FakeWindows {
    async fn get(&self, window_id: i32) -> Result<BrowserWindow, HostError> {
        check(&self.failing, "windows.get")?;
        Ok(BrowserWindow {
            id: Some(window_id),
            ..BrowserWindow::default()
        })
    }

    async fn get_all(&self) -> Result<Vec<BrowserWindow>, HostError> {
        check(&self.failing, "windows.getAll")?;
        Ok(Vec::new())
    }

    async fn create(&self, props: WindowCreate) -> Result<BrowserWindow, HostError> {
        check(&self.failing, "windows.create")?;
        self.created.borrow_mut().push(props);
        Ok(BrowserWindow {
            id: Some(100 + self.created.borrow().len() as i32),
            focused: true,
            ..BrowserWindow::default()
        })
    }

    async fn update(&self, window_id: i32, props: WindowUpdate) -> Result<BrowserWindow, HostError> {
        check(&self.failing, "windows.update")?;
        self.updated.borrow_mut().push((window_id, props.clone()));
        Ok(BrowserWindow {
            id: Some(window_id),
            focused: props.focused.unwrap_or(false),
            ..BrowserWindow::default()
        })
    }

    async fn remove(&self, window_id: i32) -> Result<(), HostError> {
        check(&self.failing, "windows.remove")?;
        self.removed.borrow_mut().push(window_id);
        Ok(())
    }

    fn on_removed(&self, listener: Listener<i32>) {
        self.removed_listeners.borrow_mut().push(listener);
    }
}

#[derive(Default)]
pub struct FakeHistory {
    pub items: RefCell<Vec<HistoryItem>>,
    pub searches: RefCell<Vec<HistoryQuery>>,
    pub deleted: RefCell<Vec<String>>,
    pub failing: Cell<bool>,
    visited_listeners: RefCell<Vec<Listener<HistoryItem>>>,
    removed_listeners: RefCell<Vec<Listener<VisitRemoved>>>,
}

impl FakeHistory {
    pub fn listener_count(&self) -> usize {
        self.visited_listeners.borrow().len() + self.removed_listeners.borrow().len()
    }

    pub async fn fire_visit_removed(&self, urls: Vec<String>) {
        let event = VisitRemoved {
            all_history: urls.is_empty(),
            urls,
        };
        fire(&self.removed_listeners, event).await;
    }
}

impl History for FakeHistory {
    async fn search(&self, query: HistoryQuery) -> Result<Vec<HistoryItem>, HostError> {
        check(&self.failing, "history.search")?;
        self.searches.borrow_mut().push(query.clone());
        let start = query.start_time.unwrap_or(0.0);
        let limit = query.max_results.unwrap_or(100) as usize;
        Ok(self
            .items
            .borrow()
            .iter()
            .filter(|item| item.last_visit_time.unwrap_or(0.0) >= start)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn delete_url(&self, url: &str) -> Result<(), HostError> {
        check(&self.failing, "history.deleteUrl")?;
        self.deleted.borrow_mut().push(url.to_string());
        self.items.borrow_mut().retain(|item| item.url.as_deref() != Some(url));
        Ok(())
    }

    fn on_visited(&self, listener: Listener<HistoryItem>) {
        self.visited_listeners.borrow_mut().push(listener);
    }

    fn on_visit_removed(&self, listener: Listener<VisitRemoved>) {
        self.removed_listeners.borrow_mut().push(listener);
    }
}

/// UTC clock frozen at a settable instant
pub struct FixedClock {
    pub now: Cell<f64>,
}

impl Clock for FixedClock {
    fn now(&self) -> f64 {
        self.now.get()
    }

    fn utc_offset_minutes(&self, _at: f64) -> i32 {
        0
    }
}

/// 2024-01-15T12:00:00Z
pub const NOON: f64 = 1_705_320_000_000.0;
pub const MINUTE: f64 = 60_000.0;
pub const HOUR: f64 = 60.0 * MINUTE;

pub struct FakeHost {
    pub storage: MemoryStorage,
    pub tabs: FakeTabs,
    pub windows: FakeWindows,
    pub history: FakeHistory,
    pub clock: FixedClock,
}

impl FakeHost {
    pub fn new() -> Self {
        FakeHost {
            storage: MemoryStorage::default(),
            tabs: FakeTabs::default(),
            windows: FakeWindows::default(),
            history: FakeHistory::default(),
            clock: FixedClock { now: Cell::new(NOON) },
        }
    }
}

impl Host for FakeHost {
    type Storage = MemoryStorage;
    type Tabs = FakeTabs;
    type Windows = FakeWindows;
    type History = FakeHistory;
    type Clock = FixedClock;

    fn storage(&self) -> &MemoryStorage {
        &self.storage
    }

    fn tabs(&self) -> &FakeTabs {
        &self.tabs
    }

    fn windows(&self) -> &FakeWindows {
        &self.windows
    }

    fn history(&self) -> &FakeHistory {
        &self.history
    }

    fn clock(&self) -> &FixedClock {
        &self.clock
    }
}

pub fn tab(id: i32, window_id: i32, url: &str, title: &str) -> BrowserTab {
    BrowserTab {
        id: Some(id),
        window_id,
        url: Some(url.to_string()),
        title: Some(title.to_string()),
        ..BrowserTab::default()
    }
}

pub fn visit(id: &str, url: &str, title: &str, last_visit_time: f64) -> HistoryItem {
    HistoryItem {
        id: id.to_string(),
        url: Some(url.to_string()),
        title: Some(title.to_string()),
        last_visit_time: Some(last_visit_time),
        visit_count: Some(1),
    }
}
