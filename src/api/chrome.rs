/// `Host` backed by the real `chrome.*` extension APIs
///
/// Calls go through `js/host.js`, which turns each callback-style API into
/// a promise that rejects with `chrome.runtime.lastError`.
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;

use crate::api::*;
use crate::error::HostError;

#[wasm_bindgen(module = "/js/host.js")]
extern "C" {
    #[wasm_bindgen(catch)]
    async fn storageGet(area: &str, key: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageGetAll(area: &str) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageSet(area: &str, key: &str, value: JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageRemove(area: &str, key: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(catch)]
    async fn storageClear(area: &str) -> Result<(), JsValue>;

    fn onStorageChanged(callback: &js_sys::Function);

    #[wasm_bindgen(catch)]
    async fn tabsCreate(props: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn tabsQuery(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn tabsUpdate(tab_id: i32, props: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn tabsRemove(tab_id: i32) -> Result<(), JsValue>;

    fn onTabCreated(callback: &js_sys::Function);
    fn onTabUpdated(callback: &js_sys::Function);
    fn onTabRemoved(callback: &js_sys::Function);

    #[wasm_bindgen(catch)]
    async fn windowsGet(window_id: i32) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn windowsGetAll() -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn windowsCreate(props: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn windowsUpdate(window_id: i32, props: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn windowsRemove(window_id: i32) -> Result<(), JsValue>;

    fn onWindowRemoved(callback: &js_sys::Function);

    #[wasm_bindgen(catch)]
    async fn historySearch(query: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(catch)]
    async fn historyDeleteUrl(url: &str) -> Result<(), JsValue>;

    fn onHistoryVisited(callback: &js_sys::Function);
    fn onHistoryVisitRemoved(callback: &js_sys::Function);

    fn setIntervalMs(callback: &js_sys::Function, ms: u32);
}

fn host_error(err: JsValue) -> HostError {
    if let Some(err) = err.dyn_ref::<js_sys::Error>() {
        return HostError::host(String::from(err.message()));
    }
    match err.as_string() {
        Some(message) => HostError::host(message),
        None => HostError::host(format!("{:?}", err)),
    }
}

/// Plain JS objects rather than `Map`s, as the chrome APIs expect
fn to_js<T: Serialize>(value: &T) -> Result<JsValue, HostError> {
    Ok(value.serialize(&serde_wasm_bindgen::Serializer::json_compatible())?)
}

fn from_js<T: DeserializeOwned>(value: JsValue) -> Result<T, HostError> {
    Ok(serde_wasm_bindgen::from_value(value)?)
}

/// Hand the browser a callback that decodes the event and runs the
/// listener's future on the local executor. Never dropped.
fn register<E: DeserializeOwned + 'static>(
    add_listener: fn(&js_sys::Function),
    tag: &'static str,
    listener: Listener<E>,
) {
    let callback = Closure::<dyn Fn(JsValue)>::new(move |payload: JsValue| {
        match serde_wasm_bindgen::from_value::<E>(payload) {
            Ok(event) => spawn_local(listener(event)),
            Err(err) => log::error!("[{}]: bad event payload: {}", tag, err),
        }
    });
    add_listener(callback.as_ref().unchecked_ref());
    callback.forget();
}

/// Run `task` every `ms` milliseconds for the lifetime of the page
pub fn every(ms: u32, task: impl Fn() -> EventFuture + 'static) {
    let callback = Closure::<dyn Fn()>::new(move || spawn_local(task()));
    setIntervalMs(callback.as_ref().unchecked_ref(), ms);
    callback.forget();
}

pub struct ChromeStorage;

impl Storage for ChromeStorage {
    async fn get(&self, key: &str, area: StorageArea) -> Result<Option<Value>, HostError> {
        let value = storageGet(area.as_str(), key).await.map_err(host_error)?;
        if value.is_undefined() || value.is_null() {
            return Ok(None);
        }
        Ok(Some(from_js(value)?))
    }

    async fn get_all(&self, area: StorageArea) -> Result<Map<String, Value>, HostError> {
        let values = storageGetAll(area.as_str()).await.map_err(host_error)?;
        if values.is_undefined() || values.is_null() {
            return Ok(Map::new());
        }
        from_js(values)
    }

    async fn set(&self, key: &str, value: Value, area: StorageArea) -> Result<(), HostError> {
        storageSet(area.as_str(), key, to_js(&value)?)
            .await
            .map_err(host_error)
    }

    async fn remove(&self, key: &str, area: StorageArea) -> Result<(), HostError> {
        storageRemove(area.as_str(), key).await.map_err(host_error)
    }

    async fn clear(&self, area: StorageArea) -> Result<(), HostError> {
        storageClear(area.as_str()).await.map_err(host_error)
    }

    fn on_changed(&self, listener: Listener<StorageChanged>) {
        register(onStorageChanged, "storage.onChanged", listener);
    }
}

pub struct ChromeTabs;

impl Tabs for ChromeTabs {
    async fn create(&self, props: CreateProperties) -> Result<BrowserTab, HostError> {
        from_js(tabsCreate(to_js(&props)?).await.map_err(host_error)?)
    }

    async fn query(&self, query: TabQuery) -> Result<Vec<BrowserTab>, HostError> {
        from_js(tabsQuery(to_js(&query)?).await.map_err(host_error)?)
    }

    async fn update(&self, tab_id: i32, props: UpdateProperties) -> Result<BrowserTab, HostError> {
        from_js(tabsUpdate(tab_id, to_js(&props)?).await.map_err(host_error)?)
    }

    async fn remove(&self, tab_id: i32) -> Result<(), HostError> {
        tabsRemove(tab_id).await.map_err(host_error)
    }

    fn on_created(&self, listener: Listener<BrowserTab>) {
        register(onTabCreated, "tabs.onCreated", listener);
    }

    fn on_updated(&self, listener: Listener<TabUpdated>) {
        register(onTabUpdated, "tabs.onUpdated", listener);
    }

    fn on_removed(&self, listener: Listener<TabRemoved>) {
        register(onTabRemoved, "tabs.onRemoved", listener);
    }
}

pub struct ChromeWindows;

impl Windows for ChromeWindows {
    async fn get(&self, window_id: i32) -> Result<BrowserWindow, HostError> {
        from_js(windowsGet(window_id).await.map_err(host_error)?)
    }

    async fn get_all(&self) -> Result<Vec<BrowserWindow>, HostError> {
        from_js(windowsGetAll().await.map_err(host_error)?)
    }

    async fn create(&self, props: WindowCreate) -> Result<BrowserWindow, HostError> {
        from_js(windowsCreate(to_js(&props)?).await.map_err(host_error)?)
    }

    async fn update(&self, window_id: i32, props: WindowUpdate) -> Result<BrowserWindow, HostError> {
        from_js(windowsUpdate(window_id, to_js(&props)?).await.map_err(host_error)?)
    }

    async fn remove(&self, window_id: i32) -> Result<(), HostError> {
        windowsRemove(window_id).await.map_err(host_error)
    }

    fn on_removed(&self, listener: Listener<i32>) {
        register(onWindowRemoved, "windows.onRemoved", listener);
    }
}

pub struct ChromeHistory;

impl History for ChromeHistory {
    async fn search(&self, query: HistoryQuery) -> Result<Vec<HistoryItem>, HostError> {
        from_js(historySearch(to_js(&query)?).await.map_err(host_error)?)
    }

    async fn delete_url(&self, url: &str) -> Result<(), HostError> {
        historyDeleteUrl(url).await.map_err(host_error)
    }

    fn on_visited(&self, listener: Listener<HistoryItem>) {
        register(onHistoryVisited, "history.onVisited", listener);
    }

    fn on_visit_removed(&self, listener: Listener<VisitRemoved>) {
        register(onHistoryVisitRemoved, "history.onVisitRemoved", listener);
    }
}

/// `Date` in the browser's time zone
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        js_sys::Date::now()
    }

    fn utc_offset_minutes(&self, at: f64) -> i32 {
        let date = js_sys::Date::new(&JsValue::from_f64(at));
        // getTimezoneOffset is UTC minus local
        -(date.get_timezone_offset() as i32)
    }
}

pub struct ChromeHost {
    storage: ChromeStorage,
    tabs: ChromeTabs,
    windows: ChromeWindows,
    history: ChromeHistory,
    clock: SystemClock,
}

impl ChromeHost {
    pub fn new() -> Self {
        ChromeHost {
            storage: ChromeStorage,
            tabs: ChromeTabs,
            windows: ChromeWindows,
            history: ChromeHistory,
            clock: SystemClock,
        }
    }
}

impl Default for ChromeHost {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for ChromeHost {
    type Storage = ChromeStorage;
    type Tabs = ChromeTabs;
    type Windows = ChromeWindows;
    type History = ChromeHistory;
    type Clock = SystemClock;

    fn storage(&self) -> &ChromeStorage {
        &self.storage
    }

    fn tabs(&self) -> &ChromeTabs {
        &self.tabs
    }

    fn windows(&self) -> &ChromeWindows {
        &self.windows
    }

    fn history(&self) -> &ChromeHistory {
        &self.history
    }

    fn clock(&self) -> &SystemClock {
        &self.clock
    }
}
