/// Capability interfaces over the browser extension APIs
///
/// Every call suspends until the host answers and resolves to a
/// `HostError::Host` when the host reports `runtime.lastError`. The
/// extension runs on a single thread, so futures here are not `Send`.
pub mod chrome;
pub mod model;

use std::future::Future;
use std::pin::Pin;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::HostError;
pub use model::*;

/// Future returned by an event listener
pub type EventFuture = Pin<Box<dyn Future<Output = ()>>>;

/// Event callback registered for the lifetime of the extension page
pub type Listener<E> = Box<dyn Fn(E) -> EventFuture>;

#[allow(async_fn_in_trait)]
pub trait Storage {
    /// Value stored under `key`, `None` when unset
    async fn get(&self, key: &str, area: StorageArea) -> Result<Option<Value>, HostError>;
    async fn get_all(&self, area: StorageArea) -> Result<Map<String, Value>, HostError>;
    async fn set(&self, key: &str, value: Value, area: StorageArea) -> Result<(), HostError>;
    async fn remove(&self, key: &str, area: StorageArea) -> Result<(), HostError>;
    async fn clear(&self, area: StorageArea) -> Result<(), HostError>;
    fn on_changed(&self, listener: Listener<StorageChanged>);
}

#[allow(async_fn_in_trait)]
pub trait Tabs {
    async fn create(&self, props: CreateProperties) -> Result<BrowserTab, HostError>;
    async fn query(&self, query: TabQuery) -> Result<Vec<BrowserTab>, HostError>;
    async fn update(&self, tab_id: i32, props: UpdateProperties) -> Result<BrowserTab, HostError>;
    async fn remove(&self, tab_id: i32) -> Result<(), HostError>;
    fn on_created(&self, listener: Listener<BrowserTab>);
    fn on_updated(&self, listener: Listener<TabUpdated>);
    fn on_removed(&self, listener: Listener<TabRemoved>);
}

#[allow(async_fn_in_trait)]
pub trait Windows {
    async fn get(&self, window_id: i32) -> Result<BrowserWindow, HostError>;
    async fn get_all(&self) -> Result<Vec<BrowserWindow>, HostError>;
    async fn create(&self, props: WindowCreate) -> Result<BrowserWindow, HostError>;
    async fn update(&self, window_id: i32, props: WindowUpdate) -> Result<BrowserWindow, HostError>;
    async fn remove(&self, window_id: i32) -> Result<(), HostError>;
    fn on_removed(&self, listener: Listener<i32>);
}

#[allow(async_fn_in_trait)]
pub trait History {
    async fn search(&self, query: HistoryQuery) -> Result<Vec<HistoryItem>, HostError>;
    async fn delete_url(&self, url: &str) -> Result<(), HostError>;
    fn on_visited(&self, listener: Listener<HistoryItem>);
    fn on_visit_removed(&self, listener: Listener<VisitRemoved>);
}

/// Wall clock in epoch milliseconds
pub trait Clock {
    fn now(&self) -> f64;

    /// Offset of local time from UTC at `at`, in minutes (UTC+8 is `480`)
    fn utc_offset_minutes(&self, at: f64) -> i32;

    /// Local midnight of the current day
    fn start_of_today(&self) -> f64 {
        let now = self.now();
        let offset_ms = f64::from(self.utc_offset_minutes(now)) * 60_000.0;
        let local = now + offset_ms;
        (local / 86_400_000.0).floor() * 86_400_000.0 - offset_ms
    }
}

/// Everything the extension needs from the browser
pub trait Host {
    type Storage: Storage;
    type Tabs: Tabs;
    type Windows: Windows;
    type History: History;
    type Clock: Clock;

    fn storage(&self) -> &Self::Storage;
    fn tabs(&self) -> &Self::Tabs;
    fn windows(&self) -> &Self::Windows;
    fn history(&self) -> &Self::History;
    fn clock(&self) -> &Self::Clock;
}

/// Read a typed value, `None` when the key is unset
pub async fn load<T: DeserializeOwned>(
    storage: &impl Storage,
    key: &str,
    area: StorageArea,
) -> Result<Option<T>, HostError> {
    match storage.get(key, area).await? {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value)?)),
    }
}

pub async fn store<T: Serialize>(
    storage: &impl Storage,
    key: &str,
    value: &T,
    area: StorageArea,
) -> Result<(), HostError> {
    storage.set(key, serde_json::to_value(value)?, area).await
}
