/// Background bookkeeping that turns tab closes into closed-tab records
///
/// Closing events only carry ids, so every live tab is mirrored in memory
/// while it is open. When a tab or its window goes away the mirrored entry
/// is persisted (if its URL is worth keeping) and then forgotten.
///
/// Saves are read-modify-write on one stored list, so they run one at a
/// time: removals queue their entry and a single drain writes them in order.
use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::{Rc, Weak};

use crate::api::{BrowserTab, EventFuture, Host, TabQuery, TabRemoved, TabUpdated, Tabs, Windows};
use crate::constants::MAX_TABS_COUNT;
use crate::domain::{is_extension_url, is_persistable_url};
use crate::error::HostError;
use crate::providers::save_closed_tab;
use crate::settings::Settings;
use crate::tab_data::TabCacheEntry;

pub struct ClosedTabCapture<H: Host> {
    host: Rc<H>,
    tabs: RefCell<HashMap<i32, TabCacheEntry>>,
    pending: RefCell<VecDeque<TabCacheEntry>>,
    saving: Cell<bool>,
}

impl<H: Host + 'static> ClosedTabCapture<H> {
    pub fn new(host: Rc<H>) -> Rc<Self> {
        Rc::new(ClosedTabCapture {
            host,
            tabs: RefCell::new(HashMap::new()),
            pending: RefCell::new(VecDeque::new()),
            saving: Cell::new(false),
        })
    }

    /// Mirror every tab that is already open
    pub async fn seed(&self) -> Result<(), HostError> {
        let tabs = self.host.tabs().query(TabQuery::default()).await?;
        for tab in &tabs {
            self.upsert(tab);
        }
        log::info!("Tracking {} open tabs", self.len());
        Ok(())
    }

    /// Register the tab and window listeners for the lifetime of the page
    pub fn install(self: &Rc<Self>) {
        let weak = Rc::downgrade(self);
        self.host.tabs().on_created(Box::new(move |tab: BrowserTab| -> EventFuture {
            if let Some(capture) = weak.upgrade() {
                capture.upsert(&tab);
            }
            Box::pin(async {})
        }));

        let weak = Rc::downgrade(self);
        self.host.tabs().on_updated(Box::new(move |event: TabUpdated| -> EventFuture {
            if let Some(capture) = weak.upgrade() {
                capture.on_tab_updated(&event);
            }
            Box::pin(async {})
        }));

        let weak: Weak<Self> = Rc::downgrade(self);
        self.host.tabs().on_removed(Box::new(move |event: TabRemoved| -> EventFuture {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(capture) = weak.upgrade() {
                    capture.on_tab_removed(event.tab_id).await;
                }
            })
        }));

        let weak: Weak<Self> = Rc::downgrade(self);
        self.host.windows().on_removed(Box::new(move |window_id: i32| -> EventFuture {
            let weak = weak.clone();
            Box::pin(async move {
                if let Some(capture) = weak.upgrade() {
                    capture.on_window_removed(window_id).await;
                }
            })
        }));
    }

    /// Remember `tab`; internal pages and tabs without a URL are ignored
    pub fn upsert(&self, tab: &BrowserTab) {
        let Some(tab_id) = tab.id else {
            return;
        };
        let Some(entry) = TabCacheEntry::from_tab(tab) else {
            return;
        };
        if is_extension_url(&entry.url) {
            return;
        }
        self.tabs.borrow_mut().insert(tab_id, entry);
    }

    pub fn on_tab_updated(&self, event: &TabUpdated) {
        let change = &event.change;
        if change.is_complete() || change.url.is_some() || change.title.is_some() {
            let mut tab = event.tab.clone();
            tab.id.get_or_insert(event.tab_id);
            self.upsert(&tab);
        }
    }

    pub async fn on_tab_removed(&self, tab_id: i32) {
        let entry = self.tabs.borrow_mut().remove(&tab_id);
        let Some(entry) = entry else {
            return;
        };
        self.pending.borrow_mut().push_back(entry);

        // a drain already running picks this entry up
        if self.saving.replace(true) {
            return;
        }
        loop {
            let next = self.pending.borrow_mut().pop_front();
            let Some(entry) = next else {
                break;
            };
            self.persist(&entry).await;
        }
        self.saving.set(false);
    }

    pub async fn on_window_removed(&self, window_id: i32) {
        let tab_ids: Vec<i32> = self
            .tabs
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.window_id == window_id)
            .map(|(tab_id, _)| *tab_id)
            .collect();

        for tab_id in tab_ids {
            self.on_tab_removed(tab_id).await;
        }
    }

    async fn persist(&self, entry: &TabCacheEntry) {
        if !is_persistable_url(&entry.url) {
            log::debug!("Skipping closed tab {}", entry.url);
            return;
        }

        let max_stored_tabs = match Settings::load(self.host.storage()).await {
            Ok(settings) => settings.max_stored_tabs,
            Err(err) => {
                log::warn!("[saveClosedTab]: settings unavailable, using default cap: {}", err);
                MAX_TABS_COUNT
            }
        };

        if let Err(err) = save_closed_tab(self.host.as_ref(), entry, max_stored_tabs).await {
            log::error!("[saveClosedTab]: {}", err);
        }
    }

    pub fn cached(&self, tab_id: i32) -> Option<TabCacheEntry> {
        self.tabs.borrow().get(&tab_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.tabs.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{StorageArea, TabChangeInfo};
    use crate::constants::{CLOSED_TABS_KEY, MAX_STORED_TABS_KEY, TAB_TYPE_KEY};
    use crate::providers::get_closed_tabs;
    use crate::testing::{FakeHost, MINUTE, NOON, block_on, tab};
    use serde_json::json;
    use std::future::Future;
    use std::task::{Context, Waker};

    fn installed() -> (Rc<FakeHost>, Rc<ClosedTabCapture<FakeHost>>) {
        let host = Rc::new(FakeHost::new());
        let capture = ClosedTabCapture::new(host.clone());
        capture.install();
        (host, capture)
    }

    fn stored_urls(host: &FakeHost) -> Vec<String> {
        block_on(get_closed_tabs(&host.storage))
            .unwrap()
            .into_iter()
            .map(|tab| tab.url)
            .collect()
    }

    #[test]
    fn test_install_registers_listeners() {
        let (host, _capture) = installed();

        assert_eq!(host.tabs.listener_count(), 3);
        assert_eq!(host.windows.listener_count(), 1);
    }

    #[test]
    fn test_seed_mirrors_open_tabs() {
        let host = Rc::new(FakeHost::new());
        host.tabs.open.borrow_mut().extend([
            tab(1, 1, "https://github.com", "GitHub"),
            tab(2, 1, "chrome://settings", "Settings"),
        ]);
        let capture = ClosedTabCapture::new(host.clone());

        block_on(capture.seed()).unwrap();

        assert_eq!(capture.len(), 1);
        assert_eq!(capture.cached(1).unwrap().url, "https://github.com");
    }

    #[test]
    fn test_closing_a_tab_saves_it() {
        let (host, capture) = installed();

        block_on(async {
            host.tabs.fire_created(tab(1, 1, "https://github.com", "GitHub")).await;
            host.clock.now.set(NOON + MINUTE);
            host.tabs.fire_removed(1, 1).await;
        });

        let tabs = block_on(get_closed_tabs(&host.storage)).unwrap();
        assert_eq!(tabs.len(), 1);
        assert_eq!(tabs[0].url, "https://github.com");
        assert_eq!(tabs[0].title, "GitHub");
        assert_eq!(tabs[0].closed_at, NOON + MINUTE);
        assert!(capture.is_empty());
    }

    #[test]
    fn test_internal_and_local_pages_are_not_saved() {
        let (host, capture) = installed();

        block_on(async {
            host.tabs.fire_created(tab(1, 1, "chrome://extensions", "Extensions")).await;
            capture.upsert(&tab(2, 1, "http://localhost:8080", "Dev server"));
            capture.upsert(&tab(3, 1, "file:///tmp/report.html", "Report"));
            for id in 1..=3 {
                host.tabs.fire_removed(id, 1).await;
            }
        });

        assert!(stored_urls(&host).is_empty());
        assert_eq!(host.storage.value(CLOSED_TABS_KEY), None);
        assert!(capture.is_empty());
    }

    #[test]
    fn test_unknown_tab_is_ignored() {
        let (host, _capture) = installed();

        block_on(host.tabs.fire_removed(99, 1));

        assert_eq!(host.storage.set_calls.get(), 0);
    }

    #[test]
    fn test_update_tracks_navigation() {
        let (host, capture) = installed();
        let loading = TabChangeInfo {
            status: Some("loading".to_string()),
            ..TabChangeInfo::default()
        };
        let complete = TabChangeInfo {
            status: Some("complete".to_string()),
            ..TabChangeInfo::default()
        };

        block_on(async {
            host.tabs.fire_created(tab(1, 1, "https://a.example.com", "A")).await;
            host.tabs
                .fire_updated(1, loading, tab(1, 1, "https://b.example.com", "B"))
                .await;
        });
        assert_eq!(capture.cached(1).unwrap().url, "https://a.example.com");

        block_on(
            host.tabs
                .fire_updated(1, complete, tab(1, 1, "https://b.example.com", "B")),
        );
        assert_eq!(capture.cached(1).unwrap().url, "https://b.example.com");
    }

    #[test]
    fn test_closing_a_window_saves_its_tabs() {
        let (host, capture) = installed();

        block_on(async {
            host.tabs.fire_created(tab(1, 1, "https://a.example.com", "A")).await;
            host.tabs.fire_created(tab(2, 1, "https://b.example.com", "B")).await;
            host.tabs.fire_created(tab(3, 2, "https://c.example.com", "C")).await;
            host.windows.fire_removed(1).await;
        });

        let mut urls = stored_urls(&host);
        urls.sort();
        assert_eq!(urls, vec!["https://a.example.com", "https://b.example.com"]);
        assert_eq!(capture.len(), 1);
        assert!(capture.cached(3).is_some());
    }

    #[test]
    fn test_save_failure_still_forgets_tab() {
        let (host, capture) = installed();
        block_on(host.tabs.fire_created(tab(1, 1, "https://github.com", "GitHub")));
        host.storage.failing.set(true);

        block_on(host.tabs.fire_removed(1, 1));

        assert!(capture.is_empty());
    }

    #[test]
    fn test_respects_configured_cap() {
        let (host, _capture) = installed();
        host.storage.put(MAX_STORED_TABS_KEY, json!(2));

        block_on(async {
            for id in 1..=3 {
                host.clock.now.set(NOON + f64::from(id) * MINUTE);
                host.tabs
                    .fire_created(tab(id, 1, &format!("https://{}.example.com", id), "Page"))
                    .await;
                host.tabs.fire_removed(id, 1).await;
            }
        });

        assert_eq!(stored_urls(&host), vec!["https://3.example.com", "https://2.example.com"]);
    }

    #[test]
    fn test_cap_of_360_drops_the_oldest_tab() {
        let (host, _capture) = installed();
        host.storage.put(TAB_TYPE_KEY, json!("closed"));
        host.storage
            .put_in(StorageArea::Local, MAX_STORED_TABS_KEY, json!(360));

        block_on(async {
            for id in 0..361 {
                host.clock.now.set(NOON + f64::from(id) * 1000.0);
                host.tabs
                    .fire_created(tab(id, 1, &format!("https://example.com/page/{}", id), "Page"))
                    .await;
                host.tabs.fire_removed(id, 1).await;
            }
        });

        let urls = stored_urls(&host);
        assert_eq!(urls.len(), 360);
        assert_eq!(urls[0], "https://example.com/page/360");
        assert!(!urls.contains(&"https://example.com/page/0".to_string()));
    }

    #[test]
    fn test_overlapping_removals_keep_every_tab() {
        let (host, capture) = installed();
        block_on(async {
            host.tabs.fire_created(tab(1, 1, "https://a.example.com", "A")).await;
            host.tabs.fire_created(tab(2, 1, "https://b.example.com", "B")).await;
        });
        host.storage.yielding.set(true);

        // drive both removals by hand so their storage awaits interleave
        let mut first = Box::pin(capture.on_tab_removed(1));
        let mut second = Box::pin(capture.on_tab_removed(2));
        let mut cx = Context::from_waker(Waker::noop());
        let (mut first_done, mut second_done) = (false, false);
        while !(first_done && second_done) {
            if !first_done {
                first_done = first.as_mut().poll(&mut cx).is_ready();
            }
            if !second_done {
                second_done = second.as_mut().poll(&mut cx).is_ready();
            }
        }

        let mut urls = stored_urls(&host);
        urls.sort();
        assert_eq!(urls, vec!["https://a.example.com", "https://b.example.com"]);
        assert!(capture.is_empty());
    }
}
