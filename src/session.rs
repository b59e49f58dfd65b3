/// Saved sessions: named snapshots of the open tabs
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::{self, Clock, CreateProperties, Host, Storage, StorageArea, TabQuery, Tabs, WindowCreate, Windows};
use crate::constants::{AUTO_SAVE_SESSION_KEY, DEFAULT_FAVICON, SESSIONS_KEY};
use crate::domain::is_extension_url;
use crate::error::HostError;
use crate::transform::random_id;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionTab {
    pub id: String,
    pub title: String,
    pub url: String,
    pub fav_icon_url: String,
    pub window_id: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: f64,
    pub updated_at: f64,
    pub tabs: Vec<SessionTab>,
    pub windows_count: usize,
}

/// Snapshot written by the background page on a timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoSavedSession {
    pub timestamp: f64,
    pub tabs: Vec<SessionTab>,
    pub is_abnormal_close: bool,
}

/// Fields of a session the user can edit; `None` leaves a field alone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tabs: Option<Vec<SessionTab>>,
}

/// Stored sessions, newest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionList {
    pub sessions: Vec<Session>,
}

impl SessionList {
    pub fn new() -> Self {
        SessionList {
            sessions: Vec::new(),
        }
    }

    pub fn add_session(&mut self, session: Session) {
        self.sessions.insert(0, session);
    }

    pub fn remove_session(&mut self, session_id: &str) -> bool {
        let original_len = self.sessions.len();
        self.sessions.retain(|s| s.id != session_id);
        self.sessions.len() < original_len
    }

    pub fn get_session(&self, session_id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    pub fn update_session(&mut self, session_id: &str, update: SessionUpdate, now: f64) -> bool {
        self.sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .map(|session| {
                if let Some(name) = update.name {
                    session.name = name;
                }
                if let Some(description) = update.description {
                    session.description = Some(description);
                }
                if let Some(tabs) = update.tabs {
                    session.tabs = tabs;
                }
                session.updated_at = now;
            })
            .is_some()
    }

    pub fn remove_tab(&mut self, session_id: &str, tab_id: &str, now: f64) -> bool {
        self.sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .map(|session| {
                session.tabs.retain(|tab| tab.id != tab_id);
                session.updated_at = now;
            })
            .is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

/// URLs grouped by their original window, in first-seen order
fn urls_by_window(tabs: &[SessionTab]) -> Vec<Vec<String>> {
    let mut groups: Vec<(i32, Vec<String>)> = Vec::new();
    for tab in tabs {
        match groups.iter_mut().find(|(window_id, _)| *window_id == tab.window_id) {
            Some((_, urls)) => urls.push(tab.url.clone()),
            None => groups.push((tab.window_id, vec![tab.url.clone()])),
        }
    }
    groups.into_iter().map(|(_, urls)| urls).collect()
}

async fn open_in_windows(host: &impl Host, tabs: &[SessionTab]) -> Result<(), HostError> {
    for urls in urls_by_window(tabs) {
        host.windows()
            .create(WindowCreate {
                url: urls,
                focused: None,
            })
            .await?;
    }
    Ok(())
}

/// Open tabs worth keeping, as session entries
async fn capture_open_tabs(host: &impl Host) -> Result<Vec<SessionTab>, HostError> {
    let tabs = host.tabs().query(TabQuery::default()).await?;
    let now = host.clock().now();

    Ok(tabs
        .into_iter()
        .filter_map(|tab| {
            let url = tab.url.filter(|url| !url.is_empty() && !is_extension_url(url))?;
            Some(SessionTab {
                id: format!("{}-{}", now, random_id()),
                title: tab.title.filter(|title| !title.is_empty()).unwrap_or_else(|| url.clone()),
                fav_icon_url: tab
                    .fav_icon_url
                    .filter(|icon| !icon.is_empty())
                    .unwrap_or_else(|| DEFAULT_FAVICON.to_string()),
                window_id: tab.window_id,
                url,
            })
        })
        .collect())
}

pub async fn get_sessions(storage: &impl Storage) -> Result<SessionList, HostError> {
    let sessions: Option<SessionList> = api::load(storage, SESSIONS_KEY, StorageArea::Local).await?;
    Ok(sessions.unwrap_or_default())
}

pub async fn save_sessions(storage: &impl Storage, sessions: &SessionList) -> Result<(), HostError> {
    api::store(storage, SESSIONS_KEY, sessions, StorageArea::Local).await
}

/// Save the open tabs as a new session at the top of the list
pub async fn create_session(
    host: &impl Host,
    name: &str,
    description: Option<String>,
) -> Result<Session, HostError> {
    let tabs = capture_open_tabs(host).await?;
    let mut window_ids: Vec<i32> = tabs.iter().map(|tab| tab.window_id).collect();
    window_ids.sort_unstable();
    window_ids.dedup();

    let now = host.clock().now();
    let session = Session {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: description.filter(|d| !d.is_empty()),
        created_at: now,
        updated_at: now,
        windows_count: window_ids.len(),
        tabs,
    };

    let mut sessions = get_sessions(host.storage()).await?;
    sessions.add_session(session.clone());
    save_sessions(host.storage(), &sessions).await?;

    log::info!("Created session '{}' with {} tabs", session.name, session.tabs.len());
    Ok(session)
}

/// Returns false when no session has `session_id`
pub async fn update_session(host: &impl Host, session_id: &str, update: SessionUpdate) -> Result<bool, HostError> {
    let mut sessions = get_sessions(host.storage()).await?;
    if !sessions.update_session(session_id, update, host.clock().now()) {
        return Ok(false);
    }
    save_sessions(host.storage(), &sessions).await?;
    Ok(true)
}

pub async fn delete_session(storage: &impl Storage, session_id: &str) -> Result<bool, HostError> {
    let mut sessions = get_sessions(storage).await?;
    let removed = sessions.remove_session(session_id);
    save_sessions(storage, &sessions).await?;
    Ok(removed)
}

pub async fn remove_tab_from_session(host: &impl Host, session_id: &str, tab_id: &str) -> Result<bool, HostError> {
    let mut sessions = get_sessions(host.storage()).await?;
    if !sessions.remove_tab(session_id, tab_id, host.clock().now()) {
        return Ok(false);
    }
    save_sessions(host.storage(), &sessions).await?;
    Ok(true)
}

/// Reopen a session, one new window per original window or every tab
/// in the current window. Failures are logged.
pub async fn restore_session(host: &impl Host, session_id: &str, new_window: bool) {
    let result = async {
        let sessions = get_sessions(host.storage()).await?;
        let Some(session) = sessions.get_session(session_id) else {
            log::warn!("[restoreSession]: no session with id {}", session_id);
            return Ok(());
        };

        if new_window {
            open_in_windows(host, &session.tabs).await?;
        } else {
            for tab in &session.tabs {
                host.tabs().create(CreateProperties::url(&tab.url)).await?;
            }
        }
        Ok::<(), HostError>(())
    }
    .await;

    if let Err(err) = result {
        log::error!("[restoreSession]: {}", err);
    }
}

pub async fn auto_save_current_session(host: &impl Host, is_abnormal_close: bool) -> Result<AutoSavedSession, HostError> {
    let snapshot = AutoSavedSession {
        tabs: capture_open_tabs(host).await?,
        timestamp: host.clock().now(),
        is_abnormal_close,
    };
    api::store(host.storage(), AUTO_SAVE_SESSION_KEY, &snapshot, StorageArea::Local).await?;
    log::debug!("Auto-saved {} tabs", snapshot.tabs.len());
    Ok(snapshot)
}

pub async fn get_auto_saved_session(storage: &impl Storage) -> Result<Option<AutoSavedSession>, HostError> {
    api::load(storage, AUTO_SAVE_SESSION_KEY, StorageArea::Local).await
}

pub async fn clear_auto_saved_session(storage: &impl Storage) -> Result<(), HostError> {
    storage.remove(AUTO_SAVE_SESSION_KEY, StorageArea::Local).await
}

/// Reopen the auto-saved snapshot window by window, then forget it
pub async fn restore_auto_saved_session(host: &impl Host) {
    let result = async {
        let Some(snapshot) = get_auto_saved_session(host.storage()).await? else {
            return Ok(());
        };
        if snapshot.tabs.is_empty() {
            return Ok(());
        }
        open_in_windows(host, &snapshot.tabs).await?;
        clear_auto_saved_session(host.storage()).await
    }
    .await;

    if let Err(err) = result {
        log::error!("[restoreAutoSavedSession]: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeHost, MINUTE, NOON, block_on, tab};

    fn session_tab(id: &str, url: &str, window_id: i32) -> SessionTab {
        SessionTab {
            id: id.to_string(),
            title: url.to_string(),
            url: url.to_string(),
            fav_icon_url: DEFAULT_FAVICON.to_string(),
            window_id,
        }
    }

    fn create_test_session(id: &str, name: &str) -> Session {
        Session {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            created_at: NOON,
            updated_at: NOON,
            tabs: vec![
                session_tab("t1", "https://github.com", 1),
                session_tab("t2", "https://docs.rs", 2),
                session_tab("t3", "https://crates.io", 1),
            ],
            windows_count: 2,
        }
    }

    fn host_with_session(id: &str) -> FakeHost {
        let host = FakeHost::new();
        let mut sessions = SessionList::new();
        sessions.add_session(create_test_session(id, "Work"));
        block_on(save_sessions(&host.storage, &sessions)).unwrap();
        host
    }

    #[test]
    fn test_add_session_puts_newest_first() {
        let mut sessions = SessionList::new();

        sessions.add_session(create_test_session("session-1", "First"));
        sessions.add_session(create_test_session("session-2", "Second"));

        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions.sessions[0].id, "session-2");
    }

    #[test]
    fn test_remove_session() {
        let mut sessions = SessionList::new();
        sessions.add_session(create_test_session("session-1", "Session 1"));
        sessions.add_session(create_test_session("session-2", "Session 2"));

        assert!(sessions.remove_session("session-1"));
        assert!(!sessions.remove_session("nonexistent"));
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions.sessions[0].id, "session-2");
    }

    #[test]
    fn test_update_session() {
        let mut sessions = SessionList::new();
        sessions.add_session(create_test_session("session-1", "Old Name"));

        let update = SessionUpdate {
            name: Some("New Name".to_string()),
            description: Some("Quarterly review".to_string()),
            tabs: None,
        };
        let updated = sessions.update_session("session-1", update, NOON + MINUTE);

        assert!(updated);
        let session = sessions.get_session("session-1").unwrap();
        assert_eq!(session.name, "New Name");
        assert_eq!(session.description.as_deref(), Some("Quarterly review"));
        assert_eq!(session.tabs.len(), 3);
        assert_eq!(session.updated_at, NOON + MINUTE);
        assert!(!sessions.update_session("missing", SessionUpdate::default(), NOON));
    }

    #[test]
    fn test_serializes_as_plain_list() {
        let mut sessions = SessionList::new();
        sessions.add_session(create_test_session("session-1", "Test"));

        let json = serde_json::to_value(&sessions).unwrap();

        assert!(json.is_array());
        assert_eq!(json[0]["windowsCount"], 2);
        assert_eq!(json[0]["tabs"][0]["favIconUrl"], DEFAULT_FAVICON);
        assert!(json[0].get("description").is_none());
        let back: SessionList = serde_json::from_value(json).unwrap();
        assert_eq!(back, sessions);
    }

    #[test]
    fn test_urls_by_window_keeps_first_seen_order() {
        let tabs = create_test_session("s", "S").tabs;

        assert_eq!(
            urls_by_window(&tabs),
            vec![
                vec!["https://github.com".to_string(), "https://crates.io".to_string()],
                vec!["https://docs.rs".to_string()],
            ]
        );
    }

    #[test]
    fn test_create_session_captures_open_tabs() {
        let host = FakeHost::new();
        host.tabs.open.borrow_mut().extend([
            tab(1, 1, "https://github.com", "GitHub"),
            tab(2, 1, "chrome://newtab/", "New Tab"),
            tab(3, 2, "https://docs.rs", ""),
        ]);

        let session = block_on(create_session(&host, "Morning", Some(String::new()))).unwrap();

        assert_eq!(session.tabs.len(), 2);
        assert_eq!(session.windows_count, 2);
        assert_eq!(session.description, None);
        assert_eq!(session.tabs[1].title, "https://docs.rs");
        assert_eq!(session.tabs[0].fav_icon_url, DEFAULT_FAVICON);
        assert!(Uuid::parse_str(&session.id).is_ok());

        let stored = block_on(get_sessions(&host.storage)).unwrap();
        assert_eq!(stored.sessions, vec![session]);
    }

    #[test]
    fn test_update_and_delete_stored_session() {
        let host = host_with_session("s1");
        host.clock.now.set(NOON + MINUTE);

        block_on(async {
            let rename = SessionUpdate {
                name: Some("Renamed".to_string()),
                ..SessionUpdate::default()
            };
            assert!(update_session(&host, "s1", rename).await.unwrap());
            assert!(!update_session(&host, "nope", SessionUpdate::default()).await.unwrap());

            let stored = get_sessions(&host.storage).await.unwrap();
            assert_eq!(stored.sessions[0].name, "Renamed");
            assert_eq!(stored.sessions[0].updated_at, NOON + MINUTE);

            assert!(delete_session(&host.storage, "s1").await.unwrap());
            assert!(get_sessions(&host.storage).await.unwrap().is_empty());
        });
    }

    #[test]
    fn test_remove_tab_from_session() {
        let host = host_with_session("s1");

        block_on(async {
            assert!(remove_tab_from_session(&host, "s1", "t2").await.unwrap());
            assert!(!remove_tab_from_session(&host, "missing", "t1").await.unwrap());
        });

        let stored = block_on(get_sessions(&host.storage)).unwrap();
        let ids: Vec<&str> = stored.sessions[0].tabs.iter().map(|tab| tab.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
    }

    #[test]
    fn test_restore_in_current_window() {
        let host = host_with_session("s1");

        block_on(restore_session(&host, "s1", false));

        let urls: Vec<String> = host
            .tabs
            .created
            .borrow()
            .iter()
            .filter_map(|props| props.url.clone())
            .collect();
        assert_eq!(urls, vec!["https://github.com", "https://docs.rs", "https://crates.io"]);
        assert!(host.windows.created.borrow().is_empty());
    }

    #[test]
    fn test_restore_in_new_windows() {
        let host = host_with_session("s1");

        block_on(restore_session(&host, "s1", true));

        let windows = host.windows.created.borrow();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].url, vec!["https://github.com", "https://crates.io"]);
        assert_eq!(windows[1].url, vec!["https://docs.rs"]);
        assert!(host.tabs.created.borrow().is_empty());
    }

    #[test]
    fn test_restore_failure_is_logged_not_returned() {
        let host = host_with_session("s1");
        host.tabs.failing.set(true);

        block_on(restore_session(&host, "s1", false));
        block_on(restore_session(&host, "unknown", true));

        assert!(host.windows.created.borrow().is_empty());
    }

    #[test]
    fn test_auto_save_round_trip() {
        let host = FakeHost::new();
        host.tabs.open.borrow_mut().extend([
            tab(1, 1, "https://github.com", "GitHub"),
            tab(2, 2, "https://docs.rs", "Docs"),
        ]);

        block_on(async {
            assert_eq!(get_auto_saved_session(&host.storage).await.unwrap(), None);

            let saved = auto_save_current_session(&host, true).await.unwrap();
            assert!(saved.is_abnormal_close);
            assert_eq!(saved.timestamp, NOON);

            let loaded = get_auto_saved_session(&host.storage).await.unwrap();
            assert_eq!(loaded, Some(saved));

            clear_auto_saved_session(&host.storage).await.unwrap();
            assert_eq!(get_auto_saved_session(&host.storage).await.unwrap(), None);
        });
    }

    #[test]
    fn test_restore_auto_saved_session_opens_windows_and_clears() {
        let host = FakeHost::new();
        host.tabs.open.borrow_mut().extend([
            tab(1, 1, "https://github.com", "GitHub"),
            tab(2, 2, "https://docs.rs", "Docs"),
            tab(3, 1, "https://crates.io", "Crates"),
        ]);

        block_on(async {
            auto_save_current_session(&host, false).await.unwrap();
            restore_auto_saved_session(&host).await;
        });

        assert_eq!(host.windows.created.borrow().len(), 2);
        assert_eq!(host.storage.value(AUTO_SAVE_SESSION_KEY), None);
    }

    #[test]
    fn test_restore_auto_saved_session_keeps_snapshot_on_failure() {
        let host = FakeHost::new();
        host.tabs.open.borrow_mut().push(tab(1, 1, "https://github.com", "GitHub"));
        block_on(auto_save_current_session(&host, false)).unwrap();
        host.windows.failing.set(true);

        block_on(restore_auto_saved_session(&host));

        assert!(host.storage.value(AUTO_SAVE_SESSION_KEY).is_some());
    }
}
