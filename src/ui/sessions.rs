/// Sessions page: save, browse and restore snapshots of the open tabs
use std::collections::BTreeMap;

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::api::Clock;
use crate::api::chrome::{ChromeHost, ChromeStorage, SystemClock};
use crate::error::HostError;
use crate::session::{
    self, AutoSavedSession, Session, SessionList, SessionTab, SessionUpdate,
};
use crate::transform::format_date;

#[derive(Clone, PartialEq)]
enum ViewState {
    Loading,
    Idle,
    Working(String),
    Error(String),
}

/// Sessions whose name, description or any tab title/URL contains `query`
pub fn filter_sessions(sessions: &SessionList, query: &str) -> Vec<Session> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return sessions.sessions.clone();
    }

    sessions
        .sessions
        .iter()
        .filter(|session| {
            session.name.to_lowercase().contains(&query)
                || session
                    .description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
                || session.tabs.iter().any(|tab| {
                    tab.url.to_lowercase().contains(&query) || tab.title.to_lowercase().contains(&query)
                })
        })
        .cloned()
        .collect()
}

/// Tabs grouped by the window they were saved from, by window id
pub fn group_by_window(tabs: &[SessionTab]) -> Vec<(i32, Vec<SessionTab>)> {
    let mut groups: BTreeMap<i32, Vec<SessionTab>> = BTreeMap::new();
    for tab in tabs {
        groups.entry(tab.window_id).or_default().push(tab.clone());
    }
    groups.into_iter().collect()
}

fn local_date(epoch_ms: f64) -> String {
    format_date(epoch_ms, SystemClock.utc_offset_minutes(epoch_ms))
}

async fn load_all() -> Result<(SessionList, Option<AutoSavedSession>), HostError> {
    let sessions = session::get_sessions(&ChromeStorage).await?;
    let auto_saved = session::get_auto_saved_session(&ChromeStorage).await?;
    Ok((sessions, auto_saved))
}

#[function_component(SessionsViewer)]
pub fn sessions_viewer() -> Html {
    let state = use_state(|| ViewState::Loading);
    let sessions = use_state(SessionList::new);
    let auto_saved = use_state(|| None::<AutoSavedSession>);
    let search_query = use_state(String::new);
    let new_name = use_state(String::new);
    let new_description = use_state(String::new);

    // Re-read sessions and the auto-saved snapshot
    let reload = {
        let state = state.clone();
        let sessions = sessions.clone();
        let auto_saved = auto_saved.clone();

        Callback::from(move |_: ()| {
            let state = state.clone();
            let sessions = sessions.clone();
            let auto_saved = auto_saved.clone();

            spawn_local(async move {
                match load_all().await {
                    Ok((list, snapshot)) => {
                        sessions.set(list);
                        auto_saved.set(snapshot);
                        state.set(ViewState::Idle);
                    }
                    Err(e) => {
                        state.set(ViewState::Error(format!("Failed to load: {}", e)));
                    }
                }
            });
        })
    };

    {
        let reload = reload.clone();
        use_effect_with((), move |_| {
            reload.emit(());
            || ()
        });
    }

    let on_search_input = {
        let search_query = search_query.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                search_query.set(input.value());
            }
        })
    };

    let on_name_input = {
        let new_name = new_name.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                new_name.set(input.value());
            }
        })
    };

    let on_description_input = {
        let new_description = new_description.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                new_description.set(input.value());
            }
        })
    };

    // Save the open tabs as a new session
    let on_create = {
        let state = state.clone();
        let new_name = new_name.clone();
        let new_description = new_description.clone();
        let reload = reload.clone();

        Callback::from(move |_: MouseEvent| {
            let name = new_name.trim().to_string();
            if name.is_empty() {
                state.set(ViewState::Error("Session name is required".to_string()));
                return;
            }
            let description = Some(new_description.trim().to_string());
            new_name.set(String::new());
            new_description.set(String::new());
            state.set(ViewState::Working("Saving open tabs...".to_string()));

            let state = state.clone();
            let reload = reload.clone();
            spawn_local(async move {
                match session::create_session(&ChromeHost::new(), &name, description).await {
                    Ok(_) => reload.emit(()),
                    Err(e) => state.set(ViewState::Error(format!("Failed to save session: {}", e))),
                }
            });
        })
    };

    let on_delete_session = {
        let state = state.clone();
        let reload = reload.clone();

        Callback::from(move |session_id: String| {
            let state = state.clone();
            let reload = reload.clone();
            spawn_local(async move {
                match session::delete_session(&ChromeStorage, &session_id).await {
                    Ok(_) => reload.emit(()),
                    Err(e) => state.set(ViewState::Error(format!("Failed to delete: {}", e))),
                }
            });
        })
    };

    let on_restore_session = {
        let state = state.clone();

        Callback::from(move |(session_id, new_window): (String, bool)| {
            let state = state.clone();
            state.set(ViewState::Working("Restoring tabs...".to_string()));
            spawn_local(async move {
                session::restore_session(&ChromeHost::new(), &session_id, new_window).await;
                state.set(ViewState::Idle);
            });
        })
    };

    let on_rename = {
        let state = state.clone();
        let reload = reload.clone();

        Callback::from(move |(session_id, name): (String, String)| {
            let update = SessionUpdate {
                name: Some(name),
                ..SessionUpdate::default()
            };
            let state = state.clone();
            let reload = reload.clone();
            spawn_local(async move {
                match session::update_session(&ChromeHost::new(), &session_id, update).await {
                    Ok(_) => reload.emit(()),
                    Err(e) => state.set(ViewState::Error(format!("Failed to rename: {}", e))),
                }
            });
        })
    };

    let on_delete_tab = {
        let state = state.clone();
        let reload = reload.clone();

        Callback::from(move |(session_id, tab_id): (String, String)| {
            let state = state.clone();
            let reload = reload.clone();
            spawn_local(async move {
                match session::remove_tab_from_session(&ChromeHost::new(), &session_id, &tab_id).await {
                    Ok(_) => reload.emit(()),
                    Err(e) => state.set(ViewState::Error(format!("Failed to save: {}", e))),
                }
            });
        })
    };

    let on_restore_auto_saved = {
        let state = state.clone();
        let reload = reload.clone();

        Callback::from(move |_: MouseEvent| {
            state.set(ViewState::Working("Restoring last session...".to_string()));
            let reload = reload.clone();
            spawn_local(async move {
                session::restore_auto_saved_session(&ChromeHost::new()).await;
                reload.emit(());
            });
        })
    };

    let on_clear_auto_saved = {
        let state = state.clone();
        let auto_saved = auto_saved.clone();

        Callback::from(move |_: MouseEvent| {
            let state = state.clone();
            let auto_saved = auto_saved.clone();
            spawn_local(async move {
                match session::clear_auto_saved_session(&ChromeStorage).await {
                    Ok(()) => auto_saved.set(None),
                    Err(e) => state.set(ViewState::Error(format!("Failed to clear: {}", e))),
                }
            });
        })
    };

    let filtered_sessions = filter_sessions(&sessions, &search_query);

    html! {
        <div class="container">
            <div class="header">
                <h1 class="main-title">{"Sessions"}</h1>
            </div>

            {match &*state {
                ViewState::Loading => html! {
                    <div class="loading-text-center">
                        <Spinner />
                        <p class="loading-text">{"Loading sessions..."}</p>
                    </div>
                },
                ViewState::Working(msg) => html! {
                    <div class="message-container">
                        <Spinner />
                        <p class="message-text">{msg}</p>
                    </div>
                },
                ViewState::Error(err) => html! {
                    <Alert r#type={AlertType::Danger} title={"Error"} inline={true}>
                        {err.clone()}
                    </Alert>
                },
                ViewState::Idle => html! {}
            }}

            if let Some(snapshot) = (*auto_saved).clone() {
                if !snapshot.tabs.is_empty() {
                    <div class="auto-saved-banner">
                        <p class="message-text">
                            {format!(
                                "{} tabs from {}{}",
                                snapshot.tabs.len(),
                                local_date(snapshot.timestamp),
                                if snapshot.is_abnormal_close { " (browser closed unexpectedly)" } else { "" }
                            )}
                        </p>
                        <Button onclick={on_restore_auto_saved}>{"Restore"}</Button>
                        <Button onclick={on_clear_auto_saved} variant={ButtonVariant::Secondary}>
                            {"Dismiss"}
                        </Button>
                    </div>
                }
            }

            <div class="session-create">
                <input
                    type="text"
                    placeholder="Session name"
                    value={(*new_name).clone()}
                    oninput={on_name_input}
                    class="search-input"
                />
                <input
                    type="text"
                    placeholder="Description (optional)"
                    value={(*new_description).clone()}
                    oninput={on_description_input}
                    class="search-input"
                />
                <Button onclick={on_create} block={true}>
                    {"Save open tabs"}
                </Button>
            </div>

            <div class="search-container">
                <input
                    type="text"
                    placeholder="Search sessions, titles or URLs..."
                    value={(*search_query).clone()}
                    oninput={on_search_input}
                    class="search-input"
                />
            </div>

            if filtered_sessions.is_empty() {
                <div class="empty-state">
                    if search_query.is_empty() {
                        <p>{"No saved sessions yet."}</p>
                    } else {
                        <p>{"No sessions match your search."}</p>
                    }
                </div>
            } else {
                <div class="sessions-list">
                    {for filtered_sessions.iter().map(|session| html! {
                        <SessionCard
                            key={session.id.clone()}
                            session={session.clone()}
                            on_delete={on_delete_session.clone()}
                            on_restore={on_restore_session.clone()}
                            on_rename={on_rename.clone()}
                            on_delete_tab={on_delete_tab.clone()}
                        />
                    })}
                </div>
            }

            <div class="footer">
                {format!("{} sessions • {} total tabs",
                    sessions.len(),
                    sessions.sessions.iter().map(|s| s.tabs.len()).sum::<usize>()
                )}
            </div>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct SessionCardProps {
    session: Session,
    on_delete: Callback<String>,
    on_restore: Callback<(String, bool)>,
    /// `(session id, new name)`, only for a non-empty changed name
    on_rename: Callback<(String, String)>,
    on_delete_tab: Callback<(String, String)>,
}

#[function_component(SessionCard)]
fn session_card(props: &SessionCardProps) -> Html {
    let expanded = use_state(|| false);
    // Draft name while renaming
    let draft = use_state(|| None::<String>);
    let session = &props.session;

    let start_rename = {
        let draft = draft.clone();
        let name = session.name.clone();
        Callback::from(move |_: MouseEvent| draft.set(Some(name.clone())))
    };

    let on_draft_input = {
        let draft = draft.clone();
        Callback::from(move |e: InputEvent| {
            if let Some(input) = e.target_dyn_into::<HtmlInputElement>() {
                draft.set(Some(input.value()));
            }
        })
    };

    let commit_rename = {
        let draft = draft.clone();
        let on_rename = props.on_rename.clone();
        let session_id = session.id.clone();
        let current = session.name.clone();
        Callback::from(move |_: MouseEvent| {
            if let Some(name) = (*draft).as_deref().map(str::trim) {
                if !name.is_empty() && name != current {
                    on_rename.emit((session_id.clone(), name.to_string()));
                }
            }
            draft.set(None);
        })
    };

    let cancel_rename = {
        let draft = draft.clone();
        Callback::from(move |_: MouseEvent| draft.set(None))
    };

    let toggle_expanded = {
        let expanded = expanded.clone();
        Callback::from(move |_| {
            expanded.set(!*expanded);
        })
    };

    let windows = group_by_window(&session.tabs);

    html! {
        <div class="session-card">
            <div class="session-header">
                <div class="session-title-container">
                    if let Some(name) = (*draft).clone() {
                        <div class="session-rename">
                            <input
                                type="text"
                                value={name}
                                oninput={on_draft_input}
                                class="session-title-input"
                            />
                            <Button onclick={commit_rename} size={ButtonSize::Small}>{"Save"}</Button>
                            <Button onclick={cancel_rename} size={ButtonSize::Small} variant={ButtonVariant::Link}>
                                {"Cancel"}
                            </Button>
                        </div>
                    } else {
                        <h3 class="session-title" title="Click to rename" onclick={start_rename}>
                            {&session.name}
                        </h3>
                    }
                    if let Some(description) = &session.description {
                        <p class="session-description">{description}</p>
                    }
                    <p class="session-date">
                        {format!(
                            "{} • {} tabs • {} windows",
                            local_date(session.created_at),
                            session.tabs.len(),
                            session.windows_count
                        )}
                    </p>
                </div>

                <div class="session-actions">
                    <Button
                        onclick={toggle_expanded.reform(|_| ())}
                        variant={ButtonVariant::Secondary}
                    >
                        {if *expanded { "▲ Collapse" } else { "▼ Expand" }}
                    </Button>
                    <Button
                        onclick={props.on_restore.reform({
                            let session_id = session.id.clone();
                            move |_| (session_id.clone(), false)
                        })}
                    >
                        {"🔄 Restore"}
                    </Button>
                    <Button
                        onclick={props.on_restore.reform({
                            let session_id = session.id.clone();
                            move |_| (session_id.clone(), true)
                        })}
                        variant={ButtonVariant::Secondary}
                    >
                        {"🗗 New window"}
                    </Button>
                    <Button
                        onclick={props.on_delete.reform({
                            let session_id = session.id.clone();
                            move |_| session_id.clone()
                        })}
                        variant={ButtonVariant::Danger}
                    >
                        {"🗑️"}
                    </Button>
                </div>
            </div>

            if *expanded {
                <div class="tabs-container">
                    {for windows.iter().enumerate().map(|(index, (window_id, tabs))| html! {
                        <div key={*window_id} class="domain-group">
                            <h4 class="domain-title">
                                {format!("Window {} ({})", index + 1, tabs.len())}
                            </h4>
                            <div class="tabs-list">
                                {for tabs.iter().map(|tab| {
                                    let session_id = session.id.clone();
                                    let tab_id = tab.id.clone();

                                    html! {
                                        <div key={tab.id.clone()} class="tab-item">
                                            <img src={tab.fav_icon_url.clone()} alt="" class="favicon" />
                                            <div class="tab-content">
                                                <div class="tab-title">{&tab.title}</div>
                                                <div class="tab-url">{&tab.url}</div>
                                            </div>
                                            <div class="tab-actions">
                                                <Button
                                                    onclick={props.on_delete_tab.reform(move |_| (session_id.clone(), tab_id.clone()))}
                                                    variant={ButtonVariant::Danger}
                                                    size={ButtonSize::Small}
                                                >
                                                    {"✗"}
                                                </Button>
                                            </div>
                                        </div>
                                    }
                                })}
                            </div>
                        </div>
                    })}
                </div>
            }
        </div>
    }
}
