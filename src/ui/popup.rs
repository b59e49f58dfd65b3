/// Popup UI: recently closed, opened and today's tabs
use std::rc::Rc;

use patternfly_yew::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

use crate::api::Host;
use crate::api::chrome::{ChromeHost, ChromeStorage};
use crate::render::{RenderKind, TabsRender};
use crate::settings::{self, Theme};
use crate::sort::{self, SortType};
use crate::tab_data::{Category, TabItem};
use crate::ui::components::{CategorySwitcher, TabList};

fn sort_label(sort_type: SortType) -> &'static str {
    match sort_type {
        SortType::Recent => "Recent",
        SortType::Domain => "Domain",
        SortType::Alphabetical => "A-Z",
    }
}

fn system_prefers_dark() -> bool {
    web_sys::window()
        .and_then(|window| window.match_media("(prefers-color-scheme: dark)").ok().flatten())
        .map(|query| query.matches())
        .unwrap_or(false)
}

/// Put the `dark` or `light` class on the document root
fn apply_theme(theme: Theme) {
    let dark = theme.is_dark(system_prefers_dark());
    let Some(root) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| document.document_element())
    else {
        return;
    };

    let (add, remove) = if dark { ("dark", "light") } else { ("light", "dark") };
    let classes = root.class_list();
    if let Err(err) = classes.remove_1(remove).and_then(|_| classes.add_1(add)) {
        log::warn!("[applyTheme]: {:?}", err);
    }
    if let Err(err) = root.set_attribute("data-theme", add) {
        log::warn!("[applyTheme]: {:?}", err);
    }
}

#[function_component(App)]
pub fn app() -> Html {
    let controller = use_state(|| None::<TabsRender<ChromeHost>>);
    let items = use_state(Vec::<TabItem>::new);
    let kind = use_state(|| RenderKind::Full);
    let category = use_state(Category::default);
    let sort_type = use_state(SortType::default);
    let theme = use_state(Theme::default);
    let keyword = use_state(String::new);

    // Read preferences, then start the list controller
    {
        let controller = controller.clone();
        let items = items.clone();
        let kind = kind.clone();
        let category = category.clone();
        let sort_type = sort_type.clone();
        let theme = theme.clone();

        use_effect_with((), move |_| {
            spawn_local(async move {
                let host = Rc::new(ChromeHost::new());

                let saved_theme = settings::get_theme(host.storage()).await.unwrap_or_else(|err| {
                    log::warn!("[getTheme]: {}", err);
                    Theme::default()
                });
                apply_theme(saved_theme);
                theme.set(saved_theme);

                match sort::get_sort_type(host.storage()).await {
                    Ok(saved) => sort_type.set(saved),
                    Err(err) => log::warn!("[getSortType]: {}", err),
                }

                let initial = settings::get_tab_type(host.storage()).await.unwrap_or_default();
                category.set(initial);

                let tabs = TabsRender::new(host, initial, move |loaded: &[TabItem], rendered| {
                    items.set(loaded.to_vec());
                    kind.set(rendered);
                })
                .await;
                controller.set(Some(tabs));
            });
            || ()
        });
    }

    let on_category = {
        let controller = controller.clone();
        let category = category.clone();
        let keyword = keyword.clone();

        Callback::from(move |next: Category| {
            category.set(next);
            keyword.set(String::new());
            let controller = (*controller).clone();

            spawn_local(async move {
                if let Err(err) = settings::set_tab_type(&ChromeStorage, next).await {
                    log::error!("[setTabType]: {}", err);
                }
                if let Some(tabs) = controller {
                    tabs.render_tabs(next).await;
                }
            });
        })
    };

    let on_search = {
        let controller = controller.clone();
        let category = category.clone();
        let keyword = keyword.clone();

        Callback::from(move |e: InputEvent| {
            let Some(input) = e.target_dyn_into::<HtmlInputElement>() else {
                return;
            };
            let value = input.value();
            keyword.set(value.clone());
            let controller = (*controller).clone();
            let active = *category;

            spawn_local(async move {
                if let Some(tabs) = controller {
                    tabs.search_tabs(value.trim(), active).await;
                }
            });
        })
    };

    let on_clear_search = {
        let controller = controller.clone();
        let category = category.clone();
        let keyword = keyword.clone();

        Callback::from(move |_: MouseEvent| {
            keyword.set(String::new());
            let controller = (*controller).clone();
            let active = *category;

            spawn_local(async move {
                if let Some(tabs) = controller {
                    tabs.search_tabs("", active).await;
                }
            });
        })
    };

    let on_sort = {
        let sort_type = sort_type.clone();

        Callback::from(move |e: Event| {
            let Some(select) = e.target_dyn_into::<HtmlSelectElement>() else {
                return;
            };
            let Some(next) = SortType::parse(&select.value()) else {
                return;
            };
            sort_type.set(next);

            spawn_local(async move {
                if let Err(err) = sort::set_sort_type(&ChromeStorage, next).await {
                    log::error!("[setSortType]: {}", err);
                }
            });
        })
    };

    let on_theme = {
        let theme = theme.clone();

        Callback::from(move |_: MouseEvent| {
            let next = theme.toggled(system_prefers_dark());
            apply_theme(next);
            theme.set(next);

            spawn_local(async move {
                if let Err(err) = settings::set_theme(&ChromeStorage, next).await {
                    log::error!("[setTheme]: {}", err);
                }
            });
        })
    };

    let on_item_click = {
        let controller = controller.clone();
        let category = category.clone();

        Callback::from(move |id: String| {
            let controller = (*controller).clone();
            let active = *category;
            spawn_local(async move {
                if let Some(tabs) = controller {
                    tabs.click_tab_item(id, active).await;
                }
            });
        })
    };

    let on_item_delete = {
        let controller = controller.clone();
        let category = category.clone();

        Callback::from(move |id: String| {
            let controller = (*controller).clone();
            let active = *category;
            spawn_local(async move {
                if let Some(tabs) = controller {
                    tabs.delete_tab_item(id, active).await;
                }
            });
        })
    };

    let shown = sort::sort_tab_items(&items, *sort_type);
    let dark = theme.is_dark(system_prefers_dark());

    html! {
        <div class="padding-20 popup">
            <div class="popup-header">
                <h1 class="popup-title">{"Pass Tabs"}</h1>
                <Button variant={ButtonVariant::Plain} onclick={on_theme}>
                    {if dark { "☀" } else { "☾" }}
                </Button>
            </div>

            <CategorySwitcher active={*category} on_select={on_category} />

            <div class="search-bar">
                <input
                    id="search-input"
                    type="text"
                    class="search-input"
                    placeholder="Search title or URL"
                    value={(*keyword).clone()}
                    oninput={on_search}
                />
                if !keyword.is_empty() {
                    <Button variant={ButtonVariant::Plain} size={ButtonSize::Small} onclick={on_clear_search}>
                        {"✕"}
                    </Button>
                }
                <select class="sort-select" onchange={on_sort}>
                    {for SortType::ALL.iter().map(|option| html! {
                        <option value={option.as_str()} selected={*option == *sort_type}>
                            {sort_label(*option)}
                        </option>
                    })}
                </select>
            </div>

            if controller.is_none() {
                <div class="loading-text-center">
                    <Spinner />
                </div>
            } else {
                <TabList
                    items={shown}
                    kind={*kind}
                    on_click={on_item_click}
                    on_delete={on_item_delete}
                />
            }
        </div>
    }
}
