/// List rows and the category switcher shared by the popup views
use patternfly_yew::prelude::*;
use yew::prelude::*;

use crate::render::RenderKind;
use crate::tab_data::{Category, TabItem};

/// Text shown in place of an empty list
pub fn empty_message(kind: RenderKind) -> &'static str {
    match kind {
        RenderKind::Full => "No data ...",
        RenderKind::Search => "No matched ...",
    }
}

#[derive(Properties, PartialEq)]
pub struct CategorySwitcherProps {
    pub active: Category,
    pub on_select: Callback<Category>,
}

#[function_component(CategorySwitcher)]
pub fn category_switcher(props: &CategorySwitcherProps) -> Html {
    html! {
        <div class="pf-v5-c-tabs tabs-nav">
            <ul class="pf-v5-c-tabs__list">
                {for Category::ALL.iter().map(|category| {
                    let category = *category;
                    let class = if category == props.active {
                        "pf-v5-c-tabs__item pf-m-current"
                    } else {
                        "pf-v5-c-tabs__item"
                    };
                    html! {
                        <li key={category.as_str()} class={class}>
                            <button
                                class="pf-v5-c-tabs__link"
                                onclick={props.on_select.reform(move |_| category)}
                            >
                                <span class="pf-v5-c-tabs__item-text">{category.label()}</span>
                            </button>
                        </li>
                    }
                })}
            </ul>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TabRowProps {
    pub item: TabItem,
    pub on_click: Callback<String>,
    pub on_delete: Callback<String>,
}

#[function_component(TabRow)]
pub fn tab_row(props: &TabRowProps) -> Html {
    let item = &props.item;

    let on_click = {
        let id = item.id.clone();
        props.on_click.reform(move |_: MouseEvent| id.clone())
    };

    let on_delete = {
        let id = item.id.clone();
        props.on_delete.reform(move |e: MouseEvent| {
            e.stop_propagation();
            id.clone()
        })
    };

    // title is escaped when the item is built
    let title = Html::from_html_unchecked(AttrValue::from(format!(
        "<h3 class=\"tab-item-title\">{}</h3>",
        item.title
    )));

    html! {
        <div class="tab-item" onclick={on_click} title={item.url.clone()}>
            <div class="tab-item-icon">
                <img src={item.fav_icon_url.clone()} alt="pass tabs" class="favicon" />
            </div>
            <div class="tab-item-body">
                {title}
                <div class="tab-item-meta">
                    <span class="tab-item-domain">{&item.domain}</span>
                    <span class="tab-item-time">{&item.time}</span>
                </div>
            </div>
            <Button
                onclick={on_delete}
                variant={ButtonVariant::Plain}
                size={ButtonSize::Small}
            >
                {"✗"}
            </Button>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct TabListProps {
    pub items: Vec<TabItem>,
    pub kind: RenderKind,
    pub on_click: Callback<String>,
    pub on_delete: Callback<String>,
}

#[function_component(TabList)]
pub fn tab_list(props: &TabListProps) -> Html {
    if props.items.is_empty() {
        return html! {
            <div class="empty-state">
                <p>{empty_message(props.kind)}</p>
            </div>
        };
    }

    html! {
        <div class="tab-list">
            {for props.items.iter().map(|item| html! {
                <TabRow
                    key={item.id.clone()}
                    item={item.clone()}
                    on_click={props.on_click.clone()}
                    on_delete={props.on_delete.clone()}
                />
            })}
        </div>
    }
}
