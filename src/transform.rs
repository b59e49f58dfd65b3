/// Turning raw browser records into list items
use std::collections::HashSet;
use std::hash::Hash;

use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

use crate::api::Clock;
use crate::constants::{DEFAULT_FAVICON, RELATIVE_TIME_LIMIT_SECS};
use crate::domain::domain_from_url;
use crate::tab_data::{TabItem, TabSource};

const DATE_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Escape text that ends up inside list markup
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            '"' => escaped.push_str("&quot;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// "5 minutes ago" style rendering of `then`
///
/// Older than a week, or in the future, falls back to `format_date`.
pub fn format_relative_time(then: f64, now: f64, offset_minutes: i32) -> String {
    if !then.is_finite() || !now.is_finite() {
        return String::new();
    }

    let diff = ((now - then) / 1000.0).floor() as i64;
    match diff {
        d if d < 0 => format_date(then, offset_minutes),
        d if d < 30 => "a few seconds ago".to_string(),
        d if d < 60 => format!("{} seconds ago", d),
        d if d < 3600 => plural(d / 60, "a minute ago", "minutes"),
        d if d < 86_400 => plural(d / 3600, "an hour ago", "hours"),
        d if d < RELATIVE_TIME_LIMIT_SECS => plural(d / 86_400, "a day ago", "days"),
        _ => format_date(then, offset_minutes),
    }
}

fn plural(count: i64, one: &str, unit: &str) -> String {
    if count > 1 {
        format!("{} {} ago", count, unit)
    } else {
        one.to_string()
    }
}

/// Local date as `YYYY/MM/DD HH:mm:ss`
///
/// An offset outside +/-24h renders in UTC.
pub fn format_date(epoch_ms: f64, offset_minutes: i32) -> String {
    let Some(utc) = DateTime::from_timestamp_millis(epoch_ms.floor() as i64) else {
        return String::new();
    };
    match FixedOffset::east_opt(offset_minutes.saturating_mul(60)) {
        Some(offset) => utc.with_timezone(&offset).format(DATE_FORMAT).to_string(),
        None => utc.format(DATE_FORMAT).to_string(),
    }
}

/// Short base-36 suffix for generated ids
pub fn random_id() -> String {
    let mut bytes = [0u8; 8];
    if let Err(err) = getrandom::getrandom(&mut bytes) {
        log::warn!("[randomId]: {}", err);
        bytes.copy_from_slice(&Uuid::new_v4().as_bytes()[..8]);
    }
    to_base36(u64::from_le_bytes(bytes))
}

fn to_base36(mut n: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

/// Keep the first item for each key, preserving order
pub fn unique_by<T, K, F>(items: Vec<T>, key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

/// Build the list item for a raw record
///
/// Missing favicons get the extension icon, the title falls back to the
/// URL and is escaped, and `time` is rendered against the clock.
pub fn transform_tab_item(source: TabSource, clock: &impl Clock) -> TabItem {
    let (id, url, title, fav_icon_url, timestamp) = match &source {
        TabSource::Closed(tab) => (
            tab.id.clone(),
            tab.url.clone(),
            Some(tab.title.clone()),
            Some(tab.fav_icon_url.clone()),
            tab.closed_at,
        ),
        TabSource::Opened(tab) => (
            tab.id.map(|id| id.to_string()).unwrap_or_default(),
            tab.url.clone().unwrap_or_default(),
            tab.title.clone(),
            tab.fav_icon_url.clone(),
            tab.last_accessed.unwrap_or_default(),
        ),
        TabSource::Today(item) => (
            item.id.clone(),
            item.url.clone().unwrap_or_default(),
            item.title.clone(),
            None,
            item.last_visit_time.unwrap_or_default(),
        ),
    };

    let title = title.filter(|title| !title.is_empty()).unwrap_or_else(|| url.clone());
    let fav_icon_url = fav_icon_url
        .filter(|icon| !icon.is_empty())
        .unwrap_or_else(|| DEFAULT_FAVICON.to_string());

    TabItem {
        id,
        title: escape_html(&title),
        domain: domain_from_url(&url),
        time: format_relative_time(timestamp, clock.now(), clock.utc_offset_minutes(timestamp)),
        url,
        fav_icon_url,
        timestamp,
        source,
    }
}
