/// Storage keys and limits shared across the extension

/// Closed tabs list
pub const CLOSED_TABS_KEY: &str = "pass_closed_tabs";
/// Category shown when the popup opens
pub const TAB_TYPE_KEY: &str = "pass_tab_type";
pub const SORT_TYPE_KEY: &str = "pass_sort_type";
pub const COLOR_THEME_KEY: &str = "pass_color_theme";
pub const MAX_STORED_TABS_KEY: &str = "pass_max_stored_tabs";
/// Always read from and written to the local area
pub const SYNC_ENABLED_KEY: &str = "pass_sync_enabled";
pub const SESSIONS_KEY: &str = "pass_sessions";
pub const AUTO_SAVE_SESSION_KEY: &str = "pass_auto_save_session";

pub const MAX_TABS_COUNT: usize = 360;
pub const MAX_HISTORY_COUNT: u32 = 500;
pub const AUTO_SAVE_INTERVAL_MS: u32 = 5 * 60 * 1000;

pub const DEFAULT_FAVICON: &str = "icon/32.png";

/// Past this age, relative times fall back to an absolute date
pub const RELATIVE_TIME_LIMIT_SECS: i64 = 7 * 24 * 60 * 60;
