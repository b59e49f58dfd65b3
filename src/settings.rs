/// User preferences persisted in extension storage
///
/// The sync flag always lives in the `local` area. Theme and the closed
/// tabs cap follow it: `sync` when enabled, `local` otherwise.
use serde::{Deserialize, Serialize};

use crate::api::{self, Storage, StorageArea};
use crate::constants::{COLOR_THEME_KEY, MAX_STORED_TABS_KEY, MAX_TABS_COUNT, SYNC_ENABLED_KEY, TAB_TYPE_KEY};
use crate::error::HostError;
use crate::tab_data::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl Theme {
    pub fn parse(value: &str) -> Option<Theme> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            "system" => Some(Theme::System),
            _ => None,
        }
    }

    pub fn is_dark(self, system_prefers_dark: bool) -> bool {
        match self {
            Theme::Light => false,
            Theme::Dark => true,
            Theme::System => system_prefers_dark,
        }
    }

    /// The toggle always leaves `System` for an explicit choice
    pub fn toggled(self, system_prefers_dark: bool) -> Theme {
        if self.is_dark(system_prefers_dark) {
            Theme::Light
        } else {
            Theme::Dark
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub theme: Theme,
    pub max_stored_tabs: usize,
    pub sync_enabled: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            theme: Theme::System,
            max_stored_tabs: MAX_TABS_COUNT,
            sync_enabled: false,
        }
    }
}

impl Settings {
    pub fn area(&self) -> StorageArea {
        StorageArea::from_sync_enabled(self.sync_enabled)
    }

    pub async fn load(storage: &impl Storage) -> Result<Settings, HostError> {
        let defaults = Settings::default();
        let sync_enabled: Option<bool> = api::load(storage, SYNC_ENABLED_KEY, StorageArea::Local).await?;
        let sync_enabled = sync_enabled.unwrap_or(defaults.sync_enabled);
        let area = StorageArea::from_sync_enabled(sync_enabled);

        let theme: Option<String> = api::load(storage, COLOR_THEME_KEY, area).await?;
        let max_stored_tabs: Option<usize> = api::load(storage, MAX_STORED_TABS_KEY, area).await?;

        Ok(Settings {
            theme: theme.as_deref().and_then(Theme::parse).unwrap_or(defaults.theme),
            max_stored_tabs: max_stored_tabs.filter(|max| *max >= 1).unwrap_or(defaults.max_stored_tabs),
            sync_enabled,
        })
    }

    pub fn validate(&self) -> Result<(), HostError> {
        if self.max_stored_tabs < 1 {
            return Err(HostError::InvalidSetting(
                "max stored tabs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn save(&self, storage: &impl Storage) -> Result<(), HostError> {
        self.validate()?;
        let area = self.area();
        api::store(storage, SYNC_ENABLED_KEY, &self.sync_enabled, StorageArea::Local).await?;
        api::store(storage, COLOR_THEME_KEY, &self.theme, area).await?;
        api::store(storage, MAX_STORED_TABS_KEY, &self.max_stored_tabs, area).await?;
        log::info!("Settings saved to {} storage", area.as_str());
        Ok(())
    }

    /// Flip the sync flag and move theme and cap to the new area
    ///
    /// On failure the flag is written back to its previous value.
    pub async fn set_sync_enabled(&mut self, storage: &impl Storage, enabled: bool) -> Result<(), HostError> {
        self.validate()?;
        let old_area = self.area();
        let new_area = StorageArea::from_sync_enabled(enabled);

        let result = async {
            api::store(storage, SYNC_ENABLED_KEY, &enabled, StorageArea::Local).await?;
            api::store(storage, COLOR_THEME_KEY, &self.theme, new_area).await?;
            api::store(storage, MAX_STORED_TABS_KEY, &self.max_stored_tabs, new_area).await?;
            if old_area != new_area {
                storage.remove(COLOR_THEME_KEY, old_area).await?;
                storage.remove(MAX_STORED_TABS_KEY, old_area).await?;
                log::info!("Settings migrated from {} to {}", old_area.as_str(), new_area.as_str());
            }
            Ok::<(), HostError>(())
        }
        .await;

        match result {
            Ok(()) => {
                self.sync_enabled = enabled;
                Ok(())
            }
            Err(err) => {
                log::error!("[setSyncEnabled]: {}", err);
                if let Err(revert_err) =
                    api::store(storage, SYNC_ENABLED_KEY, &self.sync_enabled, StorageArea::Local).await
                {
                    log::error!("[setSyncEnabled]: revert failed: {}", revert_err);
                }
                Err(err)
            }
        }
    }
}

pub async fn get_theme(storage: &impl Storage) -> Result<Theme, HostError> {
    Ok(Settings::load(storage).await?.theme)
}

pub async fn set_theme(storage: &impl Storage, theme: Theme) -> Result<(), HostError> {
    let mut settings = Settings::load(storage).await?;
    settings.theme = theme;
    api::store(storage, COLOR_THEME_KEY, &settings.theme, settings.area()).await
}

/// Category the popup opens on
pub async fn get_tab_type(storage: &impl Storage) -> Result<Category, HostError> {
    let stored: Option<Category> = api::load(storage, TAB_TYPE_KEY, StorageArea::Local)
        .await
        .unwrap_or_else(|err| {
            log::warn!("[getTabType]: {}", err);
            None
        });
    Ok(stored.unwrap_or_default())
}

pub async fn set_tab_type(storage: &impl Storage, category: Category) -> Result<(), HostError> {
    api::store(storage, TAB_TYPE_KEY, &category, StorageArea::Local).await
}
