//! Remembered credential and page preferences.

use crate::constants::{SETTINGS_BUCKET, STORE_VERSION};
use crate::error::StoreError;
use crate::persistence::{load_bucket, save_bucket, Persistence};
use crate::types::Settings;

/// Persisted settings used to pre-fill the ingestion form.
#[derive(Debug, Clone, Default)]
pub struct SettingsStore {
    settings: Settings,
}

impl SettingsStore {
    /// Restores the settings from `persistence`, or starts blank.
    pub fn load(persistence: &dyn Persistence) -> Self {
        let settings = load_bucket(persistence, SETTINGS_BUCKET, STORE_VERSION).unwrap_or_default();
        Self { settings }
    }

    /// Current settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replaces both fields and persists them.
    pub fn set(
        &mut self,
        settings: Settings,
        persistence: &mut dyn Persistence,
    ) -> Result<(), StoreError> {
        self.settings = settings;
        save_bucket(persistence, SETTINGS_BUCKET, STORE_VERSION, &self.settings)
    }

    /// Blanks both fields.
    pub fn reset(&mut self, persistence: &mut dyn Persistence) -> Result<(), StoreError> {
        self.set(Settings::default(), persistence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryPersistence;

    #[test]
    fn settings_survive_a_reload_and_reset() {
        let mut persistence = MemoryPersistence::new();
        let mut store = SettingsStore::load(&persistence);
        store
            .set(
                Settings { graph_api_key: "token".into(), page: "acme".into() },
                &mut persistence,
            )
            .unwrap();

        let reloaded = SettingsStore::load(&persistence);
        assert_eq!(reloaded.settings().page, "acme");

        store.reset(&mut persistence).unwrap();
        assert_eq!(SettingsStore::load(&persistence).settings(), &Settings::default());
    }
}
