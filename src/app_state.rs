//! Owner of the stores and the persistence backend they write through.

use crate::analysis_store::AnalysisStore;
use crate::config::AppConfig;
use crate::error::StoreError;
use crate::export_registry::ExportRegistry;
use crate::persistence::{MemoryPersistence, Persistence};
use crate::settings::SettingsStore;
use crate::types::{AnalysisResponse, ExportId, ExportRecord, Settings};

/// Everything the dashboard keeps between sessions.
pub struct AppState {
    persistence: Box<dyn Persistence>,
    /// Environment configuration
    pub config: AppConfig,
    /// Latest analysis snapshot
    pub analysis: AnalysisStore,
    /// Generated exports, most recent first
    pub exports: ExportRegistry,
    /// Remembered credentials
    pub settings: SettingsStore,
}

impl AppState {
    /// Loads every store from the platform's durable backend, falling back to
    /// memory when none is available.
    pub fn new(config: AppConfig) -> Self {
        let persistence = default_persistence(&config);
        Self::with_persistence(config, persistence)
    }

    /// Loads every store from `persistence`.
    pub fn with_persistence(config: AppConfig, persistence: Box<dyn Persistence>) -> Self {
        let analysis = AnalysisStore::load(persistence.as_ref());
        let exports = ExportRegistry::load(persistence.as_ref());
        let settings = SettingsStore::load(persistence.as_ref());
        log::info!(
            "Loaded state: {} comments, {} exports",
            analysis.comments().len(),
            exports.len()
        );
        Self { persistence, config, analysis, exports, settings }
    }

    /// Replaces the analysis snapshot.
    pub fn apply_analysis(&mut self, response: AnalysisResponse) -> Result<(), StoreError> {
        self.analysis.replace(response, self.persistence.as_mut())
    }

    /// Clears the analysis snapshot.
    pub fn reset_analysis(&mut self) -> Result<(), StoreError> {
        self.analysis.reset(self.persistence.as_mut())
    }

    /// Registers a finished export.
    pub fn register_export(&mut self, record: ExportRecord) -> Result<(), StoreError> {
        self.exports.add(record, self.persistence.as_mut())
    }

    /// Removes an export; unknown ids are ignored.
    pub fn remove_export(&mut self, id: ExportId) -> Result<(), StoreError> {
        self.exports.remove(id, self.persistence.as_mut())
    }

    /// Removes every export.
    pub fn clear_exports(&mut self) -> Result<(), StoreError> {
        self.exports.clear(self.persistence.as_mut())
    }

    /// Remembers `settings`.
    pub fn save_settings(&mut self, settings: Settings) -> Result<(), StoreError> {
        self.settings.set(settings, self.persistence.as_mut())
    }

    /// Forgets the remembered settings.
    pub fn reset_settings(&mut self) -> Result<(), StoreError> {
        self.settings.reset(self.persistence.as_mut())
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_persistence(AppConfig::default(), Box::new(MemoryPersistence::new()))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_persistence(config: &AppConfig) -> Box<dyn Persistence> {
    match config.require_data_dir() {
        Ok(dir) => {
            log::info!("Persisting state under {}", dir.display());
            Box::new(crate::persistence::FilePersistence::new(dir))
        }
        Err(e) => {
            log::warn!("{e}; state will not survive a restart");
            Box::new(MemoryPersistence::new())
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn default_persistence(_config: &AppConfig) -> Box<dyn Persistence> {
    match crate::persistence::LocalStoragePersistence::open() {
        Some(storage) => Box::new(storage),
        None => {
            log::warn!("localStorage unavailable; state will not survive a reload");
            Box::new(MemoryPersistence::new())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export_registry::package_export;
    use crate::types::{AnalyticsSnapshot, ExportKind};
    use chrono::Utc;

    #[test]
    fn mutations_persist_through_the_shared_backend() {
        let mut state = AppState::default();
        state
            .apply_analysis(AnalysisResponse {
                page_id: "acme".into(),
                comments_analyzed: Vec::new(),
                analytics: AnalyticsSnapshot { total_comments: 3, ..Default::default() },
            })
            .unwrap();
        let record = package_export(ExportKind::CommentsCsv, b"x", Utc::now());
        let id = record.id;
        state.register_export(record.clone()).unwrap();
        assert!(matches!(state.register_export(record), Err(StoreError::DuplicateId(d)) if d == id));

        let reloaded = AppState::with_persistence(AppConfig::default(), state.persistence);
        assert_eq!(reloaded.analysis.page_id(), "acme");
        assert_eq!(reloaded.exports.len(), 1);
    }

    #[test]
    fn resets_clear_their_stores() {
        let mut state = AppState::default();
        state
            .save_settings(Settings { graph_api_key: "k".into(), page: "p".into() })
            .unwrap();
        state.reset_settings().unwrap();
        state.clear_exports().unwrap();
        state.reset_analysis().unwrap();
        assert_eq!(state.settings.settings(), &Settings::default());
        assert!(!state.analysis.has_data());
    }
}
