//! Application state structures.
//!
//! `DashboardApp` owns the [`AppState`] stores plus everything that only
//! lives for the session: form inputs, status messages and the channel that
//! background ingestion and export tasks report back on.

use crate::app_state::AppState;
use crate::config::AppConfig;
use crate::error::{ExportError, IngestError};
use crate::exporter::GeneratedExport;
use crate::types::{AnalysisResponse, Settings};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{channel, Receiver, Sender};

/// Navigation targets in the side panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Page {
    /// Headline figures, ingestion form and recent comments
    #[default]
    Dashboard,
    /// Sentiment breakdown and timeline
    Sentiment,
    /// Per-topic distribution
    Topics,
    /// PDF and CSV exports
    Reports,
    /// Remembered credentials
    Settings,
}

impl Page {
    /// Every page in navigation order.
    pub const ALL: [Page; 5] = [Page::Dashboard, Page::Sentiment, Page::Topics, Page::Reports, Page::Settings];

    /// Navigation label.
    pub fn title(self) -> &'static str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Sentiment => "Sentiment",
            Page::Topics => "Topics",
            Page::Reports => "Reports",
            Page::Settings => "Settings",
        }
    }
}

/// Outcome of a background task, delivered to the UI thread.
#[derive(Debug)]
pub enum TaskResult {
    /// An ingestion request finished
    Analysis(Result<AnalysisResponse, IngestError>),
    /// The PDF pipeline finished
    Report(Result<GeneratedExport, ExportError>),
    /// A file picker was dismissed without a selection
    Cancelled,
}

/// Raw text of the ingestion form. Numbers and dates are validated on submit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestForm {
    /// Graph API access token
    pub graph_api_key: String,
    /// Page name or id
    pub page: String,
    /// Optional post limit
    pub max_posts: String,
    /// Optional comment limit
    pub max_comments: String,
    /// `YYYY-MM-DD`
    pub since: String,
    /// `YYYY-MM-DD`
    pub until: String,
}

impl IngestForm {
    /// Pre-fills the credentials from the remembered settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            graph_api_key: settings.graph_api_key.clone(),
            page: settings.page.clone(),
            ..Default::default()
        }
    }
}

/// A status line shown above the central panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Text shown to the user
    pub message: String,
    /// Rendered in the error colour
    pub is_error: bool,
}

/// UI preferences stored through `eframe::Storage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiPrefs {
    /// Dark or light visuals
    pub dark_mode: bool,
    /// Selected navigation page
    pub page: Page,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self { dark_mode: true, page: Page::Dashboard }
    }
}

/// The main application structure.
pub struct DashboardApp {
    /// Persisted stores
    pub state: AppState,
    /// Persisted UI preferences
    pub prefs: UiPrefs,
    /// Ingestion form contents
    pub form: IngestForm,
    /// Editable copy of the remembered settings
    pub settings_draft: Settings,
    /// Most recent first; capped at [`MAX_TOASTS`]
    pub toasts: Vec<Toast>,
    /// An ingestion request is running
    pub ingest_in_flight: bool,
    /// A PDF export is running
    pub export_in_flight: bool,
    /// Set while the "clear all exports" confirmation is open
    pub confirm_clear_exports: bool,
    /// Background tasks send their results here
    pub task_sender: Sender<TaskResult>,
    /// Drained once per frame
    pub task_receiver: Receiver<TaskResult>,
}

/// Status lines kept on screen.
pub const MAX_TOASTS: usize = 4;

impl Default for DashboardApp {
    fn default() -> Self {
        Self::with_state(AppState::default())
    }
}

impl DashboardApp {
    /// Builds the app around already-loaded stores.
    pub fn with_state(state: AppState) -> Self {
        let (task_sender, task_receiver) = channel();
        let settings = state.settings.settings().clone();
        Self {
            form: IngestForm::from_settings(&settings),
            settings_draft: settings,
            state,
            prefs: UiPrefs::default(),
            toasts: Vec::new(),
            ingest_in_flight: false,
            export_in_flight: false,
            confirm_clear_exports: false,
            task_sender,
            task_receiver,
        }
    }

    /// Loads the stores for `config` and restores the UI preferences.
    pub fn new(cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        let mut app = Self::with_state(AppState::new(config));
        if let Some(storage) = cc.storage {
            if let Some(prefs) = eframe::get_value::<UiPrefs>(storage, eframe::APP_KEY) {
                app.prefs = prefs;
            }
        }
        app
    }

    /// Shows an informational status line.
    pub fn notify(&mut self, message: impl Into<String>) {
        self.push_toast(message.into(), false);
    }

    /// Shows an error status line and logs it.
    pub fn notify_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("{message}");
        self.push_toast(message, true);
    }

    fn push_toast(&mut self, message: String, is_error: bool) {
        self.toasts.insert(0, Toast { message, is_error });
        self.toasts.truncate(MAX_TOASTS);
    }
}
