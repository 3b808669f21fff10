//! Session store for the last analysis received from the backend.

use crate::constants::{ANALYSIS_BUCKET, STORE_VERSION};
use crate::error::StoreError;
use crate::persistence::{load_bucket, save_bucket, Persistence};
use crate::types::{AnalysisResponse, AnalyticsSnapshot, CommentRecord};
use serde::{Deserialize, Serialize};

/// Everything the store holds; persisted as one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisState {
    /// Source identifier of the snapshot
    pub page_id: String,
    /// Latest analytics, `None` until the first ingestion
    pub analytics: Option<AnalyticsSnapshot>,
    /// Comments backing the analytics
    pub comments_analyzed: Vec<CommentRecord>,
}

/// Holds the current snapshot. The only mutations are wholesale replacement
/// and reset; the data itself is never edited in place.
#[derive(Debug, Clone, Default)]
pub struct AnalysisStore {
    state: AnalysisState,
}

impl AnalysisStore {
    /// Restores the store from `persistence`, or starts empty.
    pub fn load(persistence: &dyn Persistence) -> Self {
        let state = load_bucket(persistence, ANALYSIS_BUCKET, STORE_VERSION).unwrap_or_default();
        Self { state }
    }

    /// Current analytics snapshot.
    pub fn snapshot(&self) -> Option<&AnalyticsSnapshot> {
        self.state.analytics.as_ref()
    }

    /// Comments of the current snapshot.
    pub fn comments(&self) -> &[CommentRecord] {
        &self.state.comments_analyzed
    }

    /// Source identifier of the current snapshot.
    pub fn page_id(&self) -> &str {
        &self.state.page_id
    }

    /// Whether a snapshot has been ingested.
    pub fn has_data(&self) -> bool {
        self.state.analytics.is_some()
    }

    /// Full state, e.g. for handing a copy to a background export.
    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    /// Replaces the snapshot with a fresh ingestion response and persists it.
    pub fn replace(
        &mut self,
        response: AnalysisResponse,
        persistence: &mut dyn Persistence,
    ) -> Result<(), StoreError> {
        log::info!(
            "Replacing analysis snapshot: page '{}', {} comments, {} categories",
            response.page_id,
            response.comments_analyzed.len(),
            response.analytics.categories_stats.len()
        );
        self.state = AnalysisState {
            page_id: response.page_id,
            analytics: Some(response.analytics),
            comments_analyzed: response.comments_analyzed,
        };
        save_bucket(persistence, ANALYSIS_BUCKET, STORE_VERSION, &self.state)
    }

    /// Clears the snapshot and its comments.
    pub fn reset(&mut self, persistence: &mut dyn Persistence) -> Result<(), StoreError> {
        self.state = AnalysisState::default();
        save_bucket(persistence, ANALYSIS_BUCKET, STORE_VERSION, &self.state)
    }
}
