//! Core data types shared by the stores, the report pipeline and the UI.
//!
//! The shapes mirror the JSON returned by the analysis backend, so every type
//! here deserializes straight from an ingestion response.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for export artifacts.
pub type ExportId = Uuid;

/// The three sentiment classes the backend assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Favourable comment
    Positive,
    /// Neither favourable nor unfavourable
    Neutral,
    /// Unfavourable comment
    Negative,
}

impl Sentiment {
    /// All sentiments in display order.
    pub const ALL: [Sentiment; 3] = [Sentiment::Positive, Sentiment::Neutral, Sentiment::Negative];

    /// Parses a backend label case-insensitively (`"POSITIVE"`, `"neutral"`, ...).
    ///
    /// Returns `None` for anything outside the three known classes.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Sentiment::Positive),
            "neutral" => Some(Sentiment::Neutral),
            "negative" => Some(Sentiment::Negative),
            _ => None,
        }
    }

    /// Capitalized label used in charts and summaries.
    pub fn label(self) -> &'static str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
        }
    }

    /// Fixed palette colour for this sentiment.
    pub fn color(self) -> &'static str {
        match self {
            Sentiment::Positive => crate::constants::POSITIVE_COLOR,
            Sentiment::Neutral => crate::constants::NEUTRAL_COLOR,
            Sentiment::Negative => crate::constants::NEGATIVE_COLOR,
        }
    }
}

/// Aggregated counts for one category of a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryStat {
    /// Category name, unique within a snapshot
    pub category: String,
    /// Comments classified into this category
    #[serde(default)]
    pub total_comments: u64,
    /// Positive comments in this category
    #[serde(default)]
    pub positive_comments: u64,
    /// Neutral comments in this category
    #[serde(default)]
    pub neutral_comments: u64,
    /// Negative comments in this category
    #[serde(default)]
    pub negative_comments: u64,
}

impl CategoryStat {
    /// Count for a single sentiment.
    pub fn count(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive_comments,
            Sentiment::Neutral => self.neutral_comments,
            Sentiment::Negative => self.negative_comments,
        }
    }
}

/// One complete analytics payload. Replaced wholesale on every ingestion.
///
/// `total_comments` is expected to equal the sum of the three sentiment
/// counts, but nothing enforces it; consumers treat ratios as best-effort.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSnapshot {
    /// All analyzed comments
    #[serde(default)]
    pub total_comments: u64,
    /// Comments classified positive
    #[serde(default)]
    pub positive_comments: u64,
    /// Comments classified neutral
    #[serde(default)]
    pub neutral_comments: u64,
    /// Comments classified negative
    #[serde(default)]
    pub negative_comments: u64,
    /// Per-category breakdown
    #[serde(default)]
    pub categories_stats: Vec<CategoryStat>,
}

/// A single analyzed comment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommentRecord {
    /// Backend identifier, unique per snapshot
    pub comment_id: String,
    /// Raw comment text
    #[serde(default)]
    pub text: String,
    /// Sentiment label as sent by the backend (any case)
    #[serde(default)]
    pub sentiment: String,
    /// Sentiment confidence in `[0, 1]`
    #[serde(default)]
    pub sentiment_conf: f64,
    /// Assigned category
    #[serde(default)]
    pub category: String,
    /// Category confidence in `[0, 1]`
    #[serde(default)]
    pub category_conf: f64,
    /// ISO-8601 creation time, when the source provides one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_time: Option<String>,
}

impl CommentRecord {
    /// The parsed sentiment class, if the label is one of the known three.
    pub fn sentiment_kind(&self) -> Option<Sentiment> {
        Sentiment::parse(&self.sentiment)
    }
}

/// Body returned by both ingestion endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResponse {
    /// Source identifier (page id, or the uploaded file's label)
    #[serde(default)]
    pub page_id: String,
    /// Every analyzed comment
    #[serde(default)]
    pub comments_analyzed: Vec<CommentRecord>,
    /// Aggregated analytics
    pub analytics: AnalyticsSnapshot,
}

/// The kinds of artifacts the export pipeline produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportKind {
    /// Multi-page image-based report
    Pdf,
    /// Raw comment rows
    CommentsCsv,
    /// Category aggregate rows
    CategoriesCsv,
}

impl ExportKind {
    /// Display name shown in the reports list.
    pub fn display_name(self) -> &'static str {
        match self {
            ExportKind::Pdf => "PDF Report",
            ExportKind::CommentsCsv => "Comments Export",
            ExportKind::CategoriesCsv => "Categories Export",
        }
    }

    /// Filename stem placed before the timestamp.
    pub fn filename_prefix(self) -> &'static str {
        match self {
            ExportKind::Pdf => "analysis-report",
            ExportKind::CommentsCsv => "comments-export",
            ExportKind::CategoriesCsv => "categories-export",
        }
    }

    /// File extension without the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportKind::Pdf => "pdf",
            ExportKind::CommentsCsv | ExportKind::CategoriesCsv => "csv",
        }
    }

    /// MIME type of the produced file.
    pub fn mime(self) -> &'static str {
        match self {
            ExportKind::Pdf => "application/pdf",
            ExportKind::CommentsCsv | ExportKind::CategoriesCsv => "text/csv",
        }
    }
}

/// A generated artifact kept for later re-download.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    /// Caller-generated unique id
    pub id: ExportId,
    /// Artifact kind
    #[serde(rename = "type")]
    pub kind: ExportKind,
    /// Display name
    pub name: String,
    /// Suggested download filename
    pub filename: String,
    /// MIME type of the decoded payload
    pub mime: String,
    /// Size of the decoded payload in bytes
    pub size_bytes: u64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Self-contained `data:` URL holding the file
    pub payload: String,
}

/// Credential and page preferences remembered between sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Graph API access token used for scraping
    #[serde(default)]
    pub graph_api_key: String,
    /// Page identifier or handle to scrape
    #[serde(default)]
    pub page: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sentiment_parsing_is_case_insensitive() {
        assert_eq!(Sentiment::parse("POSITIVE"), Some(Sentiment::Positive));
        assert_eq!(Sentiment::parse(" Neutral "), Some(Sentiment::Neutral));
        assert_eq!(Sentiment::parse("negative"), Some(Sentiment::Negative));
        assert_eq!(Sentiment::parse("mixed"), None);
    }

    #[test]
    fn response_deserializes_with_missing_optional_fields() {
        let body = json!({
            "page_id": "acme",
            "comments_analyzed": [{
                "comment_id": "c1",
                "text": "love it",
                "sentiment": "Positive",
                "sentiment_conf": 0.93,
                "category": "Product",
                "category_conf": 0.71
            }],
            "analytics": {
                "total_comments": 1,
                "positive_comments": 1,
                "negative_comments": 0,
                "neutral_comments": 0,
                "categories_stats": []
            }
        });

        let response: AnalysisResponse = serde_json::from_value(body).unwrap();
        assert_eq!(response.page_id, "acme");
        assert_eq!(response.comments_analyzed[0].created_time, None);
        assert_eq!(
            response.comments_analyzed[0].sentiment_kind(),
            Some(Sentiment::Positive)
        );
        assert_eq!(response.analytics.positive_comments, 1);
    }

    #[test]
    fn export_kind_serializes_with_snake_case_tags() {
        assert_eq!(serde_json::to_value(ExportKind::CommentsCsv).unwrap(), json!("comments_csv"));
        assert_eq!(ExportKind::Pdf.mime(), "application/pdf");
        assert_eq!(ExportKind::CategoriesCsv.extension(), "csv");
    }
}
