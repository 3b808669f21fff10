//! Figures derived from a snapshot for the report and the dashboard pages.

use crate::constants::{RECENT_COMMENT_COUNT, TOP_TOPIC_COUNT};
use crate::types::{AnalyticsSnapshot, CategoryStat, CommentRecord, Sentiment};
use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use std::collections::BTreeMap;

/// Inputs to the derivation that do not come from the stores.
#[derive(Debug, Clone)]
pub struct ReportContext {
    /// Source identifier shown on the cover
    pub page_id: String,
    /// Reference time: the generated date and the timeline bucket for
    /// comments without a usable timestamp
    pub now: DateTime<Utc>,
}

/// Rounded sentiment shares, in percent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Percentages {
    /// Positive share
    pub positive: u32,
    /// Neutral share
    pub neutral: u32,
    /// Negative share
    pub negative: u32,
}

impl Percentages {
    /// Shares of the snapshot's own total.
    pub fn of_snapshot(snapshot: &AnalyticsSnapshot) -> Self {
        Self::from_counts(
            snapshot.positive_comments,
            snapshot.neutral_comments,
            snapshot.negative_comments,
            snapshot.total_comments,
        )
    }

    /// Shares of a category's total, rounded independently.
    pub fn of_category(stat: &CategoryStat) -> Self {
        Self::from_counts(
            stat.positive_comments,
            stat.neutral_comments,
            stat.negative_comments,
            stat.total_comments,
        )
    }

    fn from_counts(positive: u64, neutral: u64, negative: u64, total: u64) -> Self {
        Self {
            positive: percent(positive, total),
            neutral: percent(neutral, total),
            negative: percent(negative, total),
        }
    }

    /// Share of a single sentiment.
    pub fn get(&self, sentiment: Sentiment) -> u32 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }

    /// Positive if it ties or beats both others, then Neutral over Negative.
    pub fn most_prevalent(&self) -> Sentiment {
        if self.positive >= self.neutral && self.positive >= self.negative {
            Sentiment::Positive
        } else if self.neutral >= self.negative {
            Sentiment::Neutral
        } else {
            Sentiment::Negative
        }
    }
}

/// `round(value / total * 100)`, or 0 when `total` is 0.
pub fn percent(value: u64, total: u64) -> u32 {
    if total == 0 {
        return 0;
    }
    (value as f64 / total as f64 * 100.0).round() as u32
}

/// Per-month sentiment tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineBucket {
    /// Calendar year
    pub year: i32,
    /// Month, 1 to 12
    pub month: u32,
    /// Short label such as `Jan 2024`
    pub label: String,
    /// Positive comments in the month
    pub positive: u64,
    /// Neutral comments in the month
    pub neutral: u64,
    /// Negative comments in the month
    pub negative: u64,
}

impl TimelineBucket {
    /// Count for a single sentiment.
    pub fn count(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }
}

/// Everything the report pages and dashboard cards display.
#[derive(Debug, Clone)]
pub struct ReportData {
    /// Analyzed source
    pub page_id: String,
    /// e.g. `Mar 5, 2024`
    pub generated_on: String,
    /// Total comments in the snapshot
    pub total: u64,
    /// Positive comments
    pub positive: u64,
    /// Neutral comments
    pub neutral: u64,
    /// Negative comments
    pub negative: u64,
    /// Rounded shares of `total`
    pub percentages: Percentages,
    /// Sentiment with the highest count
    pub most_prevalent: Sentiment,
    /// `(category, total mentions)` in snapshot order
    pub trending: Vec<(String, u64)>,
    /// Chronologically ordered monthly buckets
    pub timeline: Vec<TimelineBucket>,
    /// Up to three category names by mentions, ties in snapshot order
    pub top_topics: Vec<String>,
    /// Earliest comment date, or `N/A`
    pub range_start: String,
    /// Latest comment date, or `N/A`
    pub range_end: String,
    /// Newest comments first
    pub recent_comments: Vec<CommentRecord>,
    /// Category breakdown in snapshot order
    pub categories: Vec<CategoryStat>,
}

impl ReportData {
    /// Derives every figure from the current snapshot. Pure given `context`.
    pub fn derive(
        snapshot: &AnalyticsSnapshot,
        comments: &[CommentRecord],
        context: &ReportContext,
    ) -> Self {
        let percentages = Percentages::of_snapshot(snapshot);
        let (range_start, range_end) = date_range(comments);
        Self {
            page_id: context.page_id.clone(),
            generated_on: format_date(context.now),
            total: snapshot.total_comments,
            positive: snapshot.positive_comments,
            neutral: snapshot.neutral_comments,
            negative: snapshot.negative_comments,
            percentages,
            most_prevalent: percentages.most_prevalent(),
            trending: snapshot
                .categories_stats
                .iter()
                .map(|c| (c.category.clone(), c.total_comments))
                .collect(),
            timeline: timeline(comments, context.now),
            top_topics: top_topics(&snapshot.categories_stats, TOP_TOPIC_COUNT),
            range_start,
            range_end,
            recent_comments: comments.iter().take(RECENT_COMMENT_COUNT).cloned().collect(),
            categories: snapshot.categories_stats.clone(),
        }
    }

    /// Comma-separated top topics, or `N/A`.
    pub fn top_topics_text(&self) -> String {
        if self.top_topics.is_empty() {
            "N/A".to_string()
        } else {
            self.top_topics.join(", ")
        }
    }

    /// Count for a single sentiment.
    pub fn count(&self, sentiment: Sentiment) -> u64 {
        match sentiment {
            Sentiment::Positive => self.positive,
            Sentiment::Neutral => self.neutral,
            Sentiment::Negative => self.negative,
        }
    }
}

/// Buckets comments by calendar month of `created_time`.
///
/// Comments without a parseable timestamp land in the month of `now`.
/// Unknown sentiment labels create the bucket but add to no tally.
pub fn timeline(comments: &[CommentRecord], now: DateTime<Utc>) -> Vec<TimelineBucket> {
    let mut buckets: BTreeMap<(i32, u32), TimelineBucket> = BTreeMap::new();
    for comment in comments {
        let at = comment
            .created_time
            .as_deref()
            .and_then(parse_timestamp)
            .unwrap_or(now);
        let key = (at.year(), at.month());
        let bucket = buckets.entry(key).or_insert_with(|| TimelineBucket {
            year: key.0,
            month: key.1,
            label: at.format("%b %Y").to_string(),
            positive: 0,
            neutral: 0,
            negative: 0,
        });
        match comment.sentiment_kind() {
            Some(Sentiment::Positive) => bucket.positive += 1,
            Some(Sentiment::Neutral) => bucket.neutral += 1,
            Some(Sentiment::Negative) => bucket.negative += 1,
            None => {}
        }
    }
    buckets.into_values().collect()
}

/// The `n` categories with the most mentions. The sort is stable, so ties
/// keep their snapshot order.
pub fn top_topics(stats: &[CategoryStat], n: usize) -> Vec<String> {
    let mut sorted: Vec<&CategoryStat> = stats.iter().collect();
    sorted.sort_by(|a, b| b.total_comments.cmp(&a.total_comments));
    sorted.into_iter().take(n).map(|c| c.category.clone()).collect()
}

/// Earliest and latest parseable comment dates, formatted for display.
pub fn date_range(comments: &[CommentRecord]) -> (String, String) {
    let mut stamps: Vec<DateTime<Utc>> = comments
        .iter()
        .filter_map(|c| c.created_time.as_deref().and_then(parse_timestamp))
        .collect();
    stamps.sort();
    match (stamps.first(), stamps.last()) {
        (Some(first), Some(last)) => (format_date(*first), format_date(*last)),
        _ => ("N/A".to_string(), "N/A".to_string()),
    }
}

/// `Jan 5, 2024`
pub fn format_date(at: DateTime<Utc>) -> String {
    at.format("%b %-d, %Y").to_string()
}

/// Accepts RFC 3339, the Graph API's `+0000` offsets, naive date-times and
/// plain dates (both read as UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
