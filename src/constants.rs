//! Shared application-wide constants.
//! Centralizes tweakable values used across report layout, pagination and persistence.

use std::time::Duration;

// Report layout
/// Fixed width of every logical report page, in CSS pixels (A4 at ~96 DPI).
pub const PAGE_WIDTH_PX: f32 = 900.0;
/// Vertical padding at the top and bottom of a logical page.
pub const PAGE_PADDING_Y: f32 = 36.0;
/// Horizontal padding at the left and right of a logical page.
pub const PAGE_PADDING_X: f32 = 24.0;
/// Category stat cards per topic page (5 columns x 3 rows).
pub const STAT_CARDS_PER_PAGE: usize = 15;
/// Per-category sentiment charts per topic page (3 columns x 2 rows).
pub const THEME_CHARTS_PER_PAGE: usize = 6;
/// Number of categories listed as "top topics".
pub const TOP_TOPIC_COUNT: usize = 3;
/// Number of comments shown in the recent comments card.
pub const RECENT_COMMENT_COUNT: usize = 5;

// Pagination
/// Oversampling factor applied when rasterizing a logical page.
pub const RASTER_SCALE: f32 = 2.0;
/// Fraction of the output page width a placed bitmap occupies.
pub const PAGE_ZOOM: f32 = 0.92;
/// A4 portrait width in PDF points.
pub const A4_WIDTH_PT: f32 = 595.28;
/// A4 portrait height in PDF points.
pub const A4_HEIGHT_PT: f32 = 841.89;
/// Bounded waits that let chart painting settle before capture.
pub const SETTLE_DELAYS: [Duration; 2] = [Duration::from_millis(300), Duration::from_millis(500)];

// Sentiment palette
/// Stroke/fill colour used for positive sentiment.
pub const POSITIVE_COLOR: &str = "#10b981";
/// Stroke/fill colour used for neutral sentiment.
pub const NEUTRAL_COLOR: &str = "#6b7280";
/// Stroke/fill colour used for negative sentiment.
pub const NEGATIVE_COLOR: &str = "#ef4444";

// Persistence
/// Schema version written into every persisted bucket.
pub const STORE_VERSION: u32 = 1;
/// Bucket holding the last analysis snapshot and comments.
pub const ANALYSIS_BUCKET: &str = "analysis-store";
/// Bucket holding generated export artifacts.
pub const EXPORTS_BUCKET: &str = "exports-store";
/// Bucket holding credential and page preferences.
pub const SETTINGS_BUCKET: &str = "settings-store";

// Ingestion
/// Default backend used when no override is configured.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
/// Default request timeout for ingestion calls, in seconds.
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 120;
/// Batch size sent along with CSV uploads.
pub const DEFAULT_CSV_BATCH_SIZE: u32 = 32;
