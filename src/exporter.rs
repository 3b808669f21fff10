//! Export actions: produce the file bytes and package them into a record.
//!
//! Registering the record and offering the download are left to the caller,
//! which owns the stores.

use crate::analysis_store::AnalysisState;
use crate::csv_export;
use crate::error::ExportError;
use crate::export_registry::package_export;
use crate::report::{self, PaginationConfig, PrintTheme, ReportContext, ResvgTarget};
use crate::types::{ExportKind, ExportRecord};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::time::Duration;

/// A packaged artifact together with its raw bytes.
#[derive(Debug, Clone)]
pub struct GeneratedExport {
    /// Registry entry, payload included
    pub record: ExportRecord,
    /// Raw file contents offered for download
    pub bytes: Vec<u8>,
}

impl GeneratedExport {
    fn package(kind: ExportKind, bytes: Vec<u8>, now: DateTime<Utc>) -> Self {
        let record = package_export(kind, &bytes, now);
        log::info!("Packaged {} ({} bytes)", record.filename, bytes.len());
        Self { record, bytes }
    }
}

/// Renders the PDF report for `state` with the resvg backend.
pub async fn generate_report_export<D, F>(
    state: &AnalysisState,
    now: DateTime<Utc>,
    delay: D,
) -> Result<GeneratedExport, ExportError>
where
    D: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let snapshot = state.analytics.clone().unwrap_or_default();
    let context = ReportContext { page_id: state.page_id.clone(), now };
    let pages = report::build_report(&snapshot, &state.comments_analyzed, &context);

    let mut target = ResvgTarget::new();
    let document = report::generate_pdf(
        &mut target,
        &pages,
        &PrintTheme::default(),
        &PaginationConfig::default(),
        delay,
    )
    .await?;

    Ok(GeneratedExport::package(ExportKind::Pdf, document.bytes, now))
}

/// Comment rows as CSV.
pub fn comments_csv_export(state: &AnalysisState, now: DateTime<Utc>) -> GeneratedExport {
    let csv = csv_export::comments_csv(&state.comments_analyzed);
    GeneratedExport::package(ExportKind::CommentsCsv, csv.into_bytes(), now)
}

/// Category aggregates as CSV. Empty (header only) when nothing was analyzed.
pub fn categories_csv_export(state: &AnalysisState, now: DateTime<Utc>) -> GeneratedExport {
    let stats = state
        .analytics
        .as_ref()
        .map(|a| a.categories_stats.as_slice())
        .unwrap_or_default();
    let csv = csv_export::categories_csv(stats);
    GeneratedExport::package(ExportKind::CategoriesCsv, csv.into_bytes(), now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export_registry::decode_payload;
    use crate::report::engine::no_delay;
    use crate::report::{build_report, plan_placement, PageKind};
    use crate::types::{AnalyticsSnapshot, CategoryStat, CommentRecord};
    use chrono::TimeZone;
    use futures::executor::block_on;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 5, 10, 15, 30).unwrap()
    }

    fn state(categories: usize) -> AnalysisState {
        let categories_stats = (0..categories)
            .map(|i| CategoryStat {
                category: format!("Topic {i}"),
                total_comments: 5,
                positive_comments: 3,
                neutral_comments: 1,
                negative_comments: 1,
            })
            .collect();
        AnalysisState {
            page_id: "acme".into(),
            analytics: Some(AnalyticsSnapshot {
                total_comments: 100,
                positive_comments: 60,
                neutral_comments: 25,
                negative_comments: 15,
                categories_stats,
            }),
            comments_analyzed: vec![CommentRecord {
                comment_id: "c1".into(),
                text: "Great, \"really\" great".into(),
                sentiment: "positive".into(),
                sentiment_conf: 0.9,
                category: "Topic 0".into(),
                category_conf: 0.8,
                created_time: Some("2024-02-01T12:00:00+00:00".into()),
            }],
        }
    }

    #[test]
    fn comments_export_round_trips_through_the_payload() {
        let export = comments_csv_export(&state(2), now());
        assert_eq!(export.record.kind, ExportKind::CommentsCsv);
        assert_eq!(export.record.filename, "comments-export-2024-03-05T10-15-30-000Z.csv");
        assert_eq!(decode_payload(&export.record).unwrap(), export.bytes);
        assert!(String::from_utf8(export.bytes).unwrap().contains("\"Great, \"\"really\"\" great\""));
    }

    #[test]
    fn categories_export_without_analytics_is_header_only() {
        let export = categories_csv_export(&AnalysisState::default(), now());
        let text = String::from_utf8(export.bytes).unwrap();
        assert_eq!(text.lines().count(), 1);
        assert_eq!(export.record.size_bytes, text.len() as u64);
    }

    #[test]
    fn report_export_produces_a_multi_page_pdf() {
        let export = block_on(generate_report_export(&state(20), now(), no_delay)).unwrap();
        assert_eq!(export.record.mime, "application/pdf");
        assert_eq!(export.record.filename, "analysis-report-2024-03-05T10-15-30-000Z.pdf");

        let doc = lopdf::Document::load_mem(&export.bytes).unwrap();
        // Cover, overview, timeline, sentiment, 2 stat pages, distribution, 4 breakdown pages.
        assert!(doc.get_pages().len() >= 11);
    }

    #[test]
    fn tall_distribution_page_is_sliced_across_output_pages() {
        let state = state(60);
        let export = block_on(generate_report_export(&state, now(), no_delay)).unwrap();

        let context = ReportContext { page_id: state.page_id.clone(), now: now() };
        let pages = build_report(state.analytics.as_ref().unwrap(), &state.comments_analyzed, &context);
        let config = PaginationConfig::default();
        let bands = |page: &report::LogicalPage| {
            let width = (page.width * config.raster_scale).ceil() as u32;
            let height = (page.height * config.raster_scale).ceil() as u32;
            plan_placement(width, height, &config).bands.len()
        };

        let distribution = pages.iter().find(|p| p.kind == PageKind::TopicDistribution).unwrap();
        assert!(bands(distribution) > 1);

        let expected: usize = pages.iter().map(bands).sum();
        let doc = lopdf::Document::load_mem(&export.bytes).unwrap();
        assert_eq!(doc.get_pages().len(), expected);
    }

    #[test]
    fn colour_like_user_text_does_not_abort_the_report() {
        let mut state = state(3);
        state.comments_analyzed[0].text = "Tip: set color: var(--brand) in your CSS".into();
        if let Some(analytics) = state.analytics.as_mut() {
            analytics.categories_stats[0].category = "color-mix(design)".into();
            analytics.categories_stats[1].category = "oklch(0.6 0.2 250) lch(1)".into();
        }

        let export = block_on(generate_report_export(&state, now(), no_delay)).unwrap();
        let doc = lopdf::Document::load_mem(&export.bytes).unwrap();
        assert!(!doc.get_pages().is_empty());
    }
}
