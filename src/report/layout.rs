//! Report layout builder.
//!
//! Assembles the fixed-width logical pages of the PDF report as SVG
//! documents. Pages are appended top to bottom by a [`PageBuilder`] whose
//! cursor tracks the used height, so every page is exactly as tall as its
//! content. Topic pages multiply with the number of categories.

use super::derive::{Percentages, ReportContext, ReportData};
use crate::charts::{self, ChartBox, Datum, Series};
use crate::constants::{
    PAGE_PADDING_X, PAGE_PADDING_Y, PAGE_WIDTH_PX, STAT_CARDS_PER_PAGE, THEME_CHARTS_PER_PAGE,
};
use crate::svg::{self, TextStyle};
use crate::types::{AnalyticsSnapshot, CommentRecord, Sentiment};

const FOREGROUND: &str = "var(--foreground)";
const MUTED: &str = "var(--muted-foreground)";
const BACKGROUND: &str = "var(--background)";
const CARD: &str = "var(--card)";
const BORDER: &str = "var(--border)";

const GRID_GAP: f32 = 16.0;
const CARD_GAP: f32 = 12.0;
const SECTION_GAP: f32 = 14.0;
const SMALL_TEXT: f32 = 13.0;
const SMALL_LINE: f32 = 19.0;

/// What a logical page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    /// Title page
    Cover,
    /// Headline figures and sentiment split
    Overview,
    /// Sentiment over time
    OverviewTimeline,
    /// Sentiment breakdown charts
    Sentiment,
    /// Category stat cards, `chunk` counted from 0
    TopicStats {
        /// Zero-based chunk index
        chunk: usize,
    },
    /// Shown instead of the topic pages when there are no categories
    TopicsPlaceholder,
    /// Mentions per topic
    TopicDistribution,
    /// Per-category sentiment charts, `chunk` counted from 0
    ThemeBreakdown {
        /// Zero-based chunk index
        chunk: usize,
    },
}

/// One fixed-width block of the report, ready to be rasterized.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalPage {
    /// What the page shows
    pub kind: PageKind,
    /// Marks the start of a section that must begin on a fresh output page
    pub break_before: bool,
    /// Width in CSS pixels
    pub width: f32,
    /// Height in CSS pixels
    pub height: f32,
    /// Standalone SVG document; colours may still be theme tokens
    pub svg: String,
}

/// A chart placed in a grid cell.
#[derive(Debug, Clone)]
enum ChartSpec {
    Pie { data: Vec<Datum>, total_label: &'static str },
    Bar { data: Vec<Datum> },
    HorizontalBar { data: Vec<Datum> },
    Line { labels: Vec<String>, series: Vec<Series> },
}

impl ChartSpec {
    fn plot_height(&self, base: f32) -> f32 {
        match self {
            ChartSpec::HorizontalBar { data } => charts::horizontal_plot_height(data.len()),
            _ => base,
        }
    }

    fn draw(&self, out: &mut String, plot: ChartBox) {
        match self {
            ChartSpec::Pie { data, total_label } => charts::pie_chart(out, plot, data, total_label),
            ChartSpec::Bar { data } => charts::bar_chart(out, plot, data),
            ChartSpec::HorizontalBar { data } => charts::horizontal_bar_chart(out, plot, data),
            ChartSpec::Line { labels, series } => charts::line_chart(out, plot, labels, series),
        }
    }
}

#[derive(Debug, Clone)]
struct ChartCell {
    title: String,
    description: String,
    chart: ChartSpec,
}

struct StatCardSpec {
    label: String,
    value: String,
    help: String,
}

/// Appends content to one logical page.
struct PageBuilder {
    kind: PageKind,
    break_before: bool,
    body: String,
    cursor: f32,
}

impl PageBuilder {
    fn new(kind: PageKind, break_before: bool) -> Self {
        Self { kind, break_before, body: String::new(), cursor: PAGE_PADDING_Y }
    }

    fn content_width() -> f32 {
        PAGE_WIDTH_PX - 2.0 * PAGE_PADDING_X
    }

    fn gap(&mut self, height: f32) {
        self.cursor += height;
    }

    /// Running header: report title on the left, generated date on the right.
    fn header(&mut self, title: &str, generated_on: &str) {
        let baseline = self.cursor + 12.0;
        svg::text(
            &mut self.body,
            PAGE_PADDING_X,
            baseline,
            TextStyle::new(12.0, FOREGROUND).weight(700),
            &format!("Social Media Analysis | {title}"),
        );
        svg::text(
            &mut self.body,
            PAGE_WIDTH_PX - PAGE_PADDING_X,
            baseline,
            TextStyle::new(11.0, MUTED).anchor(svg::Anchor::End),
            &format!("Generated {generated_on}"),
        );
        self.cursor += 24.0;
    }

    fn title(&mut self, text: &str, size: f32, weight: u16) {
        svg::text(
            &mut self.body,
            PAGE_PADDING_X,
            self.cursor + size,
            TextStyle::new(size, FOREGROUND).weight(weight),
            text,
        );
        self.cursor += size + 10.0;
    }

    fn section_title(&mut self, text: &str) {
        self.title(text, 18.0, 700);
    }

    fn small_text(&mut self, text: &str, muted: bool) {
        let color = if muted { MUTED } else { FOREGROUND };
        let next = svg::paragraph(
            &mut self.body,
            PAGE_PADDING_X,
            self.cursor + SMALL_TEXT + 4.0,
            Self::content_width(),
            SMALL_LINE,
            TextStyle::new(SMALL_TEXT, color),
            text,
        );
        self.cursor = next - SMALL_TEXT + 4.0;
    }

    fn stat_cards(&mut self, cards: &[StatCardSpec], columns: usize) {
        let width = (Self::content_width() - CARD_GAP * (columns as f32 - 1.0)) / columns as f32;
        let inner = width - 24.0;
        for row in cards.chunks(columns) {
            let row_height = row
                .iter()
                .map(|c| 74.0 + 14.0 * svg::wrap_text(&c.help, 11.0, inner).len() as f32)
                .fold(0.0, f32::max);
            for (i, card) in row.iter().enumerate() {
                let x = PAGE_PADDING_X + (width + CARD_GAP) * i as f32;
                let y = self.cursor;
                svg::rect(&mut self.body, x, y, width, row_height, CARD, Some(BORDER), 8.0);
                let label = svg::truncate_to_width(&card.label.to_uppercase(), 11.0, inner);
                svg::text(&mut self.body, x + 12.0, y + 22.0, TextStyle::new(11.0, MUTED), &label);
                svg::text(
                    &mut self.body,
                    x + 12.0,
                    y + 52.0,
                    TextStyle::new(24.0, FOREGROUND).weight(600),
                    &card.value,
                );
                svg::paragraph(
                    &mut self.body,
                    x + 12.0,
                    y + 74.0,
                    inner,
                    14.0,
                    TextStyle::new(11.0, MUTED),
                    &card.help,
                );
            }
            self.cursor += row_height + CARD_GAP;
        }
    }

    fn chart_grid(&mut self, cells: &[ChartCell], columns: usize, base_plot: f32) {
        let width = (Self::content_width() - GRID_GAP * (columns as f32 - 1.0)) / columns as f32;
        for row in cells.chunks(columns) {
            let row_height = row
                .iter()
                .map(|c| charts::card_height(c.chart.plot_height(base_plot)))
                .fold(0.0, f32::max);
            for (i, cell) in row.iter().enumerate() {
                let area = ChartBox::new(
                    PAGE_PADDING_X + (width + GRID_GAP) * i as f32,
                    self.cursor,
                    width,
                    row_height,
                );
                let plot = charts::card(&mut self.body, area, &cell.title, Some(cell.description.as_str()));
                cell.chart.draw(&mut self.body, plot);
            }
            self.cursor += row_height + GRID_GAP;
        }
    }

    fn recent_comments(&mut self, comments: &[CommentRecord]) {
        let x = PAGE_PADDING_X;
        let width = Self::content_width();
        let inner = width - 32.0;
        let top = self.cursor;

        let mut list = String::new();
        let mut y = top + 16.0 + 16.0;
        svg::text(&mut list, x + 16.0, y, TextStyle::new(14.0, FOREGROUND).weight(600), "Recent Comments Analysis");
        y += 24.0;

        if comments.is_empty() {
            svg::text(&mut list, x + 16.0, y, TextStyle::new(14.0, MUTED), "No comments analyzed yet.");
            y += 20.0;
        }
        for comment in comments {
            let heading = format!(
                "{} ({}%):",
                comment.category,
                confidence_percent(comment.category_conf)
            );
            svg::text(&mut list, x + 16.0, y, TextStyle::new(14.0, FOREGROUND).weight(700), &heading);
            y += 20.0;
            y = svg::paragraph(&mut list, x + 16.0, y, inner, 19.0, TextStyle::new(14.0, FOREGROUND), &comment.text);
            let date = comment
                .created_time
                .as_deref()
                .and_then(super::derive::parse_timestamp)
                .map(super::derive::format_date)
                .unwrap_or_else(|| "No date".to_string());
            let meta = format!(
                "Sentiment: {} ({}%) - {}",
                comment.sentiment,
                confidence_percent(comment.sentiment_conf),
                date
            );
            svg::text(&mut list, x + 16.0, y, TextStyle::new(12.0, MUTED), &meta);
            y += 26.0;
        }

        let height = y - top;
        svg::rect(&mut self.body, x, top, width, height, CARD, Some(BORDER), 8.0);
        self.body.push_str(&list);
        self.cursor = top + height;
    }

    fn finish(self) -> LogicalPage {
        let height = (self.cursor + PAGE_PADDING_Y).ceil();
        let mut out = String::new();
        svg::open(&mut out, PAGE_WIDTH_PX, height);
        svg::rect(&mut out, 0.0, 0.0, PAGE_WIDTH_PX, height, BACKGROUND, None, 0.0);
        out.push_str(&self.body);
        svg::close(&mut out);
        LogicalPage {
            kind: self.kind,
            break_before: self.break_before,
            width: PAGE_WIDTH_PX,
            height,
            svg: out,
        }
    }
}

fn confidence_percent(conf: f64) -> i64 {
    (conf * 100.0).round() as i64
}

fn sentiment_data(data: &ReportData) -> Vec<Datum> {
    Sentiment::ALL
        .iter()
        .map(|s| Datum::new(s.label(), data.count(*s) as f64))
        .collect()
}

fn timeline_chart(data: &ReportData) -> ChartSpec {
    ChartSpec::Line {
        labels: data.timeline.iter().map(|b| b.label.clone()).collect(),
        series: Sentiment::ALL
            .iter()
            .map(|s| Series {
                name: s.label().to_lowercase(),
                color: s.color().to_string(),
                values: data.timeline.iter().map(|b| b.count(*s) as f64).collect(),
            })
            .collect(),
    }
}

fn topic_data(data: &ReportData) -> Vec<Datum> {
    data.trending
        .iter()
        .map(|(topic, count)| Datum::new(topic.clone(), *count as f64))
        .collect()
}

/// Builds the logical pages for the current snapshot. Pure and
/// deterministic given `context`.
pub fn build_report(
    snapshot: &AnalyticsSnapshot,
    comments: &[CommentRecord],
    context: &ReportContext,
) -> Vec<LogicalPage> {
    build_pages(&ReportData::derive(snapshot, comments, context))
}

/// Builds the logical pages from already-derived figures.
pub fn build_pages(data: &ReportData) -> Vec<LogicalPage> {
    let mut pages = vec![
        cover_page(data),
        overview_page(data),
        overview_timeline_page(data),
        sentiment_page(data),
    ];
    pages.extend(topic_pages(data));
    pages
}

fn cover_page(data: &ReportData) -> LogicalPage {
    let pct = data.percentages;
    let mut page = PageBuilder::new(PageKind::Cover, false);
    page.title("Social Media Analysis Report", 26.0, 800);
    let prepared_for = if data.page_id.is_empty() { "N/A" } else { data.page_id.as_str() };
    page.small_text(&format!("Prepared for: {prepared_for}"), true);
    page.small_text(&format!("Generated: {}", data.generated_on), true);
    page.small_text(&format!("Period: {} – {}", data.range_start, data.range_end), true);
    page.gap(12.0);

    let cards = [
        StatCardSpec {
            label: "Total Comments".into(),
            value: data.total.to_string(),
            help: "100% of sample".into(),
        },
        StatCardSpec {
            label: "Positive".into(),
            value: data.positive.to_string(),
            help: format!("{}% of total", pct.positive),
        },
        StatCardSpec {
            label: "Neutral".into(),
            value: data.neutral.to_string(),
            help: format!("{}% of total", pct.neutral),
        },
        StatCardSpec {
            label: "Negative".into(),
            value: data.negative.to_string(),
            help: format!("{}% of total", pct.negative),
        },
    ];
    page.stat_cards(&cards, 4);

    page.section_title("Executive Summary");
    let period = if data.range_start == "N/A" {
        String::new()
    } else {
        format!(" from {} to {}", data.range_start, data.range_end)
    };
    page.small_text(
        &format!(
            "The analysis covers {} comments{}. Sentiment distribution indicates Positive {}%, Neutral {}%, Negative {}%. Dominant discussion topics: {}.",
            data.total,
            period,
            pct.positive,
            pct.neutral,
            pct.negative,
            data.top_topics_text()
        ),
        false,
    );
    page.finish()
}

fn overview_page(data: &ReportData) -> LogicalPage {
    let pct = data.percentages;
    let mut page = PageBuilder::new(PageKind::Overview, false);
    page.header("Descriptive Overview", &data.generated_on);
    page.section_title("Descriptive Overview");
    page.small_text(
        &format!(
            "Snapshot of engagement and sentiment across the analyzed period. Total comments: {}. Sentiment mix: Positive {}%, Neutral {}%, Negative {}%.",
            data.total, pct.positive, pct.neutral, pct.negative
        ),
        false,
    );
    page.small_text(&format!("Top topics by volume: {}.", data.top_topics_text()), true);
    page.gap(SECTION_GAP);
    page.chart_grid(
        &[
            ChartCell {
                title: "Sentiment Share".into(),
                description: "Relative distribution of sentiments.".into(),
                chart: ChartSpec::Pie { data: sentiment_data(data), total_label: "Total" },
            },
            ChartCell {
                title: "Trending Topics".into(),
                description: "Most discussed categories.".into(),
                chart: ChartSpec::Bar { data: topic_data(data) },
            },
        ],
        2,
        charts::PLOT_HEIGHT,
    );
    page.finish()
}

fn overview_timeline_page(data: &ReportData) -> LogicalPage {
    let mut page = PageBuilder::new(PageKind::OverviewTimeline, true);
    page.header("Descriptive Overview", &data.generated_on);
    page.chart_grid(
        &[ChartCell {
            title: "Sentiment Timeline".into(),
            description: "Monthly sentiment trends.".into(),
            chart: timeline_chart(data),
        }],
        1,
        charts::PLOT_HEIGHT,
    );
    page.recent_comments(&data.recent_comments);
    page.finish()
}

fn sentiment_page(data: &ReportData) -> LogicalPage {
    let mut page = PageBuilder::new(PageKind::Sentiment, false);
    page.header("Sentiment Analysis", &data.generated_on);
    page.section_title("Sentiment Analysis Summary");
    page.small_text(
        "The pie summarizes the overall sentiment composition; the line chart captures monthly temporal dynamics.",
        false,
    );
    page.small_text(
        &format!(
            "Most prevalent sentiment: {}. Period: {} – {}.",
            data.most_prevalent.label(),
            data.range_start,
            data.range_end
        ),
        true,
    );
    page.gap(SECTION_GAP);
    page.chart_grid(
        &[
            ChartCell {
                title: "Sentiment Distribution".into(),
                description: "Overall share of classified sentiments.".into(),
                chart: ChartSpec::Pie { data: sentiment_data(data), total_label: "Total" },
            },
            ChartCell {
                title: "Sentiment Timeline".into(),
                description: "Monthly sentiment trends.".into(),
                chart: timeline_chart(data),
            },
        ],
        2,
        charts::PLOT_HEIGHT,
    );
    page.finish()
}

fn topic_pages(data: &ReportData) -> Vec<LogicalPage> {
    if data.categories.is_empty() {
        let mut page = PageBuilder::new(PageKind::TopicsPlaceholder, true);
        page.section_title("Thematic Analysis");
        page.small_text("No topics data available.", true);
        return vec![page.finish()];
    }

    let mut pages = Vec::new();
    for (chunk, stats) in data.categories.chunks(STAT_CARDS_PER_PAGE).enumerate() {
        let mut page = PageBuilder::new(PageKind::TopicStats { chunk }, chunk == 0);
        if chunk == 0 {
            page.header("Thematic Analysis", &data.generated_on);
            page.section_title("Thematic Summary");
            page.small_text(
                "This section ranks topics by total mentions and shows the sentiment mix per topic.",
                false,
            );
            page.small_text(&format!("Top topics: {}.", data.top_topics_text()), true);
            page.gap(SECTION_GAP);
        }
        let cards: Vec<StatCardSpec> = stats
            .iter()
            .map(|stat| {
                let pct = Percentages::of_category(stat);
                StatCardSpec {
                    label: stat.category.clone(),
                    value: stat.total_comments.to_string(),
                    help: format!(
                        "{}% Positive / {}% Negative / {}% Neutral",
                        pct.positive, pct.negative, pct.neutral
                    ),
                }
            })
            .collect();
        page.stat_cards(&cards, 5);
        pages.push(page.finish());
    }

    let mut distribution = PageBuilder::new(PageKind::TopicDistribution, false);
    distribution.header("Thematic Analysis", &data.generated_on);
    distribution.section_title("Thematic Distribution");
    distribution.small_text("Total mentions per topic with relative ranking.", true);
    distribution.gap(SECTION_GAP);
    distribution.chart_grid(
        &[ChartCell {
            title: "Topic Distribution".into(),
            description: "Total mentions per topic".into(),
            chart: ChartSpec::HorizontalBar { data: topic_data(data) },
        }],
        1,
        charts::PLOT_HEIGHT,
    );
    pages.push(distribution.finish());

    for (chunk, stats) in data.categories.chunks(THEME_CHARTS_PER_PAGE).enumerate() {
        let mut page = PageBuilder::new(PageKind::ThemeBreakdown { chunk }, chunk == 0);
        page.header("Thematic Analysis", &data.generated_on);
        page.section_title("Sentiment by Theme");
        page.small_text("Per-topic sentiment composition (counts).", true);
        page.gap(SECTION_GAP);
        let cells: Vec<ChartCell> = stats
            .iter()
            .map(|stat| ChartCell {
                title: stat.category.clone(),
                description: format!("Sentiment breakdown for {}", stat.category),
                chart: ChartSpec::Bar {
                    data: Sentiment::ALL
                        .iter()
                        .map(|s| Datum::new(s.label(), stat.count(*s) as f64).with_color(s.color()))
                        .collect(),
                },
            })
            .collect();
        page.chart_grid(&cells, 3, 200.0);
        pages.push(page.finish());
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CategoryStat;
    use chrono::{TimeZone, Utc};

    fn context() -> ReportContext {
        ReportContext {
            page_id: "acme".into(),
            now: Utc.with_ymd_and_hms(2024, 3, 5, 12, 0, 0).unwrap(),
        }
    }

    fn snapshot(categories: usize) -> AnalyticsSnapshot {
        AnalyticsSnapshot {
            total_comments: 100,
            positive_comments: 60,
            neutral_comments: 25,
            negative_comments: 15,
            categories_stats: (0..categories)
                .map(|i| CategoryStat {
                    category: format!("Topic {i}"),
                    total_comments: 5,
                    positive_comments: 3,
                    neutral_comments: 1,
                    negative_comments: 1,
                })
                .collect(),
        }
    }

    fn kinds(pages: &[LogicalPage]) -> Vec<PageKind> {
        pages.iter().map(|p| p.kind).collect()
    }

    #[test]
    fn twenty_categories_chunk_into_stat_and_theme_pages() {
        let pages = build_report(&snapshot(20), &[], &context());

        let stat_pages: Vec<_> = pages
            .iter()
            .filter(|p| matches!(p.kind, PageKind::TopicStats { .. }))
            .collect();
        assert_eq!(stat_pages.len(), 2);
        assert_eq!(stat_pages[0].svg.matches("TOPIC ").count(), 15);
        assert_eq!(stat_pages[1].svg.matches("TOPIC ").count(), 5);

        let theme_pages: Vec<_> = pages
            .iter()
            .filter(|p| matches!(p.kind, PageKind::ThemeBreakdown { .. }))
            .collect();
        assert_eq!(theme_pages.len(), 4);
        let per_page: Vec<_> = theme_pages
            .iter()
            .map(|p| p.svg.matches("Sentiment breakdown for").count())
            .collect();
        assert_eq!(per_page, vec![6, 6, 6, 2]);
    }

    #[test]
    fn page_sequence_and_break_markers() {
        let pages = build_report(&snapshot(7), &[], &context());
        assert_eq!(
            kinds(&pages),
            vec![
                PageKind::Cover,
                PageKind::Overview,
                PageKind::OverviewTimeline,
                PageKind::Sentiment,
                PageKind::TopicStats { chunk: 0 },
                PageKind::TopicDistribution,
                PageKind::ThemeBreakdown { chunk: 0 },
                PageKind::ThemeBreakdown { chunk: 1 },
            ]
        );
        let breaks: Vec<_> = pages.iter().map(|p| p.break_before).collect();
        assert_eq!(breaks, vec![false, false, true, false, true, false, true, false]);
    }

    #[test]
    fn no_categories_yields_a_placeholder_page() {
        let pages = build_report(&snapshot(0), &[], &context());
        let last = pages.last().unwrap();
        assert_eq!(last.kind, PageKind::TopicsPlaceholder);
        assert!(last.svg.contains("No topics data available."));
        assert!(!pages.iter().any(|p| p.kind == PageKind::TopicDistribution));
    }

    #[test]
    fn every_page_is_full_width_and_well_formed() {
        let pages = build_report(&snapshot(3), &[], &context());
        for page in &pages {
            assert_eq!(page.width, PAGE_WIDTH_PX);
            assert!(page.height > 2.0 * PAGE_PADDING_Y);
            assert!(page.svg.starts_with("<svg"));
            assert!(page.svg.trim_end().ends_with("</svg>"));
        }
    }

    #[test]
    fn cover_shows_totals_and_shares() {
        let pages = build_report(&snapshot(3), &[], &context());
        let cover = &pages[0].svg;
        assert!(cover.contains("Prepared for: acme"));
        assert!(cover.contains("Generated: Mar 5, 2024"));
        assert!(cover.contains("60% of total"));
        assert!(cover.contains("25% of total"));
        assert!(cover.contains("15% of total"));
    }

    #[test]
    fn distribution_page_grows_with_category_count() {
        let height = |n| {
            build_report(&snapshot(n), &[], &context())
                .into_iter()
                .find(|p| p.kind == PageKind::TopicDistribution)
                .map(|p| p.height)
                .unwrap()
        };
        assert!(height(60) > height(5) + 1000.0);
    }

    #[test]
    fn recent_comments_are_limited_and_escaped() {
        let comments: Vec<_> = (0..8)
            .map(|i| CommentRecord {
                comment_id: i.to_string(),
                text: format!("<b>comment {i}</b>"),
                sentiment: "positive".into(),
                sentiment_conf: 0.876,
                category: "Service".into(),
                category_conf: 0.5,
                created_time: Some("2024-01-05T10:00:00Z".into()),
            })
            .collect();
        let pages = build_report(&snapshot(1), &comments, &context());
        let timeline = pages.iter().find(|p| p.kind == PageKind::OverviewTimeline).unwrap();
        assert_eq!(timeline.svg.matches("Sentiment: positive (88%) - Jan 5, 2024").count(), 5);
        assert!(timeline.svg.contains("&lt;b&gt;comment 0&lt;/b&gt;"));
        assert!(!timeline.svg.contains("comment 5"));
    }
}
