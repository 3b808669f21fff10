//! Chart rendering surface.
//!
//! Pure functions turning tabular records into pie, bar and line charts. The
//! geometry helpers (`pie_arcs`, `axis_max`, `bar_slots`, `line_points`) are
//! shared by the SVG emitters used for report pages and by the egui painter
//! widgets on screen. Colours may be theme tokens (`var(--chart-1)`) which the
//! report pipeline resolves before rasterizing.

use crate::svg::{self, Anchor, TextStyle};
use std::f32::consts::TAU;
use std::fmt::Write as _;

/// Default slice colours, cycled when a datum has no explicit colour.
pub const PIE_PALETTE: [&str; 4] = [
    "var(--chart-1)",
    "var(--chart-3)",
    "var(--chart-2)",
    "var(--chart-4)",
];
/// Fill for bars without an explicit colour.
pub const DEFAULT_BAR_COLOR: &str = "var(--primary)";

const CARD_FILL: &str = "var(--card)";
const CARD_STROKE: &str = "var(--border)";
const GRID_COLOR: &str = "var(--border)";
const TITLE_COLOR: &str = "var(--card-foreground)";
const MUTED_COLOR: &str = "var(--muted-foreground)";

/// Inner padding of a chart card.
pub const CARD_PADDING: f32 = 16.0;
/// Space taken by the title and description lines of a card.
pub const CARD_HEADER: f32 = 44.0;
/// Default plot height of a chart card.
pub const PLOT_HEIGHT: f32 = 240.0;
/// Row pitch of a horizontal bar chart.
pub const HBAR_ROW: f32 = 28.0;

const LEGEND_HEIGHT: f32 = 22.0;
const AXIS_GUTTER: f32 = 34.0;
const LABEL_GUTTER: f32 = 20.0;
const HBAR_LABEL_GUTTER: f32 = 150.0;
const PIE_MAX_RADIUS: f32 = 80.0;
const PIE_INNER_RATIO: f32 = 50.0 / 80.0;
const PIE_PAD_ANGLE: f32 = 2.0 * std::f32::consts::PI / 180.0;

/// One labelled value (a pie slice or a bar).
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    /// Legend and axis label
    pub label: String,
    /// Magnitude; negative values draw as zero
    pub value: f64,
    /// Explicit colour, otherwise taken from the palette
    pub color: Option<String>,
}

impl Datum {
    /// A datum coloured from the palette.
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self { label: label.into(), value, color: None }
    }

    /// Sets an explicit colour.
    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }
}

/// One line of a line chart; `values` align with the chart's x labels.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    /// Legend label
    pub name: String,
    /// Stroke colour
    pub color: String,
    /// One value per x label
    pub values: Vec<f64>,
}

/// Axis-aligned drawing area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartBox {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Horizontal extent
    pub width: f32,
    /// Vertical extent
    pub height: f32,
}

impl ChartBox {
    /// A box with its top-left corner at `(x, y)`.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// X coordinate of the right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Y coordinate of the bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Shrinks the box by the given insets.
    pub fn inset(&self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            x: self.x + left,
            y: self.y + top,
            width: (self.width - left - right).max(0.0),
            height: (self.height - top - bottom).max(0.0),
        }
    }
}

/// Angular extent of a pie slice, in radians clockwise from 12 o'clock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PieArc {
    /// Start angle
    pub start: f32,
    /// End angle
    pub end: f32,
}

impl PieArc {
    /// Angle covered by the slice.
    pub fn sweep(&self) -> f32 {
        self.end - self.start
    }
}

/// Splits the full circle proportionally to `values`.
///
/// Negative values count as zero. Returns an empty list when nothing is
/// positive, so callers can fall back to a placeholder.
pub fn pie_arcs(values: &[f64]) -> Vec<PieArc> {
    let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
    if total <= 0.0 {
        return Vec::new();
    }
    let mut start = 0.0_f32;
    values
        .iter()
        .map(|v| {
            let sweep = (v.max(0.0) / total) as f32 * TAU;
            let arc = PieArc { start, end: start + sweep };
            start += sweep;
            arc
        })
        .collect()
}

/// Rounds `max` up to a readable axis ceiling divisible into four whole steps.
pub fn axis_max(max: f64) -> f64 {
    if max.is_nan() || max <= 0.0 {
        return 4.0;
    }
    let raw_step = max / 4.0;
    let magnitude = 10f64.powf(raw_step.log10().floor());
    let normalized = raw_step / magnitude;
    let nice = if normalized <= 1.0 {
        1.0
    } else if normalized <= 2.0 {
        2.0
    } else if normalized <= 5.0 {
        5.0
    } else {
        10.0
    };
    (nice * magnitude).max(1.0) * 4.0
}

/// Horizontal slots for `count` bars across `plot`: `(x, width)` per bar.
pub fn bar_slots(count: usize, plot: ChartBox) -> Vec<(f32, f32)> {
    if count == 0 {
        return Vec::new();
    }
    let slot = plot.width / count as f32;
    let bar = (slot * 0.7).min(64.0);
    (0..count)
        .map(|i| (plot.x + slot * i as f32 + (slot - bar) / 2.0, bar))
        .collect()
}

/// Maps a value onto the vertical extent of `plot` (0 at the bottom).
pub fn value_to_y(value: f64, max: f64, plot: ChartBox) -> f32 {
    let ratio = if max > 0.0 { (value / max).clamp(0.0, 1.0) } else { 0.0 };
    plot.bottom() - ratio as f32 * plot.height
}

/// Evenly spaced points for a series; a single point is centred.
pub fn line_points(values: &[f64], max: f64, plot: ChartBox) -> Vec<(f32, f32)> {
    let n = values.len();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let x = if n <= 1 {
                plot.x + plot.width / 2.0
            } else {
                plot.x + plot.width * i as f32 / (n - 1) as f32
            };
            (x, value_to_y(*v, max, plot))
        })
        .collect()
}

/// Total card height for a plot of `plot_height`.
pub fn card_height(plot_height: f32) -> f32 {
    plot_height + CARD_HEADER + 2.0 * CARD_PADDING
}

/// Plot height a horizontal bar chart needs for `rows` bars.
pub fn horizontal_plot_height(rows: usize) -> f32 {
    rows.max(1) as f32 * HBAR_ROW + LABEL_GUTTER
}

/// Draws the card frame, title and description. Returns the plot area.
pub fn card(out: &mut String, area: ChartBox, title: &str, description: Option<&str>) -> ChartBox {
    svg::rect(out, area.x, area.y, area.width, area.height, CARD_FILL, Some(CARD_STROKE), 8.0);
    let inner = area.inset(CARD_PADDING, CARD_PADDING, CARD_PADDING, CARD_PADDING);
    let title_text = svg::truncate_to_width(title, 14.0, inner.width);
    svg::text(
        out,
        inner.x,
        inner.y + 14.0,
        TextStyle::new(14.0, TITLE_COLOR).weight(600),
        &title_text,
    );
    if let Some(description) = description {
        let desc = svg::truncate_to_width(description, 12.0, inner.width);
        svg::text(out, inner.x, inner.y + 34.0, TextStyle::new(12.0, MUTED_COLOR), &desc);
    }
    inner.inset(0.0, CARD_HEADER, 0.0, 0.0)
}

fn no_data(out: &mut String, plot: ChartBox) {
    svg::text(
        out,
        plot.x + plot.width / 2.0,
        plot.y + plot.height / 2.0,
        TextStyle::new(12.0, MUTED_COLOR).anchor(Anchor::Middle),
        "No data",
    );
}

fn color_at<'a>(datum: &'a Datum, index: usize) -> &'a str {
    datum
        .color
        .as_deref()
        .unwrap_or(PIE_PALETTE[index % PIE_PALETTE.len()])
}

fn polar(cx: f32, cy: f32, radius: f32, angle: f32) -> (f32, f32) {
    (cx + radius * angle.sin(), cy - radius * angle.cos())
}

fn legend(out: &mut String, plot: ChartBox, entries: &[(&str, &str)]) {
    let item_widths: Vec<f32> = entries
        .iter()
        .map(|(label, _)| 14.0 + svg::text_width(label, 12.0) + 16.0)
        .collect();
    let total: f32 = item_widths.iter().sum();
    let mut x = plot.x + ((plot.width - total) / 2.0).max(0.0);
    let y = plot.bottom() - 6.0;
    for ((label, color), width) in entries.iter().zip(item_widths) {
        svg::rect(out, x, y - 9.0, 10.0, 10.0, color, None, 2.0);
        svg::text(out, x + 14.0, y, TextStyle::new(12.0, MUTED_COLOR), label);
        x += width;
    }
}

/// Donut chart with a centred total and a legend.
pub fn pie_chart(out: &mut String, plot: ChartBox, data: &[Datum], total_label: &str) {
    let values: Vec<f64> = data.iter().map(|d| d.value).collect();
    let arcs = pie_arcs(&values);
    if arcs.is_empty() {
        no_data(out, plot);
        return;
    }

    let body = plot.inset(0.0, 0.0, 0.0, LEGEND_HEIGHT);
    let outer = (body.width.min(body.height) / 2.0 - 4.0).clamp(8.0, PIE_MAX_RADIUS);
    let inner = outer * PIE_INNER_RATIO;
    let cx = body.x + body.width / 2.0;
    let cy = body.y + body.height / 2.0;

    let visible = arcs.iter().filter(|a| a.sweep() > 0.0).count();
    for (i, (datum, arc)) in data.iter().zip(&arcs).enumerate() {
        if arc.sweep() <= 0.0 {
            continue;
        }
        let color = color_at(datum, i);
        if visible == 1 {
            // A lone slice covers the whole ring; arcs cannot express that.
            let _ = writeln!(
                out,
                "<path fill-rule=\"evenodd\" fill=\"{color}\" d=\"M{:.2},{cy:.2} A{outer},{outer} 0 1 1 {:.2},{cy:.2} A{outer},{outer} 0 1 1 {:.2},{cy:.2} Z M{:.2},{cy:.2} A{inner},{inner} 0 1 0 {:.2},{cy:.2} A{inner},{inner} 0 1 0 {:.2},{cy:.2} Z\" />",
                cx - outer,
                cx + outer,
                cx - outer,
                cx - inner,
                cx + inner,
                cx - inner,
            );
            continue;
        }
        let pad = (PIE_PAD_ANGLE / 2.0).min(arc.sweep() / 4.0);
        let (a0, a1) = (arc.start + pad, arc.end - pad);
        let large = if a1 - a0 > std::f32::consts::PI { 1 } else { 0 };
        let (ox0, oy0) = polar(cx, cy, outer, a0);
        let (ox1, oy1) = polar(cx, cy, outer, a1);
        let (ix1, iy1) = polar(cx, cy, inner, a1);
        let (ix0, iy0) = polar(cx, cy, inner, a0);
        let _ = writeln!(
            out,
            "<path fill=\"{color}\" d=\"M{ox0:.2},{oy0:.2} A{outer},{outer} 0 {large} 1 {ox1:.2},{oy1:.2} L{ix1:.2},{iy1:.2} A{inner},{inner} 0 {large} 0 {ix0:.2},{iy0:.2} Z\" />"
        );
    }

    let total: f64 = values.iter().map(|v| v.max(0.0)).sum();
    svg::text(
        out,
        cx,
        cy - 4.0,
        TextStyle::new(11.0, MUTED_COLOR).anchor(Anchor::Middle),
        total_label,
    );
    svg::text(
        out,
        cx,
        cy + 14.0,
        TextStyle::new(16.0, TITLE_COLOR).weight(600).anchor(Anchor::Middle),
        &format_value(total),
    );

    let entries: Vec<(&str, &str)> = data
        .iter()
        .enumerate()
        .map(|(i, d)| (d.label.as_str(), color_at(d, i)))
        .collect();
    legend(out, plot, &entries);
}

fn y_axis(out: &mut String, plot: ChartBox, max: f64) {
    for step in 0..=4 {
        let value = max * f64::from(step) / 4.0;
        let y = value_to_y(value, max, plot);
        svg::line(out, plot.x, y, plot.right(), y, GRID_COLOR, step != 0);
        svg::text(
            out,
            plot.x - 6.0,
            y + 4.0,
            TextStyle::new(10.0, MUTED_COLOR).anchor(Anchor::End),
            &format_value(value),
        );
    }
}

/// Vertical bar chart, one bar per datum.
pub fn bar_chart(out: &mut String, plot: ChartBox, data: &[Datum]) {
    if data.is_empty() {
        no_data(out, plot);
        return;
    }
    let grid = plot.inset(AXIS_GUTTER, 4.0, 0.0, LABEL_GUTTER);
    let max = axis_max(data.iter().map(|d| d.value).fold(0.0, f64::max));
    y_axis(out, grid, max);

    let slots = bar_slots(data.len(), grid);
    let slot_width = grid.width / data.len() as f32;
    for (datum, (x, width)) in data.iter().zip(slots) {
        let top = value_to_y(datum.value, max, grid);
        let color = datum.color.as_deref().unwrap_or(DEFAULT_BAR_COLOR);
        svg::rect(out, x, top, width, grid.bottom() - top, color, None, 2.0);
        let label = svg::truncate_to_width(&datum.label, 10.0, slot_width - 2.0);
        svg::text(
            out,
            x + width / 2.0,
            grid.bottom() + 14.0,
            TextStyle::new(10.0, MUTED_COLOR).anchor(Anchor::Middle),
            &label,
        );
    }
}

/// Horizontal bar chart whose height grows with the number of rows.
/// Size the plot with [`horizontal_plot_height`].
pub fn horizontal_bar_chart(out: &mut String, plot: ChartBox, data: &[Datum]) {
    if data.is_empty() {
        no_data(out, plot);
        return;
    }
    let grid = plot.inset(HBAR_LABEL_GUTTER, 0.0, 40.0, LABEL_GUTTER);
    let max = axis_max(data.iter().map(|d| d.value).fold(0.0, f64::max));
    for step in 0..=4 {
        let value = max * f64::from(step) / 4.0;
        let x = grid.x + grid.width * (value / max) as f32;
        svg::line(out, x, grid.y, x, grid.bottom(), GRID_COLOR, step != 0);
        svg::text(
            out,
            x,
            grid.bottom() + 14.0,
            TextStyle::new(10.0, MUTED_COLOR).anchor(Anchor::Middle),
            &format_value(value),
        );
    }
    for (i, datum) in data.iter().enumerate() {
        let row_y = grid.y + HBAR_ROW * i as f32;
        let width = grid.width * (datum.value.max(0.0) / max) as f32;
        let color = datum.color.as_deref().unwrap_or(DEFAULT_BAR_COLOR);
        let label = svg::truncate_to_width(&datum.label, 11.0, HBAR_LABEL_GUTTER - 10.0);
        svg::text(
            out,
            grid.x - 8.0,
            row_y + HBAR_ROW / 2.0 + 4.0,
            TextStyle::new(11.0, TITLE_COLOR).anchor(Anchor::End),
            &label,
        );
        svg::rect(out, grid.x, row_y + 5.0, width, HBAR_ROW - 10.0, color, None, 2.0);
        svg::text(
            out,
            grid.x + width + 4.0,
            row_y + HBAR_ROW / 2.0 + 4.0,
            TextStyle::new(10.0, MUTED_COLOR),
            &format_value(datum.value),
        );
    }
}

/// Multi-series line chart over shared x labels.
pub fn line_chart(out: &mut String, plot: ChartBox, labels: &[String], series: &[Series]) {
    if labels.is_empty() || series.is_empty() {
        no_data(out, plot);
        return;
    }
    let grid = plot.inset(AXIS_GUTTER, 4.0, 8.0, LABEL_GUTTER + LEGEND_HEIGHT);
    let max = axis_max(
        series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max),
    );
    y_axis(out, grid, max);

    let label_points = line_points(&vec![0.0; labels.len()], max, grid);
    let label_width = grid.width / labels.len() as f32;
    for (label, (x, _)) in labels.iter().zip(&label_points) {
        let text = svg::truncate_to_width(label, 10.0, label_width);
        svg::text(
            out,
            *x,
            grid.bottom() + 14.0,
            TextStyle::new(10.0, MUTED_COLOR).anchor(Anchor::Middle),
            &text,
        );
    }

    for s in series {
        let points = line_points(&s.values, max, grid);
        if points.len() == 1 {
            let (x, y) = points[0];
            let _ = writeln!(out, "<circle cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"3\" fill=\"{}\" />", s.color);
            continue;
        }
        let mut d = String::new();
        for (i, (x, y)) in points.iter().enumerate() {
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{cmd}{x:.2},{y:.2} ");
        }
        let _ = writeln!(
            out,
            "<path d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"2\" stroke-linejoin=\"round\" />",
            d.trim_end(),
            s.color
        );
    }

    let entries: Vec<(&str, &str)> = series
        .iter()
        .map(|s| (s.name.as_str(), s.color.as_str()))
        .collect();
    legend(out, plot, &entries);
}

/// Integer-looking values print without decimals.
pub fn format_value(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{value:.1}")
    }
}
