//! Dashboard widgets drawn with the egui painter.
//!
//! Chart geometry comes from [`crate::charts`], the same functions that lay
//! out the report's SVG charts, so the dashboard and the PDF agree.

use crate::charts::{self, ChartBox, Datum, Series};
use crate::report::PrintTheme;
use eframe::egui::{self, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Vec2};

/// Parses a palette colour (`#rrggbb` or a `var(--token)`).
pub fn parse_color(value: &str) -> Color32 {
    let theme = PrintTheme::default();
    let resolved = value
        .strip_prefix("var(")
        .and_then(|rest| rest.strip_suffix(')'))
        .and_then(|token| theme.get(token.trim()))
        .unwrap_or(value);
    Color32::from_hex(resolved).unwrap_or(Color32::GRAY)
}

fn to_box(rect: Rect) -> ChartBox {
    ChartBox::new(rect.min.x, rect.min.y, rect.width(), rect.height())
}

fn datum_color(datum: &Datum, index: usize) -> Color32 {
    match &datum.color {
        Some(color) => parse_color(color),
        None => parse_color(charts::PIE_PALETTE[index % charts::PIE_PALETTE.len()]),
    }
}

/// A framed card with a title, a headline value and a caption.
pub fn stat_card(ui: &mut egui::Ui, title: &str, value: &str, caption: &str) {
    egui::Frame::group(ui.style()).inner_margin(12.0).show(ui, |ui| {
        ui.set_min_width(160.0);
        ui.vertical(|ui| {
            ui.label(egui::RichText::new(title).small().weak());
            ui.label(egui::RichText::new(value).heading().strong());
            ui.label(egui::RichText::new(caption).small());
        });
    });
}

fn empty_placeholder(ui: &egui::Ui, rect: Rect) {
    ui.painter().text(
        rect.center(),
        Align2::CENTER_CENTER,
        "No data",
        FontId::proportional(14.0),
        ui.visuals().weak_text_color(),
    );
}

/// Donut chart with a legend underneath.
pub fn pie_chart(ui: &mut egui::Ui, data: &[Datum], size: f32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::splat(size), Sense::hover());
    let values: Vec<f64> = data.iter().map(|d| d.value).collect();
    let arcs = charts::pie_arcs(&values);
    if arcs.is_empty() {
        empty_placeholder(ui, rect);
        return;
    }

    let painter = ui.painter_at(rect);
    let center = rect.center();
    let outer = size / 2.0 - 4.0;
    let inner = outer * 0.62;
    for (i, arc) in arcs.iter().enumerate() {
        if arc.sweep() <= 0.0 {
            continue;
        }
        let steps = ((arc.sweep() / std::f32::consts::TAU) * 96.0).ceil().max(2.0) as usize;
        let point = |angle: f32, radius: f32| {
            // Angles run clockwise from 12 o'clock.
            Pos2::new(center.x + radius * angle.sin(), center.y - radius * angle.cos())
        };
        let color = datum_color(&data[i], i);
        for s in 0..steps {
            let a0 = arc.start + arc.sweep() * s as f32 / steps as f32;
            let a1 = arc.start + arc.sweep() * (s + 1) as f32 / steps as f32;
            painter.add(Shape::convex_polygon(
                vec![point(a0, outer), point(a1, outer), point(a1, inner), point(a0, inner)],
                color,
                Stroke::NONE,
            ));
        }
    }

    ui.horizontal_wrapped(|ui| {
        for (i, datum) in data.iter().enumerate() {
            let (swatch, _) = ui.allocate_exact_size(Vec2::splat(10.0), Sense::hover());
            ui.painter().rect_filled(swatch, 2.0, datum_color(datum, i));
            ui.label(format!("{} ({})", datum.label, charts::format_value(datum.value)));
        }
    });
}

fn draw_grid(ui: &egui::Ui, plot: ChartBox, max: f64) {
    let painter = ui.painter();
    let stroke = Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color);
    for step in 0..=4 {
        let value = max * f64::from(step) / 4.0;
        let y = charts::value_to_y(value, max, plot);
        painter.line_segment([Pos2::new(plot.x, y), Pos2::new(plot.right(), y)], stroke);
        painter.text(
            Pos2::new(plot.x - 4.0, y),
            Align2::RIGHT_CENTER,
            charts::format_value(value),
            FontId::proportional(10.0),
            ui.visuals().weak_text_color(),
        );
    }
}

/// Vertical bar chart.
pub fn bar_chart(ui: &mut egui::Ui, data: &[Datum], height: f32) {
    let (rect, response) = ui.allocate_exact_size(Vec2::new(ui.available_width(), height), Sense::hover());
    if data.is_empty() {
        empty_placeholder(ui, rect);
        return;
    }
    let plot = to_box(rect).inset(36.0, 8.0, 8.0, 22.0);
    let max = charts::axis_max(data.iter().map(|d| d.value).fold(0.0, f64::max));
    draw_grid(ui, plot, max);

    let painter = ui.painter();
    let mut hovered = None;
    for (i, ((x, width), datum)) in charts::bar_slots(data.len(), plot).into_iter().zip(data).enumerate() {
        let top = charts::value_to_y(datum.value, max, plot);
        let bar = Rect::from_min_max(Pos2::new(x, top), Pos2::new(x + width, plot.bottom()));
        let color = datum.color.as_deref().map_or(parse_color(charts::DEFAULT_BAR_COLOR), parse_color);
        painter.rect_filled(bar, 3.0, color);
        painter.text(
            Pos2::new(x + width / 2.0, plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            &datum.label,
            FontId::proportional(10.0),
            ui.visuals().text_color(),
        );
        if response.hover_pos().is_some_and(|p| p.x >= x && p.x <= x + width) {
            hovered = Some(i);
        }
    }
    if let Some(i) = hovered {
        response.on_hover_text(format!("{}: {}", data[i].label, charts::format_value(data[i].value)));
    }
}

/// Line chart with one polyline per series.
pub fn line_chart(ui: &mut egui::Ui, labels: &[String], series: &[Series], height: f32) {
    let (rect, _) = ui.allocate_exact_size(Vec2::new(ui.available_width(), height), Sense::hover());
    if labels.is_empty() {
        empty_placeholder(ui, rect);
        return;
    }
    let plot = to_box(rect).inset(36.0, 8.0, 8.0, 22.0);
    let max = charts::axis_max(
        series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max),
    );
    draw_grid(ui, plot, max);

    let painter = ui.painter();
    for s in series {
        let color = parse_color(&s.color);
        let points: Vec<Pos2> = charts::line_points(&s.values, max, plot)
            .into_iter()
            .map(|(x, y)| Pos2::new(x, y))
            .collect();
        for p in &points {
            painter.circle_filled(*p, 3.0, color);
        }
        painter.add(Shape::line(points, Stroke::new(2.0, color)));
    }
    let ticks = charts::line_points(&vec![0.0; labels.len()], max, plot);
    for ((x, _), label) in ticks.into_iter().zip(labels) {
        painter.text(
            Pos2::new(x, plot.bottom() + 4.0),
            Align2::CENTER_TOP,
            label,
            FontId::proportional(10.0),
            ui.visuals().text_color(),
        );
    }
}
