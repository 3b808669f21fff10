//! Central panel content for each navigation page.

use super::state::{DashboardApp, Page};
use super::widgets;
use crate::charts::{Datum, Series};
use crate::report::derive::{format_date, Percentages};
use crate::report::{ReportContext, ReportData};
use crate::types::{CommentRecord, Sentiment};
use chrono::Utc;
use eframe::egui;

const CHART_HEIGHT: f32 = 240.0;

impl DashboardApp {
    /// Derived figures for the current snapshot, if any.
    pub fn report_data(&self) -> Option<ReportData> {
        let snapshot = self.state.analysis.snapshot()?;
        let context = ReportContext { page_id: self.state.analysis.page_id().to_string(), now: Utc::now() };
        Some(ReportData::derive(snapshot, self.state.analysis.comments(), &context))
    }

    /// Draws the central panel for the selected page.
    pub fn draw_page(&mut self, ui: &mut egui::Ui) {
        egui::ScrollArea::vertical().auto_shrink([false; 2]).show(ui, |ui| {
            ui.heading(self.prefs.page.title());
            ui.separator();
            match self.prefs.page {
                Page::Dashboard => self.draw_dashboard(ui),
                Page::Sentiment => self.draw_sentiment(ui),
                Page::Topics => self.draw_topics(ui),
                Page::Reports => self.draw_reports(ui),
                Page::Settings => self.draw_settings(ui),
            }
        });
    }

    fn draw_ingest_form(&mut self, ui: &mut egui::Ui) {
        egui::CollapsingHeader::new("Analyze comments")
            .default_open(!self.state.analysis.has_data())
            .show(ui, |ui| {
                egui::Grid::new("ingest_form").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
                    ui.label("Graph API key");
                    ui.add(egui::TextEdit::singleline(&mut self.form.graph_api_key).password(true));
                    ui.end_row();
                    ui.label("Page");
                    ui.text_edit_singleline(&mut self.form.page);
                    ui.end_row();
                    ui.label("Max posts");
                    ui.add(egui::TextEdit::singleline(&mut self.form.max_posts).hint_text("optional"));
                    ui.end_row();
                    ui.label("Max comments");
                    ui.add(egui::TextEdit::singleline(&mut self.form.max_comments).hint_text("optional"));
                    ui.end_row();
                    ui.label("Since");
                    ui.add(egui::TextEdit::singleline(&mut self.form.since).hint_text("YYYY-MM-DD"));
                    ui.end_row();
                    ui.label("Until");
                    ui.add(egui::TextEdit::singleline(&mut self.form.until).hint_text("YYYY-MM-DD"));
                    ui.end_row();
                });

                ui.horizontal(|ui| {
                    let idle = !self.ingest_in_flight;
                    if ui.add_enabled(idle, egui::Button::new("Scrape & analyze")).clicked() {
                        self.start_scrape(ui.ctx());
                    }
                    if ui.add_enabled(idle, egui::Button::new("Upload CSV…")).clicked() {
                        self.start_csv_upload(ui.ctx());
                    }
                    if self.ingest_in_flight {
                        ui.spinner();
                        ui.label("Analyzing…");
                    }
                });
            });
    }

    fn draw_no_data(ui: &mut egui::Ui) {
        ui.add_space(24.0);
        ui.label("No analysis yet. Scrape a page or upload a CSV from the dashboard.");
    }

    fn draw_dashboard(&mut self, ui: &mut egui::Ui) {
        self.draw_ingest_form(ui);
        ui.add_space(8.0);
        let Some(data) = self.report_data() else {
            Self::draw_no_data(ui);
            return;
        };

        ui.horizontal_wrapped(|ui| {
            widgets::stat_card(ui, "Total comments", &data.total.to_string(), &format!("Source: {}", data.page_id));
            for sentiment in Sentiment::ALL {
                widgets::stat_card(
                    ui,
                    sentiment.label(),
                    &format!("{}%", data.percentages.get(sentiment)),
                    &format!("{} comments", data.count(sentiment)),
                );
            }
        });
        ui.label(format!(
            "Most prevalent: {}   Top topics: {}   Range: {} to {}",
            data.most_prevalent.label(),
            data.top_topics_text(),
            data.range_start,
            data.range_end
        ));

        ui.add_space(8.0);
        ui.strong("Sentiment distribution");
        widgets::pie_chart(ui, &sentiment_data(&data), CHART_HEIGHT);

        ui.add_space(8.0);
        ui.strong("Recent comments");
        draw_comment_list(ui, &data.recent_comments);
    }

    fn draw_sentiment(&mut self, ui: &mut egui::Ui) {
        let Some(data) = self.report_data() else {
            Self::draw_no_data(ui);
            return;
        };
        ui.strong("Sentiment breakdown");
        widgets::bar_chart(ui, &sentiment_data(&data), CHART_HEIGHT);
        ui.add_space(8.0);
        ui.strong("Sentiment over time");
        let labels: Vec<String> = data.timeline.iter().map(|b| b.label.clone()).collect();
        let series: Vec<Series> = Sentiment::ALL
            .iter()
            .map(|s| Series {
                name: s.label().to_string(),
                color: s.color().to_string(),
                values: data.timeline.iter().map(|b| b.count(*s) as f64).collect(),
            })
            .collect();
        widgets::line_chart(ui, &labels, &series, CHART_HEIGHT);
    }

    fn draw_topics(&mut self, ui: &mut egui::Ui) {
        let Some(data) = self.report_data() else {
            Self::draw_no_data(ui);
            return;
        };
        if data.categories.is_empty() {
            ui.label("No topics data available.");
            return;
        }
        ui.strong("Topic distribution");
        let topics: Vec<Datum> = data
            .trending
            .iter()
            .map(|(topic, count)| Datum::new(topic.clone(), *count as f64))
            .collect();
        widgets::bar_chart(ui, &topics, CHART_HEIGHT);

        ui.add_space(8.0);
        egui::Grid::new("topic_table").striped(true).num_columns(5).show(ui, |ui| {
            for header in ["Topic", "Comments", "Positive", "Neutral", "Negative"] {
                ui.strong(header);
            }
            ui.end_row();
            for stat in &data.categories {
                let pct = Percentages::of_category(stat);
                ui.label(&stat.category);
                ui.label(stat.total_comments.to_string());
                for sentiment in Sentiment::ALL {
                    ui.label(format!("{}%", pct.get(sentiment)));
                }
                ui.end_row();
            }
        });
    }

    fn draw_reports(&mut self, ui: &mut egui::Ui) {
        let has_data = self.state.analysis.has_data();
        ui.horizontal(|ui| {
            let idle = has_data && !self.export_in_flight;
            if ui.add_enabled(idle, egui::Button::new("Generate PDF report")).clicked() {
                self.start_report_export(ui.ctx());
            }
            if ui.add_enabled(idle, egui::Button::new("Export comments CSV")).clicked() {
                self.export_comments_csv();
            }
            if ui.add_enabled(idle, egui::Button::new("Export categories CSV")).clicked() {
                self.export_categories_csv();
            }
            if self.export_in_flight {
                ui.spinner();
                ui.label("Generating…");
            }
        });
        ui.separator();

        if self.state.exports.is_empty() {
            ui.label("No exports yet.");
            return;
        }

        let mut download = None;
        let mut delete = None;
        egui::Grid::new("exports_table").striped(true).num_columns(5).show(ui, |ui| {
            for header in ["Name", "File", "Size", "Created", ""] {
                ui.strong(header);
            }
            ui.end_row();
            for record in self.state.exports.exports() {
                ui.label(&record.name);
                ui.label(&record.filename);
                ui.label(format_size(record.size_bytes));
                ui.label(format_date(record.created_at));
                ui.horizontal(|ui| {
                    if ui.small_button("Download").clicked() {
                        download = Some(record.id);
                    }
                    if ui.small_button("Delete").clicked() {
                        delete = Some(record.id);
                    }
                });
                ui.end_row();
            }
        });
        if let Some(id) = download {
            self.redownload(id);
        }
        if let Some(id) = delete {
            if let Err(e) = self.state.remove_export(id) {
                self.notify_error(format!("Failed to delete export: {e}"));
            }
        }

        ui.add_space(8.0);
        if self.confirm_clear_exports {
            ui.horizontal(|ui| {
                ui.label("Delete every export?");
                if ui.button("Yes, clear all").clicked() {
                    self.confirm_clear_exports = false;
                    match self.state.clear_exports() {
                        Ok(()) => self.notify("Exports cleared"),
                        Err(e) => self.notify_error(format!("Failed to clear exports: {e}")),
                    }
                }
                if ui.button("Cancel").clicked() {
                    self.confirm_clear_exports = false;
                }
            });
        } else if ui.button("Clear all").clicked() {
            self.confirm_clear_exports = true;
        }
    }

    fn draw_settings(&mut self, ui: &mut egui::Ui) {
        egui::Grid::new("settings_form").num_columns(2).spacing([12.0, 6.0]).show(ui, |ui| {
            ui.label("Graph API key");
            ui.add(egui::TextEdit::singleline(&mut self.settings_draft.graph_api_key).password(true));
            ui.end_row();
            ui.label("Default page");
            ui.text_edit_singleline(&mut self.settings_draft.page);
            ui.end_row();
        });
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                match self.state.save_settings(self.settings_draft.clone()) {
                    Ok(()) => {
                        self.form.graph_api_key = self.settings_draft.graph_api_key.clone();
                        self.form.page = self.settings_draft.page.clone();
                        self.notify("Settings saved");
                    }
                    Err(e) => self.notify_error(format!("Failed to save settings: {e}")),
                }
            }
            if ui.button("Reset").clicked() {
                match self.state.reset_settings() {
                    Ok(()) => {
                        self.settings_draft = self.state.settings.settings().clone();
                        self.notify("Settings reset");
                    }
                    Err(e) => self.notify_error(format!("Failed to reset settings: {e}")),
                }
            }
        });

        ui.separator();
        ui.label(format!("Analysis service: {}", self.state.config.api_base_url));
        if let Some(dir) = &self.state.config.data_dir {
            ui.label(format!("Data directory: {}", dir.display()));
        }
        if ui
            .add_enabled(self.state.analysis.has_data(), egui::Button::new("Clear analysis data"))
            .clicked()
        {
            match self.state.reset_analysis() {
                Ok(()) => self.notify("Analysis data cleared"),
                Err(e) => self.notify_error(format!("Failed to clear analysis: {e}")),
            }
        }
    }
}

fn sentiment_data(data: &ReportData) -> Vec<Datum> {
    Sentiment::ALL
        .iter()
        .map(|s| Datum::new(s.label(), data.count(*s) as f64).with_color(s.color()))
        .collect()
}

fn draw_comment_list(ui: &mut egui::Ui, comments: &[CommentRecord]) {
    if comments.is_empty() {
        ui.label("No comments.");
        return;
    }
    for comment in comments {
        ui.horizontal_wrapped(|ui| {
            let color = comment
                .sentiment_kind()
                .map_or(ui.visuals().weak_text_color(), |s| widgets::parse_color(s.color()));
            ui.colored_label(color, comment.sentiment.to_uppercase());
            ui.label(egui::RichText::new(&comment.category).weak());
            ui.label(&comment.text);
        });
    }
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b < KB {
        format!("{bytes} B")
    } else if b < KB * KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{:.1} MB", b / (KB * KB))
    }
}
