//! User interface for the sentiment dashboard.
//!
//! # Module Organization
//!
//! - `state` - The `DashboardApp` struct, form state and task messages
//! - `tasks` - Background ingestion and export work
//! - `pages` - Central panel content per navigation page
//! - `widgets` - Stat cards and painter-drawn charts

mod pages;
mod state;
mod tasks;
mod widgets;


pub use state::DashboardApp;
use state::Page;

use eframe::egui;

impl eframe::App for DashboardApp {
    /// Persist UI preferences between restarts. Store data is written
    /// through on every mutation.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        eframe::set_value(storage, eframe::APP_KEY, &self.prefs);
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.prefs.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_task_results();

        egui::TopBottomPanel::top("toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::SidePanel::left("navigation")
            .resizable(false)
            .default_width(160.0)
            .show(ctx, |ui| {
                self.draw_navigation(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_toasts(ui);
            self.draw_page(ui);
        });
    }
}

impl DashboardApp {
    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.strong("Sentiment Dashboard");
            ui.separator();
            let source = self.state.analysis.page_id();
            if self.state.analysis.has_data() {
                ui.label(format!("Source: {}", if source.is_empty() { "unknown" } else { source }));
            } else {
                ui.weak("No analysis loaded");
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let label = if self.prefs.dark_mode { "☀ Light" } else { "🌙 Dark" };
                if ui.button(label).clicked() {
                    self.prefs.dark_mode = !self.prefs.dark_mode;
                }
                if self.export_in_flight || self.ingest_in_flight {
                    ui.spinner();
                }
            });
        });
    }

    fn draw_navigation(&mut self, ui: &mut egui::Ui) {
        ui.add_space(8.0);
        for page in Page::ALL {
            let selected = self.prefs.page == page;
            if ui.selectable_label(selected, page.title()).clicked() {
                self.prefs.page = page;
            }
        }
        ui.with_layout(egui::Layout::bottom_up(egui::Align::Min), |ui| {
            ui.weak(format!("{} exports", self.state.exports.len()));
        });
    }

    fn draw_toasts(&mut self, ui: &mut egui::Ui) {
        let mut dismiss = None;
        for (i, toast) in self.toasts.iter().enumerate() {
            let color = if toast.is_error {
                ui.visuals().error_fg_color
            } else {
                ui.visuals().text_color()
            };
            ui.horizontal(|ui| {
                ui.colored_label(color, &toast.message);
                if ui.small_button("✕").clicked() {
                    dismiss = Some(i);
                }
            });
        }
        if let Some(i) = dismiss {
            self.toasts.remove(i);
        }
        if !self.toasts.is_empty() {
            ui.separator();
        }
    }
}
