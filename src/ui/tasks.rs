//! Background ingestion and export tasks.
//!
//! Work runs off the UI thread (a tokio task on native, `spawn_local` in the
//! browser) and reports back through the app's task channel; the stores are
//! only touched from [`DashboardApp::handle_task_results`] on the UI thread.

use super::state::{DashboardApp, TaskResult};
use crate::error::IngestError;
use crate::export_registry::decode_payload;
use crate::exporter::{self, GeneratedExport};
use crate::ingest::{IngestClient, ScrapeRequest};
use crate::types::{ExportId, Settings};
use chrono::{NaiveDate, Utc};
use eframe::egui;
use std::future::Future;

#[cfg(not(target_arch = "wasm32"))]
fn spawn<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(future);
}

#[cfg(target_arch = "wasm32")]
fn spawn<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

fn optional_number(raw: &str, field: &str) -> Result<Option<u32>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<u32>()
        .map(Some)
        .map_err(|_| format!("{field} must be a whole number"))
}

fn optional_date(raw: &str, field: &str) -> Result<Option<String>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map(|d| Some(d.format("%Y-%m-%d").to_string()))
        .map_err(|_| format!("{field} must be a date like 2024-01-31"))
}

impl DashboardApp {
    /// Validates the form into a request.
    pub fn scrape_request(&self) -> Result<ScrapeRequest, String> {
        let graph_api_key = self.form.graph_api_key.trim().to_string();
        let page = self.form.page.trim().to_string();
        if graph_api_key.is_empty() || page.is_empty() {
            return Err("An API key and a page are required".to_string());
        }
        Ok(ScrapeRequest {
            graph_api_key,
            page,
            max_posts: optional_number(&self.form.max_posts, "Max posts")?,
            max_comments: optional_number(&self.form.max_comments, "Max comments")?,
            since: optional_date(&self.form.since, "Since")?,
            until: optional_date(&self.form.until, "Until")?,
        })
    }

    fn ingest_client(&mut self) -> Option<IngestClient> {
        match IngestClient::new(&self.state.config) {
            Ok(client) => Some(client),
            Err(e) => {
                self.notify_error(format!("Cannot reach the analysis service: {e}"));
                None
            }
        }
    }

    /// Submits the scrape form. The credentials are remembered for next time.
    pub fn start_scrape(&mut self, ctx: &egui::Context) {
        if self.ingest_in_flight {
            return;
        }
        let request = match self.scrape_request() {
            Ok(request) => request,
            Err(message) => {
                self.notify_error(message);
                return;
            }
        };
        let remembered = Settings { graph_api_key: request.graph_api_key.clone(), page: request.page.clone() };
        if let Err(e) = self.state.save_settings(remembered.clone()) {
            log::warn!("Failed to remember settings: {e}");
        }
        self.settings_draft = remembered;

        let Some(client) = self.ingest_client() else { return };
        self.ingest_in_flight = true;
        let sender = self.task_sender.clone();
        let ctx = ctx.clone();
        spawn(async move {
            let result = client.scrape_analyze(&request).await;
            let _ = sender.send(TaskResult::Analysis(result));
            ctx.request_repaint();
        });
    }

    /// Picks a CSV file and uploads it for analysis.
    pub fn start_csv_upload(&mut self, ctx: &egui::Context) {
        if self.ingest_in_flight {
            return;
        }
        let Some(client) = self.ingest_client() else { return };
        self.ingest_in_flight = true;
        let batch_size = self.state.config.csv_batch_size;
        let sender = self.task_sender.clone();
        let ctx = ctx.clone();
        spawn(async move {
            let picked = rfd::AsyncFileDialog::new()
                .add_filter("CSV", &["csv"])
                .pick_file()
                .await;
            let message = match picked {
                Some(handle) => {
                    let name = handle.file_name();
                    let bytes = handle.read().await;
                    TaskResult::Analysis(client.analyze_csv(&name, bytes, batch_size).await)
                }
                None => TaskResult::Cancelled,
            };
            let _ = sender.send(message);
            ctx.request_repaint();
        });
    }

    /// Renders the PDF report in the background.
    pub fn start_report_export(&mut self, ctx: &egui::Context) {
        if self.export_in_flight {
            return;
        }
        if !self.state.analysis.has_data() {
            self.notify_error("Nothing to export yet: run an analysis first");
            return;
        }
        self.export_in_flight = true;
        let state = self.state.analysis.state().clone();
        let sender = self.task_sender.clone();
        let ctx = ctx.clone();

        #[cfg(not(target_arch = "wasm32"))]
        tokio::task::spawn_blocking(move || {
            let result = futures::executor::block_on(exporter::generate_report_export(
                &state,
                Utc::now(),
                crate::report::engine::platform_delay,
            ));
            let _ = sender.send(TaskResult::Report(result));
            ctx.request_repaint();
        });

        #[cfg(target_arch = "wasm32")]
        spawn(async move {
            let result =
                exporter::generate_report_export(&state, Utc::now(), crate::report::engine::platform_delay).await;
            let _ = sender.send(TaskResult::Report(result));
            ctx.request_repaint();
        });
    }

    /// Exports the comment rows as CSV.
    pub fn export_comments_csv(&mut self) {
        let export = exporter::comments_csv_export(self.state.analysis.state(), Utc::now());
        self.finish_export(export);
    }

    /// Exports the category aggregates as CSV.
    pub fn export_categories_csv(&mut self) {
        let export = exporter::categories_csv_export(self.state.analysis.state(), Utc::now());
        self.finish_export(export);
    }

    /// Registers a finished export and offers it for download. The download
    /// is offered even when the record could not be stored.
    fn finish_export(&mut self, export: GeneratedExport) {
        let GeneratedExport { record, bytes } = export;
        let filename = record.filename.clone();
        let mime = record.mime.clone();
        if let Err(e) = self.state.register_export(record) {
            self.notify_error(format!("Export not saved to history: {e}"));
        }
        match crate::download::offer(&filename, &mime, bytes) {
            Ok(()) => self.notify(format!("Exported {filename}")),
            Err(e) => self.notify_error(format!("Download failed: {e}")),
        }
    }

    /// Offers a registered export for download again.
    pub fn redownload(&mut self, id: ExportId) {
        let Some(record) = self.state.exports.get(id) else { return };
        let (filename, mime) = (record.filename.clone(), record.mime.clone());
        let result = decode_payload(record)
            .map_err(|e| e.to_string())
            .and_then(|bytes| crate::download::offer(&filename, &mime, bytes));
        if let Err(e) = result {
            self.notify_error(format!("Download failed: {e}"));
        }
    }

    /// Applies finished background work. Called once per frame.
    pub fn handle_task_results(&mut self) {
        while let Ok(result) = self.task_receiver.try_recv() {
            match result {
                TaskResult::Analysis(Ok(response)) => {
                    self.ingest_in_flight = false;
                    let count = response.comments_analyzed.len();
                    match self.state.apply_analysis(response) {
                        Ok(()) => self.notify(format!("Analyzed {count} comments")),
                        Err(e) => self.notify_error(format!("Analysis received but not saved: {e}")),
                    }
                }
                TaskResult::Analysis(Err(e)) => {
                    self.ingest_in_flight = false;
                    let message = match e {
                        IngestError::Rejected(text) => text,
                        other => other.to_string(),
                    };
                    self.notify_error(format!("Analysis failed: {message}"));
                }
                TaskResult::Report(Ok(export)) => {
                    self.export_in_flight = false;
                    self.finish_export(export);
                }
                TaskResult::Report(Err(e)) => {
                    self.export_in_flight = false;
                    self.notify_error(format!("Failed to generate PDF: {e}"));
                }
                TaskResult::Cancelled => {
                    self.ingest_in_flight = false;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_parse_or_report_the_field() {
        assert_eq!(optional_number(" ", "Max posts"), Ok(None));
        assert_eq!(optional_number("25", "Max posts"), Ok(Some(25)));
        assert_eq!(optional_number("-1", "Max posts"), Err("Max posts must be a whole number".to_string()));
        assert_eq!(optional_date("2024-01-31", "Since"), Ok(Some("2024-01-31".to_string())));
        assert!(optional_date("31/01/2024", "Since").is_err());
    }
}
