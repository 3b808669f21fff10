//! # Sentiment Dashboard
//!
//! A client-side dashboard for comment sentiment analytics. Comments are
//! scraped or uploaded to an analysis service; the returned snapshot is kept
//! locally, charted, and exported as an image-based PDF report or as CSV.
//!
//! ## Features
//! - Scrape-and-analyze and CSV upload ingestion
//! - Dashboard, sentiment and topic views of the latest snapshot
//! - Multi-page PDF report rendered off-screen and re-paginated onto A4
//! - CSV exports of comments and category aggregates
//! - A persisted registry of past exports for re-download

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod analysis_store;
pub mod app_state;
pub mod charts;
pub mod config;
pub mod constants;
pub mod csv_export;
pub mod download;
pub mod error;
pub mod export_registry;
pub mod exporter;
pub mod ingest;
pub mod persistence;
pub mod report;
pub mod settings;
pub mod svg;
pub mod types;
mod ui;

pub use config::AppConfig;
pub use types::*;
pub use ui::DashboardApp;

#[cfg(not(target_arch = "wasm32"))]
/// Runs the dashboard with configuration read from the environment.
///
/// Invalid environment values are logged and replaced by defaults.
///
/// # Example
///
/// ```no_run
/// use sentiment_dashboard::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let config = AppConfig::from_env().unwrap_or_else(|e| {
        log::error!("Invalid configuration, using defaults: {e}");
        AppConfig::default()
    });
    log::info!("Analysis service at {}", config.api_base_url);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 860.0])
            .with_min_inner_size([900.0, 600.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Sentiment Dashboard",
        options,
        Box::new(move |cc| Ok(Box::new(DashboardApp::new(cc, config)))),
    )
}
