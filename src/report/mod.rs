//! PDF report generation.
//!
//! [`layout`] turns the analytics snapshot into fixed-width logical pages,
//! [`engine`] mounts them on a [`RenderTarget`], captures them and
//! re-paginates the bitmaps onto A4 pages assembled by [`pdf`].

pub mod derive;
pub mod engine;
pub mod layout;
pub mod pdf;
pub mod raster;
pub mod theme;

pub use derive::{Percentages, ReportContext, ReportData};
pub use engine::{generate_pdf, plan_placement, PaginationConfig, RenderedDocument};
pub use layout::{build_report, LogicalPage, PageKind};
pub use raster::{Bitmap, RenderTarget, ResvgTarget};
pub use theme::PrintTheme;
