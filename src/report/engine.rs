//! Off-screen rendering and pagination engine.
//!
//! Mounts the logical pages on a [`RenderTarget`], waits (bounded) for them
//! to paint, captures each page as a bitmap and re-paginates it onto fixed
//! A4 output pages. Bitmaps taller than one output page are cut into
//! contiguous horizontal bands. The target is always unmounted again, on
//! success and on every error path.

use super::layout::LogicalPage;
use super::pdf::PdfAssembler;
use super::raster::RenderTarget;
use super::theme::PrintTheme;
use crate::constants::{A4_HEIGHT_PT, A4_WIDTH_PT, PAGE_ZOOM, RASTER_SCALE, SETTLE_DELAYS};
use crate::error::ExportError;
use futures::future::{self, Either, FutureExt};
use std::future::Future;
use std::time::Duration;

/// Output geometry and timing of the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PaginationConfig {
    /// Output page width in points
    pub page_width_pt: f32,
    /// Output page height in points
    pub page_height_pt: f32,
    /// Share of the page width a placed bitmap occupies, centred
    pub zoom: f32,
    /// Device pixels per CSS pixel when rasterizing
    pub raster_scale: f32,
    /// Bounded waits raced against the target's paint signal, in order
    pub settle_delays: Vec<Duration>,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_width_pt: A4_WIDTH_PT,
            page_height_pt: A4_HEIGHT_PT,
            zoom: PAGE_ZOOM,
            raster_scale: RASTER_SCALE,
            settle_delays: SETTLE_DELAYS.to_vec(),
        }
    }
}

/// A horizontal strip of a captured bitmap placed on one output page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    /// First source row
    pub src_y: u32,
    /// Number of source rows
    pub src_height: u32,
    /// Height on the output page
    pub height_pt: f32,
}

/// Where and how a captured bitmap lands on output pages.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    /// Left offset on the output page
    pub x_pt: f32,
    /// Placed width on the output page
    pub width_pt: f32,
    /// Points per source pixel
    pub scale: f32,
    /// One band per output page, top to bottom
    pub bands: Vec<Band>,
}

/// Fits a bitmap to the zoomed page width and slices it into page-high
/// bands when it does not fit vertically.
pub fn plan_placement(bitmap_width: u32, bitmap_height: u32, config: &PaginationConfig) -> Placement {
    let width_pt = config.page_width_pt * config.zoom;
    let x_pt = (config.page_width_pt - width_pt) / 2.0;
    let scale = width_pt / bitmap_width.max(1) as f32;
    let total_height_pt = bitmap_height as f32 * scale;

    let bands = if total_height_pt <= config.page_height_pt {
        vec![Band { src_y: 0, src_height: bitmap_height, height_pt: total_height_pt }]
    } else {
        let slice = ((config.page_height_pt / scale).floor() as u32).max(1);
        let mut bands = Vec::new();
        let mut src_y = 0;
        while src_y < bitmap_height {
            let src_height = slice.min(bitmap_height - src_y);
            bands.push(Band { src_y, src_height, height_pt: src_height as f32 * scale });
            src_y += src_height;
        }
        bands
    };

    Placement { x_pt, width_pt, scale, bands }
}

/// Outcome of a successful export.
#[derive(Debug, Clone)]
pub struct RenderedDocument {
    /// Serialized PDF
    pub bytes: Vec<u8>,
    /// Pages in the PDF
    pub output_pages: usize,
    /// Logical pages that were captured
    pub logical_pages: usize,
}

/// Unmounts the target when dropped.
struct MountGuard<'a, T: RenderTarget + ?Sized> {
    target: &'a mut T,
}

impl<T: RenderTarget + ?Sized> Drop for MountGuard<'_, T> {
    fn drop(&mut self) {
        self.target.unmount();
        log::debug!("Report container unmounted");
    }
}

/// Waits for each delay in turn unless the target reports it has painted.
async fn settle<T, D, F>(target: &T, delays: &[Duration], delay: &D)
where
    T: RenderTarget + ?Sized,
    D: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    for wait in delays {
        let painted = target.painted();
        let timer = Box::pin(delay(*wait));
        if let Either::Left(_) = future::select(painted, timer).await {
            log::debug!("Report pages painted before the {wait:?} settle delay elapsed");
            return;
        }
    }
}

/// Captures `pages` through `target` and assembles the PDF.
///
/// `delay` provides the settle timers so callers choose the runtime (tokio
/// on native, `setTimeout` on the web, an immediate future in tests).
///
/// # Errors
///
/// [`ExportError::NoPagesMounted`] when nothing could be mounted; any
/// mount, capture or assembly failure is returned unchanged. There is no
/// retry.
pub async fn generate_pdf<T, D, F>(
    target: &mut T,
    pages: &[LogicalPage],
    theme: &PrintTheme,
    config: &PaginationConfig,
    delay: D,
) -> Result<RenderedDocument, ExportError>
where
    T: RenderTarget + ?Sized,
    D: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let guard = MountGuard { target };
    let mounted = guard.target.mount(pages, theme)?;
    if mounted == 0 {
        return Err(ExportError::NoPagesMounted);
    }
    log::info!("Rendering {mounted} report pages");

    settle(&*guard.target, &config.settle_delays, &delay).await;

    let mut pdf = PdfAssembler::new(config.page_width_pt, config.page_height_pt);
    for index in 0..mounted {
        let bitmap = guard.target.rasterize(index, config.raster_scale)?;
        let placement = plan_placement(bitmap.width, bitmap.height, config);
        if placement.bands.len() > 1 {
            log::debug!(
                "Page {index} ({}x{} px) sliced into {} output pages",
                bitmap.width,
                bitmap.height,
                placement.bands.len()
            );
        }
        for band in &placement.bands {
            let strip = bitmap.crop_rows(band.src_y, band.src_height);
            pdf.add_image_page(&strip, placement.x_pt, placement.width_pt, band.height_pt)?;
        }
    }

    let output_pages = pdf.page_count();
    let bytes = pdf.finish()?;
    log::info!("Report assembled: {output_pages} pages, {} bytes", bytes.len());
    Ok(RenderedDocument { bytes, output_pages, logical_pages: mounted })
}

/// Convenience for callers that do not wait at all.
pub fn no_delay(_: Duration) -> future::Ready<()> {
    future::ready(())
}

/// A timer future for the current platform.
pub fn platform_delay(duration: Duration) -> future::LocalBoxFuture<'static, ()> {
    #[cfg(not(target_arch = "wasm32"))]
    {
        tokio::time::sleep(duration).boxed_local()
    }

    #[cfg(target_arch = "wasm32")]
    {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
                    &resolve,
                    duration.as_millis() as i32,
                );
            }
        });
        wasm_bindgen_futures::JsFuture::from(promise)
            .map(|_| ())
            .boxed_local()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::layout::PageKind;
    use crate::report::raster::Bitmap;
    use futures::executor::block_on;
    use futures::future::LocalBoxFuture;
    use std::cell::Cell;

    /// Target that "renders" each page as a white bitmap of a preset height.
    #[derive(Default)]
    struct FakeTarget {
        heights: Vec<u32>,
        mount_limit: Option<usize>,
        fail_at: Option<usize>,
        painted_now: bool,
        mounted: usize,
        unmounts: usize,
        captured: Vec<usize>,
    }

    impl RenderTarget for FakeTarget {
        fn mount(&mut self, pages: &[LogicalPage], _: &PrintTheme) -> Result<usize, ExportError> {
            self.mounted = self.mount_limit.unwrap_or(pages.len()).min(pages.len());
            Ok(self.mounted)
        }

        fn painted(&self) -> LocalBoxFuture<'static, ()> {
            if self.painted_now {
                future::ready(()).boxed_local()
            } else {
                future::pending().boxed_local()
            }
        }

        fn rasterize(&mut self, index: usize, scale: f32) -> Result<Bitmap, ExportError> {
            if self.fail_at == Some(index) {
                return Err(ExportError::BitmapAllocation { width: 0, height: 0 });
            }
            self.captured.push(index);
            let width = (900.0 * scale) as u32;
            Ok(Bitmap::white(width, self.heights[index]))
        }

        fn unmount(&mut self) {
            self.mounted = 0;
            self.unmounts += 1;
        }
    }

    fn pages(n: usize) -> Vec<LogicalPage> {
        (0..n)
            .map(|_| LogicalPage {
                kind: PageKind::Cover,
                break_before: false,
                width: 900.0,
                height: 100.0,
                svg: String::new(),
            })
            .collect()
    }

    fn config() -> PaginationConfig {
        PaginationConfig::default()
    }

    #[test]
    fn short_bitmap_fits_on_one_page() {
        let placement = plan_placement(1800, 1000, &config());
        assert_eq!(placement.bands.len(), 1);
        assert!((placement.width_pt - 595.28 * 0.92).abs() < 1e-3);
        assert!((placement.x_pt * 2.0 + placement.width_pt - 595.28).abs() < 1e-3);
        assert_eq!(placement.bands[0].src_height, 1000);
    }

    #[test]
    fn tall_bitmap_is_sliced_into_contiguous_bands() {
        let cfg = config();
        let height = 7000;
        let placement = plan_placement(1800, height, &cfg);
        let slice = (cfg.page_height_pt / placement.scale).floor() as u32;

        assert_eq!(placement.bands.len() as u32, height.div_ceil(slice));
        let mut expected_y = 0;
        for band in &placement.bands {
            assert_eq!(band.src_y, expected_y);
            assert!(band.height_pt <= cfg.page_height_pt + 1e-3);
            expected_y += band.src_height;
        }
        assert_eq!(expected_y, height);
        assert_eq!(placement.bands.last().unwrap().src_height, height - slice * (placement.bands.len() as u32 - 1));
    }

    #[test]
    fn output_pages_follow_logical_page_order() {
        let mut target = FakeTarget { heights: vec![1000, 7000, 500], ..Default::default() };
        let doc = block_on(generate_pdf(&mut target, &pages(3), &PrintTheme::default(), &config(), no_delay)).unwrap();

        let tall = plan_placement(1800, 7000, &config()).bands.len();
        assert_eq!(doc.logical_pages, 3);
        assert_eq!(doc.output_pages, 1 + tall + 1);
        assert_eq!(target.captured, vec![0, 1, 2]);
        assert_eq!(target.unmounts, 1);

        let parsed = lopdf::Document::load_mem(&doc.bytes).unwrap();
        assert_eq!(parsed.get_pages().len(), doc.output_pages);
    }

    #[test]
    fn capture_failure_still_unmounts() {
        let mut target = FakeTarget { heights: vec![100, 100], fail_at: Some(1), ..Default::default() };
        let result = block_on(generate_pdf(&mut target, &pages(2), &PrintTheme::default(), &config(), no_delay));
        assert!(matches!(result, Err(ExportError::BitmapAllocation { .. })));
        assert_eq!(target.unmounts, 1);
        assert_eq!(target.mounted, 0);
    }

    #[test]
    fn nothing_mounted_is_an_error() {
        let mut target = FakeTarget { mount_limit: Some(0), ..Default::default() };
        let result = block_on(generate_pdf(&mut target, &pages(2), &PrintTheme::default(), &config(), no_delay));
        assert!(matches!(result, Err(ExportError::NoPagesMounted)));
        assert_eq!(target.unmounts, 1);
    }

    #[test]
    fn every_settle_delay_runs_without_a_paint_signal() {
        let waited = Cell::new(Vec::new());
        let delay = |d: Duration| {
            let mut seen = waited.take();
            seen.push(d);
            waited.set(seen);
            future::ready(())
        };
        let mut target = FakeTarget { heights: vec![100], ..Default::default() };
        block_on(generate_pdf(&mut target, &pages(1), &PrintTheme::default(), &config(), delay)).unwrap();
        assert_eq!(waited.take(), SETTLE_DELAYS.to_vec());
    }

    #[test]
    fn paint_signal_cuts_the_settle_short() {
        let mut target = FakeTarget { heights: vec![100], painted_now: true, ..Default::default() };
        // Pending timers would hang forever if they were awaited.
        let result = block_on(generate_pdf(
            &mut target,
            &pages(1),
            &PrintTheme::default(),
            &config(),
            |_| future::pending::<()>(),
        ));
        assert_eq!(result.unwrap().output_pages, 1);
    }
}
