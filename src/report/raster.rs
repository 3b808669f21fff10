//! Off-screen render targets.
//!
//! A [`RenderTarget`] owns the mounted report pages between `mount` and
//! `unmount` and captures them as bitmaps on request. [`ResvgTarget`] is the
//! shipped backend: pages are parsed with usvg and painted with resvg into a
//! tiny-skia pixmap.

use super::layout::LogicalPage;
use super::theme::PrintTheme;
use crate::error::ExportError;
use futures::future::{FutureExt, LocalBoxFuture};
use std::sync::Arc;

/// Captured page pixels, RGBA8, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// `width * height * 4` bytes
    pub rgba: Vec<u8>,
}

impl Bitmap {
    /// An opaque white bitmap.
    pub fn white(width: u32, height: u32) -> Self {
        Self { width, height, rgba: vec![255; width as usize * height as usize * 4] }
    }

    /// Copies `height` rows starting at row `y`, clamped to the bitmap.
    pub fn crop_rows(&self, y: u32, height: u32) -> Bitmap {
        let y = y.min(self.height);
        let height = height.min(self.height - y);
        let stride = self.width as usize * 4;
        let start = y as usize * stride;
        let end = start + height as usize * stride;
        Bitmap { width: self.width, height, rgba: self.rgba[start..end].to_vec() }
    }

    /// RGB8 pixels composited over white.
    pub fn to_rgb(&self) -> Vec<u8> {
        let mut rgb = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for px in self.rgba.chunks_exact(4) {
            let alpha = u16::from(px[3]);
            for &channel in &px[..3] {
                let c = (u16::from(channel) * alpha + 255 * (255 - alpha)) / 255;
                rgb.push(c as u8);
            }
        }
        rgb
    }
}

/// Off-screen container the pagination engine captures pages from.
pub trait RenderTarget {
    /// Mounts `pages` with `theme` applied. Returns how many pages can be
    /// captured; pages that fail to mount are left out.
    fn mount(&mut self, pages: &[LogicalPage], theme: &PrintTheme) -> Result<usize, ExportError>;

    /// Resolves once everything mounted has finished painting. Targets
    /// without such a signal never resolve, leaving the settle delays to
    /// bound the wait.
    fn painted(&self) -> LocalBoxFuture<'static, ()> {
        futures::future::pending().boxed_local()
    }

    /// Captures mounted page `index` at `scale` device pixels per CSS pixel.
    fn rasterize(&mut self, index: usize, scale: f32) -> Result<Bitmap, ExportError>;

    /// Releases everything `mount` allocated. Must be safe to call twice.
    fn unmount(&mut self);
}

/// Renders mounted pages with resvg.
pub struct ResvgTarget {
    fontdb: Arc<fontdb::Database>,
    trees: Vec<usvg::Tree>,
}

impl Default for ResvgTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl ResvgTarget {
    /// Loads egui's bundled fonts (plus system fonts on native) and maps the
    /// generic `sans-serif` family onto the bundled proportional face, so
    /// text renders the same on every platform.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        for data in egui::FontDefinitions::default().font_data.values() {
            db.load_font_data(data.font.to_vec());
        }
        let bundled = db
            .faces()
            .find(|face| !face.monospaced)
            .and_then(|face| face.families.first().map(|(name, _)| name.clone()));
        #[cfg(not(target_arch = "wasm32"))]
        db.load_system_fonts();
        if let Some(family) = bundled {
            db.set_sans_serif_family(family);
        }
        Self { fontdb: Arc::new(db), trees: Vec::new() }
    }
}

impl RenderTarget for ResvgTarget {
    fn mount(&mut self, pages: &[LogicalPage], theme: &PrintTheme) -> Result<usize, ExportError> {
        self.trees.clear();
        let mut opt = usvg::Options::default();
        opt.fontdb = self.fontdb.clone();

        for (i, page) in pages.iter().enumerate() {
            let markup = theme.resolve(&page.svg)?;
            match usvg::Tree::from_data(markup.as_bytes(), &opt) {
                Ok(tree) => self.trees.push(tree),
                Err(e) => log::warn!("Skipping report page {i} ({:?}): {e}", page.kind),
            }
        }
        log::debug!("Mounted {} of {} report pages", self.trees.len(), pages.len());
        Ok(self.trees.len())
    }

    fn painted(&self) -> LocalBoxFuture<'static, ()> {
        // Painting is synchronous; mounted trees are complete.
        futures::future::ready(()).boxed_local()
    }

    fn rasterize(&mut self, index: usize, scale: f32) -> Result<Bitmap, ExportError> {
        let tree = self.trees.get(index).ok_or(ExportError::NotMounted { index })?;
        let size = tree.size();
        let width = (size.width() * scale).ceil().max(1.0) as u32;
        let height = (size.height() * scale).ceil().max(1.0) as u32;

        let mut pixmap = tiny_skia::Pixmap::new(width, height)
            .ok_or(ExportError::BitmapAllocation { width, height })?;
        pixmap.fill(tiny_skia::Color::WHITE);
        let transform = tiny_skia::Transform::from_scale(scale, scale);
        resvg::render(tree, transform, &mut pixmap.as_mut());

        Ok(Bitmap { width, height, rgba: pixmap.take() })
    }

    fn unmount(&mut self) {
        self.trees.clear();
    }
}
