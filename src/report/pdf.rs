//! Image-based PDF assembly.
//!
//! Each output page carries one Flate-compressed RGB image XObject placed at
//! the top of the page. Coordinates are PDF points with the origin at the
//! bottom-left corner.

use super::raster::Bitmap;
use crate::error::ExportError;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use std::io::Write;

/// Accumulates image pages and serializes them into a PDF document.
pub struct PdfAssembler {
    doc: Document,
    pages_id: ObjectId,
    kids: Vec<Object>,
    page_width: f32,
    page_height: f32,
}

impl PdfAssembler {
    /// Starts an empty document whose pages are `page_width` x `page_height` points.
    pub fn new(page_width: f32, page_height: f32) -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self { doc, pages_id, kids: Vec::new(), page_width, page_height }
    }

    /// Pages added so far.
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Appends a page showing `bitmap` at horizontal offset `x`, scaled to
    /// `width` x `height` points and anchored to the top edge.
    pub fn add_image_page(
        &mut self,
        bitmap: &Bitmap,
        x: f32,
        width: f32,
        height: f32,
    ) -> Result<(), ExportError> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&bitmap.to_rgb())?;
        let compressed = encoder.finish()?;

        let image = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => i64::from(bitmap.width),
                "Height" => i64::from(bitmap.height),
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        )
        .with_compression(false);
        let image_id = self.doc.add_object(image);

        let y = self.page_height - height;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![width.into(), 0.into(), 0.into(), height.into(), x.into(), y.into()],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let media_box: Vec<Object> =
            vec![0.into(), 0.into(), self.page_width.into(), self.page_height.into()];
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => image_id },
            },
        });
        self.kids.push(page_id.into());
        Ok(())
    }

    /// Writes the page tree and catalog and serializes the document.
    pub fn finish(mut self) -> Result<Vec<u8>, ExportError> {
        let count = self.kids.len() as i64;
        self.doc.objects.insert(
            self.pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => self.kids,
                "Count" => count,
            }),
        );
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.doc.save_to(&mut bytes)?;
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pages_round_trip_through_lopdf() {
        let mut pdf = PdfAssembler::new(595.28, 841.89);
        let bmp = Bitmap::white(4, 3);
        pdf.add_image_page(&bmp, 23.8, 547.66, 410.7).unwrap();
        pdf.add_image_page(&bmp, 23.8, 547.66, 841.0).unwrap();
        assert_eq!(pdf.page_count(), 2);

        let bytes = pdf.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 2);
    }

    #[test]
    fn empty_document_still_serializes() {
        let bytes = PdfAssembler::new(595.28, 841.89).finish().unwrap();
        let doc = Document::load_mem(&bytes).unwrap();
        assert!(doc.get_pages().is_empty());
    }
}
