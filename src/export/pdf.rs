//! PDF assembly: one captured page image per PDF page.
//!
//! Builds the document directly with `lopdf`: each capture becomes a
//! flate-compressed DeviceRGB image XObject drawn over the full page, with
//! the page MediaBox matching the capture's pixel dimensions 1:1.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use image::RgbaImage;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::error::PergaminoError;

/// Incrementally assembled multi-page PDF.
pub struct PdfBuilder {
    doc: Document,
    pages_id: ObjectId,
    page_ids: Vec<Object>,
}

impl PdfBuilder {
    pub fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        Self {
            doc,
            pages_id,
            page_ids: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_ids.len()
    }

    /// Append one page holding the captured image at native size.
    pub fn add_page(&mut self, capture: &RgbaImage) -> Result<(), PergaminoError> {
        let width = capture.width() as i64;
        let height = capture.height() as i64;

        // Captures are opaque; drop the alpha channel for DeviceRGB
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        for pixel in capture.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&rgb)?;
        let compressed = encoder.finish()?;

        let xobject_id = self.doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width,
                "Height" => height,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "FlateDecode",
            },
            compressed,
        ));

        // Scale the unit image square to fill the page
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        width.into(),
                        0.into(),
                        0.into(),
                        height.into(),
                        0.into(),
                        0.into(),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(b"Im0".to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| PergaminoError::Pdf(format!("content stream: {}", e)))?;
        let content_id = self.doc.add_object(Stream::new(dictionary! {}, encoded));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), height.into()],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! { "Im0" => xobject_id },
            },
        });
        self.page_ids.push(page_id.into());
        Ok(())
    }

    /// Close the page tree and serialize the document.
    pub fn finish(mut self) -> Result<Vec<u8>, PergaminoError> {
        let count = self.page_ids.len() as i64;
        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => self.page_ids,
            "Count" => count,
        };
        self.doc.objects.insert(self.pages_id, pages_dict.into());

        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        self.doc
            .save_to(&mut bytes)
            .map_err(|e| PergaminoError::Pdf(format!("serialize: {}", e)))?;
        Ok(bytes)
    }
}

impl Default for PdfBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn builds_a_loadable_document_with_one_page_per_capture() {
        let mut builder = PdfBuilder::new();
        let page = RgbaImage::from_pixel(40, 30, Rgba([200, 10, 10, 255]));
        builder.add_page(&page).unwrap();
        builder.add_page(&page).unwrap();
        builder.add_page(&page).unwrap();
        assert_eq!(builder.page_count(), 3);

        let bytes = builder.finish().unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));

        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn media_box_matches_capture_size() {
        let mut builder = PdfBuilder::new();
        builder
            .add_page(&RgbaImage::from_pixel(1123, 794, Rgba([255, 255, 255, 255])))
            .unwrap();
        let bytes = builder.finish().unwrap();

        let doc = Document::load_mem(&bytes).unwrap();
        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        assert_eq!(media_box[2].as_i64().unwrap(), 1123);
        assert_eq!(media_box[3].as_i64().unwrap(), 794);
    }
}
