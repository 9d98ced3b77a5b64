//! PDF text and image extraction using lopdf and pdf-extract.

use std::cell::OnceCell;

use image::{DynamicImage, ImageBuffer, Rgba};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace, warn};

use super::Result;
use crate::error::PdfError;

/// One loaded PDF document. Opening is the only structural step of a parse:
/// everything past `from_bytes` degrades to empty output instead of failing.
#[derive(Debug)]
pub struct PdfExtractor {
    document: Document,
    raw_data: Vec<u8>,
    // Whole-document text from pdf-extract, computed at most once per parse.
    embedded_text: OnceCell<Option<String>>,
}

impl PdfExtractor {
    /// Load a PDF from bytes. Encrypted documents are tried with the empty
    /// password before giving up.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut doc = Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        let raw_data = if doc.is_encrypted() {
            if doc.decrypt("").is_err() {
                return Err(PdfError::Encrypted);
            }
            debug!("decrypted PDF with empty password");

            // pdf-extract needs the decrypted bytes, not the originals.
            let mut decrypted = Vec::new();
            doc.save_to(&mut decrypted)
                .map_err(|e| PdfError::Parse(format!("failed to save decrypted PDF: {}", e)))?;
            decrypted
        } else {
            data.to_vec()
        };

        if doc.get_pages().is_empty() {
            return Err(PdfError::NoPages);
        }

        debug!("loaded PDF with {} pages", doc.get_pages().len());

        Ok(Self {
            document: doc,
            raw_data,
            embedded_text: OnceCell::new(),
        })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// Whole-document text from the embedded text layer, via pdf-extract.
    /// `None` when the text layer is absent or unreadable.
    pub fn embedded_text(&self) -> Option<&str> {
        self.embedded_text
            .get_or_init(|| match pdf_extract::extract_text_from_mem(&self.raw_data) {
                Ok(text) => Some(text),
                Err(e) => {
                    debug!("embedded text extraction failed: {}", e);
                    None
                }
            })
            .as_deref()
    }

    /// Embedded-layer text for one page. pdf-extract has no page boundaries,
    /// so the document text is split into equal line runs per page - rough,
    /// but the field patterns only need the right page's content nearby.
    pub fn embedded_page_text(&self, page: u32) -> Option<String> {
        let full = self.embedded_text()?;
        let pages = self.page_count() as usize;
        if pages == 0 || page == 0 || page as usize > pages {
            return None;
        }

        let lines: Vec<&str> = full.lines().collect();
        let per_page = lines.len() / pages;
        if per_page == 0 {
            // Short document: give everything to page 1.
            return (page == 1).then(|| full.to_string());
        }

        let start = (page as usize - 1) * per_page;
        let end = if page as usize == pages {
            lines.len()
        } else {
            page as usize * per_page
        };
        Some(lines[start.min(lines.len())..end.min(lines.len())].join("\n"))
    }

    /// Page text decoded directly from the page's content streams via lopdf.
    /// Independent of pdf-extract, so it recovers pages where the primary
    /// extractor mangles bidirectional layout runs.
    pub fn content_text(&self, page: u32) -> Option<String> {
        match self.document.extract_text(&[page]) {
            Ok(text) => Some(text),
            Err(e) => {
                trace!("content-stream text failed for page {}: {}", page, e);
                None
            }
        }
    }

    /// Images referenced by one page's XObject resources.
    pub fn page_images(&self, page: u32) -> Result<Vec<DynamicImage>> {
        let pages = self.document.get_pages();
        let page_id = *pages.get(&page).ok_or(PdfError::InvalidPage(page))?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects)
                {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = self.document.dereference(obj_ref) {
                            if let Some(img) = decode_image_object(&self.document, obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("extracted {} images from page {}", images.len(), page);
        Ok(images)
    }

    /// Every decodable image in the document, in object order. Used by the
    /// legacy OCR path when page resources don't reference their scans.
    pub fn scan_images(&self) -> Vec<DynamicImage> {
        let mut images = Vec::new();
        for (_id, object) in self.document.objects.iter() {
            if let Some(img) = decode_image_object(&self.document, object) {
                images.push(img);
            }
        }
        debug!("document scan found {} images", images.len());
        images
    }

    /// Resources dictionary for a page, walking up the page tree when the
    /// entry is inherited.
    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut node_id = page_id;
        // Page trees are shallow; the bound only guards against cycles.
        for _ in 0..32 {
            let node = self.document.get_object(node_id).ok()?;
            let Object::Dictionary(dict) = node else {
                return None;
            };

            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res))) = self.document.dereference(resources) {
                    return Some(res.clone());
                }
            }

            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }
        warn!("page tree deeper than expected, giving up on resources");
        None
    }
}

/// Decode an image XObject stream into a `DynamicImage`, if we can.
fn decode_image_object(doc: &Document, obj: &Object) -> Option<DynamicImage> {
    let Object::Stream(stream) = obj else {
        return None;
    };
    let dict = &stream.dict;

    if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
        return None;
    }

    let width = dict.get(b"Width").ok()?.as_i64().ok()? as u32;
    let height = dict.get(b"Height").ok()?.as_i64().ok()? as u32;
    trace!("image object: {}x{}", width, height);

    let filter = dict.get(b"Filter").ok().and_then(|f| match f {
        Object::Name(name) => Some(name.as_slice()),
        Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
        _ => None,
    });

    match filter {
        Some(b"DCTDecode") => {
            // JPEG: the stream content is the compressed file as-is.
            return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                .ok();
        }
        Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
            trace!("unsupported image filter, skipping");
            return None;
        }
        _ => {}
    }

    let data = stream
        .decompressed_content()
        .unwrap_or_else(|_| stream.content.clone());

    let bits = dict
        .get(b"BitsPerComponent")
        .ok()
        .and_then(|o| o.as_i64().ok())
        .unwrap_or(8);
    if bits != 8 {
        trace!("unsupported bits per component: {}", bits);
        return None;
    }

    let color_space = dict
        .get(b"ColorSpace")
        .ok()
        .and_then(|o| match o {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
            Object::Reference(r) => doc.get_object(*r).ok().and_then(|o| o.as_name().ok()),
            _ => None,
        })
        .unwrap_or(b"DeviceRGB");

    raw_to_image(&data, width, height, color_space)
}

/// Assemble a raw RGB or grayscale sample buffer into an RGBA image.
fn raw_to_image(data: &[u8], width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize) * (height as usize);
    let mut rgba = Vec::with_capacity(pixels * 4);

    match color_space {
        b"DeviceRGB" | b"RGB" if data.len() >= pixels * 3 => {
            for chunk in data[..pixels * 3].chunks_exact(3) {
                rgba.extend_from_slice(&[chunk[0], chunk[1], chunk[2], 255]);
            }
        }
        b"DeviceGray" | b"G" if data.len() >= pixels => {
            for &gray in &data[..pixels] {
                rgba.extend_from_slice(&[gray, gray, gray, 255]);
            }
        }
        _ => {
            trace!(
                "cannot decode raw image: colorspace={:?}, data_len={}",
                String::from_utf8_lossy(color_space),
                data.len()
            );
            return None;
        }
    }

    ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
}
