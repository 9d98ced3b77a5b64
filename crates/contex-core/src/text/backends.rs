//! The four text-extraction backends, in chain priority order.

use tracing::{debug, warn};

use crate::pdf::PdfExtractor;

use super::TextBackend;

#[cfg(feature = "native")]
use std::sync::Arc;

#[cfg(feature = "native")]
use crate::ocr::OcrEngine;

/// Primary digital extractor: the document's embedded text layer via
/// pdf-extract. Cleanest separation of the Latin and Arabic runs when the
/// text layer is intact.
pub struct EmbeddedTextBackend;

impl TextBackend for EmbeddedTextBackend {
    fn name(&self) -> &'static str {
        "embedded-text"
    }

    fn is_ocr(&self) -> bool {
        false
    }

    fn page_text(&self, doc: &PdfExtractor, page: u32) -> Option<String> {
        doc.embedded_page_text(page)
    }
}

/// Secondary digital extractor: lopdf content-stream decoding per page.
/// Falls in when pdf-extract loses a page to reordered bidirectional runs.
pub struct ContentStreamBackend;

impl TextBackend for ContentStreamBackend {
    fn name(&self) -> &'static str {
        "content-stream"
    }

    fn is_ocr(&self) -> bool {
        false
    }

    fn page_text(&self, doc: &PdfExtractor, page: u32) -> Option<String> {
        doc.content_text(page)
    }
}

/// Primary OCR path: recognize the images referenced by the page's own
/// XObject resources.
#[cfg(feature = "native")]
pub struct PageImageOcrBackend {
    engine: Arc<OcrEngine>,
}

#[cfg(feature = "native")]
impl PageImageOcrBackend {
    pub fn new(engine: Arc<OcrEngine>) -> Self {
        Self { engine }
    }
}

#[cfg(feature = "native")]
impl TextBackend for PageImageOcrBackend {
    fn name(&self) -> &'static str {
        "page-image-ocr"
    }

    fn is_ocr(&self) -> bool {
        true
    }

    fn page_text(&self, doc: &PdfExtractor, page: u32) -> Option<String> {
        let images = match doc.page_images(page) {
            Ok(images) => images,
            Err(e) => {
                debug!("no images for page {}: {}", page, e);
                return None;
            }
        };
        if images.is_empty() {
            return None;
        }

        let mut texts = Vec::new();
        for (i, image) in images.iter().enumerate() {
            match self.engine.recognize(image) {
                Ok(output) if !output.text.trim().is_empty() => texts.push(output.text),
                Ok(_) => {}
                Err(e) => {
                    // One image failing must not sink the page.
                    warn!("recognition failed for page {} image {}: {}", page, i + 1, e);
                }
            }
        }

        (!texts.is_empty()).then(|| texts.join("\n"))
    }
}

/// Legacy OCR path: scan every image object in the document and take the one
/// matching the page index. Recovers scans that pages don't reference
/// through their resource dictionaries.
#[cfg(feature = "native")]
pub struct DocumentScanOcrBackend {
    engine: Arc<OcrEngine>,
}

#[cfg(feature = "native")]
impl DocumentScanOcrBackend {
    pub fn new(engine: Arc<OcrEngine>) -> Self {
        Self { engine }
    }
}

#[cfg(feature = "native")]
impl TextBackend for DocumentScanOcrBackend {
    fn name(&self) -> &'static str {
        "document-scan-ocr"
    }

    fn is_ocr(&self) -> bool {
        true
    }

    fn page_text(&self, doc: &PdfExtractor, page: u32) -> Option<String> {
        let images = doc.scan_images();
        let image = images.get(page as usize - 1)?;

        match self.engine.recognize(image) {
            Ok(output) if !output.text.trim().is_empty() => Some(output.text),
            Ok(_) => None,
            Err(e) => {
                warn!("document-scan recognition failed for page {}: {}", page, e);
                None
            }
        }
    }
}
