//! Multi-strategy text extraction: backends, the per-page strategy
//! selector, and the assembled document text the field matcher runs over.

mod backends;
mod chain;

pub use backends::{ContentStreamBackend, EmbeddedTextBackend};
#[cfg(feature = "native")]
pub use backends::{DocumentScanOcrBackend, PageImageOcrBackend};
pub use chain::ExtractionChain;

use crate::pdf::PdfExtractor;

/// One selectable strategy for turning a document page into plain text.
///
/// Backends return `None` for "no usable output" - internal failures are
/// converted at this boundary and never propagate past a single attempt.
pub trait TextBackend {
    /// Backend name, for logging and per-page provenance.
    fn name(&self) -> &'static str;

    /// Whether this backend performs optical recognition.
    fn is_ocr(&self) -> bool;

    /// Extract plain text for one page (1-indexed).
    fn page_text(&self, doc: &PdfExtractor, page: u32) -> Option<String>;
}

/// Text produced for a single page, with its provenance.
#[derive(Debug, Clone)]
pub struct PageText {
    /// Page number (1-indexed).
    pub number: u32,
    /// Extracted text (possibly empty).
    pub text: String,
    /// Whether optical recognition produced this text.
    pub ocr: bool,
    /// Name of the backend that won the page.
    pub backend: &'static str,
}

/// Full-document text assembled from per-page extractions, keeping page
/// boundary offsets so a field match can be attributed to the page (and
/// hence the backend kind) that produced it.
#[derive(Debug, Clone)]
pub struct DocumentText {
    /// Per-page extraction outcomes, in page order.
    pub pages: Vec<PageText>,
    /// Concatenated text, pages joined with newlines.
    pub text: String,
    /// Whether any page required optical recognition.
    pub ocr_used: bool,
    // Byte span of each page within `text`.
    spans: Vec<(usize, usize)>,
}

impl DocumentText {
    /// Assemble document text from per-page outcomes.
    pub fn assemble(pages: Vec<PageText>) -> Self {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(pages.len());

        for (i, page) in pages.iter().enumerate() {
            if i > 0 {
                text.push('\n');
            }
            let start = text.len();
            text.push_str(&page.text);
            spans.push((start, text.len()));
        }

        let ocr_used = pages.iter().any(|p| p.ocr);
        Self {
            pages,
            text,
            ocr_used,
            spans,
        }
    }

    /// Build from a single page of already-extracted text. Used for direct
    /// image input and in tests.
    pub fn from_single(text: impl Into<String>, ocr: bool, backend: &'static str) -> Self {
        Self::assemble(vec![PageText {
            number: 1,
            text: text.into(),
            ocr,
            backend,
        }])
    }

    /// Whether the text at `offset` came from a recognized (OCR) page.
    pub fn ocr_at(&self, offset: usize) -> bool {
        self.page_index_at(offset)
            .map(|i| self.pages[i].ocr)
            .unwrap_or(self.ocr_used)
    }

    fn page_index_at(&self, offset: usize) -> Option<usize> {
        self.spans
            .iter()
            .position(|&(start, end)| offset >= start && offset <= end)
    }
}
