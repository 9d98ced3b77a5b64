//! Page strategy selector: try backends in priority order per page, stop at
//! the first output that clears the minimum-character threshold.

use tracing::{debug, info};

use crate::models::config::ContexConfig;
use crate::pdf::PdfExtractor;

use super::{DocumentText, PageText, TextBackend};

#[cfg(feature = "native")]
use crate::ocr::OcrEngine;
#[cfg(feature = "native")]
use crate::text::backends::{DocumentScanOcrBackend, PageImageOcrBackend};
use crate::text::backends::{ContentStreamBackend, EmbeddedTextBackend};

/// Ordered backend chain with availability fixed at construction time.
pub struct ExtractionChain {
    backends: Vec<Box<dyn TextBackend>>,
    min_page_chars: usize,
    max_pages: usize,
    #[cfg(feature = "native")]
    engine: Option<std::sync::Arc<OcrEngine>>,
}

impl ExtractionChain {
    /// Probe backend availability once and build the chain. The digital
    /// extractors are always present; the OCR backends join only when a
    /// recognition engine loads from one of the discovery candidates.
    pub fn probe(config: &ContexConfig) -> Self {
        let mut backends: Vec<Box<dyn TextBackend>> =
            vec![Box::new(EmbeddedTextBackend), Box::new(ContentStreamBackend)];

        #[cfg(feature = "native")]
        let engine = OcrEngine::discover(&config.models, &config.ocr).map(std::sync::Arc::new);
        #[cfg(feature = "native")]
        if let Some(engine) = &engine {
            backends.push(Box::new(PageImageOcrBackend::new(engine.clone())));
            backends.push(Box::new(DocumentScanOcrBackend::new(engine.clone())));
        }

        info!(
            "extraction chain: {}",
            backends
                .iter()
                .map(|b| b.name())
                .collect::<Vec<_>>()
                .join(" -> ")
        );

        Self {
            backends,
            min_page_chars: config.pdf.min_page_chars,
            max_pages: config.pdf.max_pages,
            #[cfg(feature = "native")]
            engine,
        }
    }

    /// Build a chain from explicit backends. Test seam, and the hook for
    /// callers that need a custom strategy order.
    pub fn with_backends(backends: Vec<Box<dyn TextBackend>>, min_page_chars: usize) -> Self {
        Self {
            backends,
            min_page_chars,
            max_pages: 0,
            #[cfg(feature = "native")]
            engine: None,
        }
    }

    /// The recognition engine discovered at probe time, if any. Shared with
    /// callers that recognize standalone images outside a PDF.
    #[cfg(feature = "native")]
    pub fn ocr_engine(&self) -> Option<std::sync::Arc<OcrEngine>> {
        self.engine.clone()
    }

    /// Names of the available backends, in priority order.
    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Whether any recognition backend is available.
    pub fn has_ocr(&self) -> bool {
        self.backends.iter().any(|b| b.is_ocr())
    }

    /// Extract the best-available text for every page and assemble the
    /// document text. Never fails: a page no backend can read contributes
    /// its best (possibly empty) output.
    pub fn extract(&self, doc: &PdfExtractor) -> DocumentText {
        let mut page_count = doc.page_count();
        if self.max_pages > 0 {
            page_count = page_count.min(self.max_pages as u32);
        }

        let mut pages = Vec::with_capacity(page_count as usize);
        for page in 1..=page_count {
            pages.push(self.extract_page(doc, page));
        }

        let doc_text = DocumentText::assemble(pages);
        debug!(
            "assembled {} chars from {} pages (ocr_used={})",
            doc_text.text.len(),
            doc_text.pages.len(),
            doc_text.ocr_used
        );
        doc_text
    }

    fn extract_page(&self, doc: &PdfExtractor, page: u32) -> PageText {
        // Best-so-far fallback for pages where nothing reaches the
        // threshold: keep the longest output rather than dropping the page.
        let mut best: Option<PageText> = None;

        for backend in &self.backends {
            let Some(text) = backend.page_text(doc, page) else {
                continue;
            };
            let usable = text.trim().len();

            if usable >= self.min_page_chars {
                debug!("page {}: {} ({} chars)", page, backend.name(), usable);
                return PageText {
                    number: page,
                    text,
                    ocr: backend.is_ocr(),
                    backend: backend.name(),
                };
            }

            let better = best
                .as_ref()
                .map(|b| usable > b.text.trim().len())
                .unwrap_or(usable > 0);
            if better {
                best = Some(PageText {
                    number: page,
                    text,
                    ocr: backend.is_ocr(),
                    backend: backend.name(),
                });
            }
        }

        best.unwrap_or_else(|| {
            debug!("page {}: no backend produced output", page);
            PageText {
                number: page,
                text: String::new(),
                ocr: false,
                backend: "none",
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use lopdf::dictionary;

    use super::*;

    // Stub backend returning fixed per-page text; stands in for any of the
    // real strategies in chain-ordering tests.
    struct Fixed {
        name: &'static str,
        ocr: bool,
        pages: Vec<&'static str>,
    }

    impl TextBackend for Fixed {
        fn name(&self) -> &'static str {
            self.name
        }

        fn is_ocr(&self) -> bool {
            self.ocr
        }

        fn page_text(&self, _doc: &PdfExtractor, page: u32) -> Option<String> {
            self.pages
                .get(page as usize - 1)
                .map(|s| s.to_string())
                .filter(|s| !s.is_empty())
        }
    }

    fn sample_doc() -> PdfExtractor {
        // Minimal one-page PDF; the stub backends never read its content.
        let mut doc = lopdf::Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content_id = doc.add_object(lopdf::Object::Stream(lopdf::Stream::new(
            dictionary! {},
            Vec::new(),
        )));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        doc.objects.insert(
            pages_id,
            lopdf::Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        PdfExtractor::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn first_backend_meeting_threshold_wins() {
        let chain = ExtractionChain::with_backends(
            vec![
                Box::new(Fixed {
                    name: "primary",
                    ocr: false,
                    pages: vec!["this is plenty of text"],
                }),
                Box::new(Fixed {
                    name: "ocr",
                    ocr: true,
                    pages: vec!["should never be consulted"],
                }),
            ],
            5,
        );

        let doc = sample_doc();
        let text = chain.extract(&doc);
        assert_eq!(text.pages[0].backend, "primary");
        assert!(!text.ocr_used);
    }

    #[test]
    fn short_primary_output_falls_through_to_ocr() {
        let chain = ExtractionChain::with_backends(
            vec![
                Box::new(Fixed {
                    name: "primary",
                    ocr: false,
                    pages: vec!["x"],
                }),
                Box::new(Fixed {
                    name: "ocr",
                    ocr: true,
                    pages: vec!["recognized page text that is long enough"],
                }),
            ],
            10,
        );

        let doc = sample_doc();
        let text = chain.extract(&doc);
        assert_eq!(text.pages[0].backend, "ocr");
        assert!(text.ocr_used);
    }

    #[test]
    fn page_below_threshold_everywhere_keeps_best_output() {
        let chain = ExtractionChain::with_backends(
            vec![
                Box::new(Fixed {
                    name: "primary",
                    ocr: false,
                    pages: vec!["ab"],
                }),
                Box::new(Fixed {
                    name: "secondary",
                    ocr: false,
                    pages: vec!["abcd"],
                }),
            ],
            100,
        );

        let doc = sample_doc();
        let text = chain.extract(&doc);
        assert_eq!(text.pages[0].text, "abcd");
        assert_eq!(text.pages[0].backend, "secondary");
    }

    #[test]
    fn page_with_no_output_is_kept_empty_not_dropped() {
        let chain = ExtractionChain::with_backends(
            vec![Box::new(Fixed {
                name: "primary",
                ocr: false,
                pages: vec![""],
            })],
            10,
        );

        let doc = sample_doc();
        let text = chain.extract(&doc);
        assert_eq!(text.pages.len(), 1);
        assert_eq!(text.pages[0].text, "");
        assert_eq!(text.pages[0].backend, "none");
    }
}
