//! Error types for the contex-core library.

use thiserror::Error;

/// Main error type for the contex library.
#[derive(Error, Debug)]
pub enum ContexError {
    /// PDF processing error.
    #[error("PDF error: {0}")]
    Pdf(#[from] PdfError),

    /// OCR processing error.
    #[error("OCR error: {0}")]
    Ocr(#[from] OcrError),

    /// Field extraction error.
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Image processing error.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the document container. These are structural: they abort
/// the parse of the affected document (and only that document).
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF container.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,

    /// Invalid page number requested.
    #[error("invalid page number: {0}")]
    InvalidPage(u32),
}

/// Errors related to OCR processing. These are soft at the pipeline level:
/// a backend converts them into "no output" and the chain moves on.
#[derive(Error, Debug)]
pub enum OcrError {
    /// Failed to load recognition models.
    #[error("failed to load model: {0}")]
    ModelLoad(String),

    /// Text recognition failed.
    #[error("text recognition failed: {0}")]
    Recognition(String),
}

/// Errors related to field extraction.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Unsupported input format handed to the parser.
    #[error("unsupported input format: {0}")]
    UnsupportedFormat(String),
}

/// Result type for the contex library.
pub type Result<T> = std::result::Result<T, ContexError>;
