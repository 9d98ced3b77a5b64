//! PDF container access: structural loading, digital text layers, and
//! embedded page images for the OCR backends.

mod extractor;

pub use extractor::PdfExtractor;

use crate::error::PdfError;

/// Result type for PDF operations.
pub type Result<T> = std::result::Result<T, PdfError>;
