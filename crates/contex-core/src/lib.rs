//! Core library for MOHRE labour-contract field extraction.
//!
//! This crate provides:
//! - PDF processing (embedded text, content streams, page images)
//! - An OCR fallback pipeline for scanned documents
//! - Bilingual contract field extraction (names, dates, salaries, permit
//!   numbers) with per-field confidence scores
//! - Review routing against a configurable confidence threshold

pub mod contract;
pub mod error;
pub mod models;
pub mod ocr;
pub mod pdf;
pub mod text;

pub use contract::{ContractParser, Disposition, ReviewReport, ReviewRouter};
pub use error::{ContexError, Result};
pub use models::config::ContexConfig;
pub use models::record::{DocType, ExtractionResult, Field, FieldValue};
pub use ocr::{OcrOutput, RecognizedLine};
#[cfg(feature = "native")]
pub use ocr::OcrEngine;
pub use pdf::PdfExtractor;
pub use text::{DocumentText, ExtractionChain, PageText, TextBackend};
