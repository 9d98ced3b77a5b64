//! Data models: extraction records and pipeline configuration.

pub mod config;
pub mod record;

pub use config::{ContexConfig, ExtractionConfig, ModelConfig, OcrConfig, PdfConfig, ScorePolicy};
pub use record::{DocType, ExtractionResult, Field, FieldKind, FieldValue};
