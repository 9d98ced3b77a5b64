//! Optical recognition over page images, backed by `pure-onnx-ocr`.

#[cfg(feature = "native")]
mod engine;

#[cfg(feature = "native")]
pub use engine::OcrEngine;

use serde::{Deserialize, Serialize};

/// One recognized line of text with its position and confidence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecognizedLine {
    /// Recognized text content.
    pub text: String,

    /// Recognition confidence score (0.0 - 1.0).
    pub confidence: f32,

    /// Top-left corner of the bounding box.
    pub left: f32,
    pub top: f32,
}

/// Result of recognizing one image.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrOutput {
    /// Recognized lines, sorted in reading order.
    pub lines: Vec<RecognizedLine>,

    /// Full text (lines joined with newlines).
    pub text: String,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl OcrOutput {
    /// Sort lines top-to-bottom, left-to-right, then rebuild the full text.
    /// Rows are bucketed by approximate vertical position so that slightly
    /// skewed scans still read line by line.
    pub fn sort_by_reading_order(&mut self) {
        self.lines.sort_by(|a, b| {
            let row_a = (a.top / 20.0) as i32;
            let row_b = (b.top / 20.0) as i32;
            if row_a != row_b {
                row_a.cmp(&row_b)
            } else {
                a.left.partial_cmp(&b.left).unwrap_or(std::cmp::Ordering::Equal)
            }
        });

        self.text = self
            .lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
    }
}
