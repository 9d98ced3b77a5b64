//! Recognition engine wrapper around `pure-onnx-ocr`, with model discovery.

use std::path::{Path, PathBuf};
use std::time::Instant;

use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::models::config::{ModelConfig, OcrConfig};

use super::{OcrOutput, RecognizedLine};

/// OCR engine backed by `pure-onnx-ocr` (pure Rust, no external runtime).
pub struct OcrEngine {
    engine: pure_onnx_ocr::engine::OcrEngine,
    keep_unk: bool,
}

impl OcrEngine {
    /// Create an engine from model files in a directory.
    pub fn from_dir(model_dir: &Path, models: &ModelConfig, ocr: &OcrConfig) -> Result<Self, OcrError> {
        let det_path = model_dir.join(&models.detection_model);
        let rec_path = model_dir.join(&models.recognition_model);
        let dict_path = model_dir.join(&models.dictionary);

        let engine = pure_onnx_ocr::engine::OcrEngineBuilder::new()
            .det_model_path(&det_path)
            .rec_model_path(&rec_path)
            .dictionary_path(&dict_path)
            .build()
            .map_err(|e| OcrError::ModelLoad(format!("pure-onnx-ocr: {}", e)))?;

        info!("loaded OCR models from {}", model_dir.display());

        Ok(Self {
            engine,
            keep_unk: ocr.keep_unk,
        })
    }

    /// Probe the discovery candidates in sequence and build an engine from
    /// the first that loads. A failing candidate is logged and skipped; all
    /// candidates failing means OCR is simply unavailable, never an error.
    pub fn discover(models: &ModelConfig, ocr: &OcrConfig) -> Option<Self> {
        if !ocr.enabled {
            debug!("OCR disabled by configuration");
            return None;
        }

        for candidate in discovery_candidates(models) {
            match Self::from_dir(&candidate, models, ocr) {
                Ok(engine) => return Some(engine),
                Err(e) => {
                    debug!("OCR models not usable at {}: {}", candidate.display(), e);
                }
            }
        }

        warn!("no OCR models found; recognition backends unavailable");
        None
    }

    /// Recognize text in an image.
    pub fn recognize(&self, image: &DynamicImage) -> Result<OcrOutput, OcrError> {
        let start = Instant::now();

        let results = self
            .engine
            .run_from_image(image)
            .map_err(|e| OcrError::Recognition(format!("pure-onnx-ocr: {}", e)))?;

        debug!("recognition returned {} text regions", results.len());

        let lines: Vec<RecognizedLine> = results
            .iter()
            .map(|r| {
                let (left, top) = polygon_origin(&r.bounding_box);
                let text = if self.keep_unk {
                    r.text.clone()
                } else {
                    r.text.replace("[UNK]", " ")
                };
                RecognizedLine {
                    text,
                    confidence: r.confidence,
                    left,
                    top,
                }
            })
            .collect();

        let mut output = OcrOutput {
            lines,
            text: String::new(),
            processing_time_ms: start.elapsed().as_millis() as u64,
        };
        output.sort_by_reading_order();

        Ok(output)
    }
}

/// Model directory candidates, in discovery order: configured directory,
/// `CONTEX_MODEL_DIR`, the per-user data directory, then `./models`.
fn discovery_candidates(models: &ModelConfig) -> Vec<PathBuf> {
    let mut candidates = vec![models.model_dir.clone()];

    if let Ok(dir) = std::env::var("CONTEX_MODEL_DIR") {
        candidates.push(PathBuf::from(dir));
    }

    if let Some(data_dir) = dirs::data_dir() {
        candidates.push(data_dir.join("contex").join("models"));
    }

    candidates.push(PathBuf::from("models"));
    candidates.dedup();
    candidates
}

/// Top-left corner of a detection polygon.
fn polygon_origin(polygon: &pure_onnx_ocr::Polygon<f64>) -> (f32, f32) {
    let mut left = f64::INFINITY;
    let mut top = f64::INFINITY;
    for coord in polygon.exterior().coords() {
        left = left.min(coord.x);
        top = top.min(coord.y);
    }
    if left.is_finite() && top.is_finite() {
        (left as f32, top as f32)
    } else {
        (0.0, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_starts_with_configured_dir() {
        let models = ModelConfig {
            model_dir: PathBuf::from("/opt/contex/models"),
            ..ModelConfig::default()
        };
        let candidates = discovery_candidates(&models);
        assert_eq!(candidates[0], PathBuf::from("/opt/contex/models"));
        assert!(candidates.contains(&PathBuf::from("models")));
    }

    #[test]
    fn discovery_includes_the_per_user_data_dir() {
        let candidates = discovery_candidates(&ModelConfig::default());
        if let Some(data_dir) = dirs::data_dir() {
            assert!(candidates.contains(&data_dir.join("contex").join("models")));
        }
    }

    #[test]
    fn discover_returns_none_when_disabled() {
        let ocr = OcrConfig {
            enabled: false,
            ..OcrConfig::default()
        };
        assert!(OcrEngine::discover(&ModelConfig::default(), &ocr).is_none());
    }
}
