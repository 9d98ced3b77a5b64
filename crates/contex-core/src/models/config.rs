//! Configuration structures for the extraction pipeline.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::record::{DocType, Field};

/// Main configuration for the contex pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContexConfig {
    /// PDF processing configuration.
    pub pdf: PdfConfig,

    /// OCR configuration.
    pub ocr: OcrConfig,

    /// Field extraction and scoring configuration.
    pub extraction: ExtractionConfig,

    /// Recognition model locations.
    pub models: ModelConfig,
}

/// PDF processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// Minimum characters (trimmed) for a page's extracted text to be
    /// considered usable without falling through to the next backend.
    pub min_page_chars: usize,

    /// Maximum pages to process (0 = unlimited).
    pub max_pages: usize,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            min_page_chars: 100,
            max_pages: 0,
        }
    }
}

/// OCR configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// Allow OCR backends at all. When false the chain runs digital-only.
    pub enabled: bool,

    /// Keep `[UNK]` tokens in recognized text instead of blanking them.
    pub keep_unk: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            keep_unk: false,
        }
    }
}

/// Field extraction and review-routing configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Minimum acceptable per-field score; below it a field is flagged for
    /// manual entry, and a document whose floor score is below it goes to
    /// the exception queue.
    pub min_field_score: f32,

    /// Confidence scoring policy.
    pub policy: ScorePolicy,

    /// Fields structurally absent by design for a given document type.
    /// Absence of such a field scores 1.0, not 0.0.
    pub optional_fields: BTreeMap<DocType, Vec<Field>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        let insurance_only = vec![Field::InsuranceStatus];
        let mut optional_fields = BTreeMap::new();
        optional_fields.insert(DocType::EmploymentContract, insurance_only.clone());
        optional_fields.insert(DocType::JobOffer, insurance_only.clone());
        optional_fields.insert(DocType::Unknown, insurance_only);

        Self {
            min_field_score: 0.95,
            policy: ScorePolicy::default(),
            optional_fields,
        }
    }
}

impl ExtractionConfig {
    /// Optional-field table lookup for a document type. A document type
    /// missing from the table still treats `insurance_status` as optional,
    /// since no contract variant carries it.
    pub fn optional_for(&self, doc_type: DocType) -> &[Field] {
        self.optional_fields
            .get(&doc_type)
            .map(|v| v.as_slice())
            .unwrap_or(&[Field::InsuranceStatus])
    }

    pub fn is_optional(&self, field: Field, doc_type: DocType) -> bool {
        self.optional_for(doc_type).contains(&field)
    }
}

/// Numeric curve for confidence scoring, kept as data rather than arithmetic
/// so it can be tuned against representative documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScorePolicy {
    /// Penalty by rule priority index; indices past the end clamp to the
    /// last entry. Index 0 is the primary rule.
    pub rule_penalties: Vec<f32>,

    /// Extra penalty when recognized (OCR) text produced the match.
    pub ocr_penalty: f32,

    /// Score assigned to values derived rather than matched (job-offer
    /// start/expiry computed from signing date + duration).
    pub derived_score: f32,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        Self {
            rule_penalties: vec![0.0, 0.05, 0.08, 0.10, 0.12, 0.15],
            ocr_penalty: 0.10,
            derived_score: 0.85,
        }
    }
}

impl ScorePolicy {
    /// Penalty for the rule at `index`.
    pub fn rule_penalty(&self, index: usize) -> f32 {
        match self.rule_penalties.get(index) {
            Some(p) => *p,
            None => self.rule_penalties.last().copied().unwrap_or(0.0),
        }
    }
}

/// Recognition model file locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Preferred directory containing model files. Further discovery
    /// candidates are tried when this one fails to load.
    pub model_dir: PathBuf,

    /// Text detection model file name.
    pub detection_model: String,

    /// Text recognition model file name.
    pub recognition_model: String,

    /// Character dictionary file name.
    pub dictionary: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            detection_model: "det.onnx".to_string(),
            recognition_model: "latin_rec.onnx".to_string(),
            dictionary: "latin_dict.txt".to_string(),
        }
    }
}

impl ContexConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
