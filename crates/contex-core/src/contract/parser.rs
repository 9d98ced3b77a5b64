//! The contract parser: text extraction, field matching, document-type
//! handling, and confidence scoring, in one pass.

use std::collections::BTreeMap;
use std::time::Instant;

use tracing::{debug, info};

use crate::models::config::ContexConfig;
use crate::models::record::{DocType, ExtractionResult, Field, FieldValue};
use crate::pdf::PdfExtractor;
use crate::text::{DocumentText, ExtractionChain};

use super::doctype::{derive_job_offer_dates, detect_doc_type};
use super::matcher::match_field;
use super::rules::field_specs;
use super::scorer::{floor_score, ConfidenceScorer};

#[cfg(feature = "native")]
use crate::error::OcrError;

/// Parses one contract document into an [`ExtractionResult`].
///
/// Backend availability is probed once at construction; a parser can then be
/// reused across a whole batch.
pub struct ContractParser {
    config: ContexConfig,
    chain: ExtractionChain,
}

impl ContractParser {
    pub fn new(config: ContexConfig) -> Self {
        let chain = ExtractionChain::probe(&config);
        Self { config, chain }
    }

    /// Construct with an explicit backend chain. Test seam.
    pub fn with_chain(config: ContexConfig, chain: ExtractionChain) -> Self {
        Self { config, chain }
    }

    /// Whether any recognition backend is available.
    pub fn has_ocr(&self) -> bool {
        self.chain.has_ocr()
    }

    /// Parse a PDF document from raw bytes.
    pub fn parse_bytes(&self, data: &[u8]) -> crate::Result<ExtractionResult> {
        let start = Instant::now();
        let doc = PdfExtractor::from_bytes(data)?;
        debug!("document loaded: {} pages", doc.page_count());

        let text = self.chain.extract(&doc);
        Ok(self.parse_document_text(&text, start))
    }

    /// Parse a standalone image (a photographed or scanned contract page)
    /// through the same field pipeline. Requires recognition models.
    #[cfg(feature = "native")]
    pub fn parse_image(&self, image: &image::DynamicImage) -> crate::Result<ExtractionResult> {
        let start = Instant::now();
        let engine = self.chain.ocr_engine().ok_or_else(|| {
            OcrError::ModelLoad("no recognition models available for image input".to_string())
        })?;

        let output = engine.recognize(image)?;
        let text = DocumentText::from_single(&output.text, true, "image-ocr");
        Ok(self.parse_document_text(&text, start))
    }

    /// Run matching and scoring over already-assembled document text.
    pub fn parse_document_text(&self, text: &DocumentText, start: Instant) -> ExtractionResult {
        let doc_type = detect_doc_type(&text.text);
        let extraction = &self.config.extraction;
        let scorer = ConfidenceScorer::new(&extraction.policy);

        let mut fields: BTreeMap<Field, Option<FieldValue>> = BTreeMap::new();
        let mut scores: BTreeMap<Field, f32> = BTreeMap::new();
        let mut warnings = Vec::new();

        for spec in field_specs() {
            let attempt = match_field(spec, text);
            let optional = extraction.is_optional(spec.field, doc_type);
            let score = scorer.score(&attempt, optional);

            debug!(
                "{}: value={:?} rule={:?} score={:.2}",
                spec.field, attempt.value, attempt.rule_index, score
            );

            fields.insert(spec.field, attempt.value);
            scores.insert(spec.field, score);
        }

        // Job offers state a signing date and a duration instead of explicit
        // contract dates; fill the gaps with derived values at the policy's
        // derived score.
        if doc_type == DocType::JobOffer {
            let derived = derive_job_offer_dates(&text.text);
            let candidates = [
                (Field::ContractStartDate, derived.start),
                (Field::ContractExpiryDate, derived.expiry),
            ];
            for (field, date) in candidates {
                let missing = fields.get(&field).is_none_or(|v| v.is_none());
                if let (true, Some(date)) = (missing, date) {
                    fields.insert(field, Some(FieldValue::Date(date)));
                    scores.insert(field, scorer.derived_score());
                    warnings.push(format!("{field}: derived from signing date and duration"));
                }
            }
        }

        for (field, value) in &fields {
            if value.is_none() && !extraction.is_optional(*field, doc_type) {
                warnings.push(format!("{field}: no value extracted"));
            }
        }

        let min_score = floor_score(&scores, extraction.optional_for(doc_type));

        let result = ExtractionResult {
            fields,
            scores,
            min_score,
            ocr_used: text.ocr_used,
            doc_type,
            warnings,
            processing_time_ms: start.elapsed().as_millis() as u64,
        };

        info!(
            "parsed {} document: min score {:.2}, ocr_used={}, {} warnings",
            result.doc_type.as_str(),
            result.min_score,
            result.ocr_used,
            result.warnings.len()
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::text::{DocumentText, PageText};

    fn parser() -> ContractParser {
        ContractParser::with_chain(
            ContexConfig::default(),
            ExtractionChain::with_backends(Vec::new(), 100),
        )
    }

    fn parse(text: &DocumentText) -> ExtractionResult {
        parser().parse_document_text(text, Instant::now())
    }

    fn contract_body() -> &'static str {
        "STANDARD EMPLOYMENT CONTRACT\n\
         Transaction Number MB123456789AE\n\
         2. Name FRANK OTIM\n\
         Nationality UGANDAN\n\
         Date of Birth 14/04/1996\n\
         Passport Number P10474550\n\
         shall practice the profession of Launderer in the UAE\n\
         Basic Salary: 1200 AED\n\
         Total Salary: 1500 AED\n\
         starting from 01/08/2025 and ending on 31/07/2027\n"
    }

    #[test]
    fn clean_digital_contract_scores_one_across_the_board() {
        let result = parse(&DocumentText::from_single(contract_body(), false, "embedded-text"));

        assert_eq!(result.doc_type, DocType::EmploymentContract);
        assert!(!result.ocr_used);
        assert_eq!(result.min_score, 1.0);

        assert_eq!(
            result.value(Field::FullName),
            Some(&FieldValue::Text("FRANK OTIM".to_string()))
        );
        assert_eq!(
            result.value(Field::ContractExpiryDate),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2027, 7, 31).unwrap()))
        );

        // Optional and absent: perfect score, no warning.
        assert_eq!(result.value(Field::InsuranceStatus), None);
        assert_eq!(result.score(Field::InsuranceStatus), 1.0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn every_field_appears_in_both_maps_even_on_empty_text() {
        let result = parse(&DocumentText::from_single("", false, "embedded-text"));

        assert_eq!(result.fields.len(), Field::ALL.len());
        assert_eq!(result.scores.len(), Field::ALL.len());
        assert_eq!(result.doc_type, DocType::Unknown);
        assert_eq!(result.min_score, 0.0);
    }

    #[test]
    fn ocr_sourced_fields_carry_the_recognition_penalty() {
        let doc = DocumentText::assemble(vec![
            PageText {
                number: 1,
                text: contract_body()
                    .replace("Basic Salary: 1200 AED\nTotal Salary: 1500 AED\n", ""),
                ocr: false,
                backend: "embedded-text",
            },
            PageText {
                number: 2,
                text: "Basic Salary: 1200 AED\nTotal Salary: 1500 AED".to_string(),
                ocr: true,
                backend: "page-image-ocr",
            },
        ]);

        let result = parse(&doc);
        assert!(result.ocr_used);
        assert_eq!(result.score(Field::FullName), 1.0);
        assert!((result.score(Field::BaseSalary) - 0.9).abs() < 1e-6);
        assert!((result.min_score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn job_offer_dates_are_derived_at_the_derived_score() {
        let text = "JOB OFFER\n\
             Transaction Number MB987654321AE\n\
             2. Name FRANK OTIM\n\
             Nationality UGANDAN\n\
             Date of Birth 14/04/1996\n\
             Passport Number P10474550\n\
             shall practice the profession of Launderer in the UAE\n\
             Basic Salary: 1200 AED\n\
             Total Salary: 1500 AED\n\
             Corresponding to = 16/07/2025 for a period of 2 years\n";
        let result = parse(&DocumentText::from_single(text, false, "embedded-text"));

        assert_eq!(result.doc_type, DocType::JobOffer);
        assert_eq!(
            result.value(Field::ContractStartDate),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2025, 7, 16).unwrap()))
        );
        assert_eq!(
            result.value(Field::ContractExpiryDate),
            Some(&FieldValue::Date(NaiveDate::from_ymd_opt(2027, 7, 16).unwrap()))
        );
        assert!((result.score(Field::ContractStartDate) - 0.85).abs() < 1e-6);
        assert!((result.min_score - 0.85).abs() < 1e-6);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("derived from signing date")));
    }

    #[test]
    fn missing_required_field_zeroes_the_floor_and_warns() {
        let text = contract_body().replace("Passport Number P10474550\n", "");
        let result = parse(&DocumentText::from_single(&text, false, "embedded-text"));

        assert_eq!(result.value(Field::PassportNumber), None);
        assert_eq!(result.score(Field::PassportNumber), 0.0);
        assert_eq!(result.min_score, 0.0);
        assert!(result
            .warnings
            .iter()
            .any(|w| w.contains("passport_number: no value extracted")));
    }
}
