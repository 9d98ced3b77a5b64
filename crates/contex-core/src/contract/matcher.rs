//! Occurrence-level field matching over assembled document text.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::trace;

use crate::models::record::{Field, FieldKind, FieldValue};
use crate::text::DocumentText;

use super::rules::FieldSpec;

/// Outcome of matching one field against one document's text. Ephemeral:
/// produced by the matcher, consumed by the scorer.
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub field: Field,

    /// Accepted value, if any rule produced one.
    pub value: Option<FieldValue>,

    /// Priority index of the rule that matched.
    pub rule_index: Option<usize>,

    /// How many occurrences the matching rule found across the full text.
    pub occurrences: usize,

    /// Whether recognized (OCR) text produced the accepted occurrence.
    pub ocr: bool,
}

impl ExtractionAttempt {
    fn miss(field: Field) -> Self {
        Self {
            field,
            value: None,
            rule_index: None,
            occurrences: 0,
            ocr: false,
        }
    }
}

/// Match one field: rules in priority order, and within a rule every
/// non-overlapping occurrence in text order. Scanning occurrences matters
/// because recognition noise often produces a corrupted value before the
/// correct one; value coercion rejects the corrupted occurrence and the
/// next one is tried without needing a rule per noise pattern.
pub fn match_field(spec: &FieldSpec, doc: &DocumentText) -> ExtractionAttempt {
    for (rule_index, rule) in spec.rules.iter().enumerate() {
        for caps in rule.regex.captures_iter(&doc.text) {
            let Some(group) = caps.get(rule.group) else {
                continue;
            };
            let raw = group.as_str().trim();

            let Some(value) = coerce(spec.field.kind(), raw) else {
                trace!(
                    "{}: rule {} occurrence {:?} rejected by coercion",
                    spec.field, rule_index, raw
                );
                continue;
            };

            return ExtractionAttempt {
                field: spec.field,
                value: Some(value),
                rule_index: Some(rule_index),
                occurrences: rule.regex.find_iter(&doc.text).count(),
                ocr: doc.ocr_at(group.start()),
            };
        }
    }

    ExtractionAttempt::miss(spec.field)
}

/// Coerce a captured string into the field's value type. Failure means the
/// occurrence is skipped, not that the parse errors.
fn coerce(kind: FieldKind, raw: &str) -> Option<FieldValue> {
    match kind {
        FieldKind::Text => (!raw.is_empty()).then(|| FieldValue::Text(raw.to_string())),
        FieldKind::Date => NaiveDate::parse_from_str(raw, "%d/%m/%Y")
            .ok()
            .map(FieldValue::Date),
        FieldKind::Amount => Decimal::from_str(raw).ok().map(FieldValue::Amount),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::contract::rules::spec_for;

    fn digital(text: &str) -> DocumentText {
        DocumentText::from_single(text, false, "test")
    }

    #[test]
    fn earlier_rule_wins_over_later_rule() {
        // Both the section-anchored rule and the "of <date>" fallback could
        // match, with different values; priority must pick the first.
        let text = "2. Name FRANK OTIM\nNationality UGANDAN\nNationality PAKISTAN of 05/08/1999";
        let attempt = match_field(spec_for(Field::Nationality), &digital(text));

        assert_eq!(attempt.value, Some(FieldValue::Text("UGANDAN".to_string())));
        assert_eq!(attempt.rule_index, Some(0));
    }

    #[test]
    fn later_rule_is_consulted_only_when_earlier_rules_miss() {
        let text = "Nationality PAKISTAN of 05/08/1999";
        let attempt = match_field(spec_for(Field::Nationality), &digital(text));

        assert_eq!(attempt.value, Some(FieldValue::Text("PAKISTAN".to_string())));
        assert_eq!(attempt.rule_index, Some(1));
    }

    #[test]
    fn corrupted_occurrence_falls_through_to_the_next_one() {
        // First "Date ..." occurrence carries an impossible date; the second
        // holds the real one. Same rule, successive occurrences.
        let text = "Date 99/13/1999 noise\nDate 29/11/1999";
        let attempt = match_field(spec_for(Field::DateOfBirth), &digital(text));

        assert_eq!(
            attempt.value,
            Some(FieldValue::Date(NaiveDate::from_ymd_opt(1999, 11, 29).unwrap()))
        );
        assert!(attempt.occurrences >= 2);
    }

    #[test]
    fn no_match_yields_null_not_error() {
        let attempt = match_field(spec_for(Field::PassportNumber), &digital("nothing here"));
        assert_eq!(attempt.value, None);
        assert_eq!(attempt.rule_index, None);
    }

    #[test]
    fn field_with_no_rules_never_matches() {
        let attempt = match_field(
            spec_for(Field::InsuranceStatus),
            &digital("insurance_status COVERED"),
        );
        assert_eq!(attempt.value, None);
    }

    #[test]
    fn match_on_recognized_page_sets_ocr_flag() {
        use crate::text::{DocumentText, PageText};

        let doc = DocumentText::assemble(vec![
            PageText {
                number: 1,
                text: "2. Name FRANK OTIM\n".to_string(),
                ocr: false,
                backend: "embedded-text",
            },
            PageText {
                number: 2,
                text: "Basic Salary: 1500 AED".to_string(),
                ocr: true,
                backend: "page-image-ocr",
            },
        ]);

        let name = match_field(spec_for(Field::FullName), &doc);
        assert!(!name.ocr);

        let salary = match_field(spec_for(Field::BaseSalary), &doc);
        assert!(salary.ocr);
        assert_eq!(
            salary.value,
            Some(FieldValue::Amount(Decimal::from_str("1500").unwrap()))
        );
    }

    #[test]
    fn amount_coercion_accepts_decimals() {
        assert_eq!(
            coerce(FieldKind::Amount, "2500.50"),
            Some(FieldValue::Amount(Decimal::from_str("2500.50").unwrap()))
        );
        assert_eq!(coerce(FieldKind::Amount, "not a number"), None);
    }
}
