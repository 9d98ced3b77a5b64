//! Per-field confidence scoring and the document floor score.

use std::collections::BTreeMap;

use crate::models::config::ScorePolicy;
use crate::models::record::Field;

use super::matcher::ExtractionAttempt;

/// Maps extraction attempts to scores in [0, 1] using the policy table.
/// Pure: the same attempt and policy always produce the same score.
pub struct ConfidenceScorer<'a> {
    policy: &'a ScorePolicy,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(policy: &'a ScorePolicy) -> Self {
        Self { policy }
    }

    /// Score one attempt. `optional` marks fields structurally absent by
    /// design for the document type at hand.
    pub fn score(&self, attempt: &ExtractionAttempt, optional: bool) -> f32 {
        match (&attempt.value, attempt.rule_index) {
            // Absent where absence is expected: correct, not a failure.
            (None, _) if optional => 1.0,
            // Absent where a value is expected.
            (None, _) => 0.0,
            (Some(_), Some(rule_index)) => {
                let mut score = 1.0 - self.policy.rule_penalty(rule_index);
                if attempt.ocr {
                    score -= self.policy.ocr_penalty;
                }
                score.clamp(0.0, 1.0)
            }
            // A value without a rule index cannot come from the matcher.
            (Some(_), None) => self.policy.derived_score,
        }
    }

    /// Score for a value derived rather than matched (job-offer dates).
    pub fn derived_score(&self) -> f32 {
        self.policy.derived_score
    }
}

/// The document floor score: minimum over non-optional per-field scores.
/// A floor, not an average, so one bad field cannot be masked.
pub fn floor_score(scores: &BTreeMap<Field, f32>, optional: &[Field]) -> f32 {
    scores
        .iter()
        .filter(|(field, _)| !optional.contains(field))
        .map(|(_, score)| *score)
        .fold(f32::INFINITY, f32::min)
        .min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::record::FieldValue;

    fn attempt(field: Field, value: Option<FieldValue>, rule: Option<usize>, ocr: bool) -> ExtractionAttempt {
        ExtractionAttempt {
            field,
            value,
            rule_index: rule,
            occurrences: usize::from(rule.is_some()),
            ocr,
        }
    }

    fn text(v: &str) -> Option<FieldValue> {
        Some(FieldValue::Text(v.to_string()))
    }

    #[test]
    fn optional_absent_scores_exactly_one() {
        let policy = ScorePolicy::default();
        let scorer = ConfidenceScorer::new(&policy);
        let a = attempt(Field::InsuranceStatus, None, None, false);
        assert_eq!(scorer.score(&a, true), 1.0);
    }

    #[test]
    fn required_absent_scores_exactly_zero() {
        let policy = ScorePolicy::default();
        let scorer = ConfidenceScorer::new(&policy);
        let a = attempt(Field::FullName, None, None, false);
        assert_eq!(scorer.score(&a, false), 0.0);
    }

    #[test]
    fn primary_rule_digital_match_scores_one() {
        let policy = ScorePolicy::default();
        let scorer = ConfidenceScorer::new(&policy);
        let a = attempt(Field::FullName, text("FRANK"), Some(0), false);
        assert_eq!(scorer.score(&a, false), 1.0);
    }

    #[test]
    fn later_rules_and_ocr_both_cost_confidence() {
        let policy = ScorePolicy::default();
        let scorer = ConfidenceScorer::new(&policy);

        let primary = scorer.score(&attempt(Field::Nationality, text("UGANDAN"), Some(0), false), false);
        let fallback = scorer.score(&attempt(Field::Nationality, text("UGANDAN"), Some(2), false), false);
        let fallback_ocr = scorer.score(&attempt(Field::Nationality, text("UGANDAN"), Some(2), true), false);

        assert!(primary > fallback);
        assert!(fallback > fallback_ocr);
        assert!(fallback_ocr > 0.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let policy = ScorePolicy::default();
        let scorer = ConfidenceScorer::new(&policy);
        let a = attempt(Field::JobTitle, text("LAUNDERER"), Some(0), true);
        assert_eq!(scorer.score(&a, false), scorer.score(&a, false));
    }

    #[test]
    fn floor_is_the_minimum_not_the_average() {
        let mut scores = BTreeMap::new();
        scores.insert(Field::FullName, 1.0);
        scores.insert(Field::Nationality, 1.0);
        scores.insert(Field::DateOfBirth, 0.1);
        scores.insert(Field::PassportNumber, 1.0);
        scores.insert(Field::InsuranceStatus, 1.0);

        let floor = floor_score(&scores, &[Field::InsuranceStatus]);
        assert!((floor - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn optional_fields_do_not_drag_the_floor() {
        let mut scores = BTreeMap::new();
        scores.insert(Field::FullName, 1.0);
        scores.insert(Field::InsuranceStatus, 0.0);

        let floor = floor_score(&scores, &[Field::InsuranceStatus]);
        assert_eq!(floor, 1.0);
    }
}
