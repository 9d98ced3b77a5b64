//! Review routing: per-field accept/flag decisions and the document-level
//! exception gate used by batch callers.

use std::collections::BTreeMap;

use crate::models::record::{ExtractionResult, Field};

/// Terminal disposition for one field within a single parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Score cleared the threshold; store the value as-is.
    Accepted,
    /// Below threshold; the raw value (if any) is surfaced for manual entry.
    Flagged,
}

/// Routing outcome for a whole parse result.
#[derive(Debug, Clone)]
pub struct ReviewReport {
    /// Disposition per field. Every field of the parse appears here.
    pub dispositions: BTreeMap<Field, Disposition>,

    /// Document-level gate: floor score below threshold. Policy for batch
    /// callers deciding exception-queue routing; per-field storage is not
    /// affected by it.
    pub below_document_gate: bool,
}

impl ReviewReport {
    /// Fields flagged for manual entry, in field order.
    pub fn flagged(&self) -> Vec<Field> {
        self.dispositions
            .iter()
            .filter(|(_, d)| **d == Disposition::Flagged)
            .map(|(f, _)| *f)
            .collect()
    }
}

/// Applies the configured minimum acceptable score. Routing is per-field:
/// a document is never discarded wholesale because one field is weak.
pub struct ReviewRouter {
    min_score: f32,
}

impl ReviewRouter {
    pub fn new(min_score: f32) -> Self {
        Self { min_score }
    }

    pub fn route(&self, result: &ExtractionResult) -> ReviewReport {
        let dispositions = result
            .scores
            .iter()
            .map(|(field, score)| {
                let disposition = if *score >= self.min_score {
                    Disposition::Accepted
                } else {
                    Disposition::Flagged
                };
                (*field, disposition)
            })
            .collect();

        ReviewReport {
            dispositions,
            below_document_gate: result.min_score < self.min_score,
        }
    }
}
