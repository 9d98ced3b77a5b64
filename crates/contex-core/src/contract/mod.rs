//! Contract field extraction: prioritized pattern rules, occurrence-level
//! matching, confidence scoring, and review routing.

mod doctype;
mod matcher;
mod parser;
mod router;
pub mod rules;
mod scorer;

pub use doctype::{DerivedDates, detect_doc_type, derive_job_offer_dates};
pub use matcher::{ExtractionAttempt, match_field};
pub use parser::ContractParser;
pub use router::{Disposition, ReviewReport, ReviewRouter};
pub use rules::{FieldSpec, PatternRule, field_specs};
pub use scorer::ConfidenceScorer;
