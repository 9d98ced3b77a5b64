//! Extraction record models: target fields, typed values, and the parse result.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One structured attribute targeted for extraction from a contract document.
///
/// `InsuranceStatus` is never present in the contract itself; it is populated
/// later from a separate benefits document, so it is structurally optional
/// for every document type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    FullName,
    Nationality,
    DateOfBirth,
    PassportNumber,
    JobTitle,
    BaseSalary,
    TotalSalary,
    ContractStartDate,
    ContractExpiryDate,
    MohreTransactionNo,
    InsuranceStatus,
}

impl Field {
    /// All fields, in roster column order. Every parse result carries an
    /// entry for each of these, even when the value is null.
    pub const ALL: [Field; 11] = [
        Field::FullName,
        Field::Nationality,
        Field::DateOfBirth,
        Field::PassportNumber,
        Field::JobTitle,
        Field::BaseSalary,
        Field::TotalSalary,
        Field::ContractStartDate,
        Field::ContractExpiryDate,
        Field::MohreTransactionNo,
        Field::InsuranceStatus,
    ];

    /// Snake-case name used in JSON, CSV columns, and the database schema.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FullName => "full_name",
            Field::Nationality => "nationality",
            Field::DateOfBirth => "date_of_birth",
            Field::PassportNumber => "passport_number",
            Field::JobTitle => "job_title",
            Field::BaseSalary => "base_salary",
            Field::TotalSalary => "total_salary",
            Field::ContractStartDate => "contract_start_date",
            Field::ContractExpiryDate => "contract_expiry_date",
            Field::MohreTransactionNo => "mohre_transaction_no",
            Field::InsuranceStatus => "insurance_status",
        }
    }

    /// The value type this field coerces to.
    pub fn kind(&self) -> FieldKind {
        match self {
            Field::DateOfBirth | Field::ContractStartDate | Field::ContractExpiryDate => {
                FieldKind::Date
            }
            Field::BaseSalary | Field::TotalSalary => FieldKind::Amount,
            _ => FieldKind::Text,
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Value type of a field. Coercion into this type doubles as per-occurrence
/// disambiguation: a captured string that fails to coerce is skipped and the
/// next occurrence tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Free text (uppercased names, codes, titles).
    Text,
    /// DD/MM/YYYY in the document, ISO on output.
    Date,
    /// Monetary amount in AED.
    Amount,
}

/// A typed extracted value.
///
/// Untagged, and ordered so that on deserialization a date or amount string
/// comes back typed instead of falling into the text variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Date(NaiveDate),
    Amount(Decimal),
    Text(String),
}

impl FieldValue {
    /// Render for CSV cells and terminal tables. Dates come out ISO.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            FieldValue::Amount(a) => a.to_string(),
        }
    }
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.display())
    }
}

/// Document variant, detected from header phrasing in the assembled text.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Standard MOHRE employment contract.
    EmploymentContract,
    /// Job offer letter; contract dates are derived, not stated.
    JobOffer,
    /// Neither marker found.
    #[default]
    Unknown,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::EmploymentContract => "employment_contract",
            DocType::JobOffer => "job_offer",
            DocType::Unknown => "unknown",
        }
    }
}

/// The externally visible output of one document parse.
///
/// Every `Field` variant appears in both `fields` and `scores`, value or not.
/// `min_score` is the minimum across non-optional fields - a floor, not an
/// average, so one bad field cannot hide behind nine good ones.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Field values; `None` when no rule produced an accepted occurrence.
    pub fields: BTreeMap<Field, Option<FieldValue>>,

    /// Per-field confidence scores in [0, 1].
    pub scores: BTreeMap<Field, f32>,

    /// Minimum score across fields not structurally optional for `doc_type`.
    pub min_score: f32,

    /// Whether any page required optical recognition.
    pub ocr_used: bool,

    /// Detected document variant.
    pub doc_type: DocType,

    /// Extraction warnings (fields without values, derived dates, etc.).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,

    /// Processing time in milliseconds.
    pub processing_time_ms: u64,
}

impl ExtractionResult {
    pub fn value(&self, field: Field) -> Option<&FieldValue> {
        self.fields.get(&field).and_then(|v| v.as_ref())
    }

    pub fn score(&self, field: Field) -> f32 {
        self.scores.get(&field).copied().unwrap_or(0.0)
    }
}
