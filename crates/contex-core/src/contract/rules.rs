//! Prioritized pattern rules for each target field.
//!
//! Rules are tried in order; earlier rules anchor on the clean digital text
//! layout, later ones recover values from reordered bilingual columns and
//! recognition noise. Rule position doubles as its priority for scoring.

use lazy_static::lazy_static;
use regex::Regex;

use crate::models::record::Field;

/// One candidate pattern for locating a field's value.
pub struct PatternRule {
    /// Compiled pattern; flags are inline (`(?i)`, `(?is)`).
    pub regex: Regex,
    /// Capture group holding the value.
    pub group: usize,
}

/// The ordered rule list for one field.
pub struct FieldSpec {
    pub field: Field,
    pub rules: Vec<PatternRule>,
}

fn rule(pattern: &str) -> PatternRule {
    PatternRule {
        regex: Regex::new(pattern).expect("static field pattern"),
        group: 1,
    }
}

lazy_static! {
    static ref SPECS: Vec<FieldSpec> = vec![
        FieldSpec {
            field: Field::FullName,
            rules: vec![
                // "2. Name FRANK ..." - recognition sometimes drops the dot.
                // [A-Z ]+ stops at newlines and Arabic characters naturally.
                rule(r"(?i)2\.?\s*Name\s+([A-Z][A-Z ]+)"),
            ],
        },
        FieldSpec {
            field: Field::Nationality,
            rules: vec![
                // Anchored to the employee section ("2. Name") so the
                // employer's "Nationality EMIRATES" line cannot match.
                rule(r"(?i)2\.?\s*Name\s+[A-Z][A-Z ]+\s+Nationality\s+([A-Z]+)"),
                // Secondary layout: employee nationality precedes their DOB
                // on one line ("Nationality PAKISTAN of 05/08/1999"); the
                // employer line never carries "of <date>".
                rule(r"(?i)Nationality\s+([A-Z]+)\s+of\s+\d{2}/\d{2}/\d{4}"),
                // Recognized text: the employee entry follows the "First
                // Party" marker; lazy DOTALL skips the noise between.
                rule(r"(?is)First Party.+?Nationality\s*([A-Z]+)"),
            ],
        },
        FieldSpec {
            field: Field::DateOfBirth,
            rules: vec![
                rule(r"(?i)Date\s+of\s+Birth\s+(\d{2}/\d{2}/\d{4})"),
                // Value immediately after a bare "Date" label.
                rule(r"(?i)\bDate\b\s+(\d{2}/\d{2}/\d{4})"),
                // DOB embedded in the nationality line.
                rule(r"(?i)Nationality\s+[A-Z]+\s+of\s+(\d{2}/\d{2}/\d{4})"),
                // Scans sometimes yield a garbled date before the real one
                // ("99/11/1999" then "29/11/1999"): capture the second.
                rule(r"(?i)(?:Date|Daret)[^\d]+\d{2}/\d{2}/\d{4}[^\d]+(\d{2}/\d{2}/\d{4})"),
                // Any DOB-adjacent label, including recognition misreads.
                rule(r"(?i)(?:Date|Daret|Birth|Birt)[^\d]+(\d{2}/\d{2}/\d{4})"),
            ],
        },
        FieldSpec {
            field: Field::PassportNumber,
            rules: vec![
                // \s* also accepts "PassportNumber" with the space dropped.
                // The employer side uses "Passport No", never "Number".
                rule(r"(?i)Passport\s*Number\s+([A-Z][0-9A-Z]{5,})"),
                // Reordered bilingual column: the value lands just before
                // the "Telephone" label.
                rule(r"(?i)([A-Z][0-9A-Z]{5,})\s+Telephone"),
            ],
        },
        FieldSpec {
            field: Field::JobTitle,
            rules: vec![
                // \s* (not \s+) accepts "Laundererin the UAE" where the
                // scan dropped the space; lazy match stops at the first
                // "in the UAE".
                rule(r"(?is)profession of\s+(.+?)\s*in the UAE"),
            ],
        },
        FieldSpec {
            field: Field::BaseSalary,
            rules: vec![rule(r"(?i)Basic Salary:\s*(\d+(?:\.\d+)?)\s*AED")],
        },
        FieldSpec {
            field: Field::TotalSalary,
            rules: vec![rule(r"(?i)Total Salary:\s*(\d+(?:\.\d+)?)\s*AED")],
        },
        FieldSpec {
            field: Field::ContractStartDate,
            rules: vec![
                rule(r"(?i)starting from\s+(\d{2}/\d{2}/\d{4})"),
                rule(r"(?i)commenc(?:ing|es?)\s+(?:on|from)\s+(\d{2}/\d{2}/\d{4})"),
                rule(r"(?i)effective\s+(?:from|on|date)\s+(\d{2}/\d{2}/\d{4})"),
                rule(r"(?i)from\s+(\d{2}/\d{2}/\d{4})\s+(?:to|until|and\s+ending)"),
                rule(r"(?i)Start\s*Date[\s:]+(\d{2}/\d{2}/\d{4})"),
                // Arabic text may sit between "term" and the date.
                rule(r"(?is)term\b.{0,80}?\bfrom\s+(\d{2}/\d{2}/\d{4})"),
            ],
        },
        FieldSpec {
            field: Field::ContractExpiryDate,
            rules: vec![
                // [^\d]* absorbs the Arabic between label and date.
                rule(r"(?i)ending on[^\d]*(\d{2}/\d{2}/\d{4})"),
                rule(r"(?i)expir(?:ing|es?|y\s*date)\s*(?:on|at|from|:)?\s*(\d{2}/\d{2}/\d{4})"),
                rule(r"(?i)(?:until|up\s+to|through|till)\s+(\d{2}/\d{2}/\d{4})"),
                // "from <start> to <expiry>" - capture the second date.
                rule(
                    r"(?i)from\s+\d{2}/\d{2}/\d{4}\s+(?:to|until|and\s+ending\s+on)\s+(\d{2}/\d{2}/\d{4})"
                ),
                rule(r"(?i)End(?:ing)?\s*Date[\s:]+(\d{2}/\d{2}/\d{4})"),
                rule(r"(?i)valid\s+(?:until|till)\s+(\d{2}/\d{2}/\d{4})"),
                rule(r"(?is)term\b.{0,80}?\bending\s+(?:on\s+)?(\d{2}/\d{2}/\d{4})"),
            ],
        },
        FieldSpec {
            field: Field::MohreTransactionNo,
            rules: vec![
                rule(r"(?i)Transaction Number\s+([A-Z0-9]+)"),
                // Arabic sits between label and value across a newline.
                rule(r"(?i)Transaction Number[^\n]*\n([A-Z0-9]+)"),
            ],
        },
        // Not present in any contract variant; populated downstream from
        // the benefits document.
        FieldSpec {
            field: Field::InsuranceStatus,
            rules: vec![],
        },
    ];
}

/// The static field specification table, one entry per target field.
pub fn field_specs() -> &'static [FieldSpec] {
    &SPECS
}

/// Spec lookup for a single field.
pub fn spec_for(field: Field) -> &'static FieldSpec {
    SPECS
        .iter()
        .find(|s| s.field == field)
        .expect("every field has a spec entry")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_field_has_a_spec() {
        for field in Field::ALL {
            assert_eq!(spec_for(field).field, field);
        }
        assert_eq!(field_specs().len(), Field::ALL.len());
    }

    #[test]
    fn full_name_pattern_tolerates_missing_dot() {
        let spec = spec_for(Field::FullName);
        let caps = spec.rules[0]
            .regex
            .captures("2 Name FRANK OTIM\nNationality UGANDAN")
            .unwrap();
        assert_eq!(caps[1].trim(), "FRANK OTIM");
    }

    #[test]
    fn passport_pattern_accepts_dropped_space() {
        let spec = spec_for(Field::PassportNumber);
        let caps = spec.rules[0].regex.captures("PassportNumber P10474550").unwrap();
        assert_eq!(&caps[1], "P10474550");
    }
}
