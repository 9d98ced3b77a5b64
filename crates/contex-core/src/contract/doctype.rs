//! Document variant detection and job-offer date derivation.

use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;

use crate::models::record::DocType;

lazy_static! {
    static ref EMPLOYMENT_CONTRACT: Regex = Regex::new(r"(?i)EMPLOYMENT CONTRACT").unwrap();
    static ref JOB_OFFER: Regex = Regex::new(r"(?i)JOB OFFER").unwrap();

    // Signing date; the scan sometimes merges "Correspondingto".
    static ref SIGNING_DATE: Regex =
        Regex::new(r"(?i)Corresponding\s*to\s*[=:]?\s*(\d{2}/\d{2}/\d{4})").unwrap();

    // Contract duration, numeric or spelled out.
    static ref DURATION_NUMERIC: Regex =
        Regex::new(r"(?i)for\s+a\s+period\s+of\s+(\d+)\s+[Yy]ear").unwrap();
    static ref DURATION_WORD: Regex =
        Regex::new(r"(?i)for\s+a\s+period\s+of\s+(one|two|three|four|five)\s+[Yy]ear").unwrap();
}

/// Detect the document variant from header phrasing.
pub fn detect_doc_type(text: &str) -> DocType {
    if EMPLOYMENT_CONTRACT.is_match(text) {
        DocType::EmploymentContract
    } else if JOB_OFFER.is_match(text) {
        DocType::JobOffer
    } else {
        DocType::Unknown
    }
}

/// Dates derived from a job offer rather than matched from contract
/// phrasing. Derived values carry the policy's derived score, not 1.0.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedDates {
    pub start: Option<NaiveDate>,
    pub expiry: Option<NaiveDate>,
}

/// Derive start and expiry for the job offer format:
/// start = signing date, expiry = start + stated duration in years.
pub fn derive_job_offer_dates(text: &str) -> DerivedDates {
    let start = SIGNING_DATE
        .captures_iter(text)
        .find_map(|caps| NaiveDate::parse_from_str(&caps[1], "%d/%m/%Y").ok());

    let Some(start) = start else {
        return DerivedDates::default();
    };

    let years = DURATION_NUMERIC
        .captures(text)
        .and_then(|caps| caps[1].parse::<i32>().ok())
        .or_else(|| DURATION_WORD.captures(text).map(|caps| word_years(&caps[1])))
        .filter(|&y| y > 0);

    let expiry = years.and_then(|y| add_years(start, y));

    DerivedDates {
        start: Some(start),
        expiry,
    }
}

fn word_years(word: &str) -> i32 {
    match word.to_lowercase().as_str() {
        "one" => 1,
        "two" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        _ => 0,
    }
}

/// Add whole years, clamping Feb 29 to Feb 28 on non-leap targets.
fn add_years(date: NaiveDate, years: i32) -> Option<NaiveDate> {
    use chrono::Datelike;
    NaiveDate::from_ymd_opt(date.year() + years, date.month(), date.day())
        .or_else(|| NaiveDate::from_ymd_opt(date.year() + years, date.month(), 28))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_employment_contract() {
        assert_eq!(
            detect_doc_type("STANDARD EMPLOYMENT CONTRACT\n..."),
            DocType::EmploymentContract
        );
        assert_eq!(detect_doc_type("JOB OFFER\n..."), DocType::JobOffer);
        assert_eq!(detect_doc_type("unrelated text"), DocType::Unknown);
    }

    #[test]
    fn derives_start_and_expiry_from_signing_date_and_duration() {
        let text = "Corresponding to = 16/07/2025 ... for a period of 2 years";
        let derived = derive_job_offer_dates(text);

        assert_eq!(derived.start, NaiveDate::from_ymd_opt(2025, 7, 16));
        assert_eq!(derived.expiry, NaiveDate::from_ymd_opt(2027, 7, 16));
    }

    #[test]
    fn spelled_out_duration_works() {
        let text = "Correspondingto: 01/01/2024 for a period of Two Years";
        let derived = derive_job_offer_dates(text);

        assert_eq!(derived.start, NaiveDate::from_ymd_opt(2024, 1, 1));
        assert_eq!(derived.expiry, NaiveDate::from_ymd_opt(2026, 1, 1));
    }

    #[test]
    fn missing_duration_yields_start_only() {
        let derived = derive_job_offer_dates("Corresponding to = 16/07/2025");
        assert!(derived.start.is_some());
        assert!(derived.expiry.is_none());
    }

    #[test]
    fn leap_day_clamps_on_non_leap_target() {
        let start = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        assert_eq!(add_years(start, 1), NaiveDate::from_ymd_opt(2025, 2, 28));
    }

    #[test]
    fn no_signing_date_derives_nothing() {
        assert_eq!(derive_job_offer_dates("no dates at all"), DerivedDates::default());
    }
}
