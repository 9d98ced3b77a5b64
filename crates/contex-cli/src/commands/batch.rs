//! Batch command - ingest a folder of contract files.
//!
//! One document's failure never aborts the batch: structural errors and
//! low-confidence parses land in the exception queue CSV, everything else is
//! upserted into the store.

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, warn};

use contex_core::contract::ContractParser;
use contex_core::models::record::{ExtractionResult, Field};

use super::process::parse_file;
use crate::store::EmployeeStore;

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Exception queue CSV for failures and low-confidence documents
    #[arg(long, default_value = "exceptions.csv")]
    exceptions_out: PathBuf,

    /// Upsert accepted records into this SQLite store
    #[arg(long)]
    store: Option<PathBuf>,

    /// Also write a per-file summary CSV
    #[arg(long)]
    summary: Option<PathBuf>,
}

/// One exception queue entry: a structural failure (error set, no result) or
/// a low-floor parse (result set, values and scores preserved for review).
struct ExceptionRow {
    source_file: String,
    result: Option<ExtractionResult>,
    error: Option<String>,
}

struct SummaryRow {
    file: String,
    status: &'static str,
    confidence: Option<f32>,
    time_ms: u64,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = super::load_config(config_path)?;
    let threshold = config.extraction.min_field_score;

    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| {
            let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
            matches!(
                ext.to_lowercase().as_str(),
                "pdf" | "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp"
            )
        })
        .collect();

    if files.is_empty() {
        anyhow::bail!("no matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    let parser = ContractParser::new(config);
    let mut store = match &args.store {
        Some(path) => Some(EmployeeStore::open(path)?),
        None => None,
    };

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut stored = 0usize;
    let mut exceptions: Vec<ExceptionRow> = Vec::new();
    let mut summary_rows: Vec<SummaryRow> = Vec::new();

    for path in &files {
        let file_start = Instant::now();
        let file_name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_string();

        match parse_file(&parser, path) {
            Ok(result) => {
                let time_ms = file_start.elapsed().as_millis() as u64;
                if result.min_score >= threshold {
                    if let Some(store) = store.as_mut() {
                        match store.upsert(&result, &path.display().to_string()) {
                            Ok(id) => debug!("stored {} as {}", file_name, id),
                            Err(e) => warn!("store failed for {}: {}", file_name, e),
                        }
                    }
                    summary_rows.push(SummaryRow {
                        file: file_name,
                        status: "accepted",
                        confidence: Some(result.min_score),
                        time_ms,
                        error: None,
                    });
                    stored += 1;
                } else {
                    debug!(
                        "{}: floor {:.2} below threshold {:.2}",
                        file_name, result.min_score, threshold
                    );
                    summary_rows.push(SummaryRow {
                        file: file_name.clone(),
                        status: "review",
                        confidence: Some(result.min_score),
                        time_ms,
                        error: None,
                    });
                    exceptions.push(ExceptionRow {
                        source_file: file_name,
                        result: Some(result),
                        error: None,
                    });
                }
            }
            Err(e) => {
                warn!("failed to process {}: {}", path.display(), e);
                summary_rows.push(SummaryRow {
                    file: file_name.clone(),
                    status: "error",
                    confidence: None,
                    time_ms: file_start.elapsed().as_millis() as u64,
                    error: Some(e.to_string()),
                });
                exceptions.push(ExceptionRow {
                    source_file: file_name,
                    result: None,
                    error: Some(e.to_string()),
                });
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Complete");

    if !exceptions.is_empty() {
        write_exceptions(&args.exceptions_out, &exceptions)?;
        println!(
            "{} {} exception(s) written to {}",
            style("!").yellow(),
            exceptions.len(),
            args.exceptions_out.display()
        );
    }

    if let Some(summary_path) = &args.summary {
        write_summary(summary_path, &summary_rows)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        files.len(),
        start.elapsed()
    );
    println!(
        "   {} accepted, {} routed to review",
        style(stored).green(),
        style(exceptions.len()).yellow()
    );

    if !exceptions.is_empty() {
        anyhow::bail!(
            "{} of {} documents need manual review",
            exceptions.len(),
            files.len()
        );
    }

    Ok(())
}

/// Columns of the exception queue CSV: source file and floor confidence,
/// every field value, per-field scores (insurance status carries no score
/// column since no contract variant states it), then the error column.
fn exception_header() -> Vec<String> {
    let mut header = vec!["source_file".to_string(), "confidence".to_string()];
    header.extend(Field::ALL.iter().map(|f| f.as_str().to_string()));
    header.extend(
        Field::ALL
            .iter()
            .filter(|f| **f != Field::InsuranceStatus)
            .map(|f| format!("score_{}", f.as_str())),
    );
    header.push("error".to_string());
    header
}

fn exception_record(row: &ExceptionRow) -> Vec<String> {
    let mut record = vec![row.source_file.clone()];

    match &row.result {
        Some(result) => {
            record.push(format!("{:.2}", result.min_score));
            record.extend(
                Field::ALL
                    .iter()
                    .map(|f| result.value(*f).map(|v| v.display()).unwrap_or_default()),
            );
            record.extend(
                Field::ALL
                    .iter()
                    .filter(|f| **f != Field::InsuranceStatus)
                    .map(|f| format!("{:.2}", result.score(*f))),
            );
        }
        None => {
            record.push("0.00".to_string());
            // Value columns plus score columns, all empty.
            let blanks = Field::ALL.len() + Field::ALL.len() - 1;
            record.extend(std::iter::repeat_n(String::new(), blanks));
        }
    }

    record.push(row.error.clone().unwrap_or_default());
    record
}

fn write_exceptions(path: &Path, rows: &[ExceptionRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(exception_header())?;
    for row in rows {
        wtr.write_record(exception_record(row))?;
    }
    wtr.flush()?;
    Ok(())
}

fn write_summary(path: &Path, rows: &[SummaryRow]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(["filename", "status", "confidence", "processing_time_ms", "error"])?;

    for row in rows {
        let confidence = row
            .confidence
            .map(|c| format!("{:.2}", c))
            .unwrap_or_default();
        let time_ms = row.time_ms.to_string();
        wtr.write_record([
            row.file.as_str(),
            row.status,
            confidence.as_str(),
            time_ms.as_str(),
            row.error.as_deref().unwrap_or(""),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use contex_core::models::record::{DocType, FieldValue};

    use super::*;

    fn low_confidence_result() -> ExtractionResult {
        let mut fields = BTreeMap::new();
        let mut scores = BTreeMap::new();
        for field in Field::ALL {
            fields.insert(field, None);
            scores.insert(field, 1.0);
        }
        fields.insert(
            Field::FullName,
            Some(FieldValue::Text("FRANK OTIM".to_string())),
        );
        scores.insert(Field::PassportNumber, 0.0);

        ExtractionResult {
            fields,
            scores,
            min_score: 0.0,
            ocr_used: false,
            doc_type: DocType::EmploymentContract,
            warnings: Vec::new(),
            processing_time_ms: 0,
        }
    }

    #[test]
    fn exception_record_width_matches_header() {
        let header = exception_header();

        let parsed = ExceptionRow {
            source_file: "contract.pdf".to_string(),
            result: Some(low_confidence_result()),
            error: None,
        };
        assert_eq!(exception_record(&parsed).len(), header.len());

        let failed = ExceptionRow {
            source_file: "broken.pdf".to_string(),
            result: None,
            error: Some("failed to parse PDF".to_string()),
        };
        assert_eq!(exception_record(&failed).len(), header.len());
    }

    #[test]
    fn exception_record_preserves_values_and_scores() {
        let row = ExceptionRow {
            source_file: "contract.pdf".to_string(),
            result: Some(low_confidence_result()),
            error: None,
        };
        let record = exception_record(&row);
        let header = exception_header();

        let name_col = header.iter().position(|h| h == "full_name").unwrap();
        assert_eq!(record[name_col], "FRANK OTIM");

        let score_col = header
            .iter()
            .position(|h| h == "score_passport_number")
            .unwrap();
        assert_eq!(record[score_col], "0.00");
    }

    #[test]
    fn insurance_status_has_no_score_column() {
        let header = exception_header();
        assert!(header.contains(&"insurance_status".to_string()));
        assert!(!header.contains(&"score_insurance_status".to_string()));
    }
}
