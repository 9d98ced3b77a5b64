//! Process command - extract fields from a single contract file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use tracing::info;

use contex_core::contract::{ContractParser, ReviewRouter};
use contex_core::error::{ContexError, ExtractionError};
use contex_core::models::record::{ExtractionResult, Field};

use crate::store::EmployeeStore;

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Upsert the parsed record into this SQLite store
    #[arg(long)]
    store: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Per-field value/score table
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("input file not found: {}", args.input.display());
    }

    info!("processing {}", args.input.display());

    let threshold = config.extraction.min_field_score;
    let parser = ContractParser::new(config);
    let result = parse_file(&parser, &args.input)?;

    let output = format_result(&result, args.format)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &output)?;
            println!(
                "{} Output written to {}",
                style("✓").green(),
                path.display()
            );
        }
        None => println!("{}", output),
    }

    if let Some(db) = &args.store {
        let mut store = EmployeeStore::open(db)?;
        let employee_id = store.upsert(&result, &args.input.display().to_string())?;
        println!("{} Stored as {}", style("✓").green(), employee_id);
    }

    let report = ReviewRouter::new(threshold).route(&result);
    let flagged = report.flagged();
    if !flagged.is_empty() {
        println!();
        println!("{}", style("Fields needing manual review:").yellow());
        for field in &flagged {
            println!("  - {} ({:.2})", field, result.score(*field));
        }
    }

    if report.below_document_gate {
        anyhow::bail!(
            "confidence floor {:.2} is below threshold {:.2}; routed to manual review",
            result.min_score,
            threshold
        );
    }

    Ok(())
}

/// Parse one input file, dispatching on extension. Shared with batch.
pub(crate) fn parse_file(parser: &ContractParser, path: &Path) -> anyhow::Result<ExtractionResult> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match extension.as_str() {
        "pdf" => {
            let data = fs::read(path)?;
            Ok(parser.parse_bytes(&data)?)
        }
        "png" | "jpg" | "jpeg" | "tiff" | "tif" | "bmp" => {
            let image = image::open(path)?;
            Ok(parser.parse_image(&image)?)
        }
        _ => Err(ContexError::from(ExtractionError::UnsupportedFormat(extension)).into()),
    }
}

pub(crate) fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => format_csv(result),
        OutputFormat::Text => Ok(format_text(result)),
    }
}

fn format_csv(result: &ExtractionResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = vec!["doc_type".to_string(), "confidence".to_string()];
    header.extend(Field::ALL.iter().map(|f| f.as_str().to_string()));
    header.extend(Field::ALL.iter().map(|f| format!("score_{}", f.as_str())));
    wtr.write_record(&header)?;

    let mut row = vec![
        result.doc_type.as_str().to_string(),
        format!("{:.2}", result.min_score),
    ];
    row.extend(
        Field::ALL
            .iter()
            .map(|f| result.value(*f).map(|v| v.display()).unwrap_or_default()),
    );
    row.extend(Field::ALL.iter().map(|f| format!("{:.2}", result.score(*f))));
    wtr.write_record(&row)?;

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn format_text(result: &ExtractionResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("Document type:    {}\n", result.doc_type.as_str()));
    out.push_str(&format!("Confidence floor: {:.2}\n", result.min_score));
    if result.ocr_used {
        out.push_str("Recognition (OCR) was used\n");
    }
    out.push('\n');

    for field in Field::ALL {
        let value = result
            .value(field)
            .map(|v| v.display())
            .unwrap_or_else(|| "-".to_string());
        out.push_str(&format!(
            "  {:<22} {:<28} {:.2}\n",
            field.as_str(),
            value,
            result.score(field)
        ));
    }

    if !result.warnings.is_empty() {
        out.push('\n');
        for warning in &result.warnings {
            out.push_str(&format!("  ! {}\n", warning));
        }
    }

    out
}
