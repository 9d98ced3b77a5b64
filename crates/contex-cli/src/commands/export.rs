//! Export command - employee roster CSV with expiry tracking.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use clap::Args;
use console::style;

use contex_core::models::record::Field;

use crate::store::{EmployeeRow, EmployeeStore};

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// SQLite store to export from
    #[arg(long, default_value = "contex.db")]
    store: PathBuf,

    /// Output CSV path
    #[arg(short, long, default_value = "employees.csv")]
    out: PathBuf,

    /// Flag contracts expiring within this many days
    #[arg(long, default_value = "30")]
    warning_days: i64,
}

pub async fn run(args: ExportArgs) -> anyhow::Result<()> {
    if !args.store.exists() {
        anyhow::bail!("store not found: {}", args.store.display());
    }

    let store = EmployeeStore::open(&args.store)?;
    let rows = store.all()?;
    let today = Local::now().date_naive();

    write_roster(&args.out, &rows, today, args.warning_days)?;

    println!(
        "{} Exported {} employee(s) to {}",
        style("✓").green(),
        rows.len(),
        args.out.display()
    );

    Ok(())
}

fn write_roster(
    path: &Path,
    rows: &[EmployeeRow],
    today: NaiveDate,
    warning_days: i64,
) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    let mut header = vec!["employee_id".to_string()];
    header.extend(Field::ALL.iter().map(|f| f.as_str().to_string()));
    header.extend(
        [
            "source_file",
            "confidence_score",
            "source_doc_type",
            "ingested_at",
            "days_until_expiry",
            "expiry_flag",
        ]
        .map(String::from),
    );
    wtr.write_record(&header)?;

    for row in rows {
        let (days, flag) = expiry_columns(row.field(Field::ContractExpiryDate), today, warning_days);

        let mut record = vec![row.employee_id.clone()];
        record.extend(
            Field::ALL
                .iter()
                .map(|f| row.field(*f).unwrap_or_default().to_string()),
        );
        record.push(row.source_file.clone().unwrap_or_default());
        record.push(
            row.confidence_score
                .map(|c| format!("{:.2}", c))
                .unwrap_or_default(),
        );
        record.push(row.doc_type.clone().unwrap_or_default());
        record.push(row.ingested_at.clone().unwrap_or_default());
        record.push(days);
        record.push(flag);

        wtr.write_record(&record)?;
    }

    wtr.flush()?;
    Ok(())
}

/// `days_until_expiry` and `expiry_flag` computed at export time. An
/// unparseable or missing expiry date leaves the day count empty and the
/// flag false.
fn expiry_columns(expiry: Option<&str>, today: NaiveDate, warning_days: i64) -> (String, String) {
    let days = expiry
        .and_then(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d").ok())
        .map(|d| (d - today).num_days());

    match days {
        Some(days) => (days.to_string(), (days < warning_days).to_string()),
        None => (String::new(), "false".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn expiry_inside_the_window_is_flagged() {
        let (days, flag) = expiry_columns(Some("2026-09-10"), day(2026, 8, 25), 30);
        assert_eq!(days, "16");
        assert_eq!(flag, "true");
    }

    #[test]
    fn expiry_outside_the_window_is_not_flagged() {
        let (days, flag) = expiry_columns(Some("2027-08-25"), day(2026, 8, 25), 30);
        assert_eq!(days, "365");
        assert_eq!(flag, "false");
    }

    #[test]
    fn already_expired_contract_is_flagged() {
        let (days, flag) = expiry_columns(Some("2026-08-01"), day(2026, 8, 25), 30);
        assert_eq!(days, "-24");
        assert_eq!(flag, "true");
    }

    #[test]
    fn missing_or_garbled_expiry_is_never_flagged() {
        assert_eq!(
            expiry_columns(None, day(2026, 8, 25), 30),
            (String::new(), "false".to_string())
        );
        assert_eq!(
            expiry_columns(Some("not a date"), day(2026, 8, 25), 30),
            (String::new(), "false".to_string())
        );
    }
}
