//! SQLite employee store.
//!
//! Assigns sequential human-readable `EID-10xx` ids on first insert only;
//! re-ingesting a document for a known employee updates the existing row.
//! Deduplication key: passport number first, else MOHRE transaction number.

use std::path::Path;

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use contex_core::models::record::{ExtractionResult, Field};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS employees (
    employee_id          TEXT PRIMARY KEY,
    full_name            TEXT,
    nationality          TEXT,
    date_of_birth        TEXT,
    passport_number      TEXT UNIQUE,
    job_title            TEXT,
    base_salary          TEXT,
    total_salary         TEXT,
    contract_start_date  TEXT,
    contract_expiry_date TEXT,
    insurance_status     TEXT,
    mohre_transaction_no TEXT UNIQUE,
    source_file          TEXT,
    confidence_score     REAL,
    field_scores         TEXT,
    source_doc_type      TEXT,
    ingested_at          TEXT
);

CREATE TABLE IF NOT EXISTS eid_seq (
    seq INTEGER PRIMARY KEY AUTOINCREMENT
);
";

pub struct EmployeeStore {
    conn: Connection,
}

/// One stored employee row. `fields` holds textual values in `Field::ALL`
/// order (dates ISO, amounts as written).
pub struct EmployeeRow {
    pub employee_id: String,
    pub fields: Vec<Option<String>>,
    pub source_file: Option<String>,
    pub confidence_score: Option<f64>,
    pub doc_type: Option<String>,
    pub ingested_at: Option<String>,
}

impl EmployeeRow {
    pub fn field(&self, field: Field) -> Option<&str> {
        let index = Field::ALL.iter().position(|f| *f == field)?;
        self.fields.get(index)?.as_deref()
    }
}

impl EmployeeStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Insert or update one parsed record. Always stores regardless of
    /// confidence; review routing flags fields, it does not discard
    /// documents. Returns the employee id.
    pub fn upsert(&mut self, result: &ExtractionResult, source_file: &str) -> anyhow::Result<String> {
        let value = |field: Field| result.value(field).map(|v| v.display());
        let passport = value(Field::PassportNumber);
        let transaction = value(Field::MohreTransactionNo);
        let scores_json = serde_json::to_string(&result.scores)?;
        let now = Utc::now().to_rfc3339();

        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT employee_id FROM employees
                 WHERE passport_number = ?1 OR mohre_transaction_no = ?2",
                params![passport, transaction],
                |row| row.get(0),
            )
            .optional()?;

        let employee_id = match existing {
            Some(id) => {
                // Dedup keys are left untouched on update.
                tx.execute(
                    "UPDATE employees SET
                        full_name = ?1, nationality = ?2, date_of_birth = ?3, job_title = ?4,
                        base_salary = ?5, total_salary = ?6, contract_start_date = ?7,
                        contract_expiry_date = ?8, insurance_status = ?9,
                        source_file = ?10, confidence_score = ?11, field_scores = ?12,
                        source_doc_type = ?13, ingested_at = ?14
                     WHERE employee_id = ?15",
                    params![
                        value(Field::FullName),
                        value(Field::Nationality),
                        value(Field::DateOfBirth),
                        value(Field::JobTitle),
                        value(Field::BaseSalary),
                        value(Field::TotalSalary),
                        value(Field::ContractStartDate),
                        value(Field::ContractExpiryDate),
                        value(Field::InsuranceStatus),
                        source_file,
                        result.min_score as f64,
                        scores_json,
                        result.doc_type.as_str(),
                        now,
                        id,
                    ],
                )?;
                debug!("updated existing employee {}", id);
                id
            }
            None => {
                tx.execute("INSERT INTO eid_seq DEFAULT VALUES", [])?;
                let id = format!("EID-10{:02}", tx.last_insert_rowid());
                tx.execute(
                    "INSERT INTO employees (
                        employee_id, full_name, nationality, date_of_birth, passport_number,
                        job_title, base_salary, total_salary, contract_start_date,
                        contract_expiry_date, insurance_status, mohre_transaction_no,
                        source_file, confidence_score, field_scores, source_doc_type, ingested_at
                     ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17)",
                    params![
                        id,
                        value(Field::FullName),
                        value(Field::Nationality),
                        value(Field::DateOfBirth),
                        passport,
                        value(Field::JobTitle),
                        value(Field::BaseSalary),
                        value(Field::TotalSalary),
                        value(Field::ContractStartDate),
                        value(Field::ContractExpiryDate),
                        value(Field::InsuranceStatus),
                        transaction,
                        source_file,
                        result.min_score as f64,
                        scores_json,
                        result.doc_type.as_str(),
                        now,
                    ],
                )?;
                debug!("inserted new employee {}", id);
                id
            }
        };

        tx.commit()?;
        Ok(employee_id)
    }

    /// All employee rows, ordered by employee id.
    pub fn all(&self) -> anyhow::Result<Vec<EmployeeRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT employee_id, full_name, nationality, date_of_birth, passport_number,
                    job_title, base_salary, total_salary, contract_start_date,
                    contract_expiry_date, mohre_transaction_no, insurance_status,
                    source_file, confidence_score, source_doc_type, ingested_at
             FROM employees ORDER BY employee_id",
        )?;

        let rows = stmt.query_map([], |row| {
            let mut fields = Vec::with_capacity(Field::ALL.len());
            for i in 0..Field::ALL.len() {
                fields.push(row.get::<_, Option<String>>(1 + i)?);
            }
            Ok(EmployeeRow {
                employee_id: row.get(0)?,
                fields,
                source_file: row.get(12)?,
                confidence_score: row.get(13)?,
                doc_type: row.get(14)?,
                ingested_at: row.get(15)?,
            })
        })?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}
