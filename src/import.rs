//! Bulk import of job spreadsheets.
//!
//! An upload is parsed into [`RawRow`]s (every value a string), each row is
//! normalised into a [`JobRecord`], and the resulting [`ImportRequest`] is
//! handed to a [`JobStore`]. Parsing and normalisation are pure; nothing here
//! writes anywhere except through [`submit`].

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use chrono::{NaiveDateTime, NaiveTime};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::db::JobStore;
use crate::error::{ImportError, ImportResult};
use crate::models::{CompanyId, ImportRequest, JobRecord};

/// Columns understood by the importer, in the order shown to users.
pub const EXPECTED_COLUMNS: [&str; 12] = [
    "title",
    "is_remote",
    "location",
    "department",
    "employment_type",
    "experience_level",
    "job_type",
    "salary_range",
    "job_slug",
    "posted_days_ago",
    "skills",
    "last_application_date",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv,
    Workbook,
}

impl FileFormat {
    /// Picks the parser from the declared file name's extension (case-insensitive).
    pub fn from_file_name(name: &str) -> ImportResult<Self> {
        let extension = name.rsplit('.').next().unwrap_or_default().to_lowercase();
        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv),
            "xlsx" | "xls" => Ok(FileFormat::Workbook),
            _ => Err(ImportError::UnsupportedFormat { extension }),
        }
    }
}

/// One parsed source row: column name to raw string value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, String)>,
}

impl RawRow {
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Value of `column`; with duplicate headers the rightmost column wins.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .rev()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    fn text(&self, column: &str) -> String {
        self.get(column).unwrap_or_default().to_string()
    }
}

// --- Coercions ---

/// Only the exact strings `"true"` and `"1"` count as remote.
pub fn parse_is_remote(raw: Option<&str>) -> bool {
    matches!(raw, Some("true") | Some("1"))
}

/// Numeric parse with a zero default. Negative values pass through unchanged;
/// values outside the `i64` range count as non-numeric.
pub fn parse_posted_days_ago(raw: Option<&str>) -> i64 {
    let trimmed = raw.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return 0;
    }
    if let Ok(days) = trimmed.parse::<i64>() {
        return days;
    }
    match trimmed.parse::<f64>() {
        // i64::MAX as f64 rounds up to 2^63, hence the exclusive upper bound.
        Ok(days) if days >= i64::MIN as f64 && days < i64::MAX as f64 => days.trunc() as i64,
        _ => 0,
    }
}

pub fn parse_skills(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn parse_last_application_date(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.is_empty()).map(str::to_string)
}

pub fn normalize_row(row: &RawRow, company: CompanyId) -> JobRecord {
    JobRecord {
        title: row.text("title"),
        is_remote: parse_is_remote(row.get("is_remote")),
        location: row.text("location"),
        department: row.text("department"),
        employment_type: row.text("employment_type"),
        experience_level: row.text("experience_level"),
        jobtype: row.text("job_type"),
        salary_range: row.text("salary_range"),
        job_slug: row.text("job_slug"),
        posted_days_ago: parse_posted_days_ago(row.get("posted_days_ago")),
        skills: parse_skills(row.get("skills")),
        last_application_date: parse_last_application_date(row.get("last_application_date")),
        description: String::new(),
        company_id: company,
    }
}

// --- Readers ---

/// Reads delimited text with a header row. Any malformed record aborts the read.
pub fn read_csv_rows<R: Read>(reader: R) -> ImportResult<Vec<RawRow>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ImportError::MalformedInput {
            row: 0,
            message: e.to_string(),
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = result.map_err(|e| ImportError::MalformedInput {
            row: index + 1,
            message: e.to_string(),
        })?;
        rows.push(RawRow::from_pairs(
            headers.iter().cloned().zip(record.iter().map(str::to_string)),
        ));
    }
    Ok(rows)
}

/// Reads the first sheet of an `.xlsx`/`.xls` workbook. Blank cells become `""`
/// and rows with no content at all are skipped.
pub fn read_workbook_rows<R: Read>(mut reader: R) -> ImportResult<Vec<RawRow>> {
    let mut buffer = Vec::new();
    reader.read_to_end(&mut buffer)?;

    let mut workbook =
        open_workbook_auto_from_rs(Cursor::new(buffer)).map_err(|e| ImportError::MalformedInput {
            row: 0,
            message: e.to_string(),
        })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ImportError::MalformedInput {
            row: 0,
            message: "Workbook has no sheets".to_string(),
        })?
        .map_err(|e| ImportError::MalformedInput {
            row: 0,
            message: e.to_string(),
        })?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Vec::new());
    };
    let headers: Vec<String> = header_row.iter().map(cell_to_string).collect();

    let rows = sheet_rows
        .map(|cells| cells.iter().map(cell_to_string).collect::<Vec<_>>())
        .filter(|values| values.iter().any(|v| !v.is_empty()))
        .map(|values| RawRow::from_pairs(headers.iter().cloned().zip(values)))
        .collect();
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(format_datetime)
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(_) => String::new(),
    }
}

fn format_datetime(dt: NaiveDateTime) -> String {
    if dt.time() == NaiveTime::MIN {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

// --- Pipeline ---

pub fn read_rows<R: Read>(format: FileFormat, reader: R) -> ImportResult<Vec<RawRow>> {
    match format {
        FileFormat::Csv => read_csv_rows(reader),
        FileFormat::Workbook => read_workbook_rows(reader),
    }
}

/// Parses an uploaded file and normalises every row for `company`.
///
/// `file_name` is only used for its extension, which is checked before the
/// reader is touched.
pub fn normalize_file<R: Read>(
    reader: R,
    file_name: &str,
    company: CompanyId,
) -> ImportResult<ImportRequest> {
    let format = FileFormat::from_file_name(file_name)?;
    let rows = read_rows(format, reader)?;
    Ok(ImportRequest {
        jobs: rows.iter().map(|row| normalize_row(row, company)).collect(),
    })
}

pub fn normalize_path(path: &Path, company: CompanyId) -> ImportResult<ImportRequest> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    // Reject before opening so an unsupported upload never reaches a parser.
    FileFormat::from_file_name(file_name)?;
    let file = File::open(path)?;
    normalize_file(file, file_name, company)
}

/// Hands the normalised records to the store. Store failures are surfaced
/// verbatim and never retried.
pub fn submit<S: JobStore + ?Sized>(
    store: &S,
    company: CompanyId,
    request: &ImportRequest,
) -> ImportResult<usize> {
    store
        .insert_jobs(company, &request.jobs)
        .map_err(|e| ImportError::UpstreamPersistenceFailure(format!("{:#}", e)))
}
