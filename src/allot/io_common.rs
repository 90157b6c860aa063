// Primitives shared by the table readers and writers.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use seat_allocation::builder::parse_applicant_id;

use crate::allot::*;

/// The content of one cell of an input table.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static EMPTY_CELL: Cell = Cell::Empty;

impl Cell {
    /// The text written back in the output tables.
    pub fn to_text(&self) -> String {
        match self {
            Cell::Empty => "".to_string(),
            Cell::Text(s) => s.clone(),
            Cell::Number(f) => format_number(*f),
            Cell::DateTime(dt) => dt.format(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

/// A table with a header row, as read from a file.
#[derive(PartialEq, Debug, Clone)]
pub struct RawTable {
    pub path: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> BAllotResult<usize> {
        let idxs = get_col_index_mapping(&[name.to_string()], &self.header, &self.path)?;
        Ok(idxs[0])
    }
}

/// Rows may be shorter than the header: the missing cells are empty.
pub fn cell_at(row: &[Cell], idx: usize) -> &Cell {
    row.get(idx).unwrap_or(&EMPTY_CELL)
}

/// Given the header of a table and the names of the requested columns, finds
/// the position of each requested column.
pub fn get_col_index_mapping(
    req_col_names: &[String],
    header: &[String],
    path: &str,
) -> BAllotResult<Vec<usize>> {
    // The first occurrence wins if a name is repeated in the header.
    let mut col_names: HashMap<&str, usize> = HashMap::new();
    for (idx, name) in header.iter().enumerate() {
        col_names.entry(name.trim()).or_insert(idx);
    }

    let mut col_indexes: Vec<usize> = Vec::new();
    for cname in req_col_names {
        let idx = col_names
            .get(cname.trim())
            .context(MissingColumnSnafu {
                column: cname.clone(),
                path,
            })?;
        col_indexes.push(*idx);
    }
    Ok(col_indexes)
}

pub fn format_number(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        format!("{}", f as i64)
    } else {
        format!("{}", f)
    }
}

/// Excel serial dates count days from 1899-12-30.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() || serial < 0.0 {
        return None;
    }
    let base = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * 86_400_000.0).round() as i64;
    base.checked_add_signed(Duration::milliseconds(millis))
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d-%m-%Y %H:%M",
    "%d/%m/%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%m-%Y", "%d/%m/%Y"];

pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(dt);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Unreadable timestamps are treated as missing.
pub fn read_timestamp(cell: &Cell) -> Option<NaiveDateTime> {
    match cell {
        Cell::Empty => None,
        Cell::DateTime(dt) => Some(*dt),
        Cell::Number(f) => excel_serial_to_datetime(*f),
        Cell::Text(s) => parse_timestamp(s),
    }
}

pub fn read_applicant_id(cell: &Cell) -> ApplicantId {
    match cell {
        Cell::Empty => ApplicantId::Missing,
        Cell::Number(f) if f.fract() == 0.0 && f.abs() < 9e15 => {
            ApplicantId::Number(*f as i64, format_number(*f))
        }
        Cell::Text(s) => parse_applicant_id(s),
        c => ApplicantId::Text(c.to_text()),
    }
}

/// Blank cells are None.
pub fn read_optional_text(cell: &Cell) -> Option<String> {
    let s = cell.to_text();
    let t = s.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}
