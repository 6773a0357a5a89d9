//! Shared tabular reader for CSV and XLSX inputs.

use std::collections::BTreeMap;
use std::path::Path;

use calamine::{Reader, Xlsx, XlsxError, open_workbook};
use csv::ReaderBuilder;

use crate::error::StandardsError;

/// One data row keyed by lowercased header, with its 1-based file row number.
#[derive(Debug, Clone)]
pub struct TableRow {
    pub number: usize,
    cells: BTreeMap<String, String>,
}

impl TableRow {
    /// Trimmed cell value, empty when the column is absent.
    pub fn get(&self, key: &str) -> &str {
        self.cells
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn optional(&self, key: &str) -> Option<&str> {
        Some(self.get(key)).filter(|v| !v.is_empty())
    }
}

/// Rows of a sheet plus the lowercased headers seen.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<TableRow>,
}

impl Table {
    pub fn require(&self, path: &Path, column: &str) -> Result<(), StandardsError> {
        if self.headers.iter().any(|h| h == column) {
            Ok(())
        } else {
            Err(StandardsError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })
        }
    }
}

/// Reads a `.csv` or the first sheet of an `.xlsx` file.
pub fn read_table(path: &Path) -> Result<Table, StandardsError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("csv") => read_csv_table(path),
        Some("xlsx" | "xlsm") => read_xlsx_table(path),
        _ => Err(StandardsError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

/// Reads a CSV file. Handles BOM characters and trims values.
pub fn read_csv_table(path: &Path) -> Result<Table, StandardsError> {
    let bytes = std::fs::read(path).map_err(|e| StandardsError::io(path, e))?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes.as_slice());
    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| StandardsError::csv(path, &e))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| StandardsError::csv(path, &e))?;
        let cells = zip_cells(&headers, record.iter().map(str::to_string));
        if cells.values().all(String::is_empty) {
            continue;
        }
        // Header is row 1.
        rows.push(TableRow {
            number: idx + 2,
            cells,
        });
    }
    Ok(Table { headers, rows })
}

fn read_xlsx_table(path: &Path) -> Result<Table, StandardsError> {
    let workbook_error = |message: String| StandardsError::Workbook {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook: Xlsx<_> =
        open_workbook(path).map_err(|e: XlsxError| workbook_error(e.to_string()))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Table::default());
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| workbook_error(e.to_string()))?;

    let mut sheet_rows = range.rows();
    let Some(header_row) = sheet_rows.next() else {
        return Ok(Table::default());
    };
    let headers: Vec<String> = header_row
        .iter()
        .map(|cell| normalize_header(&cell.to_string()))
        .collect();

    let mut rows = Vec::new();
    for (idx, row) in sheet_rows.enumerate() {
        let cells = zip_cells(&headers, row.iter().map(|cell| cell.to_string()));
        if cells.values().all(String::is_empty) {
            continue;
        }
        rows.push(TableRow {
            number: idx + 2,
            cells,
        });
    }
    Ok(Table { headers, rows })
}

fn normalize_header(raw: &str) -> String {
    raw.trim_matches('\u{feff}').trim().to_ascii_lowercase()
}

fn zip_cells(headers: &[String], values: impl Iterator<Item = String>) -> BTreeMap<String, String> {
    headers
        .iter()
        .cloned()
        .zip(values.map(|v| v.trim().to_string()))
        .collect()
}

/// Splits a comma-separated label cell, dropping empty entries.
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Parses a boolean cell. Empty means `false`.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "0" | "false" | "no" | "n" | "f" => Some(false),
        "1" | "true" | "yes" | "y" | "t" => Some(true),
        _ => None,
    }
}
