//! Run outputs: one CSV row per report, plus the rewrite audit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use synoptic_model::{AuditLog, Report};
use synoptic_standards::save_audit;
use tracing::info;

/// Timestamp shared by the files of one run.
pub fn run_stamp(at: DateTime<Local>) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}

/// Paths written by one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub raw: PathBuf,
    pub coded: PathBuf,
    pub audit: PathBuf,
}

impl OutputPaths {
    pub fn new(dir: &Path, stamp: &str) -> Self {
        Self {
            raw: dir.join(format!("raw_{stamp}.csv")),
            coded: dir.join(format!("coded_{stamp}.csv")),
            audit: dir.join(format!("audit_{stamp}.csv")),
        }
    }
}

/// Which map of a report a table shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sheet {
    /// Primary text of each extracted value.
    Raw,
    /// Code of each column.
    Coded,
}

fn cell<'a>(report: &'a Report, column: &str, sheet: Sheet) -> &'a str {
    match sheet {
        Sheet::Raw => report
            .extractions()
            .get(column)
            .map_or("", |value| value.primary.as_str()),
        Sheet::Coded => report.encoded().get(column).map_or("", String::as_str),
    }
}

/// Writes `report_id` followed by the columns in schema order.
pub fn write_table(path: &Path, columns: &[&str], reports: &[Report], sheet: Sheet) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    let mut header = Vec::with_capacity(columns.len() + 1);
    header.push("report_id");
    header.extend_from_slice(columns);
    writer
        .write_record(&header)
        .with_context(|| format!("write header of {}", path.display()))?;
    for report in reports {
        let mut row = Vec::with_capacity(columns.len() + 1);
        row.push(report.id());
        row.extend(columns.iter().map(|column| cell(report, column, sheet)));
        writer
            .write_record(&row)
            .with_context(|| format!("write row {} of {}", report.id(), path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("flush {}", path.display()))?;
    Ok(())
}

/// Writes the raw, coded and audit files of a run.
pub fn write_outputs(
    paths: &OutputPaths,
    columns: &[&str],
    reports: &[Report],
    audit: &AuditLog,
) -> Result<()> {
    write_table(&paths.raw, columns, reports, Sheet::Raw)?;
    write_table(&paths.coded, columns, reports, Sheet::Coded)?;
    save_audit(&paths.audit, audit)
        .with_context(|| format!("write audit {}", paths.audit.display()))?;
    info!(
        raw = %paths.raw.display(),
        coded = %paths.coded.display(),
        rows = reports.len(),
        "outputs written"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn stamp_names_every_file() {
        let at = Local.with_ymd_and_hms(2026, 3, 7, 14, 5, 9).unwrap();
        let stamp = run_stamp(at);
        assert_eq!(stamp, "20260307_140509");
        let paths = OutputPaths::new(Path::new("out"), &stamp);
        assert_eq!(paths.raw, Path::new("out/raw_20260307_140509.csv"));
        assert_eq!(paths.coded, Path::new("out/coded_20260307_140509.csv"));
        assert_eq!(paths.audit, Path::new("out/audit_20260307_140509.csv"));
    }
}
