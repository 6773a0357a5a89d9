//! Report file discovery.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IngestError, Result};

/// Which files in a directory count as reports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Lowest report number to include.
    pub start: Option<u64>,
    /// Highest report number to include.
    pub end: Option<u64>,
    /// Required ending of the file stem (e.g. `_path`).
    pub report_ending: Option<String>,
    /// Accepted file extension, without the dot.
    pub extension: String,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            report_ending: None,
            extension: "txt".to_string(),
        }
    }
}

/// A report file and the id derived from its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    pub id: String,
    pub number: u64,
    pub path: PathBuf,
}

impl ReportFile {
    pub fn read(&self) -> Result<String> {
        read_report(&self.path)
    }
}

/// Numeric prefix of a file stem: `"12_path"` gives `12`.
pub fn report_number(stem: &str) -> Option<u64> {
    let digits: String = stem.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Lists report files in `dir`, sorted by report number then file name.
pub fn discover_reports(dir: &Path, options: &DiscoveryOptions) -> Result<Vec<ReportFile>> {
    if !dir.is_dir() {
        return Err(IngestError::DirectoryNotFound {
            path: dir.to_path_buf(),
        });
    }

    let entries = std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryRead {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut files = Vec::new();
    for entry_result in entries {
        let entry = entry_result.map_err(|e| IngestError::DirectoryRead {
            path: dir.to_path_buf(),
            source: e,
        })?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let matches_extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&options.extension));
        if !matches_extension {
            continue;
        }
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if let Some(ending) = &options.report_ending
            && !stem.ends_with(ending.as_str())
        {
            continue;
        }
        let Some(number) = report_number(stem) else {
            debug!(file = %path.display(), "skipping file without a report number");
            continue;
        };
        if options.start.is_some_and(|start| number < start)
            || options.end.is_some_and(|end| number > end)
        {
            continue;
        }
        files.push(ReportFile {
            id: number.to_string(),
            number,
            path,
        });
    }

    files.sort_by(|a, b| {
        a.number
            .cmp(&b.number)
            .then_with(|| a.path.file_name().cmp(&b.path.file_name()))
    });
    Ok(files)
}

pub fn read_report(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| IngestError::ReportRead {
        path: path.to_path_buf(),
        source,
    })
}
