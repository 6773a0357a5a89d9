#![deny(unsafe_code)]

use std::path::PathBuf;

use synoptic_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum StandardsError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {message}")]
    Csv { path: PathBuf, message: String },

    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("{path} is missing required column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("{path} row {row}: {message}")]
    MalformedRow {
        path: PathBuf,
        row: usize,
        message: String,
    },

    #[error("unsupported file type for {path} (expected .csv or .xlsx)")]
    UnsupportedFormat { path: PathBuf },

    #[error("invalid schema in {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: ModelError,
    },
}

impl StandardsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: &csv::Error) -> Self {
        Self::Csv {
            path: path.into(),
            message: source.to_string(),
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, row: usize, message: impl Into<String>) -> Self {
        Self::MalformedRow {
            path: path.into(),
            row,
            message: message.into(),
        }
    }
}
