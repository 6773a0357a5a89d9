//! Data model for turning clinical report text into encoded rows.

#![deny(unsafe_code)]

pub mod audit;
pub mod category;
pub mod codebook;
pub mod error;
pub mod exclusion;
pub mod report;
pub mod schema;
pub mod text;

pub use audit::{AuditLog, AuditRecord};
pub use category::{CategoryTable, TnmCategory};
pub use codebook::{CodeBook, Encoding, EncodingMode, SPECIAL_CODE, transform_key};
pub use error::{ModelError, Result};
pub use exclusion::ExclusionSet;
pub use report::{Laterality, Report, ReportState, ReportType, Value};
pub use schema::{AutocorrectOverride, CaptureRules, Column, DEFAULT_THRESHOLD, Schema};

/// Code emitted for a column whose transform failed.
pub const MALFUNCTION_CODE: &str = "pipeline malfunction";

/// Compares two codes the way the baseline comparison does.
///
/// For `zero_empty` columns, `""` and `"0"` are the same value.
pub fn codes_equivalent(column: &Column, left: &str, right: &str) -> bool {
    let left = left.trim();
    let right = right.trim();
    if left == right {
        return true;
    }
    column.zero_empty && is_zero_or_empty(left) && is_zero_or_empty(right)
}

fn is_zero_or_empty(code: &str) -> bool {
    code.is_empty() || code == "0"
}
