//! Schema CSV loader.
//!
//! Columns: `primary`, `alternative`, `canonical`, `zero_empty`; label cells
//! are comma-separated. Optional `substitution_cost` and `max_distance`
//! override the normalizer per column.

use std::path::Path;

use synoptic_model::{AutocorrectOverride, Column, Schema};
use tracing::debug;

use crate::error::StandardsError;
use crate::table::{parse_flag, read_table, split_list};

pub fn load_schema(path: &Path) -> Result<Schema, StandardsError> {
    let table = read_table(path)?;
    for column in ["primary", "canonical"] {
        table.require(path, column)?;
    }

    let mut columns = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        let canonical = row.get("canonical");
        if canonical.is_empty() {
            return Err(StandardsError::malformed(path, row.number, "empty canonical name"));
        }
        let mut primary = split_list(row.get("primary"));
        if primary.is_empty() {
            // The canonical name doubles as the label when none is given.
            primary.push(canonical.to_string());
        }
        let zero_empty = parse_flag(row.get("zero_empty")).ok_or_else(|| {
            StandardsError::malformed(
                path,
                row.number,
                format!("zero_empty must be a boolean, got '{}'", row.get("zero_empty")),
            )
        })?;
        let autocorrect = AutocorrectOverride {
            substitution_cost: parse_count(path, row.number, row.optional("substitution_cost"))?,
            max_distance: parse_count(path, row.number, row.optional("max_distance"))?,
        };
        let mut column = Column::new(canonical, primary)
            .with_alternatives(split_list(row.get("alternative")))
            .with_zero_empty(zero_empty);
        column.autocorrect = autocorrect;
        columns.push(column);
    }

    debug!(path = %path.display(), columns = columns.len(), "loaded schema");
    Schema::new(columns).map_err(|source| StandardsError::Schema {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_count(path: &Path, row: usize, value: Option<&str>) -> Result<Option<usize>, StandardsError> {
    value
        .map(|raw| {
            raw.parse::<usize>().map_err(|_| {
                StandardsError::malformed(path, row, format!("expected a non-negative integer, got '{raw}'"))
            })
        })
        .transpose()
}
