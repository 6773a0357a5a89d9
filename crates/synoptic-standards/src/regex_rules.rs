//! Regex-rules CSV: capture flags per canonical column.

use std::collections::BTreeMap;
use std::path::Path;

use synoptic_model::{CaptureRules, Schema};
use tracing::{debug, warn};

use crate::error::StandardsError;
use crate::table::{TableRow, parse_flag, read_table};

const FLAGS: [&str; 5] = [
    "add_anchor",
    "capture_up_to_keyword",
    "capture_up_to_line_with_separator",
    "val_on_next_line",
    "add_separator_to_col_name",
];

/// Loads capture rules. A missing file is created with one all-false row per
/// column and defaults are returned.
pub fn load_regex_rules(
    path: &Path,
    schema: &Schema,
) -> Result<BTreeMap<String, CaptureRules>, StandardsError> {
    if !path.exists() {
        warn!(path = %path.display(), "regex rules missing, writing template");
        write_template(path, schema)?;
        return Ok(BTreeMap::new());
    }

    let table = read_table(path)?;
    table.require(path, "canonical")?;
    let mut rules = BTreeMap::new();
    for row in &table.rows {
        let canonical = row.get("canonical");
        if canonical.is_empty() {
            continue;
        }
        if !schema.contains(canonical) {
            warn!(column = %canonical, row = row.number, "regex rule for unknown column ignored");
            continue;
        }
        rules.insert(canonical.to_string(), parse_rules(path, row)?);
    }
    debug!(path = %path.display(), count = rules.len(), "loaded regex rules");
    Ok(rules)
}

/// Writes loaded rules onto the schema's columns.
pub fn apply_regex_rules(schema: &mut Schema, rules: &BTreeMap<String, CaptureRules>) {
    for (column, rule) in rules {
        if let Some(target) = schema.get_mut(column) {
            target.rules = *rule;
        }
    }
}

fn parse_rules(path: &Path, row: &TableRow) -> Result<CaptureRules, StandardsError> {
    let mut values = [false; 5];
    for (slot, flag) in values.iter_mut().zip(FLAGS) {
        *slot = parse_flag(row.get(flag)).ok_or_else(|| {
            StandardsError::malformed(
                path,
                row.number,
                format!("{flag} must be a boolean, got '{}'", row.get(flag)),
            )
        })?;
    }
    Ok(CaptureRules {
        add_anchor: values[0],
        capture_up_to_keyword: values[1],
        capture_up_to_line_with_separator: values[2],
        val_on_next_line: values[3],
        add_separator_to_col_name: values[4],
    })
}

fn write_template(path: &Path, schema: &Schema) -> Result<(), StandardsError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| StandardsError::csv(path, &e))?;
    let mut header = vec!["canonical"];
    header.extend(FLAGS);
    writer
        .write_record(&header)
        .map_err(|e| StandardsError::csv(path, &e))?;
    for column in schema.columns() {
        let mut record = vec![column.canonical.as_str()];
        record.extend(std::iter::repeat_n("false", FLAGS.len()));
        writer
            .write_record(&record)
            .map_err(|e| StandardsError::csv(path, &e))?;
    }
    writer.flush().map_err(|e| StandardsError::io(path, e))
}
