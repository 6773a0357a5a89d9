//! Per-column similarity thresholds (`column`, `threshold`).

use std::collections::BTreeMap;
use std::path::Path;

use synoptic_model::Schema;
use tracing::{info, warn};

use crate::error::StandardsError;
use crate::table::read_table;

/// Loads thresholds. A missing file yields an empty map and a CSV template
/// beside the expected path; absent columns keep the default.
pub fn load_thresholds(path: &Path, schema: &Schema) -> Result<BTreeMap<String, f32>, StandardsError> {
    if !path.exists() {
        let template = path.with_extension("csv");
        warn!(
            path = %path.display(),
            template = %template.display(),
            "threshold file missing, using defaults"
        );
        if !template.exists() {
            write_template(&template, schema)?;
        }
        return Ok(BTreeMap::new());
    }

    let table = read_table(path)?;
    table.require(path, "column")?;
    table.require(path, "threshold")?;

    let mut thresholds = BTreeMap::new();
    for row in &table.rows {
        let column = row.get("column");
        let raw = row.get("threshold");
        if column.is_empty() || raw.is_empty() {
            continue;
        }
        let value: f32 = raw.parse().map_err(|_| {
            StandardsError::malformed(path, row.number, format!("threshold '{raw}' is not a number"))
        })?;
        if !(0.0..=1.0).contains(&value) {
            return Err(StandardsError::malformed(
                path,
                row.number,
                format!("threshold {value} is outside [0, 1]"),
            ));
        }
        thresholds.insert(column.to_string(), value);
    }
    info!(path = %path.display(), count = thresholds.len(), "loaded thresholds");
    Ok(thresholds)
}

/// Writes loaded thresholds onto the schema's columns.
pub fn apply_thresholds(schema: &mut Schema, thresholds: &BTreeMap<String, f32>) {
    for (column, threshold) in thresholds {
        match schema.get_mut(column) {
            Some(target) => target.threshold = *threshold,
            None => warn!(column = %column, "threshold for unknown column ignored"),
        }
    }
}

fn write_template(path: &Path, schema: &Schema) -> Result<(), StandardsError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| StandardsError::csv(path, &e))?;
    writer
        .write_record(["column", "threshold"])
        .map_err(|e| StandardsError::csv(path, &e))?;
    for column in schema.columns() {
        writer
            .write_record([column.canonical.as_str(), &column.threshold.to_string()])
            .map_err(|e| StandardsError::csv(path, &e))?;
    }
    writer.flush().map_err(|e| StandardsError::io(path, e))
}
