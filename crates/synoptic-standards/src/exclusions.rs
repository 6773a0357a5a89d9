//! Exclusion list persistence: a two-column CSV of `raw_label,canonical`.

use std::path::Path;

use synoptic_model::ExclusionSet;
use tracing::{debug, warn};

use crate::error::StandardsError;
use crate::table::read_csv_table;

/// Loads the exclusion set. A missing file is created empty.
pub fn load_exclusions(path: &Path) -> Result<ExclusionSet, StandardsError> {
    if !path.exists() {
        warn!(path = %path.display(), "exclusion list missing, creating an empty one");
        save_exclusions(path, &ExclusionSet::new())?;
        return Ok(ExclusionSet::new());
    }
    let table = read_csv_table(path)?;
    table.require(path, "raw_label")?;
    table.require(path, "canonical")?;
    let mut set = ExclusionSet::new();
    for row in &table.rows {
        let label = row.get("raw_label");
        let canonical = row.get("canonical");
        if label.is_empty() || canonical.is_empty() {
            return Err(StandardsError::malformed(
                path,
                row.number,
                "both raw_label and canonical are required",
            ));
        }
        set.insert(label, canonical);
    }
    debug!(path = %path.display(), pairs = set.len(), "loaded exclusions");
    Ok(set)
}

pub fn save_exclusions(path: &Path, set: &ExclusionSet) -> Result<(), StandardsError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| StandardsError::csv(path, &e))?;
    writer
        .write_record(["raw_label", "canonical"])
        .map_err(|e| StandardsError::csv(path, &e))?;
    for (label, canonical) in set.iter() {
        writer
            .write_record([label, canonical])
            .map_err(|e| StandardsError::csv(path, &e))?;
    }
    writer.flush().map_err(|e| StandardsError::io(path, e))
}
