use std::path::Path;

use synoptic_model::AuditLog;
use tracing::debug;

use crate::error::StandardsError;

/// Writes the rewrite log with a `study_id,raw_label,canonical,distance,sample_value` header.
pub fn save_audit(path: &Path, log: &AuditLog) -> Result<(), StandardsError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| StandardsError::csv(path, &e))?;
    if log.is_empty() {
        writer
            .write_record(["study_id", "raw_label", "canonical", "distance", "sample_value"])
            .map_err(|e| StandardsError::csv(path, &e))?;
    }
    for record in log.records() {
        writer
            .serialize(record)
            .map_err(|e| StandardsError::csv(path, &e))?;
    }
    writer.flush().map_err(|e| StandardsError::io(path, e))?;
    debug!(path = %path.display(), records = log.len(), "saved audit log");
    Ok(())
}
