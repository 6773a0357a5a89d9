//! Append-only log of normalizer rewrites.

use serde::{Deserialize, Serialize};

/// One accepted label rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub study_id: String,
    pub raw_label: String,
    pub canonical: String,
    pub distance: usize,
    pub sample_value: String,
}

/// Rewrite events in the order they were accepted.
///
/// Each worker owns one log; the caller concatenates them with [`AuditLog::extend`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditLog {
    records: Vec<AuditRecord>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: AuditRecord) {
        self.records.push(record);
    }

    pub fn extend(&mut self, other: AuditLog) {
        self.records.extend(other.records);
    }

    pub fn records(&self) -> &[AuditRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn for_study<'a>(&'a self, study_id: &'a str) -> impl Iterator<Item = &'a AuditRecord> {
        self.records.iter().filter(move |r| r.study_id == study_id)
    }
}

impl IntoIterator for AuditLog {
    type Item = AuditRecord;
    type IntoIter = std::vec::IntoIter<AuditRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.into_iter()
    }
}
