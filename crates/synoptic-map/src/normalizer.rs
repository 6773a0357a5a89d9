//! Maps extracted labels onto canonical columns.

use std::collections::BTreeMap;

use rapidfuzz::distance::levenshtein;
use serde::{Deserialize, Serialize};
use synoptic_model::{AuditLog, AuditRecord, Column, ExclusionSet, Schema, Value};
use tracing::{debug, warn};

use crate::extractor::Extraction;
use crate::repair::RepairRules;

/// Edit-distance matching defaults; columns may override them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocorrectSettings {
    /// Off: generic labels are kept only when they clean to a canonical name.
    pub enabled: bool,
    pub substitution_cost: usize,
    /// Accepted distance as a fraction of the canonical name's length.
    pub relative_threshold: f32,
    pub min_distance: usize,
}

impl Default for AutocorrectSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            substitution_cost: 1,
            relative_threshold: 0.2,
            min_distance: 1,
        }
    }
}

impl AutocorrectSettings {
    pub fn substitution_cost_for(&self, column: &Column) -> usize {
        column
            .autocorrect
            .substitution_cost
            .unwrap_or(self.substitution_cost)
    }

    /// Largest accepted distance to a column's cleaned name.
    pub fn max_distance_for(&self, column: &Column) -> usize {
        if !self.enabled {
            return 0;
        }
        column.autocorrect.max_distance.unwrap_or_else(|| {
            let length = column.cleaned().chars().count() as f32;
            ((length * self.relative_threshold).round() as usize).max(self.min_distance)
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerOptions {
    pub autocorrect: AutocorrectSettings,
    /// Share of missing columns above which a report is flagged.
    pub missing_ratio: f32,
    pub repairs: RepairRules,
}

impl Default for NormalizerOptions {
    fn default() -> Self {
        Self {
            autocorrect: AutocorrectSettings::default(),
            missing_ratio: 0.95,
            repairs: RepairRules::default(),
        }
    }
}

/// Character edit distance with a configurable substitution cost.
pub fn edit_distance(left: &str, right: &str, substitution_cost: usize) -> usize {
    let weights = levenshtein::WeightTable {
        insertion_cost: 1,
        deletion_cost: 1,
        substitution_cost,
    };
    levenshtein::distance_with_args(
        left.chars(),
        right.chars(),
        &levenshtein::Args::default().weights(&weights),
    )
}

/// Canonical extractions of one report.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Normalized {
    pub extractions: BTreeMap<String, Value>,
    /// Rewrites accepted for this report.
    pub audit: AuditLog,
    /// Canonical columns with no value.
    pub missing: usize,
    /// More than the configured share of columns is missing.
    pub mostly_missing: bool,
}

/// Resolves generic labels against the columns still missing.
#[derive(Debug, Clone)]
pub struct Normalizer {
    schema: Schema,
    exclusions: ExclusionSet,
    options: NormalizerOptions,
}

impl Normalizer {
    pub fn new(schema: Schema, exclusions: ExclusionSet, options: NormalizerOptions) -> Self {
        Self {
            schema,
            exclusions,
            options,
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Nearest missing column for a cleaned label, with its distance. Ties go
    /// to the column declared first.
    pub fn nearest<'a>(
        &'a self,
        raw_label: &str,
        key: &str,
        filled: &BTreeMap<String, Value>,
    ) -> Option<(&'a Column, usize)> {
        let settings = &self.options.autocorrect;
        let mut best: Option<(&Column, usize)> = None;
        for column in self.schema.columns() {
            if filled.contains_key(&column.canonical)
                || self.exclusions.is_excluded(raw_label, &column.canonical)
            {
                continue;
            }
            let distance = edit_distance(key, &column.cleaned(), settings.substitution_cost_for(column));
            if distance > settings.max_distance_for(column) {
                continue;
            }
            if best.is_none_or(|(_, current)| distance < current) {
                best = Some((column, distance));
            }
        }
        best
    }

    pub fn normalize(&self, study_id: &str, extraction: Extraction, section: &str) -> Normalized {
        let mut extractions: BTreeMap<String, Value> = extraction
            .specific
            .into_iter()
            .filter(|(column, _)| self.schema.contains(column))
            .collect();
        let mut audit = AuditLog::new();

        for pair in extraction.generic {
            if pair.key.is_empty() {
                continue;
            }
            if let Some(target) = self.options.repairs.renamed_column(&self.schema, &pair.key)
                && !extractions.contains_key(target)
                && !self.exclusions.is_excluded(&pair.label, target)
            {
                debug!(study_id, label = %pair.label, column = target, "renamed node count label");
                extractions.insert(target.to_string(), Value::new(pair.value));
                continue;
            }
            let Some((column, distance)) = self.nearest(&pair.label, &pair.key, &extractions)
            else {
                debug!(study_id, label = %pair.label, "dropped unmatched label");
                continue;
            };
            if distance > 0 {
                audit.push(AuditRecord {
                    study_id: study_id.to_string(),
                    raw_label: pair.label.clone(),
                    canonical: column.canonical.clone(),
                    distance,
                    sample_value: pair.value.clone(),
                });
            }
            extractions.insert(column.canonical.clone(), Value::new(pair.value));
        }

        self.options
            .repairs
            .apply(&self.schema, section, &mut extractions);

        let missing = self
            .schema
            .columns()
            .iter()
            .filter(|c| extractions.get(&c.canonical).is_none_or(Value::is_empty))
            .count();
        let mostly_missing = !self.schema.is_empty()
            && missing as f32 / self.schema.len() as f32 > self.options.missing_ratio;
        if mostly_missing {
            warn!(
                study_id,
                missing,
                columns = self.schema.len(),
                "most canonical columns are missing"
            );
        }
        Normalized {
            extractions,
            audit,
            missing,
            mostly_missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitution_cost_weights_distance() {
        assert_eq!(edit_distance("grade", "grade", 1), 0);
        assert_eq!(edit_distance("grode", "grade", 1), 1);
        assert_eq!(edit_distance("grode", "grade", 2), 2);
    }

    #[test]
    fn max_distance_scales_with_length() {
        let settings = AutocorrectSettings::default();
        let short = Column::new("Size", vec!["Size".into()]);
        let long = Column::new("Closest Margin", vec!["Closest margin".into()]);
        assert_eq!(settings.max_distance_for(&short), 1);
        assert_eq!(settings.max_distance_for(&long), 3);

        let disabled = AutocorrectSettings {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(disabled.max_distance_for(&long), 0);
    }
}
