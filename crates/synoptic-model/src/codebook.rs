//! Code book: per-column synonym sets mapped to discrete codes.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::schema::Schema;
use crate::text::clean_text;

/// Sentinel code for dependency and computed encodings.
pub const SPECIAL_CODE: i64 = -1;

/// One `(synonyms, code)` entry of a column's encoding list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encoding {
    pub synonyms: Vec<String>,
    pub code: i64,
    /// Row of the code-book file the entry came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<usize>,
}

impl Encoding {
    pub fn new(synonyms: Vec<String>, code: i64) -> Self {
        Self {
            synonyms,
            code,
            row: None,
        }
    }

    #[must_use]
    pub fn with_row(mut self, row: usize) -> Self {
        self.row = Some(row);
        self
    }

    pub fn is_special(&self) -> bool {
        self.code == SPECIAL_CODE
    }

    /// First synonym, which names the target of a `-1` encoding.
    pub fn target(&self) -> Option<&str> {
        self.synonyms
            .first()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }
}

/// How a column is encoded, resolved once at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EncodingMode {
    /// Similarity lookup over the column's encoding list.
    Lookup,
    /// `0` iff the named column is empty or `0`, else `1`.
    Dependency { column: String },
    /// Value produced by a registered transform.
    Computed { transform: String },
}

/// Ordered encoding lists keyed by canonical column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeBook {
    entries: BTreeMap<String, Vec<Encoding>>,
    modes: BTreeMap<String, EncodingMode>,
}

impl CodeBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an encoding to a column's list, keeping declaration order.
    pub fn push(&mut self, column: impl Into<String>, encoding: Encoding) {
        self.entries.entry(column.into()).or_default().push(encoding);
    }

    pub fn encodings(&self, column: &str) -> &[Encoding] {
        self.entries.get(column).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn mode(&self, column: &str) -> &EncodingMode {
        self.modes.get(column).unwrap_or(&EncodingMode::Lookup)
    }

    /// Checks every column against the schema and classifies `-1` entries.
    ///
    /// A `-1` entry must name an existing canonical column or a registered
    /// transform, never both.
    pub fn resolve(&mut self, schema: &Schema, transforms: &BTreeSet<String>) -> Result<()> {
        let mut modes = BTreeMap::new();
        for (column, encodings) in &self.entries {
            if !schema.contains(column) {
                return Err(ModelError::UnknownColumn {
                    column: column.clone(),
                    row: encodings.first().and_then(|e| e.row),
                });
            }
            let Some(special) = encodings.iter().find(|e| e.is_special()) else {
                modes.insert(column.clone(), EncodingMode::Lookup);
                continue;
            };
            let target = special.target().unwrap_or_default().to_string();
            let as_column = schema.find_cleaned(&target).map(|c| c.canonical.clone());
            let transform_key = transform_key(&target);
            let as_transform = transforms.contains(&transform_key);
            let mode = match (as_column, as_transform) {
                (Some(_), true) => {
                    return Err(ModelError::AmbiguousSpecialCode {
                        column: column.clone(),
                        target,
                        row: special.row,
                    });
                }
                (Some(dependency), false) => EncodingMode::Dependency { column: dependency },
                (None, true) => EncodingMode::Computed {
                    transform: transform_key,
                },
                (None, false) => {
                    return Err(ModelError::UnresolvedSpecialCode {
                        column: column.clone(),
                        target,
                        row: special.row,
                    });
                }
            };
            modes.insert(column.clone(), mode);
        }
        self.modes = modes;
        Ok(())
    }
}

/// Registry key for a transform name: cleaned, with spaces as underscores.
pub fn transform_key(name: &str) -> String {
    clean_text(&name.replace(['_', '-'], " ")).replace(' ', "_")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Column;

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("Reconstruction", vec!["Reconstruction".into()]),
            Column::new("Reconstruction Done", vec!["Reconstruction done".into()]),
            Column::new("Nottingham Score", vec!["Nottingham score".into()]),
        ])
        .unwrap()
    }

    #[test]
    fn classifies_dependency_and_computed() {
        let mut book = CodeBook::new();
        book.push(
            "Reconstruction Done",
            Encoding::new(vec!["reconstruction".into()], SPECIAL_CODE),
        );
        book.push(
            "Nottingham Score",
            Encoding::new(vec!["nottingham_score".into()], SPECIAL_CODE),
        );
        let transforms = BTreeSet::from(["nottingham_score".to_string()]);
        book.resolve(&schema(), &transforms).unwrap();

        assert_eq!(
            book.mode("Reconstruction Done"),
            &EncodingMode::Dependency {
                column: "Reconstruction".to_string()
            }
        );
        assert_eq!(
            book.mode("Nottingham Score"),
            &EncodingMode::Computed {
                transform: "nottingham_score".to_string()
            }
        );
        assert_eq!(book.mode("Reconstruction"), &EncodingMode::Lookup);
    }

    #[test]
    fn rejects_unresolved_target() {
        let mut book = CodeBook::new();
        book.push(
            "Reconstruction Done",
            Encoding::new(vec!["no such thing".into()], SPECIAL_CODE),
        );
        let err = book.resolve(&schema(), &BTreeSet::new()).unwrap_err();
        assert!(matches!(err, ModelError::UnresolvedSpecialCode { .. }));
    }

    #[test]
    fn rejects_unknown_column() {
        let mut book = CodeBook::new();
        book.push("Laterality", Encoding::new(vec!["left".into()], 1));
        let err = book.resolve(&schema(), &BTreeSet::new()).unwrap_err();
        assert_eq!(
            err,
            ModelError::UnknownColumn {
                column: "Laterality".to_string(),
                row: None,
            }
        );
        assert_eq!(
            err.to_string(),
            "code book references unknown column 'Laterality'"
        );
    }
}
