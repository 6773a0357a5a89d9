//! Column schema: the canonical columns a report is extracted into.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};
use crate::text::{clean_text, group_name};

/// Similarity threshold used when a column has no tuned value.
pub const DEFAULT_THRESHOLD: f32 = 0.75;

/// Per-column flags controlling how the schema pattern captures a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureRules {
    /// Anchor the label to the start of a line.
    #[serde(default)]
    pub add_anchor: bool,
    /// Stop the value where the next schema label begins.
    #[serde(default)]
    pub capture_up_to_keyword: bool,
    /// Stop the value at the next line that contains the separator.
    #[serde(default)]
    pub capture_up_to_line_with_separator: bool,
    /// The value starts on the line after the label.
    #[serde(default)]
    pub val_on_next_line: bool,
    /// The label must be followed by the separator.
    #[serde(default)]
    pub add_separator_to_col_name: bool,
}

/// Per-column override of the normalizer's edit-distance matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutocorrectOverride {
    /// Cost of one substituted character.
    pub substitution_cost: Option<usize>,
    /// Largest accepted distance.
    pub max_distance: Option<usize>,
}

/// One canonical column of the schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Name used downstream (baselines, code book, exports).
    pub canonical: String,
    /// Labels as they appear in reports, in preference order.
    pub primary_labels: Vec<String>,
    /// Fallback labels, in preference order.
    #[serde(default)]
    pub alternative_labels: Vec<String>,
    /// Encoding similarity threshold in `[0, 1]`.
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Empty and `0` are equivalent when comparing codes.
    #[serde(default)]
    pub zero_empty: bool,
    #[serde(default)]
    pub rules: CaptureRules,
    #[serde(default)]
    pub autocorrect: AutocorrectOverride,
}

fn default_threshold() -> f32 {
    DEFAULT_THRESHOLD
}

impl Column {
    pub fn new(canonical: impl Into<String>, primary_labels: Vec<String>) -> Self {
        Self {
            canonical: canonical.into(),
            primary_labels,
            alternative_labels: Vec::new(),
            threshold: DEFAULT_THRESHOLD,
            zero_empty: false,
            rules: CaptureRules::default(),
            autocorrect: AutocorrectOverride::default(),
        }
    }

    #[must_use]
    pub fn with_alternatives(mut self, labels: Vec<String>) -> Self {
        self.alternative_labels = labels;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_zero_empty(mut self, zero_empty: bool) -> Self {
        self.zero_empty = zero_empty;
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: CaptureRules) -> Self {
        self.rules = rules;
        self
    }

    /// All labels, primaries first.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.primary_labels
            .iter()
            .chain(self.alternative_labels.iter())
            .map(String::as_str)
    }

    /// Cleaned form of the canonical name.
    pub fn cleaned(&self) -> String {
        clean_text(&self.canonical)
    }

    /// Capture-group name for this column.
    pub fn variable_name(&self) -> String {
        group_name(&self.canonical)
    }
}

/// Ordered, validated list of columns.
///
/// Canonical names are unique, and so are the cleaned variable names derived
/// from them. Colliding names are rejected instead of being disambiguated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<Column>,
    #[serde(skip)]
    index: BTreeMap<String, usize>,
}

impl Schema {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut index = BTreeMap::new();
        let mut variables: BTreeMap<String, String> = BTreeMap::new();
        for (position, column) in columns.iter().enumerate() {
            if column.primary_labels.iter().all(|l| l.trim().is_empty()) {
                return Err(ModelError::MissingLabel(column.canonical.clone()));
            }
            if !(0.0..=1.0).contains(&column.threshold) {
                return Err(ModelError::InvalidThreshold {
                    column: column.canonical.clone(),
                    value: column.threshold,
                });
            }
            if index.insert(column.canonical.clone(), position).is_some() {
                return Err(ModelError::DuplicateColumn(column.canonical.clone()));
            }
            let variable = column.variable_name();
            if let Some(first) = variables.insert(variable.clone(), column.canonical.clone()) {
                return Err(ModelError::VariableCollision {
                    first,
                    second: column.canonical.clone(),
                    variable,
                });
            }
        }
        Ok(Self { columns, index })
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, canonical: &str) -> Option<&Column> {
        self.position(canonical).map(|idx| &self.columns[idx])
    }

    pub fn get_mut(&mut self, canonical: &str) -> Option<&mut Column> {
        let idx = self.position(canonical)?;
        self.columns.get_mut(idx)
    }

    /// Schema order of a column; used to break ties deterministically.
    pub fn position(&self, canonical: &str) -> Option<usize> {
        if self.index.is_empty() && !self.columns.is_empty() {
            return self.columns.iter().position(|c| c.canonical == canonical);
        }
        self.index.get(canonical).copied()
    }

    pub fn contains(&self, canonical: &str) -> bool {
        self.position(canonical).is_some()
    }

    /// Finds a column whose cleaned canonical name equals the cleaned input.
    pub fn find_cleaned(&self, raw: &str) -> Option<&Column> {
        let cleaned = clean_text(raw);
        self.columns.iter().find(|c| c.cleaned() == cleaned)
    }

    pub fn canonical_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.canonical.as_str())
    }
}
