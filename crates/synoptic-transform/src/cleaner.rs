//! Per-column value cleaning.
//!
//! Every value goes through the default regime of its report type. A column
//! may instead be assigned a cleaning transform from the registry, which then
//! reads the raw value and replaces the default for the primary text.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use synoptic_model::text::clean_text;
use synoptic_model::{ReportType, Value};
use tracing::{debug, warn};

use crate::error::{Result, TransformError};
use crate::registry::{TransformContext, TransformInput, TransformKind, TransformRegistry};

/// A line that opens a new `label:` field.
static FIELD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*(?:\d+[.)][ \t]*)?[A-Za-z][^:\n]{0,60}:").expect("Invalid field line regex")
});

/// Longest head treated as an inherited label by the numeric regime.
const MAX_INHERITED_LABEL: usize = 60;

/// Operative regime: cut at the next `label:` line, then strip punctuation,
/// lowercase, drop single-letter tokens and collapse whitespace.
pub fn clean_alpha(raw: &str) -> String {
    let mut kept = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if idx > 0 && FIELD_LINE.is_match(line) {
            break;
        }
        kept.push(line);
    }
    clean_text(&kept.join("\n"))
        .split(' ')
        .filter(|token| {
            let mut chars = token.chars();
            !matches!((chars.next(), chars.next()), (Some(ch), None) if ch.is_alphabetic())
        })
        .filter(|token| !token.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Pathology regime: drop a leading inherited label up to the first `:` and
/// trailing colons. Case and inner structure are kept.
pub fn clean_numeric(raw: &str) -> String {
    let trimmed = raw.trim();
    let body = match trimmed.split_once(':') {
        Some((head, rest))
            if !head.trim().is_empty()
                && !rest.trim().is_empty()
                && head.chars().count() <= MAX_INHERITED_LABEL
                && !head.chars().any(|ch| ch.is_ascii_digit()) =>
        {
            rest
        }
        _ => trimmed,
    };
    body.trim().trim_end_matches(':').trim_end().to_string()
}

/// Cleaned values of a section plus the columns whose transform failed.
#[derive(Debug, Clone, Default)]
pub struct Cleaned {
    pub values: BTreeMap<String, Value>,
    pub failures: Vec<(String, TransformError)>,
}

/// Cleans values with the regime of one report type.
#[derive(Debug, Clone)]
pub struct ValueCleaner {
    report_type: ReportType,
    assignments: BTreeMap<String, String>,
}

impl ValueCleaner {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            assignments: BTreeMap::new(),
        }
    }

    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    /// Assigns a cleaning transform to a column.
    pub fn assign(&mut self, registry: &TransformRegistry, column: &str, name: &str) -> Result<()> {
        let transform = registry
            .get(name)
            .ok_or_else(|| TransformError::UnknownTransform(name.to_string()))?;
        if transform.kind() != TransformKind::Cleaning {
            return Err(TransformError::NotCleaning {
                name: name.to_string(),
                column: column.to_string(),
            });
        }
        self.assignments
            .insert(column.to_string(), transform.name().to_string());
        Ok(())
    }

    pub fn assignment(&self, column: &str) -> Option<&str> {
        self.assignments.get(column).map(String::as_str)
    }

    /// Default regime for one string.
    pub fn clean_text(&self, raw: &str) -> String {
        match self.report_type {
            ReportType::Alpha => clean_alpha(raw),
            ReportType::Numeric => clean_numeric(raw),
        }
    }

    /// Default regime applied to the primary and every alternative.
    pub fn clean_value(&self, value: &Value) -> Value {
        Value {
            primary: self.clean_text(&value.primary),
            alternatives: value
                .alternatives
                .iter()
                .map(|alt| self.clean_text(alt))
                .collect(),
        }
    }

    /// Cleans every extracted column. A failing transform leaves the default
    /// cleaning in place and is reported in [`Cleaned::failures`].
    pub fn clean_all(
        &self,
        extractions: &BTreeMap<String, Value>,
        registry: &TransformRegistry,
        context: &TransformContext,
    ) -> Cleaned {
        let no_codes = BTreeMap::new();
        let mut cleaned = Cleaned::default();
        for (column, value) in extractions {
            let mut result = self.clean_value(value);
            if let Some(name) = self.assignment(column)
                && !value.primary.trim().is_empty()
            {
                let input = TransformInput {
                    column,
                    value,
                    encoded: &no_codes,
                    report_type: self.report_type,
                    context,
                };
                match registry.apply(name, &input) {
                    Ok(text) => {
                        debug!(column = %column, transform = name, "value transformed");
                        result.primary = text;
                    }
                    Err(err) => {
                        warn!(column = %column, transform = name, error = %err, "transform failed");
                        cleaned.failures.push((column.clone(), err));
                    }
                }
            }
            cleaned.values.insert(column.clone(), result);
        }
        cleaned
    }
}
