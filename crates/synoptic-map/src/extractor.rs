//! Applies the compiled patterns to a section.

use std::collections::BTreeMap;
use std::ops::Range;

use synoptic_model::text::clean_label_key;
use synoptic_model::{CaptureRules, Schema, Value};
use tracing::trace;

use crate::compiler::{ColumnPattern, CompilerOptions, GenericPattern, SchemaPattern};
use crate::error::Result;

/// A `label: value` pair found by the generic pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericPair {
    /// Label as written in the report.
    pub label: String,
    /// Cleaned label used for comparison.
    pub key: String,
    pub value: String,
}

/// Raw extraction of one section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Canonical column to value, from the schema pattern.
    pub specific: BTreeMap<String, Value>,
    /// Generic pairs in source order.
    pub generic: Vec<GenericPair>,
}

#[derive(Debug, Clone)]
pub struct Extractor {
    specific: SchemaPattern,
    generic: GenericPattern,
}

impl Extractor {
    pub fn new(schema: &Schema, options: &CompilerOptions) -> Result<Self> {
        Ok(Self {
            specific: SchemaPattern::compile(schema, options)?,
            generic: GenericPattern::compile(options)?,
        })
    }

    pub fn schema_pattern(&self) -> &SchemaPattern {
        &self.specific
    }

    pub fn extract(&self, section: &str) -> Extraction {
        Extraction {
            specific: self.extract_specific(section),
            generic: self.extract_generic(section),
        }
    }

    /// Non-empty values of the schema pattern. The first match of a column is
    /// the primary value; later distinct matches become alternatives. Labels
    /// are searched from the end of the last accepted value, so label text
    /// inside a value is never read as a new label.
    pub fn extract_specific(&self, section: &str) -> BTreeMap<String, Value> {
        let separator = self.specific.separator();
        let mut out: BTreeMap<String, Value> = BTreeMap::new();
        let mut cursor = 0;
        while let Some((_, label_end, column)) = self.label_at(section, cursor) {
            let next_label = self
                .label_at(section, label_end)
                .map_or(section.len(), |(start, _, _)| start);
            let span = value_span(section, label_end, next_label, column.rules, separator);
            cursor = span.end.max(label_end);
            let value = &section[span];
            if value.is_empty() {
                continue;
            }
            let canonical = column.canonical.as_str();
            trace!(column = canonical, "schema pattern match");
            match out.get_mut(canonical) {
                None => {
                    out.insert(canonical.to_string(), Value::new(value));
                }
                Some(existing) => {
                    if existing.primary != value && !existing.alternatives.iter().any(|a| a == value)
                    {
                        existing.alternatives.push(value.to_string());
                    }
                }
            }
        }
        out
    }

    /// First non-empty schema label at or after `from`.
    fn label_at(&self, section: &str, from: usize) -> Option<(usize, usize, &ColumnPattern)> {
        let pattern = &self.specific;
        let mut at = from;
        while at <= section.len() {
            let caps = pattern.regex().captures_at(section, at)?;
            let whole = caps.get(0)?;
            let column = pattern
                .columns()
                .iter()
                .find(|c| caps.name(&c.group).is_some());
            if let Some(column) = column
                && whole.end() > whole.start()
            {
                return Some((whole.start(), whole.end(), column));
            }
            at = next_char_boundary(section, whole.start());
        }
        None
    }

    /// Generic pairs in source order. A value continues over following lines
    /// until a terminator line or a line holding the separator.
    pub fn extract_generic(&self, section: &str) -> Vec<GenericPair> {
        let mut pairs = Vec::new();
        for caps in self.generic.regex().captures_iter(section) {
            let (Some(whole), Some(label), Some(value)) =
                (caps.get(0), caps.name("label"), caps.name("value"))
            else {
                continue;
            };
            let label = label.as_str().trim();
            if !label.chars().any(char::is_alphabetic) {
                continue;
            }
            let mut value = value.as_str().trim().to_string();
            let rest = section.get(whole.end()..).unwrap_or_default();
            for line in rest.split('\n').skip(1) {
                if self.generic.ends_value(line) {
                    break;
                }
                if !value.is_empty() {
                    value.push(' ');
                }
                value.push_str(line.trim());
            }
            if value.is_empty() {
                continue;
            }
            pairs.push(GenericPair {
                label: label.to_string(),
                key: clean_label_key(label),
                value,
            });
        }
        pairs
    }
}

fn line_end(text: &str, from: usize) -> usize {
    text[from..].find('\n').map_or(text.len(), |offset| from + offset)
}

fn next_char_boundary(text: &str, from: usize) -> usize {
    text[from..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| from + c.len_utf8())
}

/// Byte range of the value following a label, bounded by the column's
/// capture rule and trimmed.
fn value_span(
    text: &str,
    label_end: usize,
    next_label: usize,
    rules: CaptureRules,
    separator: char,
) -> Range<usize> {
    let mut start = label_end;
    start += text[start..].len() - text[start..].trim_start_matches([' ', '\t']).len();

    if rules.val_on_next_line && text[start..line_end(text, start)].trim().is_empty() {
        let mut cursor = line_end(text, start);
        loop {
            if cursor >= text.len() {
                return label_end..label_end;
            }
            cursor += 1;
            let end = line_end(text, cursor);
            if !text[cursor..end].trim().is_empty() {
                start = cursor;
                break;
            }
            cursor = end;
        }
    }

    let first_line_end = line_end(text, start);
    let mut end = if rules.capture_up_to_keyword || rules.capture_up_to_line_with_separator {
        text.len()
    } else {
        first_line_end
    };
    if rules.capture_up_to_keyword {
        end = end.min(next_label);
    }
    if rules.capture_up_to_line_with_separator {
        let mut cursor = first_line_end;
        while cursor < text.len() {
            let line_start = cursor + 1;
            let next_end = line_end(text, line_start);
            if text[line_start..next_end].contains(separator) {
                end = end.min(line_start);
                break;
            }
            cursor = next_end;
        }
    }
    if end <= start {
        return start..start;
    }
    let raw = &text[start..end];
    let leading = raw.len() - raw.trim_start().len();
    let trimmed = raw.trim();
    start + leading..start + leading + trimmed.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_line_value_skips_blank_label_line() {
        let rules = CaptureRules {
            val_on_next_line: true,
            ..Default::default()
        };
        let text = "Margins:\n\n  Negative\nNext: x";
        assert_eq!(&text[value_span(text, 8, text.len(), rules, ':')], "Negative");
    }

    #[test]
    fn separator_line_bounds_multi_line_value() {
        let rules = CaptureRules {
            capture_up_to_line_with_separator: true,
            ..Default::default()
        };
        let text = "Comment: first line\nsecond line\nGrade: 2";
        assert_eq!(
            &text[value_span(text, 8, text.len(), rules, ':')],
            "first line\nsecond line"
        );
    }

    #[test]
    fn keyword_bounds_contained_value() {
        let rules = CaptureRules {
            capture_up_to_keyword: true,
            ..Default::default()
        };
        let text = "Type: ductal carcinoma Grade: 2";
        let next = text.find("Grade").unwrap();
        assert_eq!(&text[value_span(text, 5, next, rules, ':')], "ductal carcinoma");
    }
}
