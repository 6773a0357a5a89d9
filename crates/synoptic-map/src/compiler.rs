//! Schema-aware pattern compiler.
//!
//! The composite pattern holds one named group per column that matches the
//! column's labels. Value spans are derived from each column's capture rule
//! by the extractor, since the `regex` crate has no look-around.

use std::collections::{BTreeMap, BTreeSet};

use regex::Regex;
use serde::{Deserialize, Serialize};
use synoptic_model::{CaptureRules, Column, Schema};
use tracing::debug;

use crate::error::{PatternError, Result};

/// Line-start anchor used for anchored columns. Tolerates indentation and a
/// list marker such as `3.` or `b)`.
pub const DEFAULT_ANCHOR: &str = r"^[ \t]*(?:[0-9a-z]{1,2}[.)][ \t]*)?";

/// Knobs of the pattern compiler. Column sets name canonical columns and add
/// to the per-column rules loaded from the regex-rules file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub anchor: String,
    pub separator: char,
    /// Value starts on the line after the label.
    pub second_line: BTreeSet<String>,
    /// Value may continue until the next line holding the separator.
    pub multi_line: BTreeSet<String>,
    pub anchored: BTreeSet<String>,
    /// Wins over `anchored` and the column's own rule.
    pub not_anchored: BTreeSet<String>,
    /// Value ends at the end of the label's line. Wins over the span rules.
    pub end_of_line: BTreeSet<String>,
    /// Value ends where the next schema label begins.
    pub contained: BTreeSet<String>,
    /// Line patterns that end a generic value.
    pub generic_terminators: Vec<String>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            anchor: DEFAULT_ANCHOR.to_string(),
            separator: ':',
            second_line: BTreeSet::new(),
            multi_line: BTreeSet::new(),
            anchored: BTreeSet::new(),
            not_anchored: BTreeSet::new(),
            end_of_line: BTreeSet::new(),
            contained: BTreeSet::new(),
            generic_terminators: vec![r"\s*$".to_string(), r"\s*\d+[.)]\s".to_string()],
        }
    }
}

impl CompilerOptions {
    /// Effective capture rules of a column.
    pub fn rules_for(&self, column: &Column) -> CaptureRules {
        let name = column.canonical.as_str();
        let mut rules = column.rules;
        rules.add_anchor =
            (rules.add_anchor || self.anchored.contains(name)) && !self.not_anchored.contains(name);
        rules.val_on_next_line |= self.second_line.contains(name);
        if self.end_of_line.contains(name) {
            rules.capture_up_to_keyword = false;
            rules.capture_up_to_line_with_separator = false;
        } else {
            rules.capture_up_to_keyword |= self.contained.contains(name);
            rules.capture_up_to_line_with_separator |= self.multi_line.contains(name);
        }
        rules
    }

    fn check_separator(&self) -> Result<()> {
        if self.separator.is_whitespace() || self.separator.is_alphanumeric() {
            return Err(PatternError::Separator(self.separator));
        }
        Ok(())
    }
}

/// Label pattern for one column and the rule for its value span.
#[derive(Debug, Clone)]
pub struct ColumnPattern {
    pub canonical: String,
    pub group: String,
    pub rules: CaptureRules,
}

/// Composite pattern compiled from a schema.
#[derive(Debug, Clone)]
pub struct SchemaPattern {
    regex: Regex,
    columns: Vec<ColumnPattern>,
    group_to_column: BTreeMap<String, String>,
    separator: char,
}

impl SchemaPattern {
    pub fn compile(schema: &Schema, options: &CompilerOptions) -> Result<Self> {
        options.check_separator()?;

        let mut group_to_column: BTreeMap<String, String> = BTreeMap::new();
        let mut columns = Vec::with_capacity(schema.len());
        let mut fragments: Vec<(usize, String)> = Vec::with_capacity(schema.len());
        for column in schema.columns() {
            let group = column.variable_name();
            if let Some(first) = group_to_column.insert(group.clone(), column.canonical.clone()) {
                return Err(PatternError::Collision {
                    first,
                    second: column.canonical.clone(),
                    group,
                });
            }
            let rules = options.rules_for(column);
            let mut labels: Vec<&str> = column.labels().filter(|l| !l.trim().is_empty()).collect();
            labels.sort_by_key(|l| std::cmp::Reverse(l.len()));
            let longest = labels.first().map_or(0, |l| l.len());
            let alternation = labels
                .iter()
                .map(|label| label_fragment(label))
                .collect::<Vec<_>>()
                .join("|");
            let anchor = if rules.add_anchor {
                options.anchor.as_str()
            } else {
                ""
            };
            let separator = regex::escape(&options.separator.to_string());
            let tail = if rules.add_separator_to_col_name {
                format!("[ \\t]*{separator}")
            } else {
                format!("[ \\t]*{separator}?")
            };
            fragments.push((
                longest,
                format!("(?P<{group}>{anchor}(?:{alternation}){tail})"),
            ));
            columns.push(ColumnPattern {
                canonical: column.canonical.clone(),
                group,
                rules,
            });
        }

        // Longer labels first, so a label is never shadowed by its prefix.
        fragments.sort_by_key(|(longest, _)| std::cmp::Reverse(*longest));
        let source = format!(
            "(?im){}",
            fragments
                .into_iter()
                .map(|(_, fragment)| fragment)
                .collect::<Vec<_>>()
                .join("|")
        );
        let regex = Regex::new(&source).map_err(|source| PatternError::Build {
            what: "schema".to_string(),
            source,
        })?;
        debug!(columns = columns.len(), "compiled schema pattern");
        Ok(Self {
            regex,
            columns,
            group_to_column,
            separator: options.separator,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }

    pub fn columns(&self) -> &[ColumnPattern] {
        &self.columns
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Canonical column of a capture group.
    pub fn column_for_group(&self, group: &str) -> Option<&str> {
        self.group_to_column.get(group).map(String::as_str)
    }
}

/// Escapes a label and lets its inner whitespace stretch across spaces and
/// line breaks.
fn label_fragment(label: &str) -> String {
    let body = label
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    if label.trim_start().starts_with(char::is_alphanumeric) {
        format!(r"\b{body}")
    } else {
        body
    }
}

/// Fallback `label: value` pattern applied after the schema pattern.
#[derive(Debug, Clone)]
pub struct GenericPattern {
    regex: Regex,
    terminator: Option<Regex>,
    separator: char,
}

impl GenericPattern {
    pub fn compile(options: &CompilerOptions) -> Result<Self> {
        options.check_separator()?;
        let separator = regex::escape(&options.separator.to_string());
        let source = format!(
            r"(?m)^[ \t]*(?:\d+[.)][ \t]*)?(?P<label>[^\n{separator}]{{1,80}}?)[ \t]*{separator}[ \t]*(?P<value>[^\n]*)"
        );
        let regex = Regex::new(&source).map_err(|source| PatternError::Build {
            what: "generic label".to_string(),
            source,
        })?;
        let terminator = if options.generic_terminators.is_empty() {
            None
        } else {
            let source = format!(
                "^(?:{})",
                options
                    .generic_terminators
                    .iter()
                    .map(|t| format!("(?:{t})"))
                    .collect::<Vec<_>>()
                    .join("|")
            );
            Some(Regex::new(&source).map_err(|source| PatternError::Build {
                what: "generic terminators".to_string(),
                source,
            })?)
        };
        Ok(Self {
            regex,
            terminator,
            separator: options.separator,
        })
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }

    /// Whether a continuation line ends the current value.
    pub(crate) fn ends_value(&self, line: &str) -> bool {
        self.terminator.as_ref().is_some_and(|t| t.is_match(line)) || line.contains(self.separator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new(vec![
            Column::new("Tumour Size", vec!["Tumour size".into()]),
            Column::new("Margins", vec!["Margins".into()])
                .with_alternatives(vec!["Margin status".into()])
                .with_rules(CaptureRules {
                    add_anchor: true,
                    add_separator_to_col_name: true,
                    ..Default::default()
                }),
        ])
        .unwrap()
    }

    #[test]
    fn schema_pattern_text() {
        let pattern = SchemaPattern::compile(&schema(), &CompilerOptions::default()).unwrap();
        insta::assert_snapshot!(
            pattern.as_str(),
            @r"(?im)(?P<margins>^[ \t]*(?:[0-9a-z]{1,2}[.)][ \t]*)?(?:\bMargin\s+status|\bMargins)[ \t]*:)|(?P<tumour_size>(?:\bTumour\s+size)[ \t]*:?)"
        );
        assert_eq!(pattern.column_for_group("tumour_size"), Some("Tumour Size"));
    }

    #[test]
    fn option_sets_override_column_rules() {
        let mut options = CompilerOptions::default();
        options.not_anchored.insert("Margins".into());
        options.contained.insert("Margins".into());
        let schema = schema();
        let rules = options.rules_for(schema.get("Margins").unwrap());
        assert!(!rules.add_anchor);
        assert!(rules.capture_up_to_keyword);

        options.end_of_line.insert("Margins".into());
        let rules = options.rules_for(schema.get("Margins").unwrap());
        assert!(!rules.capture_up_to_keyword);
    }

    #[test]
    fn rejects_whitespace_separator() {
        let options = CompilerOptions {
            separator: ' ',
            ..Default::default()
        };
        assert!(matches!(
            GenericPattern::compile(&options),
            Err(PatternError::Separator(' '))
        ));
    }

    #[test]
    fn generic_pattern_stops_at_first_separator() {
        let generic = GenericPattern::compile(&CompilerOptions::default()).unwrap();
        let caps = generic.regex().captures("2. Time: 10:30").unwrap();
        assert_eq!(&caps["label"], "Time");
        assert_eq!(&caps["value"], "10:30");
    }
}
