//! Transforms that compute a code from other columns.

use std::sync::LazyLock;

use regex::Regex;
use synoptic_model::text::clean_text;

use crate::error::{Result, TransformError};
use crate::registry::{Transform, TransformInput, TransformKind};

static TUBULE_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:tubul\w*|glandular|acinar)\D{0,40}?([1-3])").expect("Invalid tubule regex")
});

static NUCLEAR_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)nuclear\D{0,40}?([1-3])").expect("Invalid nuclear regex")
});

static MITOTIC_SCORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)mito\w*\D{0,40}?([1-3])").expect("Invalid mitotic regex")
});

static NEGATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:no|none|not|declined|deferred)\b").expect("Invalid negation regex")
});

fn parse_in(text: &str, range: std::ops::RangeInclusive<u32>) -> Option<u32> {
    text.trim().parse().ok().filter(|n| range.contains(n))
}

/// One subscore: its encoded code, else a score written in the raw value.
fn subscore(input: &TransformInput<'_>, column: &str, pattern: &Regex) -> Result<u32> {
    if let Some(score) = input.encoded.get(column).and_then(|c| parse_in(c, 1..=3)) {
        return Ok(score);
    }
    pattern
        .captures(&input.value.primary)
        .and_then(|caps| parse_in(&caps[1], 1..=3))
        .ok_or_else(|| TransformError::MissingDependency {
            transform: "nottingham_score",
            column: column.to_string(),
        })
}

/// Nottingham total from the three subscores.
pub fn nottingham_total(input: &TransformInput<'_>) -> Result<u32> {
    let columns = &input.context.nottingham;
    let subscores = [
        subscore(input, &columns.tubule, &TUBULE_SCORE),
        subscore(input, &columns.nuclear, &NUCLEAR_SCORE),
        subscore(input, &columns.mitotic, &MITOTIC_SCORE),
    ];
    match subscores {
        [Ok(tubule), Ok(nuclear), Ok(mitotic)] => Ok(tubule + nuclear + mitotic),
        [first, second, third] => {
            // A total written directly in the value stands in for the parts.
            if let Some(total) = parse_in(&input.value.primary, 3..=9) {
                return Ok(total);
            }
            Err([first, second, third]
                .into_iter()
                .find_map(std::result::Result::err)
                .unwrap_or_else(|| {
                    TransformError::invalid("nottingham_score", &input.value.primary, "no score")
                }))
        }
    }
}

/// Histologic grade of a Nottingham total.
pub fn grade_for_total(total: u32) -> Option<u32> {
    match total {
        3..=5 => Some(1),
        6 | 7 => Some(2),
        8 | 9 => Some(3),
        _ => None,
    }
}

pub struct NottinghamScore;

impl Transform for NottinghamScore {
    fn name(&self) -> &'static str {
        "nottingham_score"
    }

    fn description(&self) -> &'static str {
        "Sum of the tubule, nuclear and mitotic subscores"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Computed
    }

    fn apply(&self, input: &TransformInput<'_>) -> Result<String> {
        nottingham_total(input).map(|total| total.to_string())
    }
}

pub struct HistologicGrade;

impl Transform for HistologicGrade {
    fn name(&self) -> &'static str {
        "histologic_grade"
    }

    fn description(&self) -> &'static str {
        "Histologic grade derived from the Nottingham score"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Computed
    }

    fn apply(&self, input: &TransformInput<'_>) -> Result<String> {
        let score_column = &input.context.nottingham.score;
        let total = match input
            .encoded
            .get(score_column)
            .and_then(|c| parse_in(c, 3..=9))
        {
            Some(total) => total,
            None => match nottingham_total(input) {
                Ok(total) => total,
                Err(err) => {
                    // A grade written directly in the value.
                    let cleaned = clean_text(&input.value.primary);
                    return cleaned
                        .split(' ')
                        .find_map(|token| parse_in(token, 1..=3))
                        .map(|grade| grade.to_string())
                        .ok_or(err);
                }
            },
        };
        grade_for_total(total)
            .map(|grade| grade.to_string())
            .ok_or_else(|| {
                TransformError::invalid("histologic_grade", &total.to_string(), "score out of range")
            })
    }
}

pub struct Reconstruction;

impl Transform for Reconstruction {
    fn name(&self) -> &'static str {
        "reconstruction_performed"
    }

    fn description(&self) -> &'static str {
        "1 when a reconstruction was performed, else 0"
    }

    fn kind(&self) -> TransformKind {
        TransformKind::Computed
    }

    fn apply(&self, input: &TransformInput<'_>) -> Result<String> {
        let cleaned = clean_text(&input.value.primary);
        let performed = !cleaned.is_empty() && !NEGATION.is_match(&cleaned);
        Ok(if performed { "1" } else { "0" }.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use synoptic_model::{ReportType, Value};

    use super::*;
    use crate::registry::TransformContext;

    fn input<'a>(
        value: &'a Value,
        encoded: &'a BTreeMap<String, String>,
        context: &'a TransformContext,
    ) -> TransformInput<'a> {
        TransformInput {
            column: "Nottingham Score",
            value,
            encoded,
            report_type: ReportType::Numeric,
            context,
        }
    }

    #[test]
    fn total_from_encoded_subscores() {
        let context = TransformContext::default();
        let encoded = BTreeMap::from([
            (context.nottingham.tubule.clone(), "2".to_string()),
            (context.nottingham.nuclear.clone(), "3".to_string()),
            (context.nottingham.mitotic.clone(), "2".to_string()),
        ]);
        let value = Value::empty();
        let input = input(&value, &encoded, &context);
        assert_eq!(NottinghamScore.apply(&input).unwrap(), "7");
        assert_eq!(HistologicGrade.apply(&input).unwrap(), "2");
    }

    #[test]
    fn total_from_raw_text() {
        let context = TransformContext::default();
        let encoded = BTreeMap::new();
        let value = Value::new("Tubules: 3, Nuclear grade: 3, Mitoses: 2");
        let input = input(&value, &encoded, &context);
        assert_eq!(NottinghamScore.apply(&input).unwrap(), "8");
        assert_eq!(HistologicGrade.apply(&input).unwrap(), "3");
    }

    #[test]
    fn missing_subscore_is_reported() {
        let context = TransformContext::default();
        let encoded = BTreeMap::new();
        let value = Value::new("not assessed");
        let err = NottinghamScore
            .apply(&input(&value, &encoded, &context))
            .unwrap_err();
        assert!(matches!(err, TransformError::MissingDependency { .. }));
    }

    #[test]
    fn grade_bands() {
        assert_eq!(grade_for_total(5), Some(1));
        assert_eq!(grade_for_total(7), Some(2));
        assert_eq!(grade_for_total(9), Some(3));
        assert_eq!(grade_for_total(2), None);
    }

    #[test]
    fn reconstruction_reads_negations() {
        let context = TransformContext::default();
        let encoded = BTreeMap::new();
        for (text, code) in [
            ("Immediate implant reconstruction", "1"),
            ("No reconstruction", "0"),
            ("", "0"),
        ] {
            let value = Value::new(text);
            assert_eq!(
                Reconstruction.apply(&input(&value, &encoded, &context)).unwrap(),
                code
            );
        }
    }
}
