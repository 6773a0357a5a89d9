//! Synoptic section isolation, laterality detection, and bilateral split.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};
use synoptic_model::{Laterality, ReportType};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Start and end markers of a synoptic section. Patterns are regular
/// expressions matched case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorPair {
    pub start: String,
    pub end: String,
    /// Text re-attached in front of the captured body, for anchors that
    /// consume the first label.
    #[serde(default)]
    pub prefix: Option<String>,
}

impl AnchorPair {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
            prefix: None,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }
}

/// Markers that open a side-specific block in a bilateral report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideMarkers {
    pub left: String,
    pub right: String,
}

impl SideMarkers {
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
        }
    }
}

/// Isolation rules for one report type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRules {
    /// Tried in order; the first pair yielding a non-empty body wins.
    pub anchors: Vec<AnchorPair>,
    /// Headings whose line decides laterality, in priority order.
    #[serde(default)]
    pub laterality_headings: Vec<String>,
    /// Side markers for splitting one section into halves, in priority order.
    #[serde(default)]
    pub side_markers: Vec<SideMarkers>,
    /// Heading that names the side of each block when a report holds several
    /// synoptic blocks.
    #[serde(default)]
    pub block_side_heading: Option<String>,
}

impl SectionRules {
    /// Built-in rules for a report type.
    pub fn defaults(report_type: ReportType) -> Self {
        match report_type {
            ReportType::Alpha => Self {
                anchors: vec![
                    AnchorPair::new(
                        r"synoptic\s+operative\s+report",
                        r"electronically\s+signed|dictated\s+by",
                    ),
                    AnchorPair::new(
                        r"(?:description\s+of\s+(?:the\s+)?procedure|operative\s+details|procedure\s+in\s+detail)\s*:?",
                        r"estimated\s+blood\s+loss|specimens?\s+sent|electronically\s+signed|dictated\s+by",
                    ),
                ],
                laterality_headings: vec![
                    r"pre-?operative\s+diagnosis".into(),
                    r"operation\s+performed".into(),
                    r"procedure".into(),
                ],
                side_markers: vec![
                    SideMarkers::new(r"left\s+breast\s*:", r"right\s+breast\s*:"),
                    SideMarkers::new(
                        r"rationale\s+for\s+(?:surgery\s+)?(?:on\s+)?(?:the\s+)?left[^\n:]*:",
                        r"rationale\s+for\s+(?:surgery\s+)?(?:on\s+)?(?:the\s+)?right[^\n:]*:",
                    ),
                ],
                block_side_heading: None,
            },
            ReportType::Numeric => Self {
                anchors: vec![
                    AnchorPair::new(
                        r"(?:invasive\s+carcinoma|ductal\s+carcinoma\s+in\s+situ|dcis)\s+synoptic\s+report",
                        r"comments?\s*:|electronically\s+signed|end\s+of\s+synoptic",
                    ),
                    AnchorPair::new(
                        r"synoptic\s+report|cancer\s+summary",
                        r"comments?\s*:|electronically\s+signed|end\s+of\s+synoptic",
                    ),
                ],
                laterality_headings: vec![
                    r"parts?\s*(?:\(s\))?\s+involved".into(),
                    r"specimen\s+laterality".into(),
                    r"specimen".into(),
                    r"clinical\s+history".into(),
                ],
                side_markers: Vec::new(),
                block_side_heading: Some(r"parts?\s*(?:\(s\))?\s+involved".into()),
            },
        }
    }

    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| IngestError::ReportRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

/// One isolated section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub text: String,
    pub laterality: Laterality,
}

/// Result of isolating one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isolation {
    /// Laterality detected for the whole report.
    pub laterality: Laterality,
    /// One section, or one per side of a split bilateral report.
    pub sections: Vec<Section>,
    /// No anchor matched; the single section is the raw text.
    pub no_synoptic: bool,
}

impl Isolation {
    pub fn is_split(&self) -> bool {
        self.sections.len() > 1
    }
}

#[derive(Debug, Clone)]
struct CompiledAnchor {
    start: Regex,
    end: Regex,
    prefix: Option<String>,
}

#[derive(Debug, Clone)]
struct CompiledMarkers {
    left: Regex,
    right: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i){pattern}")).map_err(|source| IngestError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Matches a heading and the rest of its line.
fn compile_heading(pattern: &str) -> Result<Regex> {
    Regex::new(&format!("(?i)(?:{pattern})[^\\n]*")).map_err(|source| IngestError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Compiled isolator for one report type.
#[derive(Debug, Clone)]
pub struct SectionIsolator {
    report_type: ReportType,
    anchors: Vec<CompiledAnchor>,
    headings: Vec<Regex>,
    markers: Vec<CompiledMarkers>,
    block_side: Option<Regex>,
    left_word: Regex,
    right_word: Regex,
}

impl SectionIsolator {
    pub fn new(report_type: ReportType, rules: &SectionRules) -> Result<Self> {
        let anchors = rules
            .anchors
            .iter()
            .map(|pair| {
                Ok(CompiledAnchor {
                    start: compile(&pair.start)?,
                    end: compile(&pair.end)?,
                    prefix: pair.prefix.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let headings = rules
            .laterality_headings
            .iter()
            .map(|h| compile_heading(h))
            .collect::<Result<Vec<_>>>()?;
        let markers = rules
            .side_markers
            .iter()
            .map(|m| {
                Ok(CompiledMarkers {
                    left: compile(&m.left)?,
                    right: compile(&m.right)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let block_side = rules
            .block_side_heading
            .as_deref()
            .map(compile_heading)
            .transpose()?;
        Ok(Self {
            report_type,
            anchors,
            headings,
            markers,
            block_side,
            left_word: compile(r"\bleft\b")?,
            right_word: compile(r"\bright\b")?,
        })
    }

    /// Isolator with the built-in rules.
    pub fn for_report_type(report_type: ReportType) -> Result<Self> {
        Self::new(report_type, &SectionRules::defaults(report_type))
    }

    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    pub fn isolate(&self, text: &str) -> Isolation {
        let laterality = self.detect_laterality(text);
        let Some(blocks) = self.find_blocks(text) else {
            debug!(report_type = %self.report_type, "no synoptic section found");
            return Isolation {
                laterality,
                sections: vec![Section {
                    text: text.to_string(),
                    laterality,
                }],
                no_synoptic: true,
            };
        };

        let sections = if blocks.len() > 1 {
            self.split_blocks(&blocks, laterality)
        } else {
            let body = blocks.into_iter().next().unwrap_or_default();
            self.split_sides(&body, laterality)
        };
        // A lone half carries the side that was actually present.
        let laterality = match sections.as_slice() {
            [only] if matches!(laterality, Laterality::Bilateral | Laterality::Unknown) => {
                only.laterality
            }
            [_, _, ..] => Laterality::Bilateral,
            _ => laterality,
        };
        Isolation {
            laterality,
            sections,
            no_synoptic: false,
        }
    }

    /// Laterality from the first heading line that mentions a side.
    pub fn detect_laterality(&self, text: &str) -> Laterality {
        for heading in &self.headings {
            for line in heading.find_iter(text) {
                let side = self.mentions(line.as_str());
                if side != Laterality::Unknown {
                    return side;
                }
            }
        }
        Laterality::Unknown
    }

    fn mentions(&self, line: &str) -> Laterality {
        Laterality::from_mentions(
            self.left_word.is_match(line),
            self.right_word.is_match(line),
        )
    }

    /// Bodies of the first anchor pair that yields a non-empty capture.
    fn find_blocks(&self, text: &str) -> Option<Vec<String>> {
        for anchor in &self.anchors {
            let starts: Vec<_> = anchor.start.find_iter(text).collect();
            let mut blocks = Vec::new();
            for (idx, start) in starts.iter().enumerate() {
                let from = start.end();
                let next_start = starts.get(idx + 1).map_or(text.len(), |m| m.start());
                let until = anchor
                    .end
                    .find_at(text, from)
                    .map_or(text.len(), |m| m.start())
                    .min(next_start);
                let body = text[from..until].trim();
                if body.is_empty() {
                    continue;
                }
                let body = match &anchor.prefix {
                    Some(prefix) => format!("{prefix}{body}"),
                    None => body.to_string(),
                };
                blocks.push(body);
            }
            if !blocks.is_empty() {
                return Some(blocks);
            }
        }
        None
    }

    /// Groups several synoptic blocks by the side named in each block.
    /// Blocks without a side fall back to the report laterality.
    fn split_blocks(&self, blocks: &[String], laterality: Laterality) -> Vec<Section> {
        let mut by_side: BTreeMap<&'static str, (Laterality, Vec<&str>)> = BTreeMap::new();
        for block in blocks {
            let side = self
                .block_side
                .as_ref()
                .and_then(|heading| heading.find(block))
                .map_or(Laterality::Unknown, |line| self.mentions(line.as_str()));
            let side = match side {
                Laterality::Left | Laterality::Right => side,
                _ => laterality,
            };
            by_side
                .entry(side.as_str())
                .or_insert_with(|| (side, Vec::new()))
                .1
                .push(block);
        }
        let mut sections: Vec<Section> = by_side
            .into_values()
            .map(|(side, parts)| Section {
                text: parts.join("\n"),
                laterality: side,
            })
            .collect();
        if sections.len() > 1 && sections.iter().any(|s| s.laterality.suffix().is_empty()) {
            // Ids would collide; keep everything as one section.
            let text = blocks.join("\n");
            return vec![Section { text, laterality }];
        }
        sections.sort_by_key(|s| s.laterality.suffix());
        sections
    }

    /// Splits one section on side markers. The text before the first marker
    /// is shared by both halves.
    fn split_sides(&self, body: &str, laterality: Laterality) -> Vec<Section> {
        let whole = || {
            vec![Section {
                text: body.to_string(),
                laterality,
            }]
        };
        if self.report_type != ReportType::Alpha {
            return whole();
        }
        for markers in &self.markers {
            let mut found: Vec<(usize, usize, Laterality)> = markers
                .left
                .find_iter(body)
                .map(|m| (m.start(), m.end(), Laterality::Left))
                .chain(
                    markers
                        .right
                        .find_iter(body)
                        .map(|m| (m.start(), m.end(), Laterality::Right)),
                )
                .collect();
            if found.is_empty() {
                continue;
            }
            found.sort_by_key(|(start, _, _)| *start);

            let preamble = body[..found[0].0].trim();
            let mut left = String::new();
            let mut right = String::new();
            for (idx, (_, end, side)) in found.iter().enumerate() {
                let until = found.get(idx + 1).map_or(body.len(), |next| next.0);
                let segment = body[*end..until].trim();
                let target = if *side == Laterality::Left {
                    &mut left
                } else {
                    &mut right
                };
                if !target.is_empty() {
                    target.push('\n');
                }
                target.push_str(segment);
            }

            let with_preamble = |segment: String| {
                if preamble.is_empty() {
                    segment
                } else {
                    format!("{preamble}\n{segment}")
                }
            };
            let mut sections = Vec::new();
            if !left.is_empty() {
                sections.push(Section {
                    text: with_preamble(left),
                    laterality: Laterality::Left,
                });
            }
            if !right.is_empty() {
                sections.push(Section {
                    text: with_preamble(right),
                    laterality: Laterality::Right,
                });
            }
            if sections.len() == 1 && laterality != Laterality::Bilateral {
                // A single side block in a unilateral report is not a split.
                return vec![Section {
                    text: body.to_string(),
                    laterality: sections[0].laterality,
                }];
            }
            if !sections.is_empty() {
                return sections;
            }
        }
        whole()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn laterality_from_first_heading_with_a_side() {
        let isolator = SectionIsolator::for_report_type(ReportType::Numeric).unwrap();
        let text = "Specimen: breast tissue\nPart(s) involved: A: Left breast\n";
        assert_eq!(isolator.detect_laterality(text), Laterality::Left);
    }

    #[test]
    fn both_sides_on_one_heading_is_bilateral() {
        let isolator = SectionIsolator::for_report_type(ReportType::Alpha).unwrap();
        let text = "Preoperative diagnosis: left and right breast cancer\n";
        assert_eq!(isolator.detect_laterality(text), Laterality::Bilateral);
    }

    #[test]
    fn end_anchor_bounds_the_body() {
        let isolator = SectionIsolator::for_report_type(ReportType::Numeric).unwrap();
        let text = "Header\nSynoptic Report\nTumour size: 12 mm\nComment: see note\n";
        let isolation = isolator.isolate(text);
        assert!(!isolation.no_synoptic);
        assert_eq!(isolation.sections[0].text, "Tumour size: 12 mm");
    }

    #[test]
    fn rules_parse_from_toml() {
        let rules = SectionRules::from_toml_str(
            r#"
            laterality_headings = ["side"]

            [[anchors]]
            start = "begin"
            end = "finish"
            prefix = "Grade: "
            "#,
        )
        .unwrap();
        let isolator = SectionIsolator::new(ReportType::Numeric, &rules).unwrap();
        let isolation = isolator.isolate("side: right\nbegin 2 finish");
        assert_eq!(isolation.sections[0].text, "Grade: 2");
        assert_eq!(isolation.laterality, Laterality::Right);
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let rules = SectionRules {
            anchors: vec![AnchorPair::new("(", "x")],
            laterality_headings: Vec::new(),
            side_markers: Vec::new(),
            block_side_heading: None,
        };
        let err = SectionIsolator::new(ReportType::Alpha, &rules).unwrap_err();
        assert!(matches!(err, IngestError::Pattern { .. }));
    }
}
