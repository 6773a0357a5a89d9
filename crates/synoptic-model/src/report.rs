//! Reports and their lifecycle.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, Result};

/// Report family; selects section anchors and the cleaning regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    /// Operative reports.
    Alpha,
    /// Pathology reports.
    Numeric,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Alpha => "alpha",
            ReportType::Numeric => "numeric",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReportType::Alpha => "operative",
            ReportType::Numeric => "pathology",
        }
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "alpha" | "operative" | "op" => Ok(ReportType::Alpha),
            "numeric" | "pathology" | "path" => Ok(ReportType::Numeric),
            _ => Err(format!("Unknown report type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Laterality {
    Left,
    Right,
    Bilateral,
    #[default]
    Unknown,
}

impl Laterality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Laterality::Left => "left",
            Laterality::Right => "right",
            Laterality::Bilateral => "bilateral",
            Laterality::Unknown => "unknown",
        }
    }

    /// Identifier suffix of a split half.
    pub fn suffix(&self) -> &'static str {
        match self {
            Laterality::Left => "L",
            Laterality::Right => "R",
            Laterality::Bilateral | Laterality::Unknown => "",
        }
    }

    /// Laterality from the sides mentioned in a line of text.
    pub fn from_mentions(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, true) => Laterality::Bilateral,
            (true, false) => Laterality::Left,
            (false, true) => Laterality::Right,
            (false, false) => Laterality::Unknown,
        }
    }
}

impl fmt::Display for Laterality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An extracted cell: the primary text plus alternatives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub primary: String,
    #[serde(default)]
    pub alternatives: Vec<String>,
}

impl Value {
    pub fn new(primary: impl Into<String>) -> Self {
        Self {
            primary: primary.into(),
            alternatives: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_alternative(mut self, alternative: impl Into<String>) -> Self {
        self.alternatives.push(alternative.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.primary.trim().is_empty() && self.alternatives.iter().all(|a| a.trim().is_empty())
    }

    pub fn first_alternative(&self) -> Option<&str> {
        self.alternatives.first().map(String::as_str)
    }
}

/// Lifecycle of a report. Stages only move forward.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportState {
    #[default]
    Raw,
    Isolated,
    Extracted,
    Normalized,
    Encoded,
}

impl ReportState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportState::Raw => "RAW",
            ReportState::Isolated => "ISOLATED",
            ReportState::Extracted => "EXTRACTED",
            ReportState::Normalized => "NORMALIZED",
            ReportState::Encoded => "ENCODED",
        }
    }
}

impl fmt::Display for ReportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One logical report (a bilateral source yields two).
#[derive(Debug, Clone, Serialize, Deserialize)]
///
/// Fields only change through the lifecycle methods, so an encoded report
/// can no longer be modified.
pub struct Report {
    id: String,
    report_type: ReportType,
    laterality: Laterality,
    /// Full OCR text.
    text: String,
    /// Isolated section; equals `text` when no synoptic section was found.
    section: String,
    /// Set when isolation found no synoptic section.
    no_synoptic: bool,
    extractions: BTreeMap<String, Value>,
    encoded: BTreeMap<String, String>,
    state: ReportState,
}

impl Report {
    pub fn new(id: impl Into<String>, report_type: ReportType, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: id.into(),
            report_type,
            laterality: Laterality::Unknown,
            section: text.clone(),
            text,
            no_synoptic: false,
            extractions: BTreeMap::new(),
            encoded: BTreeMap::new(),
            state: ReportState::Raw,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn report_type(&self) -> ReportType {
        self.report_type
    }

    pub fn laterality(&self) -> Laterality {
        self.laterality
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn is_no_synoptic(&self) -> bool {
        self.no_synoptic
    }

    pub fn extractions(&self) -> &BTreeMap<String, Value> {
        &self.extractions
    }

    pub fn encoded(&self) -> &BTreeMap<String, String> {
        &self.encoded
    }

    pub fn state(&self) -> ReportState {
        self.state
    }

    /// Rewrites the OCR text of a raw report, before isolation.
    pub fn repair_text(&mut self, repair: impl FnOnce(&str) -> String) -> Result<()> {
        if self.state != ReportState::Raw {
            return Err(ModelError::InvalidTransition {
                id: self.id.clone(),
                from: self.state.as_str(),
                to: ReportState::Raw.as_str(),
            });
        }
        self.text = repair(&self.text);
        self.section = self.text.clone();
        Ok(())
    }

    fn advance(&mut self, to: ReportState) -> Result<()> {
        let expected_from = match to {
            ReportState::Raw => None,
            ReportState::Isolated => Some(ReportState::Raw),
            ReportState::Extracted => Some(ReportState::Isolated),
            ReportState::Normalized => Some(ReportState::Extracted),
            ReportState::Encoded => Some(ReportState::Normalized),
        };
        // A no-synoptic report jumps from ISOLATED straight to ENCODED.
        let skip_allowed =
            self.no_synoptic && to == ReportState::Encoded && self.state == ReportState::Isolated;
        if expected_from != Some(self.state) && !skip_allowed {
            return Err(ModelError::InvalidTransition {
                id: self.id.clone(),
                from: self.state.as_str(),
                to: to.as_str(),
            });
        }
        self.state = to;
        Ok(())
    }

    /// Records the isolated section of a whole (unsplit) report.
    pub fn isolate(&mut self, section: String, laterality: Laterality) -> Result<()> {
        self.advance(ReportState::Isolated)?;
        self.section = section;
        self.laterality = laterality;
        Ok(())
    }

    /// Derives one isolated half of a bilateral report; the id gets the side suffix.
    pub fn split_half(&self, section: String, side: Laterality) -> Result<Report> {
        if self.state != ReportState::Raw {
            return Err(ModelError::InvalidTransition {
                id: self.id.clone(),
                from: self.state.as_str(),
                to: ReportState::Isolated.as_str(),
            });
        }
        let mut half = Report::new(
            format!("{}{}", self.id, side.suffix()),
            self.report_type,
            self.text.clone(),
        );
        half.isolate(section, side)?;
        Ok(half)
    }

    /// Flags the report as having no synoptic section; the raw text is kept.
    pub fn mark_no_synoptic(&mut self, laterality: Laterality) -> Result<()> {
        self.advance(ReportState::Isolated)?;
        self.section = self.text.clone();
        self.laterality = laterality;
        self.no_synoptic = true;
        Ok(())
    }

    pub fn set_extracted(&mut self, extractions: BTreeMap<String, Value>) -> Result<()> {
        self.advance(ReportState::Extracted)?;
        self.extractions = extractions;
        Ok(())
    }

    pub fn set_normalized(&mut self, extractions: BTreeMap<String, Value>) -> Result<()> {
        self.advance(ReportState::Normalized)?;
        self.extractions = extractions;
        Ok(())
    }

    /// Stores the codes. The report is immutable from here on.
    pub fn set_encoded(&mut self, encoded: BTreeMap<String, String>) -> Result<()> {
        self.advance(ReportState::Encoded)?;
        self.encoded = encoded;
        Ok(())
    }

    pub fn is_encoded(&self) -> bool {
        self.state == ReportState::Encoded
    }
}
