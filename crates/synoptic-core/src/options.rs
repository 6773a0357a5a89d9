//! Run configuration.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use synoptic_encode::EncoderOptions;
use synoptic_map::{CompilerOptions, NormalizerOptions};
use synoptic_model::{DEFAULT_THRESHOLD, ReportType};
use synoptic_transform::NottinghamColumns;

/// Default minimum occurrence count of a domain word.
pub const DEFAULT_MIN_WORD_COUNT: u64 = 5;

/// Every knob of a pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    pub report_type: ReportType,
    /// Repair OCR intra-word spaces before isolation.
    pub ocr_repair: bool,
    /// Threshold of columns the thresholds file does not tune.
    pub default_threshold: f32,
    /// Domain words must occur this often in the frequency list.
    pub min_word_count: u64,
    pub compiler: CompilerOptions,
    pub normalizer: NormalizerOptions,
    pub encoder: EncoderOptions,
    /// Cleaning transform per canonical column.
    pub column_transforms: BTreeMap<String, String>,
    pub nottingham: NottinghamColumns,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            report_type: ReportType::Numeric,
            ocr_repair: false,
            default_threshold: DEFAULT_THRESHOLD,
            min_word_count: DEFAULT_MIN_WORD_COUNT,
            compiler: CompilerOptions::default(),
            normalizer: NormalizerOptions::default(),
            encoder: EncoderOptions::default(),
            column_transforms: BTreeMap::new(),
            nottingham: NottinghamColumns::default(),
        }
    }
}

impl PipelineOptions {
    pub fn new(report_type: ReportType) -> Self {
        Self {
            report_type,
            ..Self::default()
        }
    }

    /// Reads options from a TOML file; absent keys keep their defaults.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("read options {}", path.display()))?;
        let options: Self =
            toml::from_str(&source).with_context(|| format!("parse options {}", path.display()))?;
        options.validate()?;
        Ok(options)
    }

    #[must_use]
    pub fn with_autocorrect(mut self, enabled: bool) -> Self {
        self.normalizer.autocorrect.enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_training(mut self, training: bool) -> Self {
        self.encoder.training = training;
        self
    }

    #[must_use]
    pub fn with_ocr_repair(mut self, ocr_repair: bool) -> Self {
        self.ocr_repair = ocr_repair;
        self
    }

    #[must_use]
    pub fn with_column_transform(
        mut self,
        column: impl Into<String>,
        transform: impl Into<String>,
    ) -> Self {
        self.column_transforms
            .insert(column.into(), transform.into());
        self
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("default_threshold", self.default_threshold),
            ("normalizer.missing_ratio", self.normalizer.missing_ratio),
            ("encoder.training_floor", self.encoder.training_floor),
            (
                "normalizer.autocorrect.relative_threshold",
                self.normalizer.autocorrect.relative_threshold,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                bail!("{name} must be within [0, 1], got {value}");
            }
        }
        Ok(())
    }
}
