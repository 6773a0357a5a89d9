//! End-to-end processing of one report.
//!
//! # Stage order
//!
//! 1. **Vocabulary repair** (optional) - close OCR intra-word spaces
//! 2. **Isolation** - find the synoptic section, split bilateral reports
//! 3. **Extraction** - schema pattern plus generic `label: value` pairs
//! 4. **Normalization** - map generic labels onto missing columns, repairs
//! 5. **Cleaning** - report-type regime and per-column transforms
//! 6. **Encoding** - code-book lookup, dependency and computed columns

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use synoptic_encode::Encoder;
use synoptic_ingest::{SectionIsolator, SectionRules, VocabularyResolver};
use synoptic_map::{Extractor, Normalizer};
use synoptic_model::{AuditLog, MALFUNCTION_CODE, Report, ReportType};
use synoptic_transform::{TransformContext, TransformRegistry, ValueCleaner, default_registry};
use tracing::{debug, info, info_span, warn};

use crate::options::PipelineOptions;
use crate::resources::Resources;

/// Result of processing one source report.
#[derive(Debug, Clone, Default)]
pub struct ReportOutcome {
    /// One encoded report, or one per side of a split bilateral report.
    pub reports: Vec<Report>,
    /// Rewrites accepted while normalizing these reports.
    pub audit: AuditLog,
    /// No synoptic section was found.
    pub no_synoptic: bool,
    /// Ids of reports with most canonical columns missing.
    pub mostly_missing: Vec<String>,
    /// `(report id, column)` of every malfunction cell.
    pub malfunctions: Vec<(String, String)>,
}

impl ReportOutcome {
    pub fn is_split(&self) -> bool {
        self.reports.len() > 1
    }
}

/// Stages of one report type, built once per run.
pub struct Pipeline {
    options: PipelineOptions,
    resolver: Option<VocabularyResolver>,
    isolator: SectionIsolator,
    extractor: Extractor,
    normalizer: Normalizer,
    cleaner: ValueCleaner,
    encoder: Encoder,
    registry: &'static TransformRegistry,
    context: TransformContext,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("report_type", &self.options.report_type)
            .field("ocr_repair", &self.resolver.is_some())
            .field("encoder", &self.encoder)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    pub fn new(resources: Resources, options: PipelineOptions) -> Result<Self> {
        options.validate()?;
        let registry = default_registry();
        let report_type = options.report_type;

        let resolver = match (&resources.lexicon, options.ocr_repair) {
            (Some(lexicon), true) => Some(VocabularyResolver::new(lexicon.clone())),
            (None, true) => {
                warn!("OCR repair requested without a word list, skipping it");
                None
            }
            _ => None,
        };

        let rules = resources
            .section_rules
            .clone()
            .unwrap_or_else(|| SectionRules::defaults(report_type));
        let isolator =
            SectionIsolator::new(report_type, &rules).context("compile section anchors")?;

        let extractor = Extractor::new(&resources.schema, &options.compiler)
            .context("compile schema patterns")?;

        let mut cleaner = ValueCleaner::new(report_type);
        for (column, transform) in &options.column_transforms {
            if !resources.schema.contains(column) {
                warn!(column = %column, transform = %transform, "transform for unknown column ignored");
                continue;
            }
            cleaner
                .assign(registry, column, transform)
                .with_context(|| format!("assign transform to column '{column}'"))?;
        }

        let encoder = Encoder::with_default_embedder(
            resources.schema.clone(),
            resources.code_book,
            registry,
            options.encoder,
        )
        .context("build encoder")?;

        let normalizer = Normalizer::new(
            resources.schema,
            resources.exclusions,
            options.normalizer.clone(),
        );

        let context = TransformContext {
            categories: resources.categories,
            nottingham: options.nottingham.clone(),
        };

        info!(
            report_type = %report_type,
            description = report_type.description(),
            columns = normalizer.schema().len(),
            ocr_repair = resolver.is_some(),
            training = options.encoder.training,
            "pipeline ready"
        );
        Ok(Self {
            options,
            resolver,
            isolator,
            extractor,
            normalizer,
            cleaner,
            encoder,
            registry,
            context,
        })
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn report_type(&self) -> ReportType {
        self.options.report_type
    }

    pub fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }

    /// Processes raw OCR text under the given report id.
    pub fn process_text(&self, id: &str, text: &str) -> Result<ReportOutcome> {
        self.process(Report::new(id, self.options.report_type, text))
    }

    /// Runs every stage on a raw report.
    pub fn process(&self, mut report: Report) -> Result<ReportOutcome> {
        let span = info_span!("report", id = %report.id());
        let _guard = span.enter();

        if let Some(resolver) = &self.resolver {
            report.repair_text(|text| resolver.resolve(text))?;
        }

        let mut outcome = ReportOutcome::default();
        let isolation = self.isolator.isolate(report.text());
        if isolation.no_synoptic {
            info!(laterality = %isolation.laterality, "no synoptic section");
            report.mark_no_synoptic(isolation.laterality)?;
            report.set_encoded(BTreeMap::new())?;
            outcome.no_synoptic = true;
            outcome.reports.push(report);
            return Ok(outcome);
        }

        if isolation.is_split() {
            debug!(sections = isolation.sections.len(), "bilateral report split");
            for section in isolation.sections {
                let half = report.split_half(section.text, section.laterality)?;
                self.finish(half, &mut outcome)?;
            }
        } else {
            let section = isolation
                .sections
                .into_iter()
                .next()
                .map(|s| s.text)
                .unwrap_or_default();
            report.isolate(section, isolation.laterality)?;
            self.finish(report, &mut outcome)?;
        }
        Ok(outcome)
    }

    /// Extraction through encoding of one isolated report.
    fn finish(&self, mut report: Report, outcome: &mut ReportOutcome) -> Result<()> {
        let span = info_span!("section", id = %report.id(), laterality = %report.laterality());
        let _guard = span.enter();

        let extraction = self.extractor.extract(report.section());
        debug!(
            specific = extraction.specific.len(),
            generic = extraction.generic.len(),
            "extracted"
        );
        report.set_extracted(extraction.specific.clone())?;

        let normalized = self
            .normalizer
            .normalize(report.id(), extraction, report.section());
        if normalized.mostly_missing {
            outcome.mostly_missing.push(report.id().to_string());
        }
        outcome.audit.extend(normalized.audit);

        let cleaned = self
            .cleaner
            .clean_all(&normalized.extractions, self.registry, &self.context);
        report.set_normalized(cleaned.values)?;

        let mut encoded = self.encoder.encode(
            report.extractions(),
            self.registry,
            &self.context,
            report.report_type(),
        );
        for (column, _) in cleaned.failures {
            encoded
                .codes
                .insert(column.clone(), MALFUNCTION_CODE.to_string());
            if !encoded.malfunctions.contains(&column) {
                encoded.malfunctions.push(column);
            }
        }
        for column in encoded.malfunctions {
            outcome.malfunctions.push((report.id().to_string(), column));
        }
        debug!(
            values = report.extractions().len(),
            missing = normalized.missing,
            "encoded"
        );
        report.set_encoded(encoded.codes)?;
        outcome.reports.push(report);
        Ok(())
    }
}
