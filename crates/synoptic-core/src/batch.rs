//! Batch driver: many reports, one accumulated result.

use anyhow::Result;
use synoptic_model::{AuditLog, Report};
use tracing::{error, info};

use crate::pipeline::{Pipeline, ReportOutcome};

/// Accumulated outputs of a run.
#[derive(Debug, Clone, Default)]
pub struct BatchOutput {
    /// Encoded reports in processing order; split halves stay adjacent.
    pub reports: Vec<Report>,
    pub audit: AuditLog,
    /// Source ids with no synoptic section.
    pub no_synoptic: Vec<String>,
    pub mostly_missing: Vec<String>,
    /// `(report id, column)` of every malfunction cell.
    pub malfunctions: Vec<(String, String)>,
    /// Source ids whose processing failed, with the error.
    pub failed: Vec<(String, String)>,
    /// Source reports seen.
    pub sources: usize,
    /// Source reports split into two halves.
    pub splits: usize,
}

impl BatchOutput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the outcome of one source report. A failed report is recorded
    /// and does not affect the others.
    pub fn record(&mut self, id: &str, result: Result<ReportOutcome>) {
        self.sources += 1;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(id, error = %format!("{err:#}"), "report failed");
                self.failed.push((id.to_string(), format!("{err:#}")));
                return;
            }
        };
        if outcome.no_synoptic {
            self.no_synoptic.push(id.to_string());
        }
        if outcome.is_split() {
            self.splits += 1;
        }
        self.audit.extend(outcome.audit);
        self.mostly_missing.extend(outcome.mostly_missing);
        self.malfunctions.extend(outcome.malfunctions);
        self.reports.extend(outcome.reports);
    }

    /// Concatenates the output of another worker.
    pub fn merge(&mut self, other: BatchOutput) {
        self.reports.extend(other.reports);
        self.audit.extend(other.audit);
        self.no_synoptic.extend(other.no_synoptic);
        self.mostly_missing.extend(other.mostly_missing);
        self.malfunctions.extend(other.malfunctions);
        self.failed.extend(other.failed);
        self.sources += other.sources;
        self.splits += other.splits;
    }
}

/// Processes `(id, text)` pairs in order.
pub fn run_batch<I, S, T>(pipeline: &Pipeline, inputs: I) -> BatchOutput
where
    I: IntoIterator<Item = (S, T)>,
    S: AsRef<str>,
    T: AsRef<str>,
{
    let mut output = BatchOutput::new();
    for (id, text) in inputs {
        let id = id.as_ref();
        output.record(id, pipeline.process_text(id, text.as_ref()));
    }
    info!(
        sources = output.sources,
        reports = output.reports.len(),
        no_synoptic = output.no_synoptic.len(),
        rewrites = output.audit.len(),
        failed = output.failed.len(),
        "batch complete"
    );
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn failures_are_recorded_and_counted() {
        let mut output = BatchOutput::new();
        output.record("3", Err(anyhow!("broken")));
        output.record(
            "4",
            Ok(ReportOutcome {
                no_synoptic: true,
                ..ReportOutcome::default()
            }),
        );
        assert_eq!(output.sources, 2);
        assert_eq!(output.failed, vec![("3".to_string(), "broken".to_string())]);
        assert_eq!(output.no_synoptic, vec!["4".to_string()]);
    }

    #[test]
    fn merge_concatenates_workers() {
        let mut first = BatchOutput::new();
        first.record("1", Ok(ReportOutcome::default()));
        let mut second = BatchOutput::new();
        second.record("2", Err(anyhow!("broken")));
        first.merge(second);
        assert_eq!(first.sources, 2);
        assert_eq!(first.failed.len(), 1);
    }
}
