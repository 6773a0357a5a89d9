use std::time::Duration;

use synoptic_core::BatchOutput;
use synoptic_model::ReportType;

use synoptic_cli::output::OutputPaths;

/// Everything the summary shows about one run.
#[derive(Debug)]
pub struct RunResult {
    pub report_type: ReportType,
    pub outputs: OutputPaths,
    pub batch: BatchOutput,
    /// Rows written to each CSV.
    pub rows: usize,
    pub elapsed: Duration,
}

impl RunResult {
    pub fn has_errors(&self) -> bool {
        !self.batch.failed.is_empty()
    }
}
