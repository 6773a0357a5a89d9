//! Report pipeline: OCR text in, encoded rows out.
//!
//! - **options**: run configuration, readable from TOML
//! - **resources**: startup inputs loaded from disk
//! - **pipeline**: stage order and the report lifecycle
//! - **batch**: accumulation over many reports

#![deny(unsafe_code)]

pub mod batch;
pub mod options;
pub mod pipeline;
pub mod resources;

pub use batch::{BatchOutput, run_batch};
pub use options::{DEFAULT_MIN_WORD_COUNT, PipelineOptions};
pub use pipeline::{Pipeline, ReportOutcome};
pub use resources::{InputPaths, Resources};
