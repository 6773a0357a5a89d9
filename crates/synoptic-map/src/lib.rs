//! Schema pattern compilation, extraction, and label normalization.

#![deny(unsafe_code)]

pub mod compiler;
pub mod error;
pub mod extractor;
pub mod normalizer;
pub mod repair;

pub use compiler::{
    ColumnPattern, CompilerOptions, DEFAULT_ANCHOR, GenericPattern, SchemaPattern,
};
pub use error::{PatternError, Result};
pub use extractor::{Extraction, Extractor, GenericPair};
pub use normalizer::{
    AutocorrectSettings, Normalized, Normalizer, NormalizerOptions, edit_distance,
};
pub use repair::RepairRules;
