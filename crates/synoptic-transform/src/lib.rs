//! Value cleaning and named transforms.
//!
//! This crate provides the per-column post-processing of extracted values:
//!
//! - **cleaner**: default cleaning regimes for operative and pathology reports
//! - **registry**: transforms looked up by name, for cleaning or computed codes
//! - **stage**: TNM stage repair against the category table
//! - **measure**: millimetre values and clock positions
//! - **computed**: Nottingham score, histologic grade and reconstruction

#![deny(unsafe_code)]

pub mod cleaner;
pub mod computed;
pub mod error;
pub mod measure;
pub mod registry;
pub mod stage;

pub use cleaner::{Cleaned, ValueCleaner, clean_alpha, clean_numeric};
pub use computed::{HistologicGrade, NottinghamScore, Reconstruction, grade_for_total};
pub use error::{Result, TransformError};
pub use measure::{ClockPosition, Millimetres, clock_position, millimetres};
pub use registry::{
    NottinghamColumns, Transform, TransformContext, TransformInput, TransformKind,
    TransformRegistry, default_registry,
};
pub use stage::{TnmStage, repair_stage};
