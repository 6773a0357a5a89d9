//! Error types for encoder construction.

use synoptic_model::ModelError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncodeError {
    #[error("code book does not resolve against the schema: {0}")]
    CodeBook(#[from] ModelError),

    #[error("training floor {0} is outside [0, 1]")]
    TrainingFloor(f32),
}

pub type Result<T> = std::result::Result<T, EncodeError>;
