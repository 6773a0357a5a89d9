//! Error types for value transforms.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("{transform}: cannot read '{value}': {reason}")]
    InvalidInput {
        transform: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("{transform}: column '{column}' has no usable value")]
    MissingDependency {
        transform: &'static str,
        column: String,
    },

    #[error("unknown transform: {0}")]
    UnknownTransform(String),

    #[error("transform '{name}' cannot clean column '{column}': it is computed at encoding")]
    NotCleaning { name: String, column: String },
}

impl TransformError {
    pub(crate) fn invalid(transform: &'static str, value: &str, reason: &'static str) -> Self {
        Self::InvalidInput {
            transform,
            value: value.to_string(),
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, TransformError>;
