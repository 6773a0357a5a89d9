//! Error types for pattern compilation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("failed to build pattern for {what}: {source}")]
    Build {
        what: String,
        #[source]
        source: regex::Error,
    },

    #[error("columns '{first}' and '{second}' share the group name '{group}'")]
    Collision {
        first: String,
        second: String,
        group: String,
    },

    #[error("invalid separator {0:?}")]
    Separator(char),
}

pub type Result<T> = std::result::Result<T, PatternError>;
