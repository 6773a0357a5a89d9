use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("duplicate canonical column: {0}")]
    DuplicateColumn(String),
    #[error("columns '{first}' and '{second}' produce the same variable name '{variable}'")]
    VariableCollision {
        first: String,
        second: String,
        variable: String,
    },
    #[error("threshold for '{column}' must be within [0, 1], got {value}")]
    InvalidThreshold { column: String, value: f32 },
    #[error("column '{0}' has no primary label")]
    MissingLabel(String),
    #[error("{}code book references unknown column '{column}'", row_prefix(*.row))]
    UnknownColumn { column: String, row: Option<usize> },
    #[error(
        "{}code -1 for '{column}' names '{target}', which is neither a column nor a transform",
        row_prefix(*.row)
    )]
    UnresolvedSpecialCode {
        column: String,
        target: String,
        row: Option<usize>,
    },
    #[error(
        "{}code -1 for '{column}' names '{target}', which is both a column and a transform",
        row_prefix(*.row)
    )]
    AmbiguousSpecialCode {
        column: String,
        target: String,
        row: Option<usize>,
    },
    #[error("report {id}: cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: &'static str,
        to: &'static str,
    },
}

/// `row N: ` for entries loaded from a file, empty otherwise.
fn row_prefix(row: Option<usize>) -> String {
    row.map(|n| format!("row {n}: ")).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ModelError>;
