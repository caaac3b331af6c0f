use thiserror::Error;

/// Recoverable failures of the analytics engine. Callers render a placeholder
/// or prompt state for each of these; none of them is fatal.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no records to aggregate: {0}")]
    EmptyInput(String),

    #[error("invalid year selection: {0}")]
    InvalidSelection(String),
}
