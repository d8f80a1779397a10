use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DsError>;

/// Errors raised by dynamic selection. All of them indicate caller misuse
/// and are reported before any output is produced.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DsError {
    /// Empty pool, inconsistent class sets, k larger than DSEL, or a DSEL
    /// too small to train a meta-classifier.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Prediction was requested before `fit`.
    #[error("{0} is not fitted yet, call `fit` before prediction")]
    NotFitted(String),

    #[error("Dimension mismatch: expected {expected} {what}, got {actual}")]
    DimensionMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

impl DsError {
    pub(crate) fn config<S: Into<String>>(msg: S) -> Self {
        DsError::Configuration(msg.into())
    }
}
