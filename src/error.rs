use thiserror::Error;

/// Failures of the scoring-to-recommendation pipeline.
///
/// Row-count mismatches between recommendations and holdout are not errors;
/// they are reported through [`crate::evaluation::Truncation`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecError {
    #[error("{method} model is not ready, build it first")]
    NotReady { method: String },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("{missing} test feedback value(s) are not present in training data")]
    DataAlignment { missing: usize },

    #[error("Unrecognized value for flattener: {0}")]
    UnrecognizedPolicy(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised by external factorizers; the crate never produces it itself.
    #[error("Factorization failed: {0}")]
    Factorization(String),
}

pub type Result<T> = std::result::Result<T, RecError>;

#[cfg(feature = "python")]
impl From<RecError> for pyo3::PyErr {
    fn from(error: RecError) -> Self {
        pyo3::exceptions::PyValueError::new_err(error.to_string())
    }
}
