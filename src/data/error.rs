//! Data layer error types

use thiserror::Error;

/// Errors raised while assembling word or test-set data
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataError {
    #[error("sequence {index} of '{word}' has no frames")]
    EmptySequence { word: String, index: usize },

    #[error("expected {expected} features, got {actual}")]
    FeatureMismatch { expected: usize, actual: usize },

    #[error("lengths sum to {total} but observations have {rows} rows")]
    LengthMismatch { total: usize, rows: usize },

    #[error("invalid lengths: {0}")]
    InvalidLengths(String),

    #[error("cannot split {n_samples} samples into {n_splits} folds")]
    TooFewSamples { n_samples: usize, n_splits: usize },

    #[error("fold count must be at least 2, got {0}")]
    InvalidFolds(usize),

    #[error("index {index} out of range for {len} sequences")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("no sequences for word '{0}'")]
    NoSequences(String),
}

/// Result type for data operations
pub type DataResult<T> = Result<T, DataError>;
