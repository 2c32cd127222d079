//! Model error types

use thiserror::Error;

/// Errors raised while fitting an HMM
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FitError {
    #[error("not enough data: {n_frames} frames for {n_states} states")]
    InsufficientData { n_states: usize, n_frames: usize },

    #[error("invalid sequence lengths: {0}")]
    InvalidLengths(String),

    #[error("observations contain non-finite values")]
    NonFinite,

    #[error("invalid model parameters: {0}")]
    InvalidParameters(String),

    #[error("numerical failure after {iteration} iterations: {message}")]
    NumericalFailure { iteration: usize, message: String },
}

/// Errors raised while scoring observations against a fitted model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScoreError {
    #[error("model expects {expected} features, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid sequence lengths: {0}")]
    InvalidLengths(String),

    #[error("log-likelihood is not a number")]
    NonFinite,

    #[error("scoring failed: {0}")]
    Other(String),
}

/// Result type for fitting
pub type FitResult<T> = Result<T, FitError>;

/// Result type for scoring
pub type ScoreResult<T> = Result<T, ScoreError>;

/// Check that `lengths` partitions `n_rows` frames into non-empty sequences.
pub(crate) fn check_lengths(n_rows: usize, lengths: &[usize]) -> Result<(), String> {
    if lengths.is_empty() {
        return Err("no sequences given".to_string());
    }
    if lengths.iter().any(|&l| l == 0) {
        return Err("zero-length sequence".to_string());
    }
    let total: usize = lengths.iter().sum();
    if total != n_rows {
        return Err(format!(
            "lengths sum to {} but observations have {} rows",
            total, n_rows
        ));
    }
    Ok(())
}
