//! Selection error types

use crate::data::DataError;
use crate::models::FitError;
use thiserror::Error;

/// Errors surfaced by a model selector
///
/// Per-candidate failures never show up here; the selector turns them into
/// the constant-topology fallback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SelectionError {
    #[error("word '{0}' has no training data")]
    UnknownWord(String),

    #[error("invalid selector configuration: {0}")]
    InvalidConfig(String),

    #[error("unknown selector '{0}', expected one of: constant, bic, dic, cv")]
    UnknownSelector(String),

    #[error("constant-topology model with {n_states} states for '{word}' failed: {source}")]
    ConstantFitFailed {
        word: String,
        n_states: usize,
        #[source]
        source: FitError,
    },

    #[error(transparent)]
    Data(#[from] DataError),
}

/// Result type for selection
pub type SelectionResult<T> = Result<T, SelectionError>;
