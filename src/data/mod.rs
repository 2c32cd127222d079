//! Observation data module
//!
//! Provides per-word training sequences, the ordered test set and the
//! helpers used to recombine sequences into cross-validation folds.

mod error;
mod folds;
mod types;

pub use error::{DataError, DataResult};
pub use folds::{kfold_split, Fold};
pub use types::{combine_sequences, SinglesData, WordsData, XLengths};
