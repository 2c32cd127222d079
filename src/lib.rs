//! # Sign HMM Recognizer
//!
//! Trains one Gaussian Hidden Markov Model per vocabulary word, choosing the
//! number of hidden states with a pluggable selection criterion, then
//! recognizes test utterances by scoring them against every word model.
//!
//! ## Modules
//!
//! - `data` - Per-word training sequences, the ordered test set, K-fold splits
//! - `models` - Diagonal-covariance Gaussian HMM (Baum-Welch, forward scoring, Viterbi)
//! - `selection` - Constant, BIC, DIC and cross-validation model selectors
//! - `recognizer` - Scores test items against all word models and picks the best word
//!
//! ## Example
//!
//! ```no_run
//! use sign_recognizer::prelude::*;
//! # fn run(words: &WordsData, test_set: &SinglesData) -> Result<(), Box<dyn std::error::Error>> {
//! let config = SelectorConfig::default().with_range(2, 6);
//! let models = train_words(words, SelectorKind::Bic, &config);
//! let recognition = recognize(&models, test_set)?;
//! println!("guesses: {:?}", recognition.guesses);
//! # Ok(())
//! # }
//! ```

pub mod data;
pub mod models;
pub mod recognizer;
pub mod selection;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::data::{
        combine_sequences, kfold_split, DataError, SinglesData, WordsData, XLengths,
    };
    pub use crate::models::{
        FitError, GaussianHmm, GaussianHmmTrainer, HmmConfig, ModelTrainer, ScoreError,
        SequenceScorer,
    };
    pub use crate::recognizer::{recognize, Recognition, RecognitionError, Recognizer};
    pub use crate::selection::{
        bic_score, dic_score, free_parameters, train_words, CandidateScore, ModelSelector,
        Selection, SelectionError, SelectorBase, SelectorBic, SelectorConfig, SelectorConstant,
        SelectorCv, SelectorDic, SelectorKind,
    };
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
