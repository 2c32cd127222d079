//! Cross-validation selector
//!
//! Each candidate is trained on K-1 folds of the word's sequences and scored
//! on the held-out fold; the criterion is the mean held-out log-likelihood.

use super::base::{BestCandidate, ModelSelector, Selection, SelectorBase};
use super::config::SelectorConfig;
use super::error::SelectionResult;
use crate::data::{combine_sequences, kfold_split, Fold, WordsData};
use crate::models::{GaussianHmmTrainer, ModelTrainer, SequenceScorer};
use statrs::statistics::Statistics;

/// Picks the topology with the best mean held-out log-likelihood
///
/// The winner is refitted on all of the word's sequences. Too few sequences
/// for the fold count, or any fit/score failure, abandons the search in
/// favour of the constant topology. The working data is the full word data
/// again whenever `select` returns.
#[derive(Debug, Clone)]
pub struct SelectorCv<'a, T: ModelTrainer = GaussianHmmTrainer> {
    base: SelectorBase<'a, T>,
}

impl<'a> SelectorCv<'a> {
    pub fn new(
        words: &'a WordsData,
        this_word: &str,
        config: SelectorConfig,
    ) -> SelectionResult<Self> {
        Ok(Self::from_base(SelectorBase::new(words, this_word, config)?))
    }
}

impl<'a, T: ModelTrainer> SelectorCv<'a, T> {
    pub fn from_base(base: SelectorBase<'a, T>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &SelectorBase<'a, T> {
        &self.base
    }

    /// Mean held-out log-likelihood; leaves the working data on the last
    /// training fold
    fn cross_validate(&mut self, n_states: usize, folds: &[Fold]) -> Result<f64, String> {
        let sequences = self.base.sequences();
        let mut log_likelihoods = Vec::with_capacity(folds.len());

        for fold in folds {
            let train = combine_sequences(&fold.train, sequences).map_err(|e| e.to_string())?;
            self.base.set_data(train);
            let model = self
                .base
                .base_model(n_states)
                .map_err(|e| format!("{n_states} states failed to fit: {e}"))?;

            let held_out = combine_sequences(&fold.test, sequences).map_err(|e| e.to_string())?;
            let log_l = model
                .score(held_out.x(), held_out.lengths())
                .map_err(|e| format!("{n_states} states failed to score: {e}"))?;
            log_likelihoods.push(log_l);
        }

        Ok(log_likelihoods.mean())
    }
}

impl<'a, T: ModelTrainer> ModelSelector for SelectorCv<'a, T> {
    type Model = T::Model;

    fn select_detailed(&mut self) -> SelectionResult<Selection<T::Model>> {
        let folds = match kfold_split(self.base.sequences().len(), self.base.config().cv_folds) {
            Ok(folds) => folds,
            Err(err) => return self.base.fallback(&err.to_string(), vec![]),
        };

        let mut best = BestCandidate::new();
        for n_states in self.base.config().candidates() {
            let result = self.cross_validate(n_states, &folds);
            self.base.restore_data();

            match result {
                Ok(mean) => {
                    tracing::debug!(
                        "{}: {} states, mean held-out logL {:.4}",
                        self.base.this_word(),
                        n_states,
                        mean
                    );
                    best.offer(n_states, mean, ());
                }
                Err(reason) => return best.abandon(&self.base, &reason),
            }
        }

        let (winner, candidates) = best.into_parts();
        let Some((n_states, criterion, ())) = winner else {
            return self.base.fallback("no candidate could be scored", candidates);
        };

        match self.base.base_model(n_states) {
            Ok(model) => {
                tracing::info!(
                    "{}: selected {} states (criterion {:.4})",
                    self.base.this_word(),
                    n_states,
                    criterion
                );
                Ok(Selection {
                    model,
                    n_states,
                    criterion: Some(criterion),
                    fell_back: false,
                    candidates,
                })
            }
            Err(err) => self
                .base
                .fallback(&format!("refit with {n_states} states failed: {err}"), candidates),
        }
    }
}
