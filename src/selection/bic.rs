//! Bayesian Information Criterion selector
//!
//! `BIC = -2 * logL + p * logN`, lower is better. The search stores `-BIC`
//! so that the usual "largest criterion wins" rule applies.

use super::base::{BestCandidate, ModelSelector, Selection, SelectorBase};
use super::config::SelectorConfig;
use super::error::SelectionResult;
use crate::data::WordsData;
use crate::models::{GaussianHmmTrainer, ModelTrainer, SequenceScorer};

/// Free parameters of a diagonal-covariance Gaussian HMM
///
/// `k^2` transition/initial probabilities and `2 * d * k` means and
/// variances, minus one for the sum-to-one constraint.
pub fn free_parameters(n_states: usize, n_features: usize) -> usize {
    n_states * n_states + 2 * n_features * n_states - 1
}

/// Bayesian Information Criterion
pub fn bic_score(log_likelihood: f64, n_parameters: usize, n_frames: usize) -> f64 {
    -2.0 * log_likelihood + n_parameters as f64 * (n_frames as f64).ln()
}

/// Picks the topology with the lowest BIC
///
/// Any fit or scoring failure abandons the search in favour of the constant
/// topology.
#[derive(Debug, Clone)]
pub struct SelectorBic<'a, T: ModelTrainer = GaussianHmmTrainer> {
    base: SelectorBase<'a, T>,
}

impl<'a> SelectorBic<'a> {
    pub fn new(
        words: &'a WordsData,
        this_word: &str,
        config: SelectorConfig,
    ) -> SelectionResult<Self> {
        Ok(Self::from_base(SelectorBase::new(words, this_word, config)?))
    }
}

impl<'a, T: ModelTrainer> SelectorBic<'a, T> {
    pub fn from_base(base: SelectorBase<'a, T>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &SelectorBase<'a, T> {
        &self.base
    }
}

impl<'a, T: ModelTrainer> ModelSelector for SelectorBic<'a, T> {
    type Model = T::Model;

    fn select_detailed(&mut self) -> SelectionResult<Selection<T::Model>> {
        let data = self.base.data();
        let n_features = data.n_features();
        let n_frames = data.n_frames();
        let mut best = BestCandidate::new();

        for n_states in self.base.config().candidates() {
            let model = match self.base.base_model(n_states) {
                Ok(model) => model,
                Err(err) => {
                    let reason = format!("{n_states} states failed to fit: {err}");
                    return best.abandon(&self.base, &reason);
                }
            };
            let log_l = match model.score(data.x(), data.lengths()) {
                Ok(log_l) if log_l.is_finite() => log_l,
                Ok(log_l) => {
                    return best.abandon(&self.base, &format!("{n_states} states scored {log_l}"));
                }
                Err(err) => {
                    let reason = format!("{n_states} states failed to score: {err}");
                    return best.abandon(&self.base, &reason);
                }
            };

            let bic = bic_score(log_l, free_parameters(n_states, n_features), n_frames);
            tracing::debug!(
                "{}: {} states, logL {:.4}, BIC {:.4}",
                self.base.this_word(),
                n_states,
                log_l,
                bic
            );
            best.offer(n_states, -bic, model);
        }

        best.finish(&self.base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_parameters() {
        // 3 states, 4 features: 9 + 24 - 1
        assert_eq!(free_parameters(3, 4), 32);
        assert_eq!(free_parameters(1, 1), 2);
    }

    #[test]
    fn test_bic_penalizes_complexity() {
        let simple = bic_score(-100.0, 10, 50);
        let complex = bic_score(-100.0, 20, 50);
        assert!(complex > simple);

        let expected = 200.0 + 10.0 * 50f64.ln();
        assert!((simple - expected).abs() < 1e-12);
    }
}
