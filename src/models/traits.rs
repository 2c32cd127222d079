//! Seams between the selection layer and the statistical model

use super::error::{FitResult, ScoreResult};
use super::hmm::{GaussianHmm, HmmConfig};
use ndarray::Array2;

/// Anything that can report the log-likelihood of concatenated sequences
pub trait SequenceScorer {
    /// Log-likelihood of `x`, split into sequences by `lengths`
    fn score(&self, x: &Array2<f64>, lengths: &[usize]) -> ScoreResult<f64>;
}

/// Fits a model with a given number of hidden states
pub trait ModelTrainer {
    type Model: SequenceScorer;

    fn fit(
        &self,
        n_states: usize,
        x: &Array2<f64>,
        lengths: &[usize],
        seed: u64,
    ) -> FitResult<Self::Model>;
}

impl SequenceScorer for GaussianHmm {
    fn score(&self, x: &Array2<f64>, lengths: &[usize]) -> ScoreResult<f64> {
        GaussianHmm::score(self, x, lengths)
    }
}

impl<M: SequenceScorer + ?Sized> SequenceScorer for Box<M> {
    fn score(&self, x: &Array2<f64>, lengths: &[usize]) -> ScoreResult<f64> {
        (**self).score(x, lengths)
    }
}

impl<M: SequenceScorer + ?Sized> SequenceScorer for &M {
    fn score(&self, x: &Array2<f64>, lengths: &[usize]) -> ScoreResult<f64> {
        (**self).score(x, lengths)
    }
}

/// Trains diagonal-covariance [`GaussianHmm`]s with Baum-Welch
#[derive(Debug, Clone, Default)]
pub struct GaussianHmmTrainer {
    config: HmmConfig,
}

impl GaussianHmmTrainer {
    /// Create trainer with custom settings
    pub fn new(config: HmmConfig) -> Self {
        Self { config }
    }

    /// Training settings
    pub fn config(&self) -> &HmmConfig {
        &self.config
    }
}

impl ModelTrainer for GaussianHmmTrainer {
    type Model = GaussianHmm;

    fn fit(
        &self,
        n_states: usize,
        x: &Array2<f64>,
        lengths: &[usize],
        seed: u64,
    ) -> FitResult<GaussianHmm> {
        GaussianHmm::fit(n_states, x, lengths, seed, &self.config)
    }
}
