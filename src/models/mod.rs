//! HMM models module
//!
//! Provides a diagonal-covariance Gaussian HMM with Baum-Welch training,
//! forward scoring and Viterbi decoding, and the traits the selection layer
//! uses to treat it as an opaque collaborator.

mod algorithms;
mod error;
mod gaussian;
mod hmm;
mod traits;

pub use algorithms::{backward, forward, log_emissions, log_sum_exp, posteriors, viterbi};
pub use error::{FitError, FitResult, ScoreError, ScoreResult};
pub use gaussian::DiagonalGaussian;
pub use hmm::{GaussianHmm, HmmConfig};
pub use traits::{GaussianHmmTrainer, ModelTrainer, SequenceScorer};
