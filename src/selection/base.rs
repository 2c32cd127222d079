//! Shared selector state, the selector trait and candidate bookkeeping

use super::config::SelectorConfig;
use super::error::{SelectionError, SelectionResult};
use crate::data::{WordsData, XLengths};
use crate::models::{FitResult, GaussianHmmTrainer, ModelTrainer};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Criterion value reached by one candidate topology
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    /// Number of hidden states
    pub n_states: usize,
    /// Selection value, higher is better
    pub criterion: f64,
}

/// Outcome of a selection
#[derive(Debug, Clone)]
pub struct Selection<M> {
    /// Chosen fitted model
    pub model: M,
    /// Its number of hidden states
    pub n_states: usize,
    /// Winning criterion value, `None` for constant or fallback models
    pub criterion: Option<f64>,
    /// Whether the constant-topology fallback was used
    pub fell_back: bool,
    /// Every candidate scored before the search ended, ascending
    pub candidates: Vec<CandidateScore>,
}

/// A strategy that picks one fitted model for a word
pub trait ModelSelector {
    type Model;

    /// Run the search and report how the model was chosen
    fn select_detailed(&mut self) -> SelectionResult<Selection<Self::Model>>;

    /// Run the search and return only the chosen model
    fn select(&mut self) -> SelectionResult<Self::Model> {
        self.select_detailed().map(|selection| selection.model)
    }
}

/// State every selector shares: the word's data, settings and trainer
#[derive(Debug, Clone)]
pub struct SelectorBase<'a, T: ModelTrainer = GaussianHmmTrainer> {
    words: &'a WordsData,
    this_word: String,
    sequences: &'a [Array2<f64>],
    full_data: &'a XLengths,
    data: XLengths,
    config: SelectorConfig,
    trainer: T,
}

impl<'a> SelectorBase<'a, GaussianHmmTrainer> {
    /// Create base fitting Gaussian HMMs with `config.hmm`
    pub fn new(
        words: &'a WordsData,
        this_word: &str,
        config: SelectorConfig,
    ) -> SelectionResult<Self> {
        let trainer = GaussianHmmTrainer::new(config.hmm.clone());
        Self::with_trainer(words, this_word, config, trainer)
    }
}

impl<'a, T: ModelTrainer> SelectorBase<'a, T> {
    /// Create base with a custom trainer
    pub fn with_trainer(
        words: &'a WordsData,
        this_word: &str,
        config: SelectorConfig,
        trainer: T,
    ) -> SelectionResult<Self> {
        config.validate()?;
        let unknown = || SelectionError::UnknownWord(this_word.to_string());
        let sequences = words.sequences(this_word).ok_or_else(unknown)?;
        let full_data = words.xlengths(this_word).ok_or_else(unknown)?;

        Ok(Self {
            words,
            this_word: this_word.to_string(),
            sequences,
            full_data,
            data: full_data.clone(),
            config,
            trainer,
        })
    }

    /// Fit a model with `num_states` states to the current working data
    pub fn base_model(&self, num_states: usize) -> FitResult<T::Model> {
        let result = self.trainer.fit(
            num_states,
            self.data.x(),
            self.data.lengths(),
            self.config.random_state,
        );

        match &result {
            Ok(_) if self.config.verbose => {
                tracing::info!("model created for {} with {} states", self.this_word, num_states);
            }
            Err(err) if self.config.verbose => {
                tracing::info!("failure on {} with {} states: {}", self.this_word, num_states, err);
            }
            Err(err) => {
                tracing::debug!(
                    "failure on {} with {} states: {}",
                    self.this_word,
                    num_states,
                    err
                );
            }
            Ok(_) => {}
        }

        result
    }

    /// Fit the constant topology, the only fit whose failure is fatal
    pub fn constant_model(&self) -> SelectionResult<T::Model> {
        let n_states = self.config.n_constant;
        self.base_model(n_states)
            .map_err(|source| SelectionError::ConstantFitFailed {
                word: self.this_word.clone(),
                n_states,
                source,
            })
    }

    /// Abandon a search and return the constant-topology model
    pub fn fallback(
        &self,
        reason: &str,
        candidates: Vec<CandidateScore>,
    ) -> SelectionResult<Selection<T::Model>> {
        tracing::warn!(
            "{}: falling back to {} states ({})",
            self.this_word,
            self.config.n_constant,
            reason
        );
        let model = self.constant_model()?;
        Ok(Selection {
            model,
            n_states: self.config.n_constant,
            criterion: None,
            fell_back: true,
            candidates,
        })
    }

    /// All training data, for scoring against other words
    pub fn words(&self) -> &'a WordsData {
        self.words
    }

    /// Word this selector trains
    pub fn this_word(&self) -> &str {
        &self.this_word
    }

    /// The word's individual sequences
    pub fn sequences(&self) -> &'a [Array2<f64>] {
        self.sequences
    }

    /// Current working data that `base_model` fits to
    pub fn data(&self) -> &XLengths {
        &self.data
    }

    /// Settings
    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Model trainer
    pub fn trainer(&self) -> &T {
        &self.trainer
    }

    pub(crate) fn set_data(&mut self, data: XLengths) {
        self.data = data;
    }

    /// Reset the working data to the word's full data
    pub(crate) fn restore_data(&mut self) {
        self.data = self.full_data.clone();
    }
}

/// Running maximum over candidates scanned in ascending state count.
///
/// Only a strictly greater criterion replaces the current best, so ties go
/// to the smallest state count. NaN never wins.
#[derive(Debug)]
pub(crate) struct BestCandidate<M> {
    best: Option<(usize, f64, M)>,
    scores: Vec<CandidateScore>,
}

impl<M> BestCandidate<M> {
    pub(crate) fn new() -> Self {
        Self {
            best: None,
            scores: Vec::new(),
        }
    }

    pub(crate) fn offer(&mut self, n_states: usize, criterion: f64, model: M) {
        self.scores.push(CandidateScore { n_states, criterion });
        if criterion.is_nan() {
            return;
        }
        let improves = match &self.best {
            Some((_, best, _)) => criterion > *best,
            None => true,
        };
        if improves {
            self.best = Some((n_states, criterion, model));
        }
    }

    /// Split into the winner, if any, and every recorded score
    pub(crate) fn into_parts(self) -> (Option<(usize, f64, M)>, Vec<CandidateScore>) {
        (self.best, self.scores)
    }

    /// Give up on the search, keeping the scores gathered so far
    pub(crate) fn abandon<T: ModelTrainer>(
        self,
        base: &SelectorBase<'_, T>,
        reason: &str,
    ) -> SelectionResult<Selection<T::Model>> {
        base.fallback(reason, self.scores)
    }

    /// Winner as a selection, or the fallback when nothing was scored
    pub(crate) fn finish<T: ModelTrainer<Model = M>>(
        self,
        base: &SelectorBase<'_, T>,
    ) -> SelectionResult<Selection<M>> {
        match self.best {
            Some((n_states, criterion, model)) => {
                tracing::info!(
                    "{}: selected {} states (criterion {:.4})",
                    base.this_word(),
                    n_states,
                    criterion
                );
                Ok(Selection {
                    model,
                    n_states,
                    criterion: Some(criterion),
                    fell_back: false,
                    candidates: self.scores,
                })
            }
            None => base.fallback("no candidate could be scored", self.scores),
        }
    }
}
