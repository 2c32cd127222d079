//! Discriminative Information Criterion selector
//!
//! `DIC = log P(X_word) - mean(log P(X_other))` over every other word. A
//! model should explain its own word well and the rest of the vocabulary
//! badly.

use super::base::{BestCandidate, ModelSelector, Selection, SelectorBase};
use super::config::SelectorConfig;
use super::error::SelectionResult;
use crate::data::WordsData;
use crate::models::{GaussianHmmTrainer, ModelTrainer, SequenceScorer};
use statrs::statistics::Statistics;

/// Discriminative Information Criterion, `None` without other words
pub fn dic_score(this_log: f64, rest_logs: &[f64]) -> Option<f64> {
    if rest_logs.is_empty() {
        return None;
    }
    Some(this_log - rest_logs.mean())
}

/// Picks the topology with the highest DIC
///
/// Any fit or scoring failure abandons the search in favour of the constant
/// topology.
#[derive(Debug, Clone)]
pub struct SelectorDic<'a, T: ModelTrainer = GaussianHmmTrainer> {
    base: SelectorBase<'a, T>,
}

impl<'a> SelectorDic<'a> {
    pub fn new(
        words: &'a WordsData,
        this_word: &str,
        config: SelectorConfig,
    ) -> SelectionResult<Self> {
        Ok(Self::from_base(SelectorBase::new(words, this_word, config)?))
    }
}

impl<'a, T: ModelTrainer> SelectorDic<'a, T> {
    pub fn from_base(base: SelectorBase<'a, T>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &SelectorBase<'a, T> {
        &self.base
    }

    /// DIC of one fitted candidate
    fn criterion(&self, model: &T::Model) -> Result<f64, String> {
        let data = self.base.data();
        let this_log = model
            .score(data.x(), data.lengths())
            .map_err(|e| format!("scoring own data: {e}"))?;

        let mut rest_logs = Vec::with_capacity(self.base.words().len().saturating_sub(1));
        for (word, other) in self.base.words().iter_xlengths() {
            if word == self.base.this_word() {
                continue;
            }
            let log_l = model
                .score(other.x(), other.lengths())
                .map_err(|e| format!("scoring '{word}': {e}"))?;
            rest_logs.push(log_l);
        }

        dic_score(this_log, &rest_logs)
            .ok_or_else(|| "no other words to compare against".to_string())
    }
}

impl<'a, T: ModelTrainer> ModelSelector for SelectorDic<'a, T> {
    type Model = T::Model;

    fn select_detailed(&mut self) -> SelectionResult<Selection<T::Model>> {
        let mut best = BestCandidate::new();

        for n_states in self.base.config().candidates() {
            let model = match self.base.base_model(n_states) {
                Ok(model) => model,
                Err(err) => {
                    let reason = format!("{n_states} states failed to fit: {err}");
                    return best.abandon(&self.base, &reason);
                }
            };
            let dic = match self.criterion(&model) {
                Ok(dic) => dic,
                Err(reason) => return best.abandon(&self.base, &reason),
            };

            tracing::debug!("{}: {} states, DIC {:.4}", self.base.this_word(), n_states, dic);
            best.offer(n_states, dic, model);
        }

        best.finish(&self.base)
    }
}
