//! Model selection module
//!
//! One selector per criterion, all searching `min_n_components..=max_n_components`
//! in ascending order and keeping the first strict maximum:
//!
//! - [`SelectorConstant`] - fixed `n_constant` states, no search
//! - [`SelectorBic`] - lowest Bayesian Information Criterion
//! - [`SelectorDic`] - highest Discriminative Information Criterion
//! - [`SelectorCv`] - best mean held-out log-likelihood
//!
//! Every selector falls back to the constant topology when its search
//! fails.

mod base;
mod bic;
mod config;
mod constant;
mod cv;
mod dic;
mod error;

pub use base::{CandidateScore, ModelSelector, Selection, SelectorBase};
pub use bic::{bic_score, free_parameters, SelectorBic};
pub use config::SelectorConfig;
pub use constant::SelectorConstant;
pub use cv::SelectorCv;
pub use dic::{dic_score, SelectorDic};
pub use error::{SelectionError, SelectionResult};

use crate::data::WordsData;
use crate::models::{GaussianHmm, GaussianHmmTrainer, ModelTrainer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Selection criterion, for choosing a selector at runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectorKind {
    Constant,
    Bic,
    Dic,
    Cv,
}

impl SelectorKind {
    /// All kinds, in declaration order
    pub const ALL: [SelectorKind; 4] = [
        SelectorKind::Constant,
        SelectorKind::Bic,
        SelectorKind::Dic,
        SelectorKind::Cv,
    ];

    /// Run this kind of selector for one word with Gaussian HMMs
    pub fn select(
        self,
        words: &WordsData,
        this_word: &str,
        config: &SelectorConfig,
    ) -> SelectionResult<Selection<GaussianHmm>> {
        let trainer = GaussianHmmTrainer::new(config.hmm.clone());
        self.select_with(words, this_word, config, trainer)
    }

    /// Run this kind of selector for one word with a custom trainer
    pub fn select_with<T: ModelTrainer>(
        self,
        words: &WordsData,
        this_word: &str,
        config: &SelectorConfig,
        trainer: T,
    ) -> SelectionResult<Selection<T::Model>> {
        let base = SelectorBase::with_trainer(words, this_word, config.clone(), trainer)?;
        match self {
            SelectorKind::Constant => SelectorConstant::from_base(base).select_detailed(),
            SelectorKind::Bic => SelectorBic::from_base(base).select_detailed(),
            SelectorKind::Dic => SelectorDic::from_base(base).select_detailed(),
            SelectorKind::Cv => SelectorCv::from_base(base).select_detailed(),
        }
    }
}

impl fmt::Display for SelectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SelectorKind::Constant => "constant",
            SelectorKind::Bic => "bic",
            SelectorKind::Dic => "dic",
            SelectorKind::Cv => "cv",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for SelectorKind {
    type Err = SelectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "constant" => Ok(SelectorKind::Constant),
            "bic" => Ok(SelectorKind::Bic),
            "dic" => Ok(SelectorKind::Dic),
            "cv" => Ok(SelectorKind::Cv),
            _ => Err(SelectionError::UnknownSelector(s.to_string())),
        }
    }
}

/// Train one model per vocabulary word
///
/// A word whose constant-topology fallback also fails maps to `None`; the
/// recognizer scores such words as negative infinity.
pub fn train_words(
    words: &WordsData,
    kind: SelectorKind,
    config: &SelectorConfig,
) -> BTreeMap<String, Option<GaussianHmm>> {
    words
        .words()
        .map(|word| {
            let model = match kind.select(words, word, config) {
                Ok(selection) => {
                    tracing::debug!(
                        "{} ({}): {} states{}",
                        word,
                        kind,
                        selection.n_states,
                        if selection.fell_back { ", fallback" } else { "" }
                    );
                    Some(selection.model)
                }
                Err(err) => {
                    tracing::warn!("{} ({}): no model: {}", word, kind, err);
                    None
                }
            };
            (word.to_string(), model)
        })
        .collect()
}
