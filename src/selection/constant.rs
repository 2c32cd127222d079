//! Fixed-topology selector

use super::base::{ModelSelector, Selection, SelectorBase};
use super::config::SelectorConfig;
use super::error::SelectionResult;
use crate::data::WordsData;
use crate::models::{GaussianHmmTrainer, ModelTrainer};

/// Always fits `n_constant` states, no search
#[derive(Debug, Clone)]
pub struct SelectorConstant<'a, T: ModelTrainer = GaussianHmmTrainer> {
    base: SelectorBase<'a, T>,
}

impl<'a> SelectorConstant<'a> {
    pub fn new(
        words: &'a WordsData,
        this_word: &str,
        config: SelectorConfig,
    ) -> SelectionResult<Self> {
        Ok(Self::from_base(SelectorBase::new(words, this_word, config)?))
    }
}

impl<'a, T: ModelTrainer> SelectorConstant<'a, T> {
    pub fn from_base(base: SelectorBase<'a, T>) -> Self {
        Self { base }
    }

    pub fn base(&self) -> &SelectorBase<'a, T> {
        &self.base
    }
}

impl<'a, T: ModelTrainer> ModelSelector for SelectorConstant<'a, T> {
    type Model = T::Model;

    fn select_detailed(&mut self) -> SelectionResult<Selection<T::Model>> {
        let model = self.base.constant_model()?;
        Ok(Selection {
            model,
            n_states: self.base.config().n_constant,
            criterion: None,
            fell_back: false,
            candidates: vec![],
        })
    }
}
