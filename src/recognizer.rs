//! Recognizer: scores every test item against every word model

use crate::data::SinglesData;
use crate::models::SequenceScorer;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Recognition errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RecognitionError {
    #[error("no word models to recognize with")]
    NoModels,
}

/// Per-item likelihoods and guesses, index-aligned with ascending item id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recognition {
    /// Test item ids, ascending
    pub item_ids: Vec<usize>,
    /// Word -> log-likelihood for each item (negative infinity on failure)
    pub probabilities: Vec<BTreeMap<String, f64>>,
    /// Best word for each item
    pub guesses: Vec<String>,
}

impl Recognition {
    /// Number of recognized items
    pub fn len(&self) -> usize {
        self.guesses.len()
    }

    /// Whether nothing was recognized
    pub fn is_empty(&self) -> bool {
        self.guesses.is_empty()
    }

    /// Fraction of guesses that differ from the test set's labels
    ///
    /// `None` when some item has no label or the sets do not line up.
    pub fn word_error_rate(&self, test_set: &SinglesData) -> Option<f64> {
        if self.is_empty() || test_set.len() != self.len() {
            return None;
        }
        let mut errors = 0;
        for (id, guess) in self.item_ids.iter().zip(&self.guesses) {
            if test_set.word(*id)? != guess {
                errors += 1;
            }
        }
        Some(errors as f64 / self.len() as f64)
    }

    /// Items whose guess differs from the label, as `(id, expected, guess)`
    pub fn errors<'a>(&'a self, test_set: &'a SinglesData) -> Vec<(usize, &'a str, &'a str)> {
        self.item_ids
            .iter()
            .zip(&self.guesses)
            .filter_map(|(id, guess)| {
                let expected = test_set.word(*id)?;
                (expected != guess).then_some((*id, expected, guess.as_str()))
            })
            .collect()
    }
}

/// Word models in a fixed order, ready to score test items
///
/// Words are kept in ascending name order whatever map they came from, so
/// ties (including all-failing rows) always go to the alphabetically first
/// word.
#[derive(Debug, Clone)]
pub struct Recognizer<M> {
    models: Vec<(String, Option<M>)>,
}

impl<M: SequenceScorer> Recognizer<M> {
    /// Create from any word -> model mapping; `None` marks a word without a model
    pub fn new<I, S>(models: I) -> Self
    where
        I: IntoIterator<Item = (S, Option<M>)>,
        S: Into<String>,
    {
        let mut models: Vec<(String, Option<M>)> =
            models.into_iter().map(|(word, model)| (word.into(), model)).collect();
        models.sort_by(|a, b| a.0.cmp(&b.0));
        Self { models }
    }

    /// Vocabulary, ascending
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(|(word, _)| word.as_str())
    }

    /// Score every item against every model
    pub fn recognize(&self, test_set: &SinglesData) -> Result<Recognition, RecognitionError> {
        if self.models.is_empty() {
            return Err(RecognitionError::NoModels);
        }

        let mut recognition = Recognition {
            item_ids: Vec::with_capacity(test_set.len()),
            probabilities: Vec::with_capacity(test_set.len()),
            guesses: Vec::with_capacity(test_set.len()),
        };

        for (id, item) in test_set.iter() {
            let mut probs = BTreeMap::new();
            let mut best: Option<(&str, f64)> = None;

            for (word, model) in &self.models {
                let log_l = match model {
                    Some(model) => match model.score(item.x(), item.lengths()) {
                        Ok(log_l) if !log_l.is_nan() => log_l,
                        Ok(_) => f64::NEG_INFINITY,
                        Err(err) => {
                            tracing::debug!("item {}: model '{}' failed: {}", id, word, err);
                            f64::NEG_INFINITY
                        }
                    },
                    None => f64::NEG_INFINITY,
                };

                let improves = match best {
                    Some((_, best_l)) => log_l > best_l,
                    None => true,
                };
                if improves {
                    best = Some((word.as_str(), log_l));
                }
                probs.insert(word.clone(), log_l);
            }

            let guess = best.map(|(word, _)| word.to_string()).unwrap_or_default();
            recognition.item_ids.push(id);
            recognition.probabilities.push(probs);
            recognition.guesses.push(guess);
        }

        Ok(recognition)
    }
}

/// Score every test item against every word model
///
/// Accepts any mapping, e.g. `&HashMap<String, Option<GaussianHmm>>`.
pub fn recognize<'a, M, I>(
    models: I,
    test_set: &SinglesData,
) -> Result<Recognition, RecognitionError>
where
    M: SequenceScorer + 'a,
    I: IntoIterator<Item = (&'a String, &'a Option<M>)>,
{
    let recognizer = Recognizer::new(
        models
            .into_iter()
            .map(|(word, model)| (word.as_str(), model.as_ref())),
    );
    recognizer.recognize(test_set)
}
