//! Selector behaviour with a scripted trainer and with real Gaussian HMMs

mod common;

use ndarray::{arr2, Array2};
use sign_recognizer::prelude::*;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// How a scripted model scores data
#[derive(Debug, Clone, Copy)]
enum Script {
    /// More states fit marginally better, regardless of the data
    Flat,
    /// Two states explain everything equally; three states separate the words
    Discriminative,
    /// Held-out likelihood peaks at three states
    PeakAtThree,
}

impl Script {
    fn score(self, n_states: usize, x: &Array2<f64>) -> f64 {
        match self {
            Script::Flat => -100.0 + n_states as f64,
            Script::Discriminative => match n_states {
                3 if x[[0, 0]] < 1.0 => -12.0,
                3 => -100.0,
                4 => -50.0,
                _ => -10.0,
            },
            Script::PeakAtThree => -((n_states as f64 - 3.0).powi(2)) - 10.0,
        }
    }
}

/// Model whose score is a function of its state count and the data
#[derive(Debug, Clone)]
struct ScriptedModel {
    n_states: usize,
    script: Script,
}

impl SequenceScorer for ScriptedModel {
    fn score(&self, x: &Array2<f64>, _lengths: &[usize]) -> Result<f64, ScoreError> {
        Ok(self.script.score(self.n_states, x))
    }
}

/// Trainer that records every requested state count
#[derive(Debug, Clone)]
struct ScriptedTrainer {
    fits: Rc<RefCell<Vec<usize>>>,
    fail_on: Vec<usize>,
    script: Script,
}

impl ScriptedTrainer {
    fn new(script: Script) -> Self {
        Self {
            fits: Rc::new(RefCell::new(Vec::new())),
            fail_on: Vec::new(),
            script,
        }
    }

    fn failing_on(mut self, fail_on: &[usize]) -> Self {
        self.fail_on = fail_on.to_vec();
        self
    }

    fn fits(&self) -> Vec<usize> {
        self.fits.borrow().clone()
    }
}

impl ModelTrainer for ScriptedTrainer {
    type Model = ScriptedModel;

    fn fit(
        &self,
        n_states: usize,
        _x: &Array2<f64>,
        _lengths: &[usize],
        _seed: u64,
    ) -> Result<ScriptedModel, FitError> {
        self.fits.borrow_mut().push(n_states);
        if self.fail_on.contains(&n_states) {
            return Err(FitError::NumericalFailure {
                iteration: 0,
                message: "scripted failure".into(),
            });
        }
        Ok(ScriptedModel {
            n_states,
            script: self.script,
        })
    }
}

/// Word "A" has frames near 0, word "B" frames near 5
fn two_words(n_sequences: usize) -> WordsData {
    let mut map = BTreeMap::new();
    let a: Vec<Array2<f64>> = (0..n_sequences)
        .map(|i| arr2(&[[0.0, i as f64], [0.1, 0.0]]))
        .collect();
    let b: Vec<Array2<f64>> = (0..n_sequences)
        .map(|i| arr2(&[[5.0, i as f64], [5.1, 0.0], [4.9, 1.0]]))
        .collect();
    map.insert("A".to_string(), a);
    map.insert("B".to_string(), b);
    WordsData::new(map).unwrap()
}

fn config(min: usize, max: usize) -> SelectorConfig {
    SelectorConfig::default().with_range(min, max)
}

#[test]
fn test_constant_fits_only_n_constant() {
    let words = two_words(3);
    let trainer = ScriptedTrainer::new(Script::Flat);
    let settings = config(2, 8).with_n_constant(5);
    let base = SelectorBase::with_trainer(&words, "A", settings, trainer.clone()).unwrap();

    let selection = SelectorConstant::from_base(base).select_detailed().unwrap();
    assert_eq!(selection.n_states, 5);
    assert_eq!(selection.model.n_states, 5);
    assert!(!selection.fell_back);
    assert!(selection.candidates.is_empty());
    assert_eq!(trainer.fits(), vec![5]);
}

#[test]
fn test_unknown_word() {
    let words = two_words(2);
    let trainer = ScriptedTrainer::new(Script::Flat);
    let err = SelectorBase::with_trainer(&words, "ZEBRA", config(2, 4), trainer).unwrap_err();
    assert_eq!(err, SelectionError::UnknownWord("ZEBRA".into()));
}

#[test]
fn test_bic_penalty_decides_between_close_fits() {
    let words = two_words(3);
    let trainer = ScriptedTrainer::new(Script::Flat);
    let base = SelectorBase::with_trainer(&words, "A", config(2, 4), trainer.clone()).unwrap();

    let selection = SelectorBic::from_base(base).select_detailed().unwrap();
    assert!(!selection.fell_back);
    assert_eq!(selection.candidates.len(), 3);
    assert_eq!(trainer.fits(), vec![2, 3, 4]);

    // Likelihood barely moves with more states, so the penalty decides
    assert_eq!(selection.n_states, 2);
    let n_frames = words.xlengths("A").unwrap().n_frames();
    let expected = -bic_score(-98.0, free_parameters(2, 2), n_frames);
    assert!((selection.criterion.unwrap() - expected).abs() < 1e-9);
}

#[test]
fn test_bic_abandons_on_failure() {
    let words = two_words(3);
    let trainer = ScriptedTrainer::new(Script::Flat).failing_on(&[3]);
    let settings = config(2, 4).with_n_constant(4);
    let base = SelectorBase::with_trainer(&words, "A", settings, trainer.clone()).unwrap();

    let selection = SelectorBic::from_base(base).select_detailed().unwrap();
    assert!(selection.fell_back);
    assert_eq!(selection.n_states, 4);
    assert_eq!(selection.criterion, None);
    assert_eq!(selection.candidates.len(), 1);
    // The search stops at the failure; 4 is the constant-topology fit
    assert_eq!(trainer.fits(), vec![2, 3, 4]);
}

#[test]
fn test_bic_constant_fit_failure_is_fatal() {
    let words = two_words(3);

    let trainer = ScriptedTrainer::new(Script::Flat).failing_on(&[2, 3, 4]);
    let settings = config(2, 4).with_n_constant(6);
    let base = SelectorBase::with_trainer(&words, "A", settings, trainer.clone()).unwrap();
    let selection = SelectorBic::from_base(base).select_detailed().unwrap();
    assert!(selection.fell_back);
    assert_eq!(selection.n_states, 6);
    assert_eq!(trainer.fits(), vec![2, 6]);

    let trainer = ScriptedTrainer::new(Script::Flat).failing_on(&[2, 3, 4]);
    let settings = config(2, 4).with_n_constant(3);
    let base = SelectorBase::with_trainer(&words, "A", settings, trainer).unwrap();
    let err = SelectorBic::from_base(base).select().unwrap_err();
    assert!(matches!(err, SelectionError::ConstantFitFailed { n_states: 3, .. }));
}

#[test]
fn test_empty_range_falls_back() {
    let words = two_words(3);
    for kind in SelectorKind::ALL {
        let selection = kind
            .select_with(&words, "A", &config(5, 3), ScriptedTrainer::new(Script::Flat))
            .unwrap();
        assert_eq!(selection.n_states, 3, "{kind}");
        assert_eq!(selection.fell_back, kind != SelectorKind::Constant, "{kind}");
    }
}

#[test]
fn test_dic_prefers_discriminative_candidate() {
    let words = two_words(3);

    let trainer = ScriptedTrainer::new(Script::Discriminative);
    let base = SelectorBase::with_trainer(&words, "A", config(2, 4), trainer).unwrap();
    let selection = SelectorDic::from_base(base).select_detailed().unwrap();
    assert_eq!(selection.n_states, 3);
    assert_eq!(selection.criterion, Some(88.0));

    // With the data swapped the same candidate is the least discriminative;
    // 2 and 4 tie at zero and the smaller wins
    let trainer = ScriptedTrainer::new(Script::Discriminative);
    let base = SelectorBase::with_trainer(&words, "B", config(2, 4), trainer).unwrap();
    let selection = SelectorDic::from_base(base).select_detailed().unwrap();
    let criteria: Vec<f64> = selection.candidates.iter().map(|c| c.criterion).collect();
    assert_eq!(criteria, vec![0.0, -88.0, 0.0]);
    assert_eq!(selection.n_states, 2);
}

#[test]
fn test_dic_abandons_on_failure() {
    let words = two_words(3);
    let trainer = ScriptedTrainer::new(Script::Discriminative).failing_on(&[3]);
    let settings = config(2, 4).with_n_constant(4);
    let base = SelectorBase::with_trainer(&words, "A", settings, trainer.clone()).unwrap();

    let selection = SelectorDic::from_base(base).select_detailed().unwrap();
    assert!(selection.fell_back);
    assert_eq!(selection.n_states, 4);
    assert_eq!(selection.candidates.len(), 1);
    assert_eq!(trainer.fits(), vec![2, 3, 4]);
}

#[test]
fn test_dic_single_word_falls_back() {
    let mut map = BTreeMap::new();
    map.insert("ONLY".to_string(), vec![arr2(&[[0.0, 0.0]])]);
    let words = WordsData::new(map).unwrap();

    let selection = SelectorKind::Dic
        .select_with(&words, "ONLY", &config(2, 3), ScriptedTrainer::new(Script::Flat))
        .unwrap();
    assert!(selection.fell_back);
}

#[test]
fn test_cv_picks_best_mean_and_restores_data() {
    let words = two_words(4);
    let trainer = ScriptedTrainer::new(Script::PeakAtThree);
    let base = SelectorBase::with_trainer(&words, "B", config(2, 4), trainer.clone()).unwrap();
    let mut selector = SelectorCv::from_base(base);

    let x_before = selector.base().data().clone();
    let selection = selector.select_detailed().unwrap();
    assert_eq!(selector.base().data(), &x_before);
    assert_eq!(selector.base().data(), words.xlengths("B").unwrap());

    assert_eq!(selection.n_states, 3);
    assert_eq!(selection.criterion, Some(-10.0));
    // Two folds per candidate, then one refit of the winner
    assert_eq!(trainer.fits(), vec![2, 2, 3, 3, 4, 4, 3]);
}

#[test]
fn test_cv_restores_data_after_failure() {
    let words = two_words(4);
    let trainer = ScriptedTrainer::new(Script::PeakAtThree).failing_on(&[3]);
    let settings = config(2, 4).with_n_constant(2);
    let base = SelectorBase::with_trainer(&words, "A", settings, trainer).unwrap();
    let mut selector = SelectorCv::from_base(base);

    let selection = selector.select_detailed().unwrap();
    assert!(selection.fell_back);
    assert_eq!(selection.n_states, 2);
    assert_eq!(selector.base().data(), words.xlengths("A").unwrap());
}

#[test]
fn test_cv_too_few_sequences() {
    let words = two_words(1);
    let trainer = ScriptedTrainer::new(Script::PeakAtThree);
    let base = SelectorBase::with_trainer(&words, "A", config(2, 4), trainer.clone()).unwrap();

    let selection = SelectorCv::from_base(base).select_detailed().unwrap();
    assert!(selection.fell_back);
    assert_eq!(trainer.fits(), vec![3]);
}

#[test]
fn test_bic_not_worse_than_constant() {
    let words = common::training_words(6, 11);
    let config = config(2, 4).with_n_constant(3);

    for word in words.words() {
        let mut selector = SelectorBic::new(&words, word, config.clone()).unwrap();
        let selection = selector.select_detailed().unwrap();
        assert!(!selection.fell_back);

        let mut selector = SelectorConstant::new(&words, word, config.clone()).unwrap();
        let constant = selector.select().unwrap();
        let data = words.xlengths(word).unwrap();
        let log_l = constant.score(data.x(), data.lengths()).unwrap();
        let constant_bic = bic_score(log_l, free_parameters(3, data.n_features()), data.n_frames());

        assert!(-selection.criterion.unwrap() <= constant_bic + 1e-9, "{word}");
    }
}

#[test]
fn test_cv_restores_real_data() {
    let words = common::training_words(4, 12);
    let mut selector = SelectorCv::new(&words, "JOHN", config(2, 3)).unwrap();

    let x_before = selector.base().data().x().clone();
    let lengths_before = selector.base().data().lengths().to_vec();
    let selection = selector.select_detailed().unwrap();

    assert!(!selection.fell_back);
    assert_eq!(selector.base().data().x(), &x_before);
    assert_eq!(selector.base().data().lengths(), lengths_before.as_slice());
}

#[test]
fn test_selection_is_repeatable() {
    let words = common::training_words(5, 13);
    for kind in [SelectorKind::Bic, SelectorKind::Dic, SelectorKind::Cv] {
        let first = kind.select(&words, "BOOK", &config(2, 4)).unwrap();
        let second = kind.select(&words, "BOOK", &config(2, 4)).unwrap();

        assert_eq!(first.n_states, second.n_states, "{kind}");
        assert_eq!(first.candidates.len(), second.candidates.len(), "{kind}");
        for (a, b) in first.candidates.iter().zip(&second.candidates) {
            assert!((a.criterion - b.criterion).abs() < 1e-9, "{kind}");
        }
    }
}
