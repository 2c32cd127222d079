//! Synthetic sign data sampled from known word HMMs

#![allow(dead_code)]

use ndarray::{arr2, array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sign_recognizer::prelude::*;
use std::collections::BTreeMap;

/// Vocabulary with well-separated emission means
pub const WORDS: [(&str, f64); 3] = [("BOOK", 0.0), ("CHOCOLATE", 10.0), ("JOHN", 20.0)];

/// Three-state left-to-right model whose means start at `offset`
pub fn word_model(offset: f64) -> GaussianHmm {
    GaussianHmm::from_params(
        array![1.0, 0.0, 0.0],
        arr2(&[[0.8, 0.2, 0.0], [0.0, 0.8, 0.2], [0.0, 0.0, 1.0]]),
        arr2(&[
            [offset, offset + 1.0],
            [offset + 2.0, offset],
            [offset + 4.0, offset + 3.0],
        ]),
        Array2::from_elem((3, 2), 0.3),
    )
    .expect("valid word model")
}

/// `n` sequences of `len` frames sampled from `model`
pub fn sample_sequences(
    model: &GaussianHmm,
    n: usize,
    len: usize,
    rng: &mut StdRng,
) -> Vec<Array2<f64>> {
    (0..n).map(|_| model.sample(len, rng).1).collect()
}

/// Training data for every word in [`WORDS`]
pub fn training_words(n_sequences: usize, seed: u64) -> WordsData {
    let mut rng = StdRng::seed_from_u64(seed);
    let sequences: BTreeMap<String, Vec<Array2<f64>>> = WORDS
        .iter()
        .map(|(word, offset)| {
            let model = word_model(*offset);
            (word.to_string(), sample_sequences(&model, n_sequences, 15, &mut rng))
        })
        .collect();
    WordsData::new(sequences).expect("consistent training data")
}

/// Labelled test set with `per_word` items per word, ids interleaved
pub fn test_words(per_word: usize, seed: u64) -> SinglesData {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut singles = SinglesData::new();
    let mut id = 0;
    for _ in 0..per_word {
        for (word, offset) in WORDS {
            let (_, obs) = word_model(offset).sample(12, &mut rng);
            singles.insert_labelled(id, word, XLengths::from_sequence(obs).expect("one sequence"));
            id += 1;
        }
    }
    singles
}
