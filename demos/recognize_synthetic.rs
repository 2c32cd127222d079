//! Example: Selecting word topologies and recognizing synthetic signs
//!
//! Samples training and test utterances from known word HMMs, trains one
//! model per word with every selector, and compares word error rates.
//!
//! Run with: RUST_LOG=debug cargo run --example recognize_synthetic

use ndarray::{arr2, array, Array2};
use rand::rngs::StdRng;
use rand::SeedableRng;
use sign_recognizer::prelude::*;
use std::collections::BTreeMap;
use tracing_subscriber::EnvFilter;

/// Vocabulary with the offset of each word's emission means
const VOCABULARY: [(&str, f64); 4] = [
    ("BOOK", 0.0),
    ("CHOCOLATE", 3.0),
    ("JOHN", 6.0),
    ("LOVE", 9.0),
];

fn word_model(offset: f64) -> anyhow::Result<GaussianHmm> {
    let model = GaussianHmm::from_params(
        array![0.9, 0.1, 0.0],
        arr2(&[[0.7, 0.3, 0.0], [0.0, 0.7, 0.3], [0.0, 0.0, 1.0]]),
        arr2(&[
            [offset, offset + 0.5, -offset],
            [offset + 1.0, offset, 1.0 - offset],
            [offset + 2.0, offset - 1.0, 2.0 - offset],
        ]),
        Array2::from_elem((3, 3), 0.5),
    )?;
    Ok(model)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("sign_recognizer=info".parse()?),
        )
        .init();

    println!("=== Sign Recognition with HMM Model Selection ===\n");

    let mut rng = StdRng::seed_from_u64(42);

    // Training sequences
    let mut training = BTreeMap::new();
    for (word, offset) in VOCABULARY {
        let model = word_model(offset)?;
        let sequences: Vec<Array2<f64>> = (0..8).map(|_| model.sample(20, &mut rng).1).collect();
        training.insert(word.to_string(), sequences);
    }
    let words = WordsData::new(training)?;
    println!("Training words: {}", words.words().collect::<Vec<_>>().join(", "));

    // Test set, labelled for scoring
    let mut test_set = SinglesData::new();
    let mut id = 0;
    for _ in 0..5 {
        for (word, offset) in VOCABULARY {
            let (_, obs) = word_model(offset)?.sample(15, &mut rng);
            test_set.insert_labelled(id, word, XLengths::from_sequence(obs)?);
            id += 1;
        }
    }
    println!("Test items: {}\n", test_set.len());

    let config = SelectorConfig::default().with_range(2, 5).with_n_constant(3);
    println!("Selector config:\n{}\n", config.to_json()?);

    println!("{:<10} {:>8} {:>8}  {}", "Selector", "WER", "Errors", "States per word");
    println!("{}", "─".repeat(60));

    for kind in SelectorKind::ALL {
        let models = train_words(&words, kind, &config);
        let states: Vec<String> = models
            .iter()
            .map(|(word, model)| match model {
                Some(model) => format!("{}={}", word, model.n_states()),
                None => format!("{}=-", word),
            })
            .collect();

        let recognition = recognize(&models, &test_set)?;
        let wer = recognition.word_error_rate(&test_set).unwrap_or(f64::NAN);
        println!(
            "{:<10} {:>7.1}% {:>8}  {}",
            kind.to_string(),
            wer * 100.0,
            recognition.errors(&test_set).len(),
            states.join(" ")
        );

        for (item, expected, guess) in recognition.errors(&test_set) {
            println!("    item {:>3}: expected {:<10} got {}", item, expected, guess);
        }
    }

    Ok(())
}
