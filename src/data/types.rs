//! Observation sequences keyed by word, and the ordered test set

use super::error::{DataError, DataResult};
use ndarray::{concatenate, Array2, ArrayView2, Axis};
use std::collections::BTreeMap;

/// Observation sequences concatenated row-wise, with per-sequence frame counts
#[derive(Debug, Clone, PartialEq)]
pub struct XLengths {
    x: Array2<f64>,
    lengths: Vec<usize>,
}

impl XLengths {
    /// Create from concatenated frames and their sequence lengths
    pub fn new(x: Array2<f64>, lengths: Vec<usize>) -> DataResult<Self> {
        if lengths.is_empty() {
            return Err(DataError::InvalidLengths("no sequences given".into()));
        }
        if lengths.contains(&0) {
            return Err(DataError::InvalidLengths("zero-length sequence".into()));
        }
        let total: usize = lengths.iter().sum();
        if total != x.nrows() {
            return Err(DataError::LengthMismatch {
                total,
                rows: x.nrows(),
            });
        }
        Ok(Self { x, lengths })
    }

    /// Wrap a single sequence
    pub fn from_sequence(sequence: Array2<f64>) -> DataResult<Self> {
        let len = sequence.nrows();
        Self::new(sequence, vec![len])
    }

    /// Concatenated observations (frames x features)
    pub fn x(&self) -> &Array2<f64> {
        &self.x
    }

    /// Frame count of each sequence
    pub fn lengths(&self) -> &[usize] {
        &self.lengths
    }

    /// Total number of frames
    pub fn n_frames(&self) -> usize {
        self.x.nrows()
    }

    /// Number of features per frame
    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    /// Number of sequences
    pub fn n_sequences(&self) -> usize {
        self.lengths.len()
    }

    /// Split back into owned parts
    pub fn into_parts(self) -> (Array2<f64>, Vec<usize>) {
        (self.x, self.lengths)
    }
}

/// Concatenate the sequences at `indices` into one [`XLengths`]
pub fn combine_sequences(indices: &[usize], sequences: &[Array2<f64>]) -> DataResult<XLengths> {
    let mut views: Vec<ArrayView2<f64>> = Vec::with_capacity(indices.len());
    for &index in indices {
        let seq = sequences.get(index).ok_or(DataError::IndexOutOfRange {
            index,
            len: sequences.len(),
        })?;
        views.push(seq.view());
    }
    if views.is_empty() {
        return Err(DataError::InvalidLengths("no sequences selected".into()));
    }

    let n_features = views[0].ncols();
    if let Some(bad) = views.iter().find(|v| v.ncols() != n_features) {
        return Err(DataError::FeatureMismatch {
            expected: n_features,
            actual: bad.ncols(),
        });
    }

    let lengths = views.iter().map(|v| v.nrows()).collect();
    let x = concatenate(Axis(0), &views).map_err(|e| DataError::InvalidLengths(e.to_string()))?;
    XLengths::new(x, lengths)
}

/// Training data: observation sequences for every vocabulary word
#[derive(Debug, Clone)]
pub struct WordsData {
    sequences: BTreeMap<String, Vec<Array2<f64>>>,
    xlengths: BTreeMap<String, XLengths>,
    n_features: usize,
}

impl WordsData {
    /// Build from word -> sequences (each frames x features)
    ///
    /// Every word needs at least one sequence, every sequence at least one
    /// frame, and all sequences must share one feature width.
    pub fn new(sequences: BTreeMap<String, Vec<Array2<f64>>>) -> DataResult<Self> {
        let mut n_features = None;
        let mut xlengths = BTreeMap::new();

        for (word, seqs) in &sequences {
            if seqs.is_empty() {
                return Err(DataError::NoSequences(word.clone()));
            }
            for (index, seq) in seqs.iter().enumerate() {
                if seq.nrows() == 0 {
                    return Err(DataError::EmptySequence {
                        word: word.clone(),
                        index,
                    });
                }
                let expected = *n_features.get_or_insert(seq.ncols());
                if seq.ncols() != expected {
                    return Err(DataError::FeatureMismatch {
                        expected,
                        actual: seq.ncols(),
                    });
                }
            }

            let all: Vec<usize> = (0..seqs.len()).collect();
            xlengths.insert(word.clone(), combine_sequences(&all, seqs)?);
        }

        Ok(Self {
            sequences,
            xlengths,
            n_features: n_features.unwrap_or(0),
        })
    }

    /// Vocabulary in ascending order
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.sequences.keys().map(String::as_str)
    }

    /// Number of words
    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    /// Whether the vocabulary is empty
    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    /// Whether `word` is in the vocabulary
    pub fn contains(&self, word: &str) -> bool {
        self.sequences.contains_key(word)
    }

    /// Sequences recorded for `word`
    pub fn sequences(&self, word: &str) -> Option<&[Array2<f64>]> {
        self.sequences.get(word).map(Vec::as_slice)
    }

    /// Concatenated data for `word`
    pub fn xlengths(&self, word: &str) -> Option<&XLengths> {
        self.xlengths.get(word)
    }

    /// Concatenated data for every word, ascending by word
    pub fn iter_xlengths(&self) -> impl Iterator<Item = (&str, &XLengths)> {
        self.xlengths.iter().map(|(w, xl)| (w.as_str(), xl))
    }

    /// Number of features per frame
    pub fn n_features(&self) -> usize {
        self.n_features
    }
}

/// Test set: one item per utterance, enumerated by ascending item id
#[derive(Debug, Clone, Default)]
pub struct SinglesData {
    items: BTreeMap<usize, XLengths>,
    words: BTreeMap<usize, String>,
}

impl SinglesData {
    /// Create empty test set
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an unlabelled item, replacing any item with the same id
    pub fn insert(&mut self, id: usize, data: XLengths) {
        self.items.insert(id, data);
        self.words.remove(&id);
    }

    /// Add an item together with the word it shows
    pub fn insert_labelled(&mut self, id: usize, word: impl Into<String>, data: XLengths) {
        self.items.insert(id, data);
        self.words.insert(id, word.into());
    }

    /// Number of test items
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the test set is empty
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in ascending id order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &XLengths)> {
        self.items.iter().map(|(id, xl)| (*id, xl))
    }

    /// Data of one item
    pub fn get(&self, id: usize) -> Option<&XLengths> {
        self.items.get(&id)
    }

    /// Ground-truth word of one item, when labelled
    pub fn word(&self, id: usize) -> Option<&str> {
        self.words.get(&id).map(String::as_str)
    }

    /// Ground-truth words in ascending id order, if every item is labelled
    pub fn wordlist(&self) -> Option<Vec<&str>> {
        self.items.keys().map(|id| self.word(*id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    fn seq(rows: &[[f64; 2]]) -> Array2<f64> {
        arr2(rows)
    }

    #[test]
    fn test_xlengths_invariant() {
        let x = seq(&[[0.0, 1.0], [1.0, 2.0], [2.0, 3.0]]);
        assert!(XLengths::new(x.clone(), vec![1, 2]).is_ok());
        assert_eq!(
            XLengths::new(x.clone(), vec![1, 1]),
            Err(DataError::LengthMismatch { total: 2, rows: 3 })
        );
        assert!(XLengths::new(x, vec![3, 0]).is_err());
    }

    #[test]
    fn test_combine_sequences() {
        let seqs = vec![
            seq(&[[0.0, 0.0]]),
            seq(&[[1.0, 1.0], [1.5, 1.5]]),
            seq(&[[2.0, 2.0], [2.5, 2.5], [3.0, 3.0]]),
        ];
        let combined = combine_sequences(&[2, 0], &seqs).unwrap();
        assert_eq!(combined.lengths(), &[3, 1]);
        assert_eq!(combined.n_frames(), 4);
        assert_eq!(combined.x()[[3, 0]], 0.0);

        assert_eq!(
            combine_sequences(&[5], &seqs),
            Err(DataError::IndexOutOfRange { index: 5, len: 3 })
        );
    }

    #[test]
    fn test_words_data() {
        let mut map = BTreeMap::new();
        map.insert(
            "CHOCOLATE".to_string(),
            vec![seq(&[[0.0, 0.0], [1.0, 1.0]]), seq(&[[2.0, 2.0]])],
        );
        map.insert("BOOK".to_string(), vec![seq(&[[5.0, 5.0]])]);

        let words = WordsData::new(map).unwrap();
        assert_eq!(words.words().collect::<Vec<_>>(), vec!["BOOK", "CHOCOLATE"]);
        assert_eq!(words.n_features(), 2);

        let xl = words.xlengths("CHOCOLATE").unwrap();
        assert_eq!(xl.lengths(), &[2, 1]);
        assert_eq!(xl.n_frames(), xl.lengths().iter().sum::<usize>());
        assert!(words.sequences("MISSING").is_none());
    }

    #[test]
    fn test_words_data_rejects_mixed_widths() {
        let mut map = BTreeMap::new();
        map.insert("A".to_string(), vec![seq(&[[0.0, 0.0]])]);
        map.insert("B".to_string(), vec![arr2(&[[0.0, 0.0, 0.0]])]);
        assert_eq!(
            WordsData::new(map).unwrap_err(),
            DataError::FeatureMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_singles_ordering() {
        let mut singles = SinglesData::new();
        let item = XLengths::from_sequence(seq(&[[0.0, 0.0]])).unwrap();
        singles.insert_labelled(7, "JOHN", item.clone());
        singles.insert_labelled(2, "MARY", item.clone());
        singles.insert_labelled(4, "LOVE", item);

        let ids: Vec<usize> = singles.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![2, 4, 7]);
        assert_eq!(singles.wordlist(), Some(vec!["MARY", "LOVE", "JOHN"]));
    }
}
