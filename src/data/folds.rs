//! Contiguous K-fold partitioning of a word's sequence list

use super::error::{DataError, DataResult};

/// One train/held-out split, as indices into the sequence list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split `0..n_samples` into `n_splits` contiguous held-out blocks.
///
/// No shuffling. The first `n_samples % n_splits` blocks hold one extra
/// sample.
pub fn kfold_split(n_samples: usize, n_splits: usize) -> DataResult<Vec<Fold>> {
    if n_splits < 2 {
        return Err(DataError::InvalidFolds(n_splits));
    }
    if n_samples < n_splits {
        return Err(DataError::TooFewSamples {
            n_samples,
            n_splits,
        });
    }

    let base = n_samples / n_splits;
    let extra = n_samples % n_splits;

    let mut folds = Vec::with_capacity(n_splits);
    let mut start = 0;
    for k in 0..n_splits {
        let size = base + usize::from(k < extra);
        let stop = start + size;
        folds.push(Fold {
            train: (0..start).chain(stop..n_samples).collect(),
            test: (start..stop).collect(),
        });
        start = stop;
    }

    Ok(folds)
}
