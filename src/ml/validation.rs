//! Walk-forward cross-validation

use super::trainer::NoModelReason;
use super::{Classifier, ModelError, Sample};
use std::ops::Range;

/// One expanding-window split: train on everything before `test`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fold {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

/// `k` ordered splits of `n` rows.
///
/// Test windows have `n / (k + 1)` rows and end flush with the data;
/// the remainder of the division goes to the first training window.
pub fn time_series_splits(n: usize, k: usize) -> Result<Vec<Fold>, NoModelReason> {
    if k == 0 {
        return Err(NoModelReason::EmptyFold { fold: 0 });
    }

    let test_size = n / (k + 1);
    let mut folds = Vec::with_capacity(k);

    for i in 0..k {
        let test_start = n - (k - i) * test_size;
        let fold = Fold {
            train: 0..test_start,
            test: test_start..test_start + test_size,
        };
        if fold.train.is_empty() || fold.test.is_empty() {
            return Err(NoModelReason::EmptyFold { fold: i });
        }
        folds.push(fold);
    }

    Ok(folds)
}

/// Share of samples whose 0.5-cut prediction matches the label
pub fn accuracy(model: &dyn Classifier, samples: &[Sample]) -> Result<f64, ModelError> {
    if samples.is_empty() {
        return Err(ModelError::InvalidData("Empty evaluation set".to_string()));
    }
    let mut correct = 0usize;
    for s in samples {
        if model.predict(&s.features)? == s.label {
            correct += 1;
        }
    }
    Ok(correct as f64 / samples.len() as f64)
}
