//! Gradient boosted trees for binary log-loss
//!
//! Three boosters with different tree-growing algorithms share the same
//! second-order machinery: per-sample gradient `p - y`, hessian
//! `p (1 - p)`, leaf weight `-G / (H + lambda)` and split gain
//! `(GL²/(HL+λ) + GR²/(HR+λ) - G²/(H+λ)) / 2`.
//!
//! - [`HistogramBooster`]: quantile-binned features, depth-wise growth
//! - [`LeafWiseBooster`]: exact splits, best-first leaf expansion
//! - [`OrderedBooster`]: oblivious trees with ordered (prefix) leaf updates

mod histogram;
mod leafwise;
mod ordered;
mod tree;

pub use histogram::HistogramBooster;
pub use leafwise::LeafWiseBooster;
pub use ordered::OrderedBooster;
pub use tree::Tree;

use super::{FeatureVector, ModelError, Sample};

/// Hyper-parameters common to all boosters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostParams {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Maximum depth of each tree
    pub max_depth: usize,
    /// Shrinkage applied to every leaf value
    pub learning_rate: f64,
}

impl Default for BoostParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 4,
            learning_rate: 0.05,
        }
    }
}

/// Gradient/hessian pair for one sample
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct GradPair {
    pub g: f64,
    pub h: f64,
}

/// Accumulated statistics of a sample set
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct NodeStats {
    pub g: f64,
    pub h: f64,
    pub count: usize,
}

impl NodeStats {
    pub fn add(&mut self, pair: GradPair) {
        self.g += pair.g;
        self.h += pair.h;
        self.count += 1;
    }

    pub fn minus(&self, other: &NodeStats) -> NodeStats {
        NodeStats {
            g: self.g - other.g,
            h: self.h - other.h,
            count: self.count - other.count,
        }
    }

    pub fn of(indices: &[usize], grads: &[GradPair]) -> NodeStats {
        let mut stats = NodeStats::default();
        for &i in indices {
            stats.add(grads[i]);
        }
        stats
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

pub(crate) fn leaf_weight(stats: &NodeStats, l2_reg: f64) -> f64 {
    if stats.count == 0 {
        return 0.0;
    }
    -stats.g / (stats.h + l2_reg)
}

fn score(stats: &NodeStats, l2_reg: f64) -> f64 {
    stats.g * stats.g / (stats.h + l2_reg)
}

pub(crate) fn split_gain(left: &NodeStats, right: &NodeStats, l2_reg: f64) -> f64 {
    let parent = NodeStats {
        g: left.g + right.g,
        h: left.h + right.h,
        count: left.count + right.count,
    };
    0.5 * (score(left, l2_reg) + score(right, l2_reg) - score(&parent, l2_reg))
}

/// Log-odds of the positive rate, the starting margin
pub(crate) fn initial_margin(samples: &[Sample]) -> f64 {
    let rate = samples.iter().filter(|s| s.label == 1).count() as f64 / samples.len() as f64;
    let rate = rate.clamp(1e-6, 1.0 - 1e-6);
    (rate / (1.0 - rate)).ln()
}

pub(crate) fn gradients(samples: &[Sample], margins: &[f64]) -> Vec<GradPair> {
    samples
        .iter()
        .zip(margins)
        .map(|(s, &m)| {
            let p = sigmoid(m);
            GradPair {
                g: p - f64::from(s.label),
                h: (p * (1.0 - p)).max(1e-16),
            }
        })
        .collect()
}

pub(crate) fn check_training_set(samples: &[Sample]) -> Result<(), ModelError> {
    if samples.is_empty() {
        return Err(ModelError::InvalidData("Empty training set".to_string()));
    }
    if samples.iter().any(|s| s.label > 1) {
        return Err(ModelError::InvalidData("Labels must be 0 or 1".to_string()));
    }
    if samples.iter().any(|s| s.features.iter().any(|v| !v.is_finite())) {
        return Err(ModelError::InvalidData("Non-finite feature value".to_string()));
    }
    Ok(())
}

pub(crate) fn check_input(features: &FeatureVector) -> Result<(), ModelError> {
    if features.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::InvalidData("Non-finite feature value".to_string()));
    }
    Ok(())
}

/// Candidate thresholds for one feature column.
///
/// Midpoints between consecutive distinct values, thinned to at most
/// `max_bins - 1` cuts by quantile when the column has more distinct values.
pub(crate) fn quantile_cuts(column: &[f64], max_bins: usize) -> Vec<f64> {
    let mut values: Vec<f64> = column.to_vec();
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup();

    if values.len() < 2 {
        return Vec::new();
    }

    let mut cuts: Vec<f64> = if values.len() <= max_bins {
        values.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    } else {
        (1..max_bins)
            .map(|k| {
                let idx = (k * values.len() / max_bins).max(1);
                (values[idx - 1] + values[idx]) / 2.0
            })
            .collect()
    };
    cuts.dedup();
    cuts
}

/// Bin of `x`: the number of cuts at or below it
pub(crate) fn bin_index(cuts: &[f64], x: f64) -> usize {
    cuts.partition_point(|&c| c <= x)
}

/// Bin every sample on every feature
pub(crate) fn bin_samples(samples: &[Sample], cuts: &[Vec<f64>]) -> Vec<Vec<usize>> {
    samples
        .iter()
        .map(|s| {
            cuts.iter()
                .zip(s.features.iter())
                .map(|(c, &x)| bin_index(c, x))
                .collect()
        })
        .collect()
}

pub(crate) fn column(samples: &[Sample], j: usize) -> Vec<f64> {
    samples.iter().map(|s| s.features[j]).collect()
}
