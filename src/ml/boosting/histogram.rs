use super::tree::Tree;
use super::{
    bin_samples, check_input, check_training_set, column, gradients, initial_margin, leaf_weight,
    quantile_cuts, sigmoid, split_gain, BoostParams, GradPair, NodeStats,
};
use crate::ml::{Classifier, FeatureVector, ModelError, Sample, N_FEATURES};

/// Depth-wise booster over quantile histograms.
///
/// Each feature is bucketed once before training; split search scans the
/// bucket boundaries. Importance is total split gain per feature,
/// normalised to sum to 1.
#[derive(Debug, Clone)]
pub struct HistogramBooster {
    params: BoostParams,
    max_bins: usize,
    l2_reg: f64,
    min_child_weight: f64,
    base_margin: f64,
    cuts: Vec<Vec<f64>>,
    trees: Vec<Tree>,
    gain: [f64; N_FEATURES],
    fitted: bool,
}

struct SplitChoice {
    feature: usize,
    bin: usize,
    gain: f64,
}

impl HistogramBooster {
    pub fn new(params: BoostParams) -> Self {
        Self {
            params,
            max_bins: 64,
            l2_reg: 1.0,
            min_child_weight: 1.0,
            base_margin: 0.0,
            cuts: Vec::new(),
            trees: Vec::new(),
            gain: [0.0; N_FEATURES],
            fitted: false,
        }
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn grow_node(
        &mut self,
        tree: &mut Tree,
        bins: &[Vec<usize>],
        grads: &[GradPair],
        indices: &[usize],
        depth: usize,
    ) -> usize {
        let stats = NodeStats::of(indices, grads);
        let node = tree.push_leaf(self.params.learning_rate * leaf_weight(&stats, self.l2_reg));

        if depth >= self.params.max_depth || indices.len() < 2 {
            return node;
        }

        let Some(split) = self.best_split(bins, grads, indices, &stats) else {
            return node;
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| bins[i][split.feature] <= split.bin);

        self.gain[split.feature] += split.gain;
        let threshold = self.cuts[split.feature][split.bin];
        let left = self.grow_node(tree, bins, grads, &left_idx, depth + 1);
        let right = self.grow_node(tree, bins, grads, &right_idx, depth + 1);
        tree.set_split(node, split.feature, threshold, left, right);
        node
    }

    fn best_split(
        &self,
        bins: &[Vec<usize>],
        grads: &[GradPair],
        indices: &[usize],
        total: &NodeStats,
    ) -> Option<SplitChoice> {
        let mut best: Option<SplitChoice> = None;

        for (feature, cuts) in self.cuts.iter().enumerate() {
            if cuts.is_empty() {
                continue;
            }

            let mut hist = vec![NodeStats::default(); cuts.len() + 1];
            for &i in indices {
                hist[bins[i][feature]].add(grads[i]);
            }

            let mut left = NodeStats::default();
            for (bin, bucket) in hist.iter().take(cuts.len()).enumerate() {
                left.g += bucket.g;
                left.h += bucket.h;
                left.count += bucket.count;
                if left.count == 0 {
                    continue;
                }
                let right = total.minus(&left);
                if right.count == 0 {
                    break;
                }
                if left.h < self.min_child_weight || right.h < self.min_child_weight {
                    continue;
                }

                let gain = split_gain(&left, &right, self.l2_reg);
                if gain > 1e-12 && best.as_ref().map_or(true, |b| gain > b.gain) {
                    best = Some(SplitChoice { feature, bin, gain });
                }
            }
        }

        best
    }
}

impl Classifier for HistogramBooster {
    fn name(&self) -> &str {
        "histogram"
    }

    fn fit(&mut self, samples: &[Sample]) -> Result<(), ModelError> {
        check_training_set(samples)?;

        self.cuts = (0..N_FEATURES)
            .map(|j| quantile_cuts(&column(samples, j), self.max_bins))
            .collect();
        self.trees.clear();
        self.gain = [0.0; N_FEATURES];
        self.base_margin = initial_margin(samples);

        let bins = bin_samples(samples, &self.cuts);
        let all: Vec<usize> = (0..samples.len()).collect();
        let mut margins = vec![self.base_margin; samples.len()];

        for _ in 0..self.params.n_estimators {
            let grads = gradients(samples, &margins);
            let mut tree = Tree::default();
            self.grow_node(&mut tree, &bins, &grads, &all, 0);

            for (m, s) in margins.iter_mut().zip(samples) {
                *m += tree.predict(&s.features);
            }
            self.trees.push(tree);
        }

        self.fitted = true;
        Ok(())
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        if !self.fitted {
            return Err(ModelError::NotTrained);
        }
        check_input(features)?;
        let margin = self.base_margin + self.trees.iter().map(|t| t.predict(features)).sum::<f64>();
        Ok(sigmoid(margin))
    }

    fn feature_importance(&self) -> Result<Vec<f64>, ModelError> {
        if !self.fitted {
            return Err(ModelError::NotTrained);
        }
        let total: f64 = self.gain.iter().sum();
        if total <= 0.0 {
            return Ok(vec![0.0; N_FEATURES]);
        }
        Ok(self.gain.iter().map(|g| g / total).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Label is decided by feature 3 alone; the rest is noise-free filler
    fn separable(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let mut features = [0.0; N_FEATURES];
                features[0] = (i % 7) as f64;
                features[3] = (i % 50) as f64 / 50.0;
                Sample {
                    features,
                    label: u8::from(features[3] > 0.5),
                }
            })
            .collect()
    }

    #[test]
    fn test_learns_threshold() {
        let data = separable(200);
        let mut model = HistogramBooster::new(BoostParams::default());
        model.fit(&data).unwrap();

        let correct = data
            .iter()
            .filter(|s| model.predict(&s.features).unwrap() == s.label)
            .count();
        assert_eq!(correct, data.len());
        assert_eq!(model.n_trees(), 100);
    }

    #[test]
    fn test_importance_concentrates_on_signal() {
        let data = separable(200);
        let mut model = HistogramBooster::new(BoostParams::default());
        model.fit(&data).unwrap();

        let importance = model.feature_importance().unwrap();
        assert_eq!(importance.len(), N_FEATURES);
        assert!((importance.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        let top = importance
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(j, _)| j);
        assert_eq!(top, Some(3));
    }

    #[test]
    fn test_probabilities_bounded_and_repeatable() {
        let data = separable(120);
        let mut model = HistogramBooster::new(BoostParams::default());
        model.fit(&data).unwrap();

        let x = data[17].features;
        let p = model.predict_proba(&x).unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert_eq!(p, model.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_untrained() {
        let model = HistogramBooster::new(BoostParams::default());
        assert_eq!(model.predict_proba(&[0.0; N_FEATURES]), Err(ModelError::NotTrained));
    }

    #[test]
    fn test_rejects_non_finite() {
        let mut data = separable(50);
        data[4].features[1] = f64::NAN;
        let mut model = HistogramBooster::new(BoostParams::default());
        assert!(matches!(model.fit(&data), Err(ModelError::InvalidData(_))));
    }
}
