use super::{
    bin_samples, check_input, check_training_set, column, gradients, initial_margin, leaf_weight,
    quantile_cuts, sigmoid, split_gain, BoostParams, GradPair, NodeStats,
};
use crate::ml::{Classifier, FeatureVector, ModelError, Sample, N_FEATURES};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Symmetric tree: one `(feature, threshold)` test per level, `2^depth` leaves
#[derive(Debug, Clone, PartialEq)]
struct ObliviousTree {
    levels: Vec<(usize, f64)>,
    values: Vec<f64>,
}

impl ObliviousTree {
    fn leaf_index(&self, features: &FeatureVector) -> usize {
        self.levels.iter().fold(0, |idx, &(feature, threshold)| {
            idx * 2 + usize::from(features[feature] >= threshold)
        })
    }

    fn predict(&self, features: &FeatureVector) -> f64 {
        self.values[self.leaf_index(features)]
    }
}

/// Ordered boosting over oblivious trees.
///
/// Samples are visited in a seeded random order; during training each
/// sample's margin is updated from leaf statistics of the samples before
/// it only, so no row ever learns from its own gradient. The stored
/// (inference) leaf values use every sample. Importance is accumulated
/// split gain, scaled to sum to 100.
#[derive(Debug, Clone)]
pub struct OrderedBooster {
    params: BoostParams,
    border_count: usize,
    l2_reg: f64,
    seed: u64,
    base_margin: f64,
    trees: Vec<ObliviousTree>,
    gain: [f64; N_FEATURES],
    fitted: bool,
}

impl OrderedBooster {
    pub fn new(params: BoostParams, seed: u64) -> Self {
        Self {
            params,
            border_count: 32,
            l2_reg: 3.0,
            seed,
            base_margin: 0.0,
            trees: Vec::new(),
            gain: [0.0; N_FEATURES],
            fitted: false,
        }
    }

    /// Pick level splits greedily, maximising the summed gain over all
    /// current leaves. Returns the levels and each sample's leaf.
    fn choose_levels(
        &mut self,
        cuts: &[Vec<f64>],
        bins: &[Vec<usize>],
        grads: &[GradPair],
    ) -> (Vec<(usize, f64)>, Vec<usize>) {
        let n = grads.len();
        let mut leaf_of = vec![0usize; n];
        let mut levels = Vec::new();

        for depth in 0..self.params.max_depth {
            let n_leaves = 1usize << depth;
            let mut totals = vec![NodeStats::default(); n_leaves];
            for i in 0..n {
                totals[leaf_of[i]].add(grads[i]);
            }

            let mut best: Option<(usize, usize, f64)> = None;
            for (feature, feature_cuts) in cuts.iter().enumerate() {
                if feature_cuts.is_empty() {
                    continue;
                }

                let width = feature_cuts.len() + 1;
                let mut hist = vec![NodeStats::default(); n_leaves * width];
                for i in 0..n {
                    hist[leaf_of[i] * width + bins[i][feature]].add(grads[i]);
                }

                let mut left = vec![NodeStats::default(); n_leaves];
                for bin in 0..feature_cuts.len() {
                    let mut gain = 0.0;
                    for leaf in 0..n_leaves {
                        let bucket = hist[leaf * width + bin];
                        left[leaf].g += bucket.g;
                        left[leaf].h += bucket.h;
                        left[leaf].count += bucket.count;
                        let right = totals[leaf].minus(&left[leaf]);
                        if left[leaf].count > 0 && right.count > 0 {
                            gain += split_gain(&left[leaf], &right, self.l2_reg);
                        }
                    }
                    if gain > 1e-12 && best.map_or(true, |(_, _, g)| gain > g) {
                        best = Some((feature, bin, gain));
                    }
                }
            }

            let Some((feature, bin, gain)) = best else {
                break;
            };
            self.gain[feature] += gain;
            levels.push((feature, cuts[feature][bin]));
            for i in 0..n {
                leaf_of[i] = leaf_of[i] * 2 + usize::from(bins[i][feature] > bin);
            }
        }

        (levels, leaf_of)
    }
}

impl Classifier for OrderedBooster {
    fn name(&self) -> &str {
        "ordered"
    }

    fn fit(&mut self, samples: &[Sample]) -> Result<(), ModelError> {
        check_training_set(samples)?;

        let cuts: Vec<Vec<f64>> = (0..N_FEATURES)
            .map(|j| quantile_cuts(&column(samples, j), self.border_count))
            .collect();
        let bins = bin_samples(samples, &cuts);

        let mut permutation: Vec<usize> = (0..samples.len()).collect();
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        permutation.shuffle(&mut rng);

        self.trees.clear();
        self.gain = [0.0; N_FEATURES];
        self.base_margin = initial_margin(samples);
        let mut margins = vec![self.base_margin; samples.len()];
        let lr = self.params.learning_rate;

        for _ in 0..self.params.n_estimators {
            let grads = gradients(samples, &margins);
            let (levels, leaf_of) = self.choose_levels(&cuts, &bins, &grads);
            let n_leaves = 1usize << levels.len();

            let mut full = vec![NodeStats::default(); n_leaves];
            for (i, &leaf) in leaf_of.iter().enumerate() {
                full[leaf].add(grads[i]);
            }

            let mut prefix = vec![NodeStats::default(); n_leaves];
            for &i in &permutation {
                let leaf = leaf_of[i];
                margins[i] += lr * leaf_weight(&prefix[leaf], self.l2_reg);
                prefix[leaf].add(grads[i]);
            }

            self.trees.push(ObliviousTree {
                levels,
                values: full.iter().map(|s| lr * leaf_weight(s, self.l2_reg)).collect(),
            });
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
        Ok(self.gain.iter().map(|g| 100.0 * g / total).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diagonal(n: usize) -> Vec<Sample> {
        (0..n)
            .map(|i| {
                let mut features = [0.0; N_FEATURES];
                features[1] = (i % 20) as f64;
                features[8] = (i % 3) as f64;
                Sample {
                    features,
                    label: u8::from(i % 20 >= 10),
                }
            })
            .collect()
    }

    #[test]
    fn test_learns_threshold() {
        let data = diagonal(200);
        let mut model = OrderedBooster::new(BoostParams::default(), 42);
        model.fit(&data).unwrap();

        for s in &data {
            assert_eq!(model.predict(&s.features).unwrap(), s.label);
        }
    }

    #[test]
    fn test_importance_sums_to_hundred() {
        let data = diagonal(200);
        let mut model = OrderedBooster::new(BoostParams::default(), 42);
        model.fit(&data).unwrap();

        let importance = model.feature_importance().unwrap();
        assert!((importance.iter().sum::<f64>() - 100.0).abs() < 1e-6);
        assert!(importance[1] > importance[8]);
    }

    #[test]
    fn test_same_seed_same_model() {
        let data = diagonal(120);
        let mut a = OrderedBooster::new(BoostParams::default(), 42);
        let mut b = OrderedBooster::new(BoostParams::default(), 42);
        a.fit(&data).unwrap();
        b.fit(&data).unwrap();

        let x = data[33].features;
        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_oblivious_indexing() {
        let tree = ObliviousTree {
            levels: vec![(0, 0.5), (1, 0.5)],
            values: vec![0.0, 1.0, 2.0, 3.0],
        };
        let mut x = [0.0; N_FEATURES];
        assert_eq!(tree.predict(&x), 0.0);
        x[1] = 1.0;
        assert_eq!(tree.predict(&x), 1.0);
        x[0] = 1.0;
        assert_eq!(tree.predict(&x), 3.0);
    }
}
