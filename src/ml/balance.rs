//! Class balancing by seeded resampling

use super::trainer::NoModelReason;
use super::Sample;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Labeled rows with equal class counts, in shuffled order
#[derive(Debug, Clone, PartialEq)]
pub struct BalancedDataset {
    samples: Vec<Sample>,
}

impl BalancedDataset {
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(class 0, class 1)` counts
    pub fn class_counts(&self) -> (usize, usize) {
        let ups = self.samples.iter().filter(|s| s.label == 1).count();
        (self.samples.len() - ups, ups)
    }

    /// Apply `f` to every feature vector, keeping order and labels
    pub fn map_features<F>(&self, f: F) -> Self
    where
        F: Fn(&super::FeatureVector) -> super::FeatureVector,
    {
        Self {
            samples: self
                .samples
                .iter()
                .map(|s| Sample {
                    features: f(&s.features),
                    label: s.label,
                })
                .collect(),
        }
    }
}

/// Resample both classes with replacement to the minority size.
///
/// Each class is drawn with its own generator seeded from `seed`; the
/// concatenation (ups first) is then shuffled with a third one. Identical
/// input and seed give an identical ordering.
pub fn balance(
    samples: &[Sample],
    min_class_samples: usize,
    seed: u64,
) -> Result<BalancedDataset, NoModelReason> {
    if samples.is_empty() {
        return Err(NoModelReason::EmptyTable);
    }

    let ups: Vec<&Sample> = samples.iter().filter(|s| s.label == 1).collect();
    let downs: Vec<&Sample> = samples.iter().filter(|s| s.label == 0).collect();

    if ups.len() < min_class_samples || downs.len() < min_class_samples {
        return Err(NoModelReason::InsufficientSamples {
            ups: ups.len(),
            downs: downs.len(),
            required: min_class_samples,
        });
    }

    let target = ups.len().min(downs.len());
    let mut balanced = Vec::with_capacity(target * 2);
    balanced.extend(resample(&ups, target, seed));
    balanced.extend(resample(&downs, target, seed));

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    balanced.shuffle(&mut rng);

    Ok(BalancedDataset { samples: balanced })
}

fn resample(pool: &[&Sample], n: usize, seed: u64) -> Vec<Sample> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    (0..n).map(|_| *pool[rng.random_range(0..pool.len())]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(ups: usize, downs: usize) -> Vec<Sample> {
        let mut out = Vec::new();
        for i in 0..ups {
            out.push(Sample {
                features: [i as f64; 10],
                label: 1,
            });
        }
        for i in 0..downs {
            out.push(Sample {
                features: [-(i as f64); 10],
                label: 0,
            });
        }
        out
    }

    #[test]
    fn test_counts_equal() {
        for (ups, downs) in [(10, 10), (40, 12), (13, 90), (150, 122)] {
            let balanced = balance(&samples(ups, downs), 10, 42).unwrap();
            let (zeros, ones) = balanced.class_counts();
            assert_eq!(zeros, ones);
            assert_eq!(zeros, ups.min(downs));
        }
    }

    #[test]
    fn test_deterministic() {
        let input = samples(60, 35);
        let a = balance(&input, 10, 42).unwrap();
        let b = balance(&input, 10, 42).unwrap();
        assert_eq!(a, b);

        let c = balance(&input, 10, 7).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_resampled_rows_come_from_their_class() {
        let balanced = balance(&samples(30, 20), 10, 42).unwrap();
        for s in balanced.samples() {
            if s.label == 1 {
                assert!(s.features[0] >= 0.0);
            } else {
                assert!(s.features[0] <= 0.0);
            }
        }
    }

    #[test]
    fn test_minority_below_minimum() {
        let err = balance(&samples(50, 9), 10, 42).unwrap_err();
        assert_eq!(
            err,
            NoModelReason::InsufficientSamples {
                ups: 50,
                downs: 9,
                required: 10
            }
        );
    }

    #[test]
    fn test_single_class_rejected() {
        assert!(balance(&samples(80, 0), 10, 42).is_err());
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(balance(&[], 10, 42).unwrap_err(), NoModelReason::EmptyTable);
    }
}
