//! Per-feature standardisation

use super::{FeatureVector, Sample, N_FEATURES};

/// Zero-mean / unit-variance transform fitted on training rows.
///
/// Uses the population standard deviation. Constant columns keep a scale
/// of 1, so they map to 0.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: FeatureVector,
    scale: FeatureVector,
}

impl StandardScaler {
    pub fn fit(samples: &[Sample]) -> Self {
        let n = samples.len().max(1) as f64;
        let mut mean = [0.0; N_FEATURES];
        let mut scale = [1.0; N_FEATURES];

        for s in samples {
            for (m, v) in mean.iter_mut().zip(&s.features) {
                *m += v / n;
            }
        }

        for (j, sc) in scale.iter_mut().enumerate() {
            let var = samples
                .iter()
                .map(|s| (s.features[j] - mean[j]).powi(2))
                .sum::<f64>()
                / n;
            let std = var.sqrt();
            if std > f64::EPSILON {
                *sc = std;
            }
        }

        Self { mean, scale }
    }

    pub fn transform(&self, features: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; N_FEATURES];
        for (j, o) in out.iter_mut().enumerate() {
            *o = (features[j] - self.mean[j]) / self.scale[j];
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standardises_columns() {
        let samples: Vec<Sample> = [1.0, 2.0, 3.0, 4.0]
            .iter()
            .map(|&v| {
                let mut features = [5.0; N_FEATURES];
                features[0] = v;
                Sample { features, label: 0 }
            })
            .collect();

        let scaler = StandardScaler::fit(&samples);
        let transformed: Vec<f64> = samples.iter().map(|s| scaler.transform(&s.features)[0]).collect();

        let mean: f64 = transformed.iter().sum::<f64>() / 4.0;
        let var: f64 = transformed.iter().map(|v| v * v).sum::<f64>() / 4.0;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);

        // Constant column maps to zero
        assert_eq!(scaler.transform(&samples[0].features)[1], 0.0);
    }
}
