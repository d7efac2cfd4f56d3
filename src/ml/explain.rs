//! Top-feature explanation from member importances

use super::{Classifier, FEATURE_NAMES, N_FEATURES};
use tracing::warn;

/// Comma-joined names of the `n` features with the highest mean importance.
///
/// Vectors are averaged element-wise as reported by each member, without
/// rescaling. Members whose importance cannot be read are skipped; `None`
/// when no member reports one. Ties keep feature order.
pub fn top_features(members: &[Box<dyn Classifier>], n: usize) -> Option<String> {
    let mut sum = [0.0; N_FEATURES];
    let mut used = 0usize;

    for member in members {
        match member.feature_importance() {
            Ok(importance) if importance.len() == N_FEATURES => {
                for (s, v) in sum.iter_mut().zip(&importance) {
                    *s += v;
                }
                used += 1;
            }
            Ok(importance) => {
                warn!(
                    member = member.name(),
                    len = importance.len(),
                    "Importance vector has wrong length, skipping"
                );
            }
            Err(e) => {
                warn!(member = member.name(), error = %e, "Importance unavailable, skipping");
            }
        }
    }

    if used == 0 || n == 0 {
        return None;
    }

    let mut ranked: Vec<(usize, f64)> = sum
        .iter()
        .map(|s| s / used as f64)
        .enumerate()
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    Some(
        ranked
            .iter()
            .take(n)
            .map(|(j, _)| FEATURE_NAMES[*j])
            .collect::<Vec<_>>()
            .join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::{FeatureVector, ModelError, Sample};

    struct Fixed(Result<Vec<f64>, ModelError>);

    impl Classifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn fit(&mut self, _samples: &[Sample]) -> Result<(), ModelError> {
            Ok(())
        }
        fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Ok(0.5)
        }
        fn feature_importance(&self) -> Result<Vec<f64>, ModelError> {
            self.0.clone()
        }
    }

    fn one_hot(j: usize, v: f64) -> Vec<f64> {
        let mut out = vec![0.0; N_FEATURES];
        out[j] = v;
        out
    }

    #[test]
    fn test_averages_raw_vectors() {
        // Member scales differ; the largest raw values dominate
        let members: Vec<Box<dyn Classifier>> = vec![
            Box::new(Fixed(Ok(one_hot(0, 1.0)))),
            Box::new(Fixed(Ok(one_hot(3, 40.0)))),
            Box::new(Fixed(Ok(one_hot(9, 60.0)))),
        ];
        assert_eq!(
            top_features(&members, 3).as_deref(),
            Some("volatility, rsi14, ma5")
        );
    }

    #[test]
    fn test_failing_member_skipped() {
        let members: Vec<Box<dyn Classifier>> = vec![
            Box::new(Fixed(Err(ModelError::ImportanceUnavailable("x".to_string())))),
            Box::new(Fixed(Ok(one_hot(5, 2.0)))),
            Box::new(Fixed(Ok(vec![1.0; 3]))),
        ];
        let top = top_features(&members, 1);
        assert_eq!(top.as_deref(), Some("macd"));
    }

    #[test]
    fn test_ties_keep_feature_order() {
        let members: Vec<Box<dyn Classifier>> = vec![Box::new(Fixed(Ok(vec![0.0; N_FEATURES])))];
        assert_eq!(top_features(&members, 3).as_deref(), Some("ma5, ma10, ema10"));
    }

    #[test]
    fn test_nothing_usable() {
        let members: Vec<Box<dyn Classifier>> =
            vec![Box::new(Fixed(Err(ModelError::NotTrained)))];
        assert_eq!(top_features(&members, 3), None);
    }
}
