//! Model assembly and soft-voting consensus

use super::boosting::{BoostParams, HistogramBooster, LeafWiseBooster, OrderedBooster};
use super::{Classifier, FeatureVector, ModelError, Sample};
use crate::config::Variant;

/// Equal-weight average of member class-1 probabilities
pub struct SoftVotingEnsemble {
    members: Vec<Box<dyn Classifier>>,
}

impl SoftVotingEnsemble {
    pub fn new() -> Self {
        Self {
            members: Vec::new(),
        }
    }

    pub fn add_member(&mut self, model: Box<dyn Classifier>) {
        self.members.push(model);
    }

    pub fn members(&self) -> &[Box<dyn Classifier>] {
        &self.members
    }
}

impl Default for SoftVotingEnsemble {
    fn default() -> Self {
        Self::new()
    }
}

impl Classifier for SoftVotingEnsemble {
    fn name(&self) -> &str {
        "soft-voting"
    }

    fn fit(&mut self, samples: &[Sample]) -> Result<(), ModelError> {
        if self.members.is_empty() {
            return Err(ModelError::InvalidData("Ensemble has no members".to_string()));
        }
        for member in &mut self.members {
            member.fit(samples)?;
        }
        Ok(())
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        if self.members.is_empty() {
            return Err(ModelError::NotTrained);
        }
        let mut total = 0.0;
        for member in &self.members {
            total += member.predict_proba(features)?;
        }
        Ok(total / self.members.len() as f64)
    }

    fn feature_importance(&self) -> Result<Vec<f64>, ModelError> {
        Err(ModelError::ImportanceUnavailable(self.name().to_string()))
    }
}

/// The classifier a symbol is trained with
pub enum Model {
    Single(Box<dyn Classifier>),
    Consensus(SoftVotingEnsemble),
}

impl Model {
    /// Members whose importances feed the explanation, if any
    pub fn explainable_members(&self) -> Option<&[Box<dyn Classifier>]> {
        match self {
            Model::Single(_) => None,
            Model::Consensus(ensemble) => Some(ensemble.members()),
        }
    }

    fn inner(&self) -> &dyn Classifier {
        match self {
            Model::Single(model) => model.as_ref(),
            Model::Consensus(ensemble) => ensemble as &dyn Classifier,
        }
    }
}

impl Classifier for Model {
    fn name(&self) -> &str {
        self.inner().name()
    }

    fn fit(&mut self, samples: &[Sample]) -> Result<(), ModelError> {
        match self {
            Model::Single(model) => model.fit(samples),
            Model::Consensus(ensemble) => ensemble.fit(samples),
        }
    }

    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError> {
        self.inner().predict_proba(features)
    }

    fn feature_importance(&self) -> Result<Vec<f64>, ModelError> {
        self.inner().feature_importance()
    }
}

/// How a symbol's model is built
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelStrategy {
    /// One histogram booster on raw features
    Single(BoostParams),
    /// Histogram, leaf-wise and ordered boosters on standardised features
    Consensus(BoostParams),
}

impl ModelStrategy {
    pub fn for_variant(variant: Variant) -> Self {
        let params = BoostParams {
            n_estimators: variant.n_estimators(),
            max_depth: 4,
            learning_rate: 0.05,
        };
        match variant {
            Variant::ProPlus => ModelStrategy::Single(params),
            Variant::ProMax => ModelStrategy::Consensus(params),
        }
    }

    /// Fresh, untrained model
    pub fn build(&self, seed: u64) -> Model {
        match *self {
            ModelStrategy::Single(params) => Model::Single(Box::new(HistogramBooster::new(params))),
            ModelStrategy::Consensus(params) => {
                let mut ensemble = SoftVotingEnsemble::new();
                ensemble.add_member(Box::new(HistogramBooster::new(params)));
                ensemble.add_member(Box::new(LeafWiseBooster::new(params)));
                ensemble.add_member(Box::new(OrderedBooster::new(params, seed)));
                Model::Consensus(ensemble)
            }
        }
    }

    pub fn scales_features(&self) -> bool {
        matches!(self, ModelStrategy::Consensus(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ml::N_FEATURES;

    struct Fixed(f64);

    impl Classifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn fit(&mut self, _samples: &[Sample]) -> Result<(), ModelError> {
            Ok(())
        }
        fn predict_proba(&self, _features: &FeatureVector) -> Result<f64, ModelError> {
            Ok(self.0)
        }
        fn feature_importance(&self) -> Result<Vec<f64>, ModelError> {
            Ok(vec![0.0; N_FEATURES])
        }
    }

    #[test]
    fn test_soft_vote_is_mean() {
        let mut ensemble = SoftVotingEnsemble::new();
        ensemble.add_member(Box::new(Fixed(0.9)));
        ensemble.add_member(Box::new(Fixed(0.6)));
        ensemble.add_member(Box::new(Fixed(0.3)));

        let p = ensemble.predict_proba(&[0.0; N_FEATURES]).unwrap();
        assert!((p - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_empty_ensemble() {
        let mut ensemble = SoftVotingEnsemble::new();
        assert!(ensemble.fit(&[]).is_err());
        assert_eq!(ensemble.predict_proba(&[0.0; N_FEATURES]), Err(ModelError::NotTrained));
    }

    #[test]
    fn test_strategy_for_variant() {
        let plus = ModelStrategy::for_variant(Variant::ProPlus);
        assert!(!plus.scales_features());
        assert!(plus.build(42).explainable_members().is_none());

        let max = ModelStrategy::for_variant(Variant::ProMax);
        assert!(max.scales_features());
        let model = max.build(42);
        let names: Vec<&str> = model
            .explainable_members()
            .unwrap()
            .iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, vec!["histogram", "leafwise", "ordered"]);
    }

    #[test]
    fn test_params_follow_variant() {
        match ModelStrategy::for_variant(Variant::ProPlus) {
            ModelStrategy::Single(params) => assert_eq!(params.n_estimators, 150),
            other => panic!("unexpected {other:?}"),
        }
        match ModelStrategy::for_variant(Variant::ProMax) {
            ModelStrategy::Consensus(params) => assert_eq!(params.n_estimators, 100),
            other => panic!("unexpected {other:?}"),
        }
    }
}
