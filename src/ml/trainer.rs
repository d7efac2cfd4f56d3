//! Per-symbol training: optional scaling, walk-forward CV, full refit

use super::balance::BalancedDataset;
use super::ensemble::{Model, ModelStrategy};
use super::features::FeatureRow;
use super::scaler::StandardScaler;
use super::validation::{accuracy, time_series_splits};
use super::{Classifier, ModelError};
use std::fmt;
use thiserror::Error;
use tracing::debug;

/// Why no model could be produced for a symbol
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NoModelReason {
    #[error("no feature rows")]
    EmptyTable,

    #[error("class counts {ups} up / {downs} down below minimum {required}")]
    InsufficientSamples {
        ups: usize,
        downs: usize,
        required: usize,
    },

    #[error("cross-validation fold {fold} is empty")]
    EmptyFold { fold: usize },

    #[error("model error: {0}")]
    Model(String),
}

impl From<ModelError> for NoModelReason {
    fn from(e: ModelError) -> Self {
        NoModelReason::Model(e.to_string())
    }
}

pub type TrainingOutcome = Result<TrainedModel, NoModelReason>;

/// Model refitted on the full balanced set, with its CV score
pub struct TrainedModel {
    pub model: Model,
    pub scaler: Option<StandardScaler>,
    pub fold_accuracies: Vec<f64>,
    pub cv_accuracy: f64,
}

impl TrainedModel {
    /// Class-1 probability for a feature row, scaled like the training data
    pub fn probability_up(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        let raw = row.to_vector();
        let features = match &self.scaler {
            Some(scaler) => scaler.transform(&raw),
            None => raw,
        };
        self.model.predict_proba(&features)
    }
}

impl fmt::Debug for TrainedModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrainedModel")
            .field("model", &self.model.name())
            .field("scaled", &self.scaler.is_some())
            .field("fold_accuracies", &self.fold_accuracies)
            .field("cv_accuracy", &self.cv_accuracy)
            .finish()
    }
}

/// Cross-validate `strategy` on `dataset`, then refit on all of it.
///
/// When the strategy scales features, the scaler is fitted once on the
/// whole balanced set and applied to every fold.
pub fn train(
    dataset: &BalancedDataset,
    strategy: &ModelStrategy,
    folds: usize,
    seed: u64,
) -> TrainingOutcome {
    if dataset.is_empty() {
        return Err(NoModelReason::EmptyTable);
    }

    let scaler = strategy
        .scales_features()
        .then(|| StandardScaler::fit(dataset.samples()));
    let data = match &scaler {
        Some(s) => dataset.map_features(|x| s.transform(x)),
        None => dataset.clone(),
    };
    let samples = data.samples();

    let splits = time_series_splits(samples.len(), folds)?;
    let mut fold_accuracies = Vec::with_capacity(splits.len());

    for (i, fold) in splits.iter().enumerate() {
        let mut model = strategy.build(seed);
        model.fit(&samples[fold.train.clone()])?;
        let acc = accuracy(&model, &samples[fold.test.clone()])?;
        debug!(
            fold = i,
            train = fold.train.len(),
            test = fold.test.len(),
            accuracy = acc,
            "CV fold scored"
        );
        fold_accuracies.push(acc);
    }

    let cv_accuracy = fold_accuracies.iter().sum::<f64>() / fold_accuracies.len() as f64;

    let mut model = strategy.build(seed);
    model.fit(samples)?;

    Ok(TrainedModel {
        model,
        scaler,
        fold_accuracies,
        cv_accuracy,
    })
}
