//! Machine learning pipeline
//!
//! Provides the per-symbol model stack:
//! - Technical indicator features with drop-NA warm-up handling
//! - Seeded class balancing
//! - Three gradient boosting algorithms behind one [`Classifier`] trait
//! - Soft-voting consensus and feature-importance explanation
//! - Walk-forward cross-validation and full-data refit

pub mod balance;
pub mod boosting;
pub mod ensemble;
pub mod explain;
pub mod features;
pub mod indicators;
pub mod scaler;
pub mod trainer;
pub mod validation;


pub use balance::{balance, BalancedDataset};
pub use boosting::{BoostParams, HistogramBooster, LeafWiseBooster, OrderedBooster};
pub use ensemble::{Model, ModelStrategy, SoftVotingEnsemble};
pub use explain::top_features;
pub use features::{derive_features, FeatureConfig, FeatureEngineer, FeatureRow, FeatureTable};
pub use scaler::StandardScaler;
pub use trainer::{train, NoModelReason, TrainedModel, TrainingOutcome};
pub use validation::{accuracy, time_series_splits, Fold};

use thiserror::Error;

/// Number of model inputs
pub const N_FEATURES: usize = 10;

/// Fixed model input ordering
pub const FEATURE_NAMES: [&str; N_FEATURES] = [
    "ma5",
    "ma10",
    "ema10",
    "rsi14",
    "momentum",
    "macd",
    "adx",
    "bb_upper",
    "bb_lower",
    "volatility",
];

/// One model input vector
pub type FeatureVector = [f64; N_FEATURES];

/// Labeled training example
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub features: FeatureVector,
    /// 1 = next close higher, 0 otherwise
    pub label: u8,
}

/// Errors that can occur with a model
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Model not trained")]
    NotTrained,

    #[error("Feature importance unavailable for {0}")]
    ImportanceUnavailable(String),
}

/// Binary probabilistic classifier
///
/// Implementations must be deterministic after `fit`: the same input
/// always yields the same probability.
pub trait Classifier: Send {
    /// Model name for logging
    fn name(&self) -> &str;

    fn fit(&mut self, samples: &[Sample]) -> Result<(), ModelError>;

    /// Probability of label 1
    fn predict_proba(&self, features: &FeatureVector) -> Result<f64, ModelError>;

    /// Native importance vector, one entry per feature
    fn feature_importance(&self) -> Result<Vec<f64>, ModelError>;

    /// Hard label at the 0.5 cut
    fn predict(&self, features: &FeatureVector) -> Result<u8, ModelError> {
        Ok(u8::from(self.predict_proba(features)? > 0.5))
    }
}
