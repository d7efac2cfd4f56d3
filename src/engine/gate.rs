//! Quality gate: history length and cross-validated accuracy

use super::SkipReason;
use crate::ml::{TrainedModel, TrainingOutcome};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QualityGate {
    /// Minimum raw bars before feature derivation
    pub min_history: usize,
    /// Mean CV accuracy must be strictly above this
    pub accuracy_threshold: f64,
}

impl Default for QualityGate {
    fn default() -> Self {
        Self {
            min_history: 100,
            accuracy_threshold: 0.70,
        }
    }
}

impl QualityGate {
    pub fn check_history(&self, bars: usize) -> Result<(), SkipReason> {
        if bars < self.min_history {
            return Err(SkipReason::InsufficientHistory {
                bars,
                required: self.min_history,
            });
        }
        Ok(())
    }

    pub fn admit(&self, outcome: TrainingOutcome) -> Result<TrainedModel, SkipReason> {
        let trained = outcome?;
        if trained.cv_accuracy <= self.accuracy_threshold {
            return Err(SkipReason::LowAccuracy {
                accuracy: trained.cv_accuracy,
                threshold: self.accuracy_threshold,
            });
        }
        Ok(trained)
    }
}
