//! Signal engine orchestration
//!
//! One run visits every configured symbol in order:
//! fetch → features → balance → train + CV → gate → predict.
//! A symbol that fails any step is logged and left out of the result;
//! nothing short of a bad configuration stops the run.

pub mod gate;
pub mod predictor;
pub mod report;
pub mod schedule;


pub use gate::QualityGate;
pub use predictor::{predict, RuleChecks};
pub use report::render_table;
pub use schedule::next_tick;

use crate::client::{fetch_history, KeyRotator, PriceSource, TwelveDataClient, Unavailable};
use crate::config::{Config, Variant};
use crate::error::Result;
use crate::ml::{balance, derive_features, top_features, train, ModelStrategy, NoModelReason};
use crate::types::{PlanOffsets, PriceSeries, SignalResult};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Why a symbol produced no row
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    #[error("data unavailable: {0}")]
    Unavailable(#[from] Unavailable),

    #[error("only {bars} bars, need {required}")]
    InsufficientHistory { bars: usize, required: usize },

    #[error("no model: {0}")]
    NoModel(#[from] NoModelReason),

    #[error("CV accuracy {accuracy:.3} not above {threshold:.2}")]
    LowAccuracy { accuracy: f64, threshold: f64 },

    #[error("internal fault: {0}")]
    Fault(String),
}

/// Everything the CPU-side pipeline needs for one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub strategy: ModelStrategy,
    pub gate: QualityGate,
    pub offsets: PlanOffsets,
    pub min_class_samples: usize,
    pub cv_folds: usize,
    pub seed: u64,
    pub top_features: usize,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        let engine = &config.engine;
        Self {
            strategy: ModelStrategy::for_variant(engine.variant),
            gate: QualityGate {
                min_history: engine.min_history,
                accuracy_threshold: engine.accuracy_threshold,
            },
            offsets: config.plan_offsets(),
            min_class_samples: engine.min_class_samples,
            cv_folds: engine.cv_folds,
            seed: engine.seed,
            top_features: engine.top_features,
        }
    }
}

/// Run the model pipeline on one fetched series
pub fn analyze_series(
    series: &PriceSeries,
    settings: &PipelineSettings,
) -> std::result::Result<SignalResult, SkipReason> {
    settings.gate.check_history(series.len())?;

    let table = derive_features(series);
    let live = table.live_row().ok_or(NoModelReason::EmptyTable)?;

    let dataset = balance(&table.labeled(), settings.min_class_samples, settings.seed)?;
    let outcome = train(&dataset, &settings.strategy, settings.cv_folds, settings.seed);
    let trained = settings.gate.admit(outcome)?;

    let explanation = trained
        .model
        .explainable_members()
        .and_then(|members| top_features(members, settings.top_features));

    predict(
        series.symbol(),
        &trained,
        live,
        &settings.offsets,
        explanation,
    )
    .map_err(|e| SkipReason::Fault(e.to_string()))
}

pub struct SignalEngine {
    source: Box<dyn PriceSource>,
    rotator: KeyRotator,
    symbols: Vec<String>,
    variant: Variant,
    fetch_timeout: Duration,
    settings: PipelineSettings,
}

impl SignalEngine {
    pub fn new(config: &Config, source: Box<dyn PriceSource>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            rotator: KeyRotator::new(config.provider.api_keys.clone())?,
            symbols: config.engine.symbols.clone(),
            variant: config.engine.variant,
            fetch_timeout: Duration::from_secs(config.provider.timeout_secs),
            settings: PipelineSettings::from_config(config),
        })
    }

    /// Engine backed by the live HTTP provider
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = TwelveDataClient::new(&config.provider)?;
        Self::new(config, Box::new(client))
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Evaluate every symbol once, in configured order.
    ///
    /// Returns only the rows that passed every step; may be empty.
    pub async fn run(&self) -> Vec<SignalResult> {
        let run_id = Uuid::new_v4();
        let span = info_span!("signal_run", %run_id, variant = self.variant.label());

        async {
            info!(symbols = self.symbols.len(), "Signal run started");
            let mut results = Vec::new();

            for symbol in &self.symbols {
                match self.evaluate_symbol(symbol).await {
                    Ok(result) => {
                        info!(
                            symbol = %symbol,
                            signal = %result.signal,
                            prob_buy = result.prob_buy,
                            confidence = %result.confidence,
                            cv_accuracy = result.cv_accuracy,
                            "Signal generated"
                        );
                        results.push(result);
                    }
                    Err(reason) => {
                        warn!(symbol = %symbol, %reason, "Symbol skipped");
                    }
                }
            }

            info!(emitted = results.len(), "Signal run finished");
            results
        }
        .instrument(span)
        .await
    }

    async fn evaluate_symbol(&self, symbol: &str) -> std::result::Result<SignalResult, SkipReason> {
        let series =
            fetch_history(self.source.as_ref(), &self.rotator, symbol, self.fetch_timeout).await?;

        let settings = self.settings.clone();
        tokio::task::spawn_blocking(move || analyze_series(&series, &settings))
            .await
            .map_err(|e| SkipReason::Fault(format!("pipeline task failed: {e}")))?
    }
}
