//! Configuration
//!
//! Static settings for one deployment: provider credentials, the symbol
//! basket, model variant and the quality/plan constants. Loaded from an
//! optional TOML file overlaid with `FXSIG__*` environment variables.

use crate::error::{EngineError, Result};
use crate::types::PlanOffsets;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;

/// Default symbol basket
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "EUR/USD", "USD/JPY", "GBP/USD", "USD/CHF", "AUD/USD", "USD/CAD", "NZD/USD", "EUR/GBP",
];

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    /// Overrides the variant's built-in plan offsets
    #[serde(default)]
    pub plan: Option<PlanConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default = "default_interval")]
    pub interval: String,
    #[serde(default = "default_output_size")]
    pub output_size: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_keys: Vec::new(),
            interval: default_interval(),
            output_size: default_output_size(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,
    #[serde(default)]
    pub variant: Variant,
    /// Minimum bars before a symbol is considered at all
    #[serde(default = "default_min_history")]
    pub min_history: usize,
    /// Minimum rows per class before balancing
    #[serde(default = "default_min_class_samples")]
    pub min_class_samples: usize,
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,
    /// Mean CV accuracy must be strictly above this
    #[serde(default = "default_accuracy_threshold")]
    pub accuracy_threshold: f64,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default = "default_top_features")]
    pub top_features: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            variant: Variant::default(),
            min_history: default_min_history(),
            min_class_samples: default_min_class_samples(),
            cv_folds: default_cv_folds(),
            accuracy_threshold: default_accuracy_threshold(),
            seed: default_seed(),
            top_features: default_top_features(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlanConfig {
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

/// Pipeline variant
///
/// `ProPlus` trains a single histogram booster; `ProMax` trains the
/// three-member soft-voting consensus on standardised features and
/// attaches a top-feature explanation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    ProPlus,
    #[default]
    ProMax,
}

impl Variant {
    /// Built-in take-profit / stop-loss distances
    pub fn offsets(&self) -> PlanOffsets {
        match self {
            Variant::ProPlus => PlanOffsets {
                take_profit: dec!(0.005),
                stop_loss: dec!(0.004),
            },
            Variant::ProMax => PlanOffsets {
                take_profit: dec!(0.0020),
                stop_loss: dec!(0.0015),
            },
        }
    }

    /// Number of boosting rounds per member
    pub fn n_estimators(&self) -> usize {
        match self {
            Variant::ProPlus => 150,
            Variant::ProMax => 100,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Variant::ProPlus => "Pro+",
            Variant::ProMax => "Pro Max AI",
        }
    }
}

fn default_base_url() -> String {
    "https://api.twelvedata.com".to_string()
}

fn default_interval() -> String {
    "1h".to_string()
}

fn default_output_size() -> usize {
    300
}

fn default_timeout_secs() -> u64 {
    10
}

fn default_symbols() -> Vec<String> {
    DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect()
}

fn default_min_history() -> usize {
    100
}

fn default_min_class_samples() -> usize {
    10
}

fn default_cv_folds() -> usize {
    3
}

fn default_accuracy_threshold() -> f64 {
    0.70
}

fn default_seed() -> u64 {
    42
}

fn default_top_features() -> usize {
    3
}

impl Config {
    /// Load from `path` (optional) and the environment, then validate
    pub fn load(path: &str) -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .add_source(config::File::new(path, config::FileFormat::Toml).required(false))
            .add_source(
                config::Environment::with_prefix("FXSIG")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("provider.api_keys")
                    .with_list_parse_key("engine.symbols")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.provider.api_keys.iter().all(|k| k.trim().is_empty()) {
            return Err(EngineError::Invalid(
                "provider.api_keys must contain at least one key".into(),
            ));
        }
        if self.engine.symbols.is_empty() {
            return Err(EngineError::Invalid("engine.symbols must not be empty".into()));
        }
        if self.engine.cv_folds == 0 {
            return Err(EngineError::Invalid("engine.cv_folds must be at least 1".into()));
        }
        if !(self.engine.accuracy_threshold > 0.0 && self.engine.accuracy_threshold < 1.0) {
            return Err(EngineError::Invalid(format!(
                "engine.accuracy_threshold must be in (0, 1), got {}",
                self.engine.accuracy_threshold
            )));
        }
        if let Some(plan) = &self.plan {
            if plan.take_profit <= Decimal::ZERO || plan.stop_loss <= Decimal::ZERO {
                return Err(EngineError::Invalid("plan offsets must be positive".into()));
            }
        }
        Ok(())
    }

    /// Offsets in effect: explicit `[plan]` section, else the variant's
    pub fn plan_offsets(&self) -> PlanOffsets {
        match &self.plan {
            Some(plan) => PlanOffsets {
                take_profit: plan.take_profit,
                stop_loss: plan.stop_loss,
            },
            None => self.engine.variant.offsets(),
        }
    }
}
