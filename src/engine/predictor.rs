//! Live-row prediction, rule-based confidence and the price plan

use crate::ml::{FeatureRow, ModelError, TrainedModel};
use crate::types::{round_to, Confidence, PlanOffsets, PricePlan, Signal, SignalResult};
use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;

/// ADX level above which the market counts as trending
pub const ADX_TREND_LEVEL: f64 = 20.0;

/// Rule hits needed for a strong signal
pub const STRONG_TALLY: usize = 4;

/// The five technical confirmations behind the confidence label.
///
/// Only the band rule depends on the signal direction; the other four
/// always lean bullish, whatever the model says.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuleChecks {
    pub ema_above_ma: bool,
    pub momentum_positive: bool,
    pub macd_positive: bool,
    pub trending: bool,
    /// BUY: close under the lower band; SELL: close over the upper band
    pub band_breach: bool,
}

impl RuleChecks {
    pub fn evaluate(row: &FeatureRow, signal: Signal) -> Self {
        Self {
            ema_above_ma: row.ema10 > row.ma10,
            momentum_positive: row.momentum > 0.0,
            macd_positive: row.macd > 0.0,
            trending: row.adx > ADX_TREND_LEVEL,
            band_breach: match signal {
                Signal::Buy => row.close < row.bb_lower,
                Signal::Sell => row.close > row.bb_upper,
            },
        }
    }

    pub fn tally(&self) -> usize {
        [
            self.ema_above_ma,
            self.momentum_positive,
            self.macd_positive,
            self.trending,
            self.band_breach,
        ]
        .iter()
        .filter(|&&hit| hit)
        .count()
    }

    pub fn confidence(&self) -> Confidence {
        if self.tally() >= STRONG_TALLY {
            Confidence::Strong
        } else {
            Confidence::Weak
        }
    }
}

/// Build the result row for `symbol` from its admitted model and live bar
pub fn predict(
    symbol: &str,
    trained: &TrainedModel,
    live: &FeatureRow,
    offsets: &PlanOffsets,
    top_features: Option<String>,
) -> Result<SignalResult, ModelError> {
    let prob_up = trained.probability_up(live)?;
    if !(0.0..=1.0).contains(&prob_up) {
        return Err(ModelError::InvalidData(format!(
            "probability {prob_up} out of range"
        )));
    }

    let signal = Signal::from_probability(prob_up);
    let confidence = RuleChecks::evaluate(live, signal).confidence();

    let close = Decimal::from_f64(live.close)
        .ok_or_else(|| ModelError::InvalidData(format!("close {} not representable", live.close)))?;
    let plan = PricePlan::new(close, signal, offsets);

    Ok(SignalResult {
        symbol: symbol.to_string(),
        signal,
        prob_buy: round_to(prob_up, 2),
        rsi: round_to(live.rsi14, 1),
        confidence,
        price_x100: (plan.entry * Decimal::ONE_HUNDRED).round_dp(2),
        plan,
        top_features,
        cv_accuracy: trained.cv_accuracy,
    })
}
