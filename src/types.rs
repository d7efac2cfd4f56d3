//! Core domain types shared by the fetcher, the model pipeline and the
//! report layer.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One hourly OHLC candle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Time-ascending bars for a single symbol.
///
/// Built once by the fetcher and never modified afterwards; every engine
/// run fetches a fresh series.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    symbol: String,
    bars: Vec<Bar>,
}

impl PriceSeries {
    /// Build a series, sorting the bars ascending by timestamp
    pub fn new(symbol: impl Into<String>, mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.timestamp);
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn highs(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.high).collect()
    }

    pub fn lows(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.low).collect()
    }
}

/// Trade direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    Buy,
    Sell,
}

impl Signal {
    /// BUY strictly above one half, SELL otherwise
    pub fn from_probability(prob_up: f64) -> Self {
        if prob_up > 0.5 {
            Signal::Buy
        } else {
            Signal::Sell
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Buy => write!(f, "BUY"),
            Signal::Sell => write!(f, "SELL"),
        }
    }
}

/// Rule-based confidence label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Strong,
    Weak,
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::Strong => write!(f, "Strong"),
            Confidence::Weak => write!(f, "Weak"),
        }
    }
}

/// Fixed take-profit / stop-loss distances from the entry price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanOffsets {
    pub take_profit: Decimal,
    pub stop_loss: Decimal,
}

/// Entry, target and stop for one signal, all at 4 decimal places
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePlan {
    pub entry: Decimal,
    pub target: Decimal,
    pub stop: Decimal,
}

impl PricePlan {
    /// Place target and stop around `entry` in the direction of `signal`
    pub fn new(entry: Decimal, signal: Signal, offsets: &PlanOffsets) -> Self {
        let entry = entry.round_dp(4);
        let (target, stop) = match signal {
            Signal::Buy => (entry + offsets.take_profit, entry - offsets.stop_loss),
            Signal::Sell => (entry - offsets.take_profit, entry + offsets.stop_loss),
        };
        Self {
            entry,
            target: target.round_dp(4),
            stop: stop.round_dp(4),
        }
    }
}

impl fmt::Display for PricePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / TP: {} / SL: {}",
            self.entry.normalize(),
            self.target.normalize(),
            self.stop.normalize()
        )
    }
}

/// One emitted recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalResult {
    pub symbol: String,
    pub signal: Signal,
    /// Model probability of an up move, 2 dp
    pub prob_buy: f64,
    /// RSI(14) of the live bar, 1 dp
    pub rsi: f64,
    pub confidence: Confidence,
    /// Entry price scaled by 100, 2 dp
    pub price_x100: Decimal,
    pub plan: PricePlan,
    /// Top features by averaged importance (consensus models only)
    pub top_features: Option<String>,
    /// Mean walk-forward accuracy that admitted this row
    pub cv_accuracy: f64,
}

/// Round to `dp` decimal places
pub fn round_to(value: f64, dp: i32) -> f64 {
    let factor = 10f64.powi(dp);
    (value * factor).round() / factor
}
