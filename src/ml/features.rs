//! Feature derivation
//!
//! Turns a [`PriceSeries`] into one [`FeatureRow`] per bar whose indicators
//! are all defined. Head rows inside any warm-up window are dropped (no
//! imputation). Labels look one bar ahead; the last row has none and is
//! the row used for live inference.

use super::indicators;
use super::{FeatureVector, Sample};
use crate::types::PriceSeries;
use chrono::NaiveDateTime;

/// Indicator windows
#[derive(Debug, Clone)]
pub struct FeatureConfig {
    pub ma_fast: usize,
    pub ma_slow: usize,
    pub ema_span: usize,
    pub rsi_period: usize,
    pub momentum_lag: usize,
    pub macd_fast: usize,
    pub macd_slow: usize,
    pub macd_signal: usize,
    pub adx_period: usize,
    pub bollinger_window: usize,
    pub bollinger_width: f64,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            ma_fast: 5,
            ma_slow: 10,
            ema_span: 10,
            rsi_period: 14,
            momentum_lag: 4,
            macd_fast: 12,
            macd_slow: 26,
            macd_signal: 9,
            adx_period: 14,
            bollinger_window: 20,
            bollinger_width: 2.0,
        }
    }
}

/// Indicator snapshot for one bar
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub timestamp: NaiveDateTime,
    pub close: f64,
    pub ma5: f64,
    pub ma10: f64,
    pub ema10: f64,
    pub rsi14: f64,
    pub momentum: f64,
    pub macd: f64,
    pub adx: f64,
    pub bb_upper: f64,
    pub bb_lower: f64,
    pub volatility: f64,
}

impl FeatureRow {
    /// Model input in [`super::FEATURE_NAMES`] order
    pub fn to_vector(&self) -> FeatureVector {
        [
            self.ma5,
            self.ma10,
            self.ema10,
            self.rsi14,
            self.momentum,
            self.macd,
            self.adx,
            self.bb_upper,
            self.bb_lower,
            self.volatility,
        ]
    }

    pub fn is_finite(&self) -> bool {
        self.close.is_finite() && self.to_vector().iter().all(|v| v.is_finite())
    }
}

/// Retained rows of one series, in time order
#[derive(Debug, Clone, Default)]
pub struct FeatureTable {
    rows: Vec<FeatureRow>,
}

impl FeatureTable {
    pub fn rows(&self) -> &[FeatureRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// 1 where the next row closes higher, else 0; one per row except the last
    pub fn labels(&self) -> Vec<u8> {
        self.rows
            .windows(2)
            .map(|w| u8::from(w[1].close > w[0].close))
            .collect()
    }

    /// Training samples: every row but the last, paired with its label
    pub fn labeled(&self) -> Vec<Sample> {
        self.rows
            .iter()
            .zip(self.labels())
            .map(|(row, label)| Sample {
                features: row.to_vector(),
                label,
            })
            .collect()
    }

    /// The unlabeled most recent row
    pub fn live_row(&self) -> Option<&FeatureRow> {
        self.rows.last()
    }
}

/// Derive the feature table using default windows
pub fn derive_features(series: &PriceSeries) -> FeatureTable {
    FeatureEngineer::new(FeatureConfig::default()).derive(series)
}

/// Computes the indicator set over a series
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer {
    config: FeatureConfig,
}

impl FeatureEngineer {
    pub fn new(config: FeatureConfig) -> Self {
        Self { config }
    }

    pub fn derive(&self, series: &PriceSeries) -> FeatureTable {
        let cfg = &self.config;
        let closes = series.closes();
        let highs = series.highs();
        let lows = series.lows();
        let close_values = indicators::defined(&closes);

        let ma5 = indicators::rolling_mean(&close_values, cfg.ma_fast);
        let ma10 = indicators::rolling_mean(&close_values, cfg.ma_slow);
        let ema10 = indicators::ewm_mean(&closes, cfg.ema_span);
        let rsi14 = indicators::rsi(&closes, cfg.rsi_period);
        let momentum = indicators::shift_diff(&closes, cfg.momentum_lag);
        let macd =
            indicators::macd_histogram(&closes, cfg.macd_fast, cfg.macd_slow, cfg.macd_signal);
        let adx = indicators::adx(&highs, &lows, &closes, cfg.adx_period);
        let bands =
            indicators::bollinger(&closes, cfg.bollinger_window, cfg.bollinger_width);

        let rows = series
            .bars()
            .iter()
            .enumerate()
            .filter_map(|(t, bar)| {
                let (bb_upper, bb_lower) = bands[t]?;
                let row = FeatureRow {
                    timestamp: bar.timestamp,
                    close: bar.close,
                    ma5: ma5[t]?,
                    ma10: ma10[t]?,
                    ema10: ema10[t],
                    rsi14: rsi14[t]?,
                    momentum: momentum[t]?,
                    macd: macd[t],
                    adx: adx[t]?,
                    bb_upper,
                    bb_lower,
                    volatility: bar.high - bar.low,
                };
                row.is_finite().then_some(row)
            })
            .collect();

        FeatureTable { rows }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Bar;
    use chrono::{Duration, NaiveDate};

    fn series_from(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                timestamp: start + Duration::hours(i as i64),
                open: c,
                high: c + 0.0010,
                low: c - 0.0010,
                close: c,
            })
            .collect();
        PriceSeries::new("EUR/USD", bars)
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 1.10 + (i as f64 * 0.37).sin() * 0.004 + (i as f64 * 0.05).cos() * 0.002)
            .collect()
    }

    #[test]
    fn test_head_truncation() {
        let table = derive_features(&series_from(&wave(300)));
        // ADX is the longest warm-up: 27 bars
        assert_eq!(table.len(), 273);
        assert_eq!(table.labels().len(), 272);
        assert!(table.rows().iter().all(FeatureRow::is_finite));
    }

    #[test]
    fn test_last_row_unlabeled() {
        let series = series_from(&wave(120));
        let table = derive_features(&series);
        let live = table.live_row().unwrap();
        assert_eq!(live.timestamp, series.bars().last().unwrap().timestamp);
        assert_eq!(table.labeled().len(), table.len() - 1);
    }

    #[test]
    fn test_labels_look_ahead() {
        let table = derive_features(&series_from(&wave(100)));
        let rows = table.rows();
        for (i, label) in table.labels().iter().enumerate() {
            assert_eq!(*label == 1, rows[i + 1].close > rows[i].close);
        }
    }

    #[test]
    fn test_too_short_series_has_no_rows() {
        let table = derive_features(&series_from(&wave(27)));
        assert!(table.is_empty());
        assert!(table.live_row().is_none());
        assert!(table.labeled().is_empty());
    }

    #[test]
    fn test_vector_order() {
        let table = derive_features(&series_from(&wave(60)));
        let row = &table.rows()[0];
        let v = row.to_vector();
        assert_eq!(v[0], row.ma5);
        assert_eq!(v[3], row.rsi14);
        assert_eq!(v[6], row.adx);
        assert_eq!(v[9], row.volatility);
        assert!((row.volatility - 0.0020).abs() < 1e-9);
    }

    #[test]
    fn test_rising_series_reads_bullish() {
        // Strictly increasing, accelerating closes
        let closes: Vec<f64> = (0..100)
            .map(|i| 1.05 + 0.0004 * i as f64 + 0.00001 * (i * i) as f64)
            .collect();
        let table = derive_features(&series_from(&closes));
        let live = table.live_row().unwrap();
        assert!(live.momentum > 0.0);
        assert!(live.macd > 0.0);
        assert!(live.rsi14 > 70.0);
        assert!(live.ema10 > live.ma10);
        assert!(table.labels().iter().all(|&l| l == 1));
    }

    #[test]
    fn test_falling_series_reads_bearish() {
        let closes: Vec<f64> = (0..100)
            .map(|i| 1.30 - 0.0004 * i as f64 - 0.00001 * (i * i) as f64)
            .collect();
        let table = derive_features(&series_from(&closes));
        let live = table.live_row().unwrap();
        assert!(live.momentum < 0.0);
        assert!(live.macd < 0.0);
        assert!(live.rsi14 < 30.0);
        assert!(table.labels().iter().all(|&l| l == 0));
    }
}
