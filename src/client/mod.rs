//! Price-data provider access
//!
//! - [`PriceSource`]: the transport seam (real HTTP client or a test double)
//! - [`KeyRotator`]: round-robin credential pool
//! - [`fetch_history`]: the fetch contract the engine relies on. It never
//!   errors; it yields either a sorted [`PriceSeries`] or an [`Unavailable`]
//!   reason.

pub mod rotator;
pub mod twelvedata;

pub use rotator::KeyRotator;
pub use twelvedata::TwelveDataClient;

use crate::error::Result;
use crate::types::{Bar, PriceSeries};
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Source of raw time-series payloads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch the raw JSON body for `symbol` using `api_key`
    async fn time_series(&self, symbol: &str, api_key: &str) -> Result<Value>;
}

/// Why no series could be produced for a symbol
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Unavailable {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("payload has no values: {0}")]
    MissingValues(String),

    #[error("malformed bar data: {0}")]
    Malformed(String),
}

/// Fetch and normalise the latest bars for `symbol`.
///
/// Consumes exactly one key from `rotator`. Transport errors, timeouts and
/// payloads without a `values` array all map to [`Unavailable`].
pub async fn fetch_history(
    source: &dyn PriceSource,
    rotator: &KeyRotator,
    symbol: &str,
    timeout: Duration,
) -> std::result::Result<PriceSeries, Unavailable> {
    let api_key = rotator.next_key();

    let payload = match tokio::time::timeout(timeout, source.time_series(symbol, api_key)).await {
        Ok(Ok(payload)) => payload,
        Ok(Err(e)) => {
            warn!(symbol, error = %e, "time series request failed");
            return Err(Unavailable::Transport(e.to_string()));
        }
        Err(_) => {
            warn!(symbol, ?timeout, "time series request timed out");
            return Err(Unavailable::Timeout(timeout));
        }
    };

    let series = parse_time_series(symbol, &payload).inspect_err(|reason| {
        warn!(symbol, %reason, "unusable time series payload");
    })?;

    debug!(symbol, bars = series.len(), "fetched history");
    Ok(series)
}

/// Interpret a provider payload as a time-ascending series
pub fn parse_time_series(
    symbol: &str,
    payload: &Value,
) -> std::result::Result<PriceSeries, Unavailable> {
    let Some(values) = payload.get("values") else {
        return Err(Unavailable::MissingValues(provider_message(payload)));
    };

    let entries: Vec<RawBar> = serde_json::from_value(values.clone())
        .map_err(|e| Unavailable::Malformed(e.to_string()))?;

    let bars = entries
        .into_iter()
        .map(RawBar::into_bar)
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(PriceSeries::new(symbol, bars))
}

/// Error text from a provider error body, if any
fn provider_message(payload: &Value) -> String {
    let message = payload.get("message").and_then(Value::as_str);
    let code = payload.get("code").and_then(Value::as_i64);

    match (code, message) {
        (Some(code), Some(message)) => format!("code {}: {}", code, message),
        (None, Some(message)) => message.to_string(),
        _ => "response has no \"values\" field".to_string(),
    }
}

/// Bar as delivered by the provider: prices may be strings or numbers
#[derive(Debug, Deserialize)]
struct RawBar {
    datetime: String,
    open: Numeric,
    high: Numeric,
    low: Numeric,
    close: Numeric,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Numeric {
    Number(f64),
    Text(String),
}

impl Numeric {
    fn to_price(&self, field: &str) -> std::result::Result<f64, Unavailable> {
        let value = match self {
            Numeric::Number(n) => *n,
            Numeric::Text(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| Unavailable::Malformed(format!("{} is not numeric: {:?}", field, s)))?,
        };

        if !value.is_finite() || value <= 0.0 {
            return Err(Unavailable::Malformed(format!(
                "{} must be a positive finite price, got {}",
                field, value
            )));
        }
        Ok(value)
    }
}

impl RawBar {
    fn into_bar(self) -> std::result::Result<Bar, Unavailable> {
        Ok(Bar {
            timestamp: parse_datetime(&self.datetime)?,
            open: self.open.to_price("open")?,
            high: self.high.to_price("high")?,
            low: self.low.to_price("low")?,
            close: self.close.to_price("close")?,
        })
    }
}

/// Accepts `YYYY-MM-DD HH:MM:SS` (intraday) and `YYYY-MM-DD` (daily)
fn parse_datetime(raw: &str) -> std::result::Result<NaiveDateTime, Unavailable> {
    let raw = raw.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| Unavailable::Malformed(format!("unparseable datetime {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use serde_json::json;

    fn rotator() -> KeyRotator {
        KeyRotator::new(vec!["k1".into(), "k2".into()]).unwrap()
    }

    #[test]
    fn test_parse_sorts_ascending_and_coerces() {
        // Provider returns newest first, mixing strings and numbers
        let payload = json!({
            "meta": {"symbol": "EUR/USD", "interval": "1h"},
            "values": [
                {"datetime": "2024-03-01 12:00:00", "open": "1.0850", "high": "1.0860", "low": "1.0840", "close": "1.0855"},
                {"datetime": "2024-03-01 11:00:00", "open": 1.0840, "high": 1.0852, "low": 1.0835, "close": 1.0850},
            ],
            "status": "ok"
        });

        let series = parse_time_series("EUR/USD", &payload).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series.closes(), vec![1.0850, 1.0855]);
        assert!(series.bars()[0].timestamp < series.bars()[1].timestamp);
    }

    #[test]
    fn test_parse_missing_values_field() {
        let payload = json!({"code": 429, "message": "API credits exhausted", "status": "error"});
        let err = parse_time_series("EUR/USD", &payload).unwrap_err();
        assert_eq!(
            err,
            Unavailable::MissingValues("code 429: API credits exhausted".into())
        );

        let err = parse_time_series("EUR/USD", &json!({})).unwrap_err();
        assert!(matches!(err, Unavailable::MissingValues(_)));
    }

    #[test]
    fn test_parse_malformed_number() {
        let payload = json!({
            "values": [{"datetime": "2024-03-01 12:00:00", "open": "abc", "high": "1", "low": "1", "close": "1"}]
        });
        let err = parse_time_series("EUR/USD", &payload).unwrap_err();
        assert!(matches!(err, Unavailable::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_non_positive_price() {
        let payload = json!({
            "values": [{"datetime": "2024-03-01 12:00:00", "open": "1", "high": "1", "low": "0", "close": "1"}]
        });
        assert!(matches!(
            parse_time_series("EUR/USD", &payload),
            Err(Unavailable::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_values_not_array() {
        let payload = json!({"values": "nope"});
        assert!(matches!(
            parse_time_series("EUR/USD", &payload),
            Err(Unavailable::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_empty_values_is_a_series() {
        let series = parse_time_series("EUR/USD", &json!({"values": []})).unwrap();
        assert!(series.is_empty());
    }

    #[test]
    fn test_parse_daily_datetime() {
        let payload = json!({
            "values": [{"datetime": "2024-03-01", "open": "1", "high": "1", "low": "1", "close": "1"}]
        });
        let series = parse_time_series("EUR/USD", &payload).unwrap();
        assert_eq!(series.bars()[0].timestamp.to_string(), "2024-03-01 00:00:00");
    }

    #[tokio::test]
    async fn test_fetch_transport_error_is_unavailable() {
        let mut source = MockPriceSource::new();
        source
            .expect_time_series()
            .returning(|_, _| Err(EngineError::Invalid("connection refused".into())));

        let rotator = rotator();
        let result = fetch_history(&source, &rotator, "EUR/USD", Duration::from_secs(1)).await;
        assert!(matches!(result, Err(Unavailable::Transport(_))));
        // Failed fetch still consumed a key
        assert_eq!(rotator.issued(), 1);
    }

    #[tokio::test]
    async fn test_fetch_uses_rotating_keys() {
        let mut source = MockPriceSource::new();
        let mut seq = mockall::Sequence::new();
        source
            .expect_time_series()
            .withf(|_, key| key == "k1")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({"values": []})));
        source
            .expect_time_series()
            .withf(|_, key| key == "k2")
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(json!({"status": "error"})));

        let rotator = rotator();
        let timeout = Duration::from_secs(1);
        assert!(fetch_history(&source, &rotator, "EUR/USD", timeout).await.is_ok());
        assert!(fetch_history(&source, &rotator, "USD/JPY", timeout).await.is_err());
    }

    struct SlowSource;

    #[async_trait]
    impl PriceSource for SlowSource {
        async fn time_series(&self, _symbol: &str, _api_key: &str) -> Result<Value> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(json!({"values": []}))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_timeout_is_unavailable() {
        let rotator = rotator();
        let result = fetch_history(&SlowSource, &rotator, "EUR/USD", Duration::from_secs(10)).await;
        assert_eq!(result, Err(Unavailable::Timeout(Duration::from_secs(10))));
    }
}
