//! Twelve Data time-series client
//!
//! Only transport lives here; payload interpretation is in
//! [`super::parse_time_series`].

use super::PriceSource;
use crate::config::ProviderConfig;
use crate::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// HTTP client for the `/time_series` endpoint
#[derive(Clone)]
pub struct TwelveDataClient {
    http: Client,
    base_url: String,
    interval: String,
    output_size: usize,
}

impl TwelveDataClient {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            interval: config.interval.clone(),
            output_size: config.output_size,
        })
    }
}

#[async_trait]
impl PriceSource for TwelveDataClient {
    async fn time_series(&self, symbol: &str, api_key: &str) -> Result<Value> {
        let url = format!("{}/time_series", self.base_url);
        debug!(symbol, interval = %self.interval, "requesting time series");

        // Error payloads come back as JSON too, often with a 200 status
        let body: Value = self
            .http
            .get(&url)
            .query(&[
                ("symbol", symbol),
                ("interval", self.interval.as_str()),
                ("outputsize", &self.output_size.to_string()),
                ("apikey", api_key),
            ])
            .send()
            .await?
            .json()
            .await?;

        Ok(body)
    }
}
