//! CoinGecko `market_chart/range` client.
//!
//! One request per asset returns three index-aligned series of
//! `[epoch_millis, value]` pairs (prices, market caps, total volumes) which are
//! zipped into [`Sample`]s. No retry or backoff: a failure is reported to the
//! caller, which decides whether to carry on.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use super::{Asset, Sample, TIMESTAMP_FORMAT};
use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned status {status} for {asset}")]
    Status { asset: Asset, status: u16 },
    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error(
        "series lengths differ (prices {prices}, market_caps {market_caps}, \
         total_volumes {total_volumes})"
    )]
    Misaligned {
        prices: usize,
        market_caps: usize,
        total_volumes: usize,
    },
    #[error("timestamp out of range: {0}")]
    Timestamp(f64),
    #[error("failed to store samples: {0}")]
    Storage(String),
}

/// Raw response body. Values may be `null` upstream.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MarketChart {
    #[serde(default)]
    pub prices: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    pub market_caps: Vec<(f64, Option<f64>)>,
    #[serde(default)]
    pub total_volumes: Vec<(f64, Option<f64>)>,
}

impl MarketChart {
    /// Zip the three series into samples keyed by the price timestamp.
    pub fn into_samples(self) -> Result<Vec<Sample>, FetchError> {
        if self.prices.len() != self.market_caps.len()
            || self.prices.len() != self.total_volumes.len()
        {
            return Err(FetchError::Misaligned {
                prices: self.prices.len(),
                market_caps: self.market_caps.len(),
                total_volumes: self.total_volumes.len(),
            });
        }

        self.prices
            .into_iter()
            .zip(self.market_caps)
            .zip(self.total_volumes)
            .map(|(((millis, price), (_, market_cap)), (_, volume))| {
                Ok(Sample {
                    timestamp: format_millis(millis)?,
                    price,
                    market_cap,
                    volume,
                })
            })
            .collect()
    }
}

/// Epoch milliseconds → `YYYY-MM-DD HH:MM:SS` (UTC, sub-second truncated).
pub fn format_millis(millis: f64) -> Result<String, FetchError> {
    if !millis.is_finite() {
        return Err(FetchError::Timestamp(millis));
    }
    DateTime::from_timestamp_millis(millis as i64)
        .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
        .ok_or(FetchError::Timestamp(millis))
}

/// Anything that can serve a market chart for a `[from, to]` window in unix seconds.
#[async_trait]
pub trait MarketChartSource: Send + Sync {
    async fn market_chart_range(
        &self,
        asset: Asset,
        from: i64,
        to: i64,
    ) -> Result<MarketChart, FetchError>;
}

pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    vs_currency: String,
}

impl CoinGeckoClient {
    pub fn new(config: &AppConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("cryptosight/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.clone(),
        })
    }

    fn range_url(&self, asset: Asset) -> String {
        format!("{}/coins/{}/market_chart/range", self.base_url, asset.id())
    }
}

#[async_trait]
impl MarketChartSource for CoinGeckoClient {
    async fn market_chart_range(
        &self,
        asset: Asset,
        from: i64,
        to: i64,
    ) -> Result<MarketChart, FetchError> {
        let url = self.range_url(asset);
        tracing::debug!(%asset, %url, from, to, "Requesting market chart");

        let resp = self
            .client
            .get(&url)
            .query(&[
                ("vs_currency", self.vs_currency.clone()),
                ("from", from.to_string()),
                ("to", to.to_string()),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                asset,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}
