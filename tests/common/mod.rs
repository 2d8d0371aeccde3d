#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tempfile::TempDir;

use cryptosight::data::coingecko::{FetchError, MarketChart, MarketChartSource};
use cryptosight::data::sqlite::SqliteStore;
use cryptosight::data::{Asset, Sample, SampleStore};

/// A schema-initialized store in a fresh temporary directory.
pub fn temp_store() -> (SqliteStore, TempDir) {
    let tmp = TempDir::new().unwrap();
    let store = SqliteStore::open(&tmp.path().join("crypto_data.db")).unwrap();
    store.ensure_schema().unwrap();
    (store, tmp)
}

pub fn hours_ago(now: NaiveDateTime, hours: i64) -> NaiveDateTime {
    now - Duration::hours(hours)
}

pub fn days_ago(now: NaiveDateTime, days: i64) -> NaiveDateTime {
    now - Duration::days(days)
}

pub fn sample_at(ts: NaiveDateTime, price: f64) -> Sample {
    Sample::new(ts, price, price * 1_000_000.0, price * 10.0)
}

/// Daily chart of `n` points ending at `end_millis`, price rising by 1 per day.
pub fn daily_chart(end_millis: i64, n: usize, base_price: f64) -> MarketChart {
    let day_ms = 86_400_000_i64;
    let mut chart = MarketChart::default();
    for i in 0..n {
        let ts = (end_millis - day_ms * (n - 1 - i) as i64) as f64;
        let price = base_price + i as f64;
        chart.prices.push((ts, Some(price)));
        chart.market_caps.push((ts, Some(price * 1_000_000.0)));
        chart.total_volumes.push((ts, Some(price * 10.0)));
    }
    chart
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[derive(Clone)]
pub enum Reply {
    Chart(MarketChart),
    Status(u16),
}

/// Scripted `MarketChartSource`; assets without a reply get an empty chart.
#[derive(Default)]
pub struct FakeSource {
    replies: HashMap<Asset, Reply>,
    pub calls: Mutex<Vec<(Asset, i64, i64)>>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, asset: Asset, reply: Reply) -> Self {
        self.replies.insert(asset, reply);
        self
    }

    pub fn called_assets(&self) -> Vec<Asset> {
        self.calls.lock().unwrap().iter().map(|c| c.0).collect()
    }
}

#[async_trait]
impl MarketChartSource for FakeSource {
    async fn market_chart_range(
        &self,
        asset: Asset,
        from: i64,
        to: i64,
    ) -> Result<MarketChart, FetchError> {
        self.calls.lock().unwrap().push((asset, from, to));
        match self.replies.get(&asset) {
            Some(Reply::Chart(chart)) => Ok(chart.clone()),
            Some(Reply::Status(status)) => Err(FetchError::Status {
                asset,
                status: *status,
            }),
            None => Ok(MarketChart::default()),
        }
    }
}
