pub mod coingecko;
pub mod frame;
pub mod query;
pub mod sqlite;

use anyhow::Result;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Storage format for sample timestamps (always UTC).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A tracked cryptocurrency. Each variant owns one table in the local store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Asset {
    Bitcoin,
    Ethereum,
    Dogecoin,
    Solana,
    Tether,
}

impl Asset {
    pub const ALL: [Asset; 5] = [
        Asset::Bitcoin,
        Asset::Ethereum,
        Asset::Dogecoin,
        Asset::Solana,
        Asset::Tether,
    ];

    /// CoinGecko coin id, also used in URLs and CSV filenames.
    pub fn id(self) -> &'static str {
        match self {
            Asset::Bitcoin => "bitcoin",
            Asset::Ethereum => "ethereum",
            Asset::Dogecoin => "dogecoin",
            Asset::Solana => "solana",
            Asset::Tether => "tether",
        }
    }

    /// Table holding this asset's samples.
    pub fn table(self) -> &'static str {
        match self {
            Asset::Bitcoin => "bitcoin_data",
            Asset::Ethereum => "ethereum_data",
            Asset::Dogecoin => "dogecoin_data",
            Asset::Solana => "solana_data",
            Asset::Tether => "tether_data",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Asset::Bitcoin => "Bitcoin",
            Asset::Ethereum => "Ethereum",
            Asset::Dogecoin => "Dogecoin",
            Asset::Solana => "Solana",
            Asset::Tether => "Tether",
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Asset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Asset::ALL
            .into_iter()
            .find(|a| a.id().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| anyhow::anyhow!("Unknown asset: {s}"))
    }
}

/// One timestamped price / market-cap / volume observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub timestamp: String,
    pub price: Option<f64>,
    pub market_cap: Option<f64>,
    pub volume: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: NaiveDateTime, price: f64, market_cap: f64, volume: f64) -> Self {
        Self {
            timestamp: timestamp.format(TIMESTAMP_FORMAT).to_string(),
            price: Some(price),
            market_cap: Some(market_cap),
            volume: Some(volume),
        }
    }
}

/// Per-asset persistence of samples.
pub trait SampleStore: Send + Sync {
    /// Create every asset table if missing. Safe to call repeatedly.
    fn ensure_schema(&self) -> Result<()>;

    /// Insert samples, skipping any whose timestamp is already stored.
    /// Returns the number of rows actually inserted.
    fn insert_samples(&self, asset: Asset, samples: &[Sample]) -> Result<usize>;

    /// Keep only the highest-id row per timestamp. Returns rows removed.
    fn dedupe(&self, asset: Asset) -> Result<usize>;

    /// Samples with `timestamp >= since`, ascending by timestamp.
    fn query_since(&self, asset: Asset, since: NaiveDateTime) -> Result<Vec<Sample>>;

    fn count(&self, asset: Asset) -> Result<usize>;
}
