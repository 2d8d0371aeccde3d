//! Conversions between stored samples and the tabular `DataFrame` form used by
//! the query layer, the dashboard table, and CSV export.

use polars::prelude::*;

use super::Sample;

pub const TIMESTAMP_COL: &str = "timestamp";
pub const PRICE_COL: &str = "price";
pub const MARKET_CAP_COL: &str = "market_cap";
pub const VOLUME_COL: &str = "volume";

/// Column order of every sample frame.
pub const SAMPLE_COLUMNS: [&str; 4] = [TIMESTAMP_COL, PRICE_COL, MARKET_CAP_COL, VOLUME_COL];

/// Build a frame with the four sample columns. An empty slice yields a
/// zero-height frame that still carries the full schema.
pub fn samples_frame(samples: &[Sample]) -> PolarsResult<DataFrame> {
    let timestamps: Vec<&str> = samples.iter().map(|s| s.timestamp.as_str()).collect();
    let prices: Vec<Option<f64>> = samples.iter().map(|s| s.price).collect();
    let market_caps: Vec<Option<f64>> = samples.iter().map(|s| s.market_cap).collect();
    let volumes: Vec<Option<f64>> = samples.iter().map(|s| s.volume).collect();

    df! {
        TIMESTAMP_COL => timestamps,
        PRICE_COL => prices,
        MARKET_CAP_COL => market_caps,
        VOLUME_COL => volumes,
    }
}

/// Read a sample frame back into rows.
pub fn frame_rows(df: &DataFrame) -> PolarsResult<Vec<Sample>> {
    let timestamps = df.column(TIMESTAMP_COL)?.str()?;
    let prices = df.column(PRICE_COL)?.f64()?;
    let market_caps = df.column(MARKET_CAP_COL)?.f64()?;
    let volumes = df.column(VOLUME_COL)?.f64()?;

    Ok((0..df.height())
        .map(|i| Sample {
            timestamp: timestamps.get(i).unwrap_or_default().to_string(),
            price: prices.get(i),
            market_cap: market_caps.get(i),
            volume: volumes.get(i),
        })
        .collect())
}

/// Non-null prices paired with their 1-based row index.
pub fn indexed_prices(df: &DataFrame) -> PolarsResult<Vec<(usize, f64)>> {
    Ok(df
        .column(PRICE_COL)?
        .f64()?
        .into_iter()
        .enumerate()
        .filter_map(|(i, p)| p.map(|p| (i + 1, p)))
        .collect())
}

/// `(min, max)` over non-null prices, `None` when there are none.
pub fn price_bounds(df: &DataFrame) -> PolarsResult<Option<(f64, f64)>> {
    let prices = df.column(PRICE_COL)?.f64()?;
    Ok(prices.min().zip(prices.max()))
}
