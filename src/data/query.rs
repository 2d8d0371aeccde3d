use anyhow::Result;
use chrono::{Duration, NaiveDateTime, Utc};
use polars::prelude::DataFrame;

use super::frame::samples_frame;
use super::{Asset, SampleStore};

/// Samples for `asset` from the trailing `days` window ending now (UTC),
/// ascending by timestamp.
pub fn query_range<S: SampleStore + ?Sized>(store: &S, asset: Asset, days: u32) -> Result<DataFrame> {
    query_range_at(store, asset, days, Utc::now().naive_utc())
}

/// [`query_range`] against an explicit `now`.
pub fn query_range_at<S: SampleStore + ?Sized>(
    store: &S,
    asset: Asset,
    days: u32,
    now: NaiveDateTime,
) -> Result<DataFrame> {
    let since = now - Duration::days(i64::from(days));
    let samples = store.query_since(asset, since)?;
    tracing::debug!(%asset, days, %since, rows = samples.len(), "Queried window");
    Ok(samples_frame(&samples)?)
}
