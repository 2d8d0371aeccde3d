use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::AppConfig;
use crate::data::coingecko::{FetchError, MarketChartSource};
use crate::data::{Asset, SampleStore};

use super::response_types::{AssetSync, SyncReport};

/// Fetch the trailing `history_days` window for `asset` ending at `now` and
/// insert it, skipping timestamps already stored. Returns rows inserted.
pub async fn fetch_and_store<S: SampleStore + ?Sized>(
    store: &S,
    source: &dyn MarketChartSource,
    asset: Asset,
    history_days: u32,
    now: DateTime<Utc>,
) -> Result<usize, FetchError> {
    let to = now.timestamp();
    let from = (now - Duration::days(i64::from(history_days))).timestamp();

    let chart = source.market_chart_range(asset, from, to).await?;
    let samples = chart.into_samples()?;
    let inserted = store
        .insert_samples(asset, &samples)
        .map_err(|e| FetchError::Storage(format!("{e:#}")))?;

    tracing::info!(
        %asset,
        received = samples.len(),
        inserted,
        "Stored market chart"
    );
    Ok(inserted)
}

/// Fetch then dedupe every configured asset, one after another.
///
/// Fetch failures are logged and recorded in the report but never stop the
/// loop. Dedupe failures are database failures and propagate.
pub async fn execute<S: SampleStore + ?Sized>(
    store: &S,
    source: &dyn MarketChartSource,
    config: &AppConfig,
) -> Result<SyncReport> {
    let pb = ProgressBar::new(config.assets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("  {prefix:.bold} [{bar:30.cyan/dim}] {pos}/{len} assets  {msg}")
            .expect("valid template")
            .progress_chars("=> "),
    );
    pb.set_prefix("sync");

    let mut report = SyncReport::default();
    for &asset in &config.assets {
        pb.set_message(asset.id());

        let (inserted, error) =
            match fetch_and_store(store, source, asset, config.history_days, Utc::now()).await {
                Ok(n) => (n, None),
                Err(e) => {
                    tracing::warn!(%asset, "Fetch error: {e}");
                    (0, Some(e.to_string()))
                }
            };

        let duplicates_removed = store.dedupe(asset)?;
        if duplicates_removed > 0 {
            tracing::debug!(%asset, duplicates_removed, "Removed duplicate samples");
        }

        report.assets.push(AssetSync {
            asset,
            inserted,
            duplicates_removed,
            error,
        });
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "{} rows, {} failed",
        report.inserted(),
        report.failures()
    ));
    Ok(report)
}
