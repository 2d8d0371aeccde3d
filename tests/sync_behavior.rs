//! Startup sync over a scripted market data source.

use cryptosight::config::AppConfig;
use cryptosight::data::{Asset, SampleStore};
use cryptosight::tools::sync;

mod common;
use common::{daily_chart, now_millis, temp_store, FakeSource, Reply};

fn config_for(assets: &[Asset]) -> AppConfig {
    AppConfig {
        assets: assets.to_vec(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn failing_asset_does_not_stop_the_loop() {
    let (store, _tmp) = temp_store();
    let end = now_millis();
    let source = FakeSource::new()
        .with(Asset::Bitcoin, Reply::Chart(daily_chart(end, 10, 100.0)))
        .with(Asset::Ethereum, Reply::Status(429))
        .with(Asset::Solana, Reply::Chart(daily_chart(end, 5, 20.0)));
    let config = config_for(&[Asset::Bitcoin, Asset::Ethereum, Asset::Solana]);

    let report = sync::execute(&store, &source, &config).await.unwrap();

    assert_eq!(
        source.called_assets(),
        vec![Asset::Bitcoin, Asset::Ethereum, Asset::Solana]
    );
    assert_eq!(report.assets.len(), 3);
    assert_eq!(report.failures(), 1);
    assert_eq!(report.inserted(), 15);

    let eth = &report.assets[1];
    assert_eq!(eth.asset, Asset::Ethereum);
    assert_eq!(eth.inserted, 0);
    assert!(eth.error.as_deref().unwrap().contains("429"));

    assert_eq!(store.count(Asset::Bitcoin).unwrap(), 10);
    assert_eq!(store.count(Asset::Ethereum).unwrap(), 0);
    assert_eq!(store.count(Asset::Solana).unwrap(), 5);
}

#[tokio::test]
async fn misaligned_series_store_nothing() {
    let (store, _tmp) = temp_store();
    let mut chart = daily_chart(now_millis(), 3, 0.1);
    chart.market_caps.pop();
    let source = FakeSource::new().with(Asset::Dogecoin, Reply::Chart(chart));
    let config = config_for(&[Asset::Dogecoin]);

    let report = sync::execute(&store, &source, &config).await.unwrap();

    assert_eq!(report.failures(), 1);
    let err = report.assets[0].error.as_deref().unwrap();
    assert!(err.contains("series lengths differ"), "unexpected error: {err}");
    assert_eq!(store.count(Asset::Dogecoin).unwrap(), 0);
}

#[tokio::test]
async fn second_sync_inserts_nothing_new() {
    let (store, _tmp) = temp_store();
    let source =
        FakeSource::new().with(Asset::Tether, Reply::Chart(daily_chart(now_millis(), 30, 1.0)));
    let config = config_for(&[Asset::Tether]);

    let first = sync::execute(&store, &source, &config).await.unwrap();
    let second = sync::execute(&store, &source, &config).await.unwrap();

    assert_eq!(first.inserted(), 30);
    assert_eq!(second.inserted(), 0);
    assert_eq!(second.assets[0].duplicates_removed, 0);
    assert_eq!(store.count(Asset::Tether).unwrap(), 30);
}

#[tokio::test]
async fn empty_response_is_not_an_error() {
    let (store, _tmp) = temp_store();
    let source = FakeSource::new();
    let config = config_for(&[Asset::Bitcoin]);

    let report = sync::execute(&store, &source, &config).await.unwrap();

    assert_eq!(report.failures(), 0);
    assert_eq!(report.inserted(), 0);
}
