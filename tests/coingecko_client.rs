//! `CoinGeckoClient` against a local stub of the market chart endpoint.

use std::sync::{Arc, Mutex};

use axum::extract::{Path, RawQuery, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use cryptosight::config::AppConfig;
use cryptosight::data::coingecko::{CoinGeckoClient, FetchError, MarketChartSource};
use cryptosight::data::Asset;

type Seen = Arc<Mutex<Vec<(String, String)>>>;

async fn market_chart(
    State(seen): State<Seen>,
    Path(id): Path<String>,
    RawQuery(query): RawQuery,
) -> Response {
    seen.lock()
        .unwrap()
        .push((id.clone(), query.unwrap_or_default()));
    match id.as_str() {
        "tether" => (StatusCode::TOO_MANY_REQUESTS, "rate limited").into_response(),
        "dogecoin" => "not json".into_response(),
        _ => (
            [("content-type", "application/json")],
            r#"{"prices":[[1704067200000,42280.5]],
                "market_caps":[[1704067200000,827600000000.0]],
                "total_volumes":[[1704067200000,14000000000.0]]}"#,
        )
            .into_response(),
    }
}

/// Serve the stub on an ephemeral port and return a client pointed at it.
async fn stub_client() -> (CoinGeckoClient, Seen) {
    let seen: Seen = Arc::default();
    let app = Router::new()
        .route("/api/v3/coins/{id}/market_chart/range", get(market_chart))
        .with_state(Arc::clone(&seen));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

    let config = AppConfig {
        api_base_url: format!("http://{addr}/api/v3/"),
        request_timeout_secs: 5,
        ..AppConfig::default()
    };
    (CoinGeckoClient::new(&config).unwrap(), seen)
}

#[tokio::test]
async fn sends_currency_and_window_and_decodes_body() {
    let (client, seen) = stub_client().await;

    let chart = client
        .market_chart_range(Asset::Bitcoin, 10, 20)
        .await
        .unwrap();
    let samples = chart.into_samples().unwrap();

    assert_eq!(samples.len(), 1);
    assert_eq!(samples[0].timestamp, "2024-01-01 00:00:00");
    assert_eq!(samples[0].price, Some(42280.5));
    assert_eq!(samples[0].volume, Some(14_000_000_000.0));

    let seen = seen.lock().unwrap().clone();
    assert_eq!(
        seen,
        vec![("bitcoin".to_string(), "vs_currency=usd&from=10&to=20".to_string())]
    );
}

#[tokio::test]
async fn non_success_status_maps_to_status_error() {
    let (client, _seen) = stub_client().await;

    let err = client
        .market_chart_range(Asset::Tether, 10, 20)
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            FetchError::Status {
                asset: Asset::Tether,
                status: 429
            }
        ),
        "unexpected error: {err}"
    );
}

#[tokio::test]
async fn invalid_body_is_a_decode_error() {
    let (client, _seen) = stub_client().await;

    let err = client
        .market_chart_range(Asset::Dogecoin, 10, 20)
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)), "unexpected error: {err}");
}
