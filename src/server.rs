use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use garde::Validate;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::data::sqlite::SqliteStore;
use crate::data::Asset;
use crate::tools;
use crate::tools::response_types::{SortColumn, SortOrder, TableRequest, ViewState};

/// Shared handler state: one store and the process configuration.
#[derive(Clone)]
pub struct DashboardServer {
    pub store: Arc<SqliteStore>,
    pub config: Arc<AppConfig>,
}

impl DashboardServer {
    pub fn new(store: Arc<SqliteStore>, config: Arc<AppConfig>) -> Self {
        Self { store, config }
    }

    pub fn router(self) -> Router {
        Router::new()
            .route("/", get(dashboard_page))
            .route("/api/view", get(view_state))
            .route("/export.csv", get(export_csv))
            .route("/health", get(|| async { "ok" }))
            .layer(TraceLayer::new_for_http())
            .with_state(self)
    }

    fn resolve(&self, params: &ViewParams) -> Result<(Asset, u32, TableRequest), ApiError> {
        params
            .validate()
            .map_err(|e| ApiError::BadRequest(format!("Validation error: {e}")))?;
        selectable_duration(params.days, &self.config.durations).map_err(ApiError::BadRequest)?;

        let asset = params
            .asset
            .or_else(|| self.config.assets.first().copied())
            .unwrap_or(Asset::Bitcoin);
        if !self.config.assets.contains(&asset) {
            return Err(ApiError::BadRequest(format!("Asset is not tracked: {asset}")));
        }
        let days = params.days.unwrap_or(self.config.default_days);
        let table = TableRequest {
            page: params.page.unwrap_or(1),
            page_size: self.config.page_size,
            sort: params.sort.unwrap_or_default(),
            order: params.order.unwrap_or_default(),
        };
        Ok((asset, days, table))
    }

    fn view(&self, params: &ViewParams) -> Result<ViewState, ApiError> {
        let (asset, days, table) = self.resolve(params)?;
        tools::view::execute(self.store.as_ref(), asset, days, table).map_err(ApiError::Internal)
    }
}

/// `days` must be one of the configured durations when given.
fn selectable_duration(days: Option<u32>, durations: &[u32]) -> Result<(), String> {
    match days {
        Some(d) if !durations.contains(&d) => Err(format!(
            "Validation error: days must be one of {durations:?}, got {d}"
        )),
        _ => Ok(()),
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ViewParams {
    /// Coin id (e.g. "bitcoin"). Defaults to the first tracked asset.
    #[garde(skip)]
    pub asset: Option<Asset>,
    /// Trailing window in days. Defaults to the configured default.
    #[garde(skip)]
    pub days: Option<u32>,
    /// 1-based table page
    #[garde(inner(range(min = 1)))]
    pub page: Option<usize>,
    #[garde(skip)]
    pub sort: Option<SortColumn>,
    #[garde(skip)]
    pub order: Option<SortOrder>,
}

pub enum ApiError {
    BadRequest(String),
    Internal(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::Internal(e) => {
                tracing::error!("Dashboard request failed: {e:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, format!("Error: {e}")).into_response()
            }
        }
    }
}

async fn dashboard_page(
    State(server): State<DashboardServer>,
    Query(params): Query<ViewParams>,
) -> Result<Html<String>, ApiError> {
    let view = server.view(&params)?;
    Ok(Html(tools::render::render_page(&view, &server.config)))
}

async fn view_state(
    State(server): State<DashboardServer>,
    Query(params): Query<ViewParams>,
) -> Result<Json<ViewState>, ApiError> {
    server.view(&params).map(Json)
}

async fn export_csv(
    State(server): State<DashboardServer>,
    Query(params): Query<ViewParams>,
) -> Result<Response, ApiError> {
    let (asset, days, _) = server.resolve(&params)?;
    let export =
        tools::export::execute(server.store.as_ref(), asset, days).map_err(ApiError::Internal)?;

    let disposition = format!("attachment; filename=\"{}\"", export.filename);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        export.body,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DURATIONS: [u32; 4] = [7, 30, 180, 365];

    #[test]
    fn unknown_duration_is_rejected() {
        let err = selectable_duration(Some(14), &DURATIONS).unwrap_err();
        assert!(err.contains("days must be one of"));
        selectable_duration(Some(30), &DURATIONS).unwrap();
        selectable_duration(None, &DURATIONS).unwrap();
    }

    #[test]
    fn zero_page_fails_validation() {
        let params = ViewParams {
            page: Some(0),
            ..ViewParams::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn omitted_params_are_valid() {
        ViewParams::default().validate().unwrap();
    }
}
