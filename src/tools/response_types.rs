use serde::{Deserialize, Serialize};

use crate::data::{Asset, Sample};
use crate::engine::forecast::LinearFit;

/// Outcome of the startup fetch + dedupe pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncReport {
    pub assets: Vec<AssetSync>,
}

impl SyncReport {
    pub fn failures(&self) -> usize {
        self.assets.iter().filter(|a| a.error.is_some()).count()
    }

    pub fn inserted(&self) -> usize {
        self.assets.iter().map(|a| a.inserted).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetSync {
    pub asset: Asset,
    pub inserted: usize,
    pub duplicates_removed: usize,
    /// Swallowed fetch error, if any.
    pub error: Option<String>,
}

/// Everything the dashboard shows for one (asset, days) selection.
#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub asset: Asset,
    pub days: u32,
    /// `None` when the window holds no data.
    pub chart: Option<PriceChart>,
    pub summary: Option<MarketSummary>,
    pub summary_markdown: String,
    pub table: TablePage,
    pub csv_filename: String,
}

impl ViewState {
    pub fn is_empty(&self) -> bool {
        self.table.total_rows == 0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PriceChart {
    pub title: String,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<ChartPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub timestamp: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    pub min_price: f64,
    pub max_price: f64,
    /// Mean of the regression line over row indices `n+1..=n+days`, where the
    /// window's rows are indexed `1..=n` in time order.
    pub predicted_avg: f64,
    pub fit: LinearFit,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortColumn {
    #[default]
    Timestamp,
    Price,
    MarketCap,
    Volume,
}

impl SortColumn {
    pub const ALL: [SortColumn; 4] = [
        SortColumn::Timestamp,
        SortColumn::Price,
        SortColumn::MarketCap,
        SortColumn::Volume,
    ];

    pub fn column(self) -> &'static str {
        match self {
            SortColumn::Timestamp => "timestamp",
            SortColumn::Price => "price",
            SortColumn::MarketCap => "market_cap",
            SortColumn::Volume => "volume",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SortColumn::Timestamp => "Timestamp",
            SortColumn::Price => "Price (USD)",
            SortColumn::MarketCap => "Market Cap",
            SortColumn::Volume => "Volume",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn flip(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Which slice of the table to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableRequest {
    /// 1-based.
    pub page: usize,
    pub page_size: usize,
    pub sort: SortColumn,
    pub order: SortOrder,
}

impl TableRequest {
    pub fn first_page(page_size: usize) -> Self {
        Self {
            page: 1,
            page_size,
            sort: SortColumn::default(),
            order: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TablePage {
    pub rows: Vec<Sample>,
    /// 1-based, clamped to `page_count`.
    pub page: usize,
    /// At least 1, even for an empty table.
    pub page_count: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub sort: SortColumn,
    pub order: SortOrder,
}
