use anyhow::Result;
use polars::prelude::*;

use crate::data::frame::{frame_rows, indexed_prices, price_bounds};
use crate::data::query::query_range;
use crate::data::{Asset, SampleStore};
use crate::engine::forecast::LinearFit;

use super::export::csv_filename;
use super::response_types::{
    ChartPoint, MarketSummary, PriceChart, SortColumn, SortOrder, TablePage, TableRequest,
    ViewState,
};

pub const NO_DATA: &str = "No data available.";
const NO_PRICES: &str = "No price data available for this window.";

/// Query the window for (`asset`, `days`) and compute its view state.
pub fn execute<S: SampleStore + ?Sized>(
    store: &S,
    asset: Asset,
    days: u32,
    table: TableRequest,
) -> Result<ViewState> {
    let frame = query_range(store, asset, days)?;
    build_view_state(asset, days, &frame, table)
}

/// Pure view computation over an already-queried, time-ascending sample frame.
pub fn build_view_state(
    asset: Asset,
    days: u32,
    frame: &DataFrame,
    table: TableRequest,
) -> Result<ViewState> {
    let table = table_page(frame, table)?;
    let csv_filename = csv_filename(asset, days);

    if frame.height() == 0 {
        return Ok(ViewState {
            asset,
            days,
            chart: None,
            summary: None,
            summary_markdown: NO_DATA.to_string(),
            table,
            csv_filename,
        });
    }

    let points: Vec<ChartPoint> = frame_rows(frame)?
        .into_iter()
        .filter_map(|s| {
            s.price.map(|price| ChartPoint {
                timestamp: s.timestamp,
                price,
            })
        })
        .collect();

    let chart = PriceChart {
        title: format!("{} Price Trend ({days} Days)", asset.display_name()),
        x_label: "Date",
        y_label: "Price (USD)",
        points,
    };

    let summary = summarize(frame, days)?;
    let summary_markdown = summary
        .as_ref()
        .map_or_else(|| NO_PRICES.to_string(), |s| format_summary(s, days));

    Ok(ViewState {
        asset,
        days,
        chart: Some(chart),
        summary,
        summary_markdown,
        table,
        csv_filename,
    })
}

/// Min/max price and the regression forecast. `None` when no price is present.
pub fn summarize(frame: &DataFrame, days: u32) -> Result<Option<MarketSummary>> {
    let Some((min_price, max_price)) = price_bounds(frame)? else {
        return Ok(None);
    };
    let prices = indexed_prices(frame)?;
    let Some(fit) = LinearFit::fit_indexed(&prices, frame.height()) else {
        return Ok(None);
    };

    Ok(Some(MarketSummary {
        min_price,
        max_price,
        predicted_avg: fit.forecast_mean(days),
        fit,
    }))
}

pub fn format_summary(summary: &MarketSummary, days: u32) -> String {
    format!(
        "## 📊 Market Summary\n\n\
         **Min Price:** ${:.2}  \n\
         **Max Price:** ${:.2}  \n\
         **Predicted Avg (Next {days} Days):** ${:.2}",
        summary.min_price, summary.max_price, summary.predicted_avg
    )
}

fn table_page(frame: &DataFrame, req: TableRequest) -> Result<TablePage> {
    let total_rows = frame.height();
    let page_size = req.page_size.max(1);
    let page_count = total_rows.div_ceil(page_size).max(1);
    let page = req.page.clamp(1, page_count);

    // Frames arrive in ascending time order already.
    let sorted = if req.sort == SortColumn::Timestamp && req.order == SortOrder::Asc {
        frame.clone()
    } else {
        frame
            .clone()
            .lazy()
            .sort(
                [req.sort.column()],
                SortMultipleOptions::default()
                    .with_order_descending(req.order == SortOrder::Desc)
                    .with_nulls_last(true),
            )
            .collect()?
    };

    let offset = (page - 1) * page_size;
    let rows = frame_rows(&sorted.slice(offset as i64, page_size))?;

    Ok(TablePage {
        rows,
        page,
        page_count,
        page_size,
        total_rows,
        sort: req.sort,
        order: req.order,
    })
}
