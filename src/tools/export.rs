use anyhow::{Context, Result};
use polars::prelude::*;

use crate::data::query::query_range;
use crate::data::{Asset, SampleStore};

/// A downloadable CSV of one dashboard window.
#[derive(Debug, Clone)]
pub struct CsvExport {
    pub filename: String,
    pub body: String,
}

pub fn csv_filename(asset: Asset, days: u32) -> String {
    format!("{}_{days}_days_data.csv", asset.id())
}

/// Serialize a sample frame with a header row, no index column.
pub fn to_csv(frame: &DataFrame) -> Result<String> {
    let mut df = frame.clone();
    let mut buf: Vec<u8> = Vec::new();
    CsvWriter::new(&mut buf)
        .include_header(true)
        .finish(&mut df)
        .context("Failed to write CSV")?;
    String::from_utf8(buf).context("CSV output was not valid UTF-8")
}

pub fn execute<S: SampleStore + ?Sized>(store: &S, asset: Asset, days: u32) -> Result<CsvExport> {
    let frame = query_range(store, asset, days)?;
    let body = to_csv(&frame)?;
    tracing::debug!(%asset, days, rows = frame.height(), "Exported CSV");
    Ok(CsvExport {
        filename: csv_filename(asset, days),
        body,
    })
}
