//! Gold price table: CSV loading and the per-path load cache.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{info, warn};

use crate::error::AppError;
use crate::metrics;

/// Header name of the timestamp column in the gold CSV
pub const TIMESTAMP_COLUMN: &str = "date_cet";

/// One hourly row: timestamp plus one optional price per market, in €/MWh
#[derive(Debug, Clone)]
pub struct PriceRow {
    pub ts: NaiveDateTime,
    pub prices: Vec<Option<f64>>,
}

/// The full gold table, read-only after loading.
///
/// Rows are sorted ascending by timestamp and timestamps are unique; rows
/// whose timestamp failed to parse have been dropped. Market order follows
/// the CSV header.
#[derive(Debug, Clone)]
pub struct PriceTable {
    markets: Vec<String>,
    rows: Vec<PriceRow>,
}

impl PriceTable {
    /// Market column names in header order
    pub fn markets(&self) -> &[String] {
        &self.markets
    }

    /// Index of a market column, if present
    pub fn market_index(&self, market: &str) -> Option<usize> {
        self.markets.iter().position(|m| m == market)
    }

    pub fn rows(&self) -> &[PriceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct calendar dates present in the table, ascending
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.rows.iter().map(|r| r.ts.date()).collect();
        dates.dedup();
        dates
    }

    /// Most recent calendar date in the table
    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.rows.last().map(|r| r.ts.date())
    }

    /// The market preselected for the UI: `preferred` when the table has it,
    /// otherwise the first column.
    pub fn default_market<'a>(&'a self, preferred: &'a str) -> Option<&'a str> {
        if self.market_index(preferred).is_some() {
            return Some(preferred);
        }
        self.markets.first().map(|m| m.as_str())
    }
}

/// Load the gold table from a CSV file.
///
/// Fails with `DataNotFound` before touching the parser when the path does
/// not exist. Rows with unparseable timestamps are dropped; price cells that
/// are empty or not numeric become missing values. The result is sorted by
/// timestamp with duplicate timestamps collapsed to their first occurrence.
pub fn load_table(path: &Path) -> Result<PriceTable, AppError> {
    if !path.exists() {
        return Err(AppError::DataNotFound(path.to_path_buf()));
    }

    let mut reader = csv::Reader::from_path(path)?;

    let headers = reader.headers()?.clone();
    let ts_idx = headers
        .iter()
        .position(|h| h == TIMESTAMP_COLUMN)
        .ok_or_else(|| {
            AppError::DataFormat(format!("missing '{}' column", TIMESTAMP_COLUMN))
        })?;

    let markets: Vec<String> = headers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != ts_idx)
        .map(|(_, h)| h.to_string())
        .collect();

    let mut rows = Vec::new();
    let mut dropped = 0usize;

    for record in reader.records() {
        let record = record?;

        let ts = match record.get(ts_idx).and_then(parse_timestamp) {
            Some(ts) => ts,
            None => {
                dropped += 1;
                continue;
            }
        };

        let prices = (0..headers.len())
            .filter(|idx| *idx != ts_idx)
            .map(|idx| parse_price(record.get(idx)))
            .collect();

        rows.push(PriceRow { ts, prices });
    }

    rows.sort_by_key(|r| r.ts);
    rows.dedup_by_key(|r| r.ts);

    if dropped > 0 {
        warn!("Dropped {} rows with unparseable timestamps", dropped);
    }
    info!(
        "Loaded price table: {} rows, {} markets",
        rows.len(),
        markets.len()
    );

    Ok(PriceTable { markets, rows })
}

/// Parse one timestamp cell.
///
/// The upstream pipeline writes naive local timestamps; older exports carry
/// an explicit offset, so RFC 3339 is accepted as a fallback.
fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(ts);
        }
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.naive_local());
    }

    None
}

fn parse_price(cell: Option<&str>) -> Option<f64> {
    let raw = cell?.trim();
    if raw.is_empty() {
        return None;
    }
    // Non-finite cells (NaN markers and the like) count as missing
    raw.parse::<f64>().ok().filter(|price| price.is_finite())
}

struct CachedTable {
    modified: SystemTime,
    table: Arc<PriceTable>,
}

/// Memoizes `load_table` results per canonical file path.
///
/// An entry is reused while the file's modification time is unchanged and
/// reloaded otherwise. The cached table is shared read-only behind `Arc`.
#[derive(Default)]
pub struct TableCache {
    entries: DashMap<PathBuf, CachedTable>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(&self, path: &Path) -> Result<Arc<PriceTable>, AppError> {
        if !path.exists() {
            return Err(AppError::DataNotFound(path.to_path_buf()));
        }

        let canonical = path.canonicalize()?;
        let modified = std::fs::metadata(&canonical)?.modified()?;

        if let Some(entry) = self.entries.get(&canonical) {
            if entry.modified == modified {
                metrics::record_table_load("cached");
                return Ok(entry.table.clone());
            }
        }

        let table = Arc::new(load_table(&canonical)?);
        let replaced = self
            .entries
            .insert(
                canonical,
                CachedTable {
                    modified,
                    table: table.clone(),
                },
            )
            .is_some();

        metrics::record_table_load(if replaced { "reloaded" } else { "loaded" });
        Ok(table)
    }
}
