//! CSV loading into validated bar series.
//!
//! Headers are matched case-insensitively after trimming, so both the
//! exchange-style layout (`Date, Open Price, High Price, Low Price,
//! Close Price`) and the short layout (`Date, Open, High, Low, Close`) load.
//! Thousands separators are stripped from prices. Rows are sorted by
//! timestamp and duplicate timestamps keep their first row.

use std::io::Read;
use std::path::Path;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Weekday};
use thiserror::Error;
use tracing::{debug, warn};

use zonelab_core::domain::{Bar, BarSeries};

/// Errors from loading a price file.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: malformed CSV: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },
    #[error("{path}: missing required column '{column}'")]
    MissingColumn { path: String, column: &'static str },
    #[error("{path}: row {row}: cannot parse {column} value '{value}'")]
    BadNumber {
        path: String,
        row: usize,
        column: &'static str,
        value: String,
    },
    #[error("{path}: row {row}: cannot parse date '{value}'")]
    BadDate {
        path: String,
        row: usize,
        value: String,
    },
    #[error("{path}: no data rows")]
    Empty { path: String },
}

/// Accepted header spellings per field, long form first.
const DATE_COLUMNS: &[&str] = &["date"];
const OPEN_COLUMNS: &[&str] = &["open price", "open"];
const HIGH_COLUMNS: &[&str] = &["high price", "high"];
const LOW_COLUMNS: &[&str] = &["low price", "low"];
const CLOSE_COLUMNS: &[&str] = &["close price", "close"];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%d-%m-%Y", "%Y/%m/%d"];
const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Column positions resolved from the header row.
#[derive(Debug, Clone, Copy)]
struct ColumnMap {
    date: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
}

impl ColumnMap {
    fn resolve(headers: &csv::StringRecord, path: &str) -> Result<Self, LoadError> {
        let lower: Vec<String> = headers.iter().map(|h| h.trim().to_lowercase()).collect();
        let find = |names: &[&str], column: &'static str| {
            names
                .iter()
                .find_map(|name| lower.iter().position(|h| h == name))
                .ok_or_else(|| LoadError::MissingColumn {
                    path: path.to_string(),
                    column,
                })
        };
        Ok(Self {
            date: find(DATE_COLUMNS, "Date")?,
            open: find(OPEN_COLUMNS, "Open")?,
            high: find(HIGH_COLUMNS, "High")?,
            low: find(LOW_COLUMNS, "Low")?,
            close: find(CLOSE_COLUMNS, "Close")?,
        })
    }
}

/// Security name from a file name.
///
/// `DD-MM-YYYY-TO-DD-MM-YYYY-SECURITY-...` yields the eighth dash-separated
/// field; anything else yields the file stem.
pub fn security_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    match stem.split('-').nth(7) {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => stem,
    }
}

/// Load one CSV file; the symbol comes from [`security_from_path`].
pub fn load_csv(path: &Path) -> Result<BarSeries, LoadError> {
    let label = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: label.clone(),
        source,
    })?;
    read_bars(file, security_from_path(path), &label)
}

/// Parse bars from any reader. `label` names the source in errors.
pub fn read_bars<R: Read>(
    reader: R,
    symbol: impl Into<String>,
    label: &str,
) -> Result<BarSeries, LoadError> {
    let csv_err = |source| LoadError::Csv {
        path: label.to_string(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);
    let headers = rdr.headers().map_err(csv_err)?.clone();
    let columns = ColumnMap::resolve(&headers, label)?;

    let mut bars = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record.map_err(csv_err)?;
        // 1-based, counting the header line
        let row = i + 2;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let field = |idx: usize| record.get(idx).unwrap_or("");
        let number = |idx: usize, column: &'static str| {
            let raw = field(idx);
            parse_number(raw).ok_or_else(|| LoadError::BadNumber {
                path: label.to_string(),
                row,
                column,
                value: raw.to_string(),
            })
        };

        let raw_date = field(columns.date);
        let timestamp = parse_timestamp(raw_date).ok_or_else(|| LoadError::BadDate {
            path: label.to_string(),
            row,
            value: raw_date.to_string(),
        })?;
        bars.push(Bar {
            timestamp,
            open: number(columns.open, "Open")?,
            high: number(columns.high, "High")?,
            low: number(columns.low, "Low")?,
            close: number(columns.close, "Close")?,
        });
    }

    if bars.is_empty() {
        return Err(LoadError::Empty {
            path: label.to_string(),
        });
    }

    let loaded = bars.len();
    let bars = sort_and_dedup(bars);
    if bars.len() < loaded {
        debug!(
            source = label,
            dropped = loaded - bars.len(),
            "dropped rows with duplicate timestamps"
        );
    }
    // Inconsistent OHLC rows are kept: the detectors tolerate them.
    let insane = bars.iter().filter(|b| !b.is_sane()).count();
    if insane > 0 {
        warn!(source = label, rows = insane, "rows with inconsistent OHLC values");
    }
    Ok(BarSeries::new(symbol, bars))
}

/// Stable sort by timestamp, keeping the first bar of each timestamp.
pub fn sort_and_dedup(mut bars: Vec<Bar>) -> Vec<Bar> {
    bars.sort_by_key(|b| b.timestamp);
    bars.dedup_by_key(|b| b.timestamp);
    bars
}

/// Parse a price, tolerating thousands separators.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    cleaned.trim().parse::<f64>().ok()
}

/// Parse a date or date-time in any of the accepted layouts.
///
/// Date-only values land at midnight. RFC 3339 values are converted to UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Some(dt) = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Generate a synthetic daily series for development and benchmarks.
///
/// A seeded random walk from 100.0 over weekdays starting 2020-01-01. The
/// same seed always yields the same bars.
pub fn synthetic_series(symbol: &str, n: usize, seed: u64) -> BarSeries {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    let mut rng = StdRng::seed_from_u64(seed);
    let mut day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();
    let mut close = 100.0_f64;
    let mut bars = Vec::with_capacity(n);

    while bars.len() < n {
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            day += chrono::Duration::days(1);
            continue;
        }
        let open = close * (1.0 + rng.gen_range(-0.01..0.01));
        close = (open * (1.0 + rng.gen_range(-0.03..0.03))).max(1.0);
        let high = open.max(close) * (1.0 + rng.gen_range(0.0..0.015));
        let low = open.min(close) * (1.0 - rng.gen_range(0.0..0.015));
        bars.push(Bar {
            timestamp: day.and_hms_opt(0, 0, 0).unwrap_or_default(),
            open,
            high,
            low,
            close,
        });
        day += chrono::Duration::days(1);
    }

    BarSeries::new(symbol, bars)
}
