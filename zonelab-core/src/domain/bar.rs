//! Bar: the fundamental market data unit, and the per-security series of them.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC bar at one timestamp.
///
/// Indices into a series are 0-based positions in chronological order; every
/// detector and the simulator address bars by that index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Bar {
    /// Returns true if any OHLC field is NaN (void bar).
    pub fn is_void(&self) -> bool {
        self.open.is_nan() || self.high.is_nan() || self.low.is_nan() || self.close.is_nan()
    }

    /// Basic OHLC sanity check: high >= low, high >= open, high >= close, etc.
    pub fn is_sane(&self) -> bool {
        if self.is_void() {
            return false;
        }
        self.high >= self.low
            && self.high >= self.open
            && self.high >= self.close
            && self.low <= self.open
            && self.low <= self.close
            && self.open > 0.0
            && self.close > 0.0
    }

    /// Green candle: close above open.
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    /// Red candle: close below open.
    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("series '{symbol}' has no bars")]
    Empty { symbol: String },

    #[error("series '{symbol}': non-finite price at bar {index}")]
    NonFinite { symbol: String, index: usize },

    #[error("series '{symbol}': timestamp at bar {index} does not increase")]
    OutOfOrder { symbol: String, index: usize },
}

/// Bars of one security, in strictly increasing timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BarSeries {
    pub symbol: String,
    pub bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, bars: Vec<Bar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.bars.len().checked_sub(1)
    }

    pub fn timestamp_at(&self, index: usize) -> Option<NaiveDateTime> {
        self.bars.get(index).map(|b| b.timestamp)
    }

    /// Index of the bar stamped exactly `timestamp`. Assumes sorted bars.
    pub fn index_of(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.bars
            .binary_search_by(|b| b.timestamp.cmp(&timestamp))
            .ok()
    }

    /// Reject empty series, non-finite prices and non-increasing timestamps.
    pub fn validate(&self) -> Result<(), BarError> {
        if self.bars.is_empty() {
            return Err(BarError::Empty {
                symbol: self.symbol.clone(),
            });
        }
        for (i, bar) in self.bars.iter().enumerate() {
            let finite = bar.open.is_finite()
                && bar.high.is_finite()
                && bar.low.is_finite()
                && bar.close.is_finite();
            if !finite {
                return Err(BarError::NonFinite {
                    symbol: self.symbol.clone(),
                    index: i,
                });
            }
            if i > 0 && bar.timestamp <= self.bars[i - 1].timestamp {
                return Err(BarError::OutOfOrder {
                    symbol: self.symbol.clone(),
                    index: i,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ts(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn sample_bar() -> Bar {
        Bar {
            timestamp: ts(2),
            open: 100.0,
            high: 105.0,
            low: 98.0,
            close: 103.0,
        }
    }

    #[test]
    fn bar_is_sane() {
        assert!(sample_bar().is_sane());
        assert!(sample_bar().is_bullish());
        assert!(!sample_bar().is_bearish());
    }

    #[test]
    fn void_bar_is_not_sane() {
        let mut bar = sample_bar();
        bar.low = f64::NAN;
        assert!(bar.is_void());
        assert!(!bar.is_sane());
    }

    #[test]
    fn inverted_bar_is_not_sane() {
        let mut bar = sample_bar();
        bar.high = 90.0;
        assert!(!bar.is_sane());
    }

    #[test]
    fn series_lookup_by_index_and_timestamp() {
        let mut second = sample_bar();
        second.timestamp = ts(3);
        let series = BarSeries::new("SPY", vec![sample_bar(), second]);

        assert_eq!(series.last_index(), Some(1));
        assert_eq!(series.timestamp_at(1), Some(ts(3)));
        assert_eq!(series.timestamp_at(2), None);
        assert_eq!(series.index_of(ts(3)), Some(1));
        assert_eq!(series.index_of(ts(9)), None);
        assert!(series.validate().is_ok());
    }

    #[test]
    fn empty_series_fails_validation() {
        let series = BarSeries::new("SPY", vec![]);
        assert_eq!(series.last_index(), None);
        assert_eq!(
            series.validate(),
            Err(BarError::Empty {
                symbol: "SPY".into()
            })
        );
    }

    #[test]
    fn duplicate_timestamp_fails_validation() {
        let series = BarSeries::new("SPY", vec![sample_bar(), sample_bar()]);
        assert_eq!(
            series.validate(),
            Err(BarError::OutOfOrder {
                symbol: "SPY".into(),
                index: 1
            })
        );
    }

    #[test]
    fn infinite_price_fails_validation() {
        let mut bar = sample_bar();
        bar.close = f64::INFINITY;
        let series = BarSeries::new("SPY", vec![bar]);
        assert!(matches!(
            series.validate(),
            Err(BarError::NonFinite { index: 0, .. })
        ));
    }

    #[test]
    fn bar_serde_roundtrip() {
        let bar = sample_bar();
        let json = serde_json::to_string(&bar).unwrap();
        let deser: Bar = serde_json::from_str(&json).unwrap();
        assert_eq!(bar, deser);
    }
}
