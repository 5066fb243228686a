//! Indicators used by the zone detectors.
//!
//! Indicators are pure functions: bar history in, numeric series out. They are
//! precomputed once before a detector's forward pass and read by bar index.
//! No value at bar t may depend on bars after t.

pub mod atr;
pub mod roc;
pub mod rolling;

pub use atr::{true_range, Atr};
pub use roc::OpenRoc;
pub use rolling::{rolling_max, rolling_mean};

use crate::domain::Bar;

/// Trait for indicators.
///
/// Indicators take a full bar series and produce a numeric output series of
/// the same length. Undefined values are `f64::NAN`.
pub trait Indicator: Send + Sync {
    /// Human-readable name (e.g., "atr_200", "open_roc_4").
    fn name(&self) -> &str;

    /// Number of leading bars whose output is undefined.
    fn lookback(&self) -> usize;

    /// Compute the indicator for the entire bar series.
    fn compute(&self, bars: &[Bar]) -> Vec<f64>;
}

/// Build OHLC bars with consecutive daily timestamps, for tests.
#[cfg(test)]
pub fn make_ohlc_bars(data: &[(f64, f64, f64, f64)]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    data.iter()
        .enumerate()
        .map(|(i, &(open, high, low, close))| Bar {
            timestamp: base + chrono::Duration::days(i as i64),
            open,
            high,
            low,
            close,
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
