//! Average True Range (ATR).
//!
//! The gap detector sizes its zones with a plain trailing mean of true range
//! (not Wilder smoothing). With `min_periods = 1` the value is defined from
//! bar 0 onward.

use super::rolling::rolling_mean;
use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    /// A zero period is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

/// Per-bar true range. The first bar has no previous close, so its range is
/// just `high - low`. Any NaN input makes that bar's value NaN.
pub fn true_range(bars: &[Bar]) -> Vec<f64> {
    let mut prev_close: Option<f64> = None;
    bars.iter()
        .map(|bar| {
            let (h, l) = (bar.high, bar.low);
            let tr = match prev_close {
                _ if h.is_nan() || l.is_nan() => f64::NAN,
                Some(pc) if pc.is_nan() => f64::NAN,
                Some(pc) => (h - l).max((h - pc).abs()).max((l - pc).abs()),
                None => h - l,
            };
            prev_close = Some(bar.close);
            tr
        })
        .collect()
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        rolling_mean(&true_range(bars), self.period)
    }
}
