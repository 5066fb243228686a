//! Rate of Change of the open price.
//!
//! ROC[t] = (open[t] - open[t-period]) / open[t-period] * 100
//! Lookback: period.

use super::Indicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct OpenRoc {
    period: usize,
    name: String,
}

impl OpenRoc {
    /// A zero period is treated as 1.
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            period,
            name: format!("open_roc_{period}"),
        }
    }
}

impl Indicator for OpenRoc {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, bars: &[Bar]) -> Vec<f64> {
        let n = bars.len();
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let prev = bars[i - self.period].open;
            let curr = bars[i].open;
            if !(prev.is_nan() || curr.is_nan() || prev == 0.0) {
                result[i] = (curr - prev) / prev * 100.0;
            }
        }

        result
    }
}
