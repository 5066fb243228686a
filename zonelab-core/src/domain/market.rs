//! MarketData: the OHLC series the simulator prices positions against.

use super::bar::BarSeries;
use std::collections::BTreeMap;

/// Series keyed by security symbol.
#[derive(Debug, Clone, Default)]
pub struct MarketData {
    series: BTreeMap<String, BarSeries>,
}

impl MarketData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a series, replacing any previous one for the same symbol.
    pub fn insert(&mut self, series: BarSeries) -> Option<BarSeries> {
        self.series.insert(series.symbol.clone(), series)
    }

    pub fn get(&self, symbol: &str) -> Option<&BarSeries> {
        self.series.get(symbol)
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

impl FromIterator<BarSeries> for MarketData {
    fn from_iter<I: IntoIterator<Item = BarSeries>>(iter: I) -> Self {
        let mut market = Self::new();
        for series in iter {
            market.insert(series);
        }
        market
    }
}

impl From<BarSeries> for MarketData {
    fn from(series: BarSeries) -> Self {
        std::iter::once(series).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_replaces_same_symbol() {
        let mut market = MarketData::new();
        assert!(market.insert(BarSeries::new("AAA", vec![])).is_none());
        assert!(market.insert(BarSeries::new("AAA", vec![])).is_some());
        assert_eq!(market.len(), 1);
    }

    #[test]
    fn collects_by_symbol() {
        let market: MarketData = vec![
            BarSeries::new("ZZZ", vec![]),
            BarSeries::new("AAA", vec![]),
        ]
        .into_iter()
        .collect();
        assert_eq!(market.len(), 2);
        assert!(market.get("AAA").is_some());
        assert!(market.get("BBB").is_none());
    }
}
