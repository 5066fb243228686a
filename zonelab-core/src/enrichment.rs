//! Signal enrichment: score raw touches by which zones agree with them.

use crate::config::{ensure_finite, ConfigError};
use crate::detectors::Detection;
use crate::domain::{BarSeries, Direction, EnrichedSignal, TouchSignal, Zone};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    /// Gap-zone alpha at or above which a zone counts as "dark".
    pub dark_alpha_threshold: f64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            dark_alpha_threshold: 0.4,
        }
    }
}

impl EnrichmentConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("enrichment.dark_alpha_threshold", self.dark_alpha_threshold)
    }
}

/// Strength from the containment pattern.
///
/// | gap | momentum | dark | strength |
/// |-----|----------|------|----------|
/// | yes | no       | no   | 1        |
/// | yes | no       | yes  | 2        |
/// | yes | yes      | no   | 3        |
/// | yes | yes      | yes  | 4        |
/// | no  | yes      | -    | 1        |
/// | no  | no       | -    | 0        |
pub fn strength_for(inside_gap: bool, inside_momentum: bool, dark: bool) -> u8 {
    match (inside_gap, inside_momentum, dark) {
        (true, false, false) => 1,
        (true, false, true) => 2,
        (true, true, false) => 3,
        (true, true, true) => 4,
        (false, true, _) => 1,
        (false, false, _) => 0,
    }
}

/// Key that identifies a touch for de-duplication.
///
/// Prices are compared at six decimal places.
fn dedup_key(signal: &TouchSignal) -> (usize, i64, Direction) {
    (
        signal.bar_index,
        (signal.price * 1e6).round() as i64,
        signal.direction,
    )
}

fn first_containing<'a>(zones: &'a [Zone], signal: &TouchSignal) -> Option<&'a Zone> {
    zones
        .iter()
        .find(|z| z.contains(signal.bar_index, signal.price))
}

#[derive(Debug, Clone, Default)]
pub struct SignalEnricher {
    config: EnrichmentConfig,
}

impl SignalEnricher {
    pub fn new(config: EnrichmentConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Score and de-duplicate raw touches, keeping first occurrences in order.
    ///
    /// Buy touches are tested against bullish zones, sell touches against
    /// bearish ones. Temporary imbalance boxes never count.
    pub fn enrich(
        &self,
        raw: &[TouchSignal],
        gap: &Detection,
        momentum: &Detection,
        series: &BarSeries,
    ) -> Vec<EnrichedSignal> {
        let mut seen = HashSet::new();
        let mut out = Vec::with_capacity(raw.len());

        for signal in raw {
            if !signal.price.is_finite() {
                tracing::debug!(
                    symbol = %series.symbol,
                    bar = signal.bar_index,
                    "skipping touch with non-finite price"
                );
                continue;
            }
            if !seen.insert(dedup_key(signal)) {
                continue;
            }

            let gap_zone = first_containing(gap.zones_for(signal.direction), signal);
            let inside_momentum =
                first_containing(momentum.zones_for(signal.direction), signal).is_some();
            let zone_alpha = gap_zone.map(|z| z.alpha);
            let dark = zone_alpha.is_some_and(|a| a >= self.config.dark_alpha_threshold);

            out.push(EnrichedSignal {
                symbol: series.symbol.clone(),
                timestamp: series.timestamp_at(signal.bar_index),
                bar_index: signal.bar_index,
                price: signal.price,
                direction: signal.direction,
                source: signal.source,
                inside_gap_zone: gap_zone.is_some(),
                inside_momentum_zone: inside_momentum,
                zone_alpha,
                strength: strength_for(gap_zone.is_some(), inside_momentum, dark),
            });
        }

        out
    }
}
