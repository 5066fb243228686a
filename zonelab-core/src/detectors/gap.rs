//! Gap ("FVG") detector.
//!
//! A bullish gap at bar i is a three-bar imbalance where bar i's low clears
//! bar i-2's high by more than `filter_gap` percent; bearish is the inverse.
//! Each gap creates a permanent zone one ATR deep below (bullish) or above
//! (bearish) the untouched extreme of bar i-2, plus an optional short-lived
//! imbalance box covering the gap itself.
//!
//! Per bar, after creation: bullish break/touch pass, bullish nested pruning,
//! bearish break/touch pass, bearish nested pruning, capacity eviction.

use super::{Detection, ZoneDetector};
use crate::config::{ensure_at_least, ensure_finite, ConfigError};
use crate::domain::{Bar, Direction, SignalSource, TouchSignal, Zone, ZoneKind};
use crate::indicators::{rolling_max, Atr, Indicator};
use serde::{Deserialize, Serialize};

const TEMPORARY_ALPHA: f64 = 0.12;
const TEMPORARY_SPAN: usize = 5;
/// Right-edge extension applied to surviving permanent zones at the end.
const FINAL_EXTENSION: usize = 15;

const ALPHA_BASE: f64 = 0.15;
const ALPHA_SCALE: f64 = 0.5;
const ALPHA_FLOOR: f64 = 0.06;
const ALPHA_CEIL: f64 = 0.7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Minimum gap size, in percent of price.
    pub filter_gap: f64,
    /// Record temporary imbalance boxes.
    pub show_imbalance: bool,
    /// Per-direction cap on live permanent zones.
    pub box_amount: usize,
    /// Keep broken zones alive instead of dropping them.
    pub show_broken: bool,
    /// Emit touch signals.
    pub show_signal: bool,
    /// Only the last `lookback` bars may create gaps.
    pub lookback: usize,
    pub atr_period: usize,
    /// Window of the rolling max that normalizes gap size into alpha.
    pub max_window: usize,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            filter_gap: 0.5,
            show_imbalance: true,
            box_amount: 6,
            show_broken: false,
            show_signal: false,
            lookback: 2000,
            atr_period: 200,
            max_window: 2000,
        }
    }
}

impl GapConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_finite("gap.filter_gap", self.filter_gap)?;
        ensure_at_least("gap.box_amount", 1, self.box_amount)?;
        ensure_at_least("gap.atr_period", 1, self.atr_period)?;
        ensure_at_least("gap.max_window", 1, self.max_window)?;
        Ok(())
    }
}

/// `(low[i] - high[i-2]) / low[i] * 100`, NaN for the first two bars.
pub fn bullish_gap_metric(bars: &[Bar]) -> Vec<f64> {
    let mut out = vec![f64::NAN; bars.len()];
    for i in 2..bars.len() {
        let low = bars[i].low;
        out[i] = (low - bars[i - 2].high) / low * 100.0;
    }
    out
}

/// `(low[i-2] - high[i]) / low[i-2] * 100`, NaN for the first two bars.
pub fn bearish_gap_metric(bars: &[Bar]) -> Vec<f64> {
    let mut out = vec![f64::NAN; bars.len()];
    for i in 2..bars.len() {
        let base = bars[i - 2].low;
        out[i] = (base - bars[i].high) / base * 100.0;
    }
    out
}

/// Zone opacity from gap size relative to the recent maximum gap size.
///
/// An undefined or zero maximum divides by 1.
pub fn gap_alpha(metric: f64, recent_max: f64) -> f64 {
    let divisor = if recent_max.is_nan() || recent_max == 0.0 {
        1.0
    } else {
        recent_max
    };
    (ALPHA_BASE + ALPHA_SCALE * (metric / divisor).max(0.0)).clamp(ALPHA_FLOOR, ALPHA_CEIL)
}

fn is_bullish_gap(bars: &[Bar], i: usize, metric: f64, filter: f64) -> bool {
    let (a, b, c) = (&bars[i - 2], &bars[i - 1], &bars[i]);
    a.high < c.low && a.high < b.high && a.low < c.low && metric > filter
}

fn is_bearish_gap(bars: &[Bar], i: usize, metric: f64, filter: f64) -> bool {
    let (a, b, c) = (&bars[i - 2], &bars[i - 1], &bars[i]);
    a.low > c.high && a.low > b.low && a.high > c.high && metric > filter
}

/// Drop every zone that has another zone's top strictly inside its band.
///
/// Flags are computed against one snapshot and removed together, so removal
/// order never changes which zones survive.
pub fn prune_nested(zones: &mut Vec<Zone>) {
    let tops: Vec<f64> = zones.iter().map(|z| z.top).collect();
    let nested: Vec<bool> = zones
        .iter()
        .enumerate()
        .map(|(i, z)| {
            tops.iter()
                .enumerate()
                .any(|(j, &t)| j != i && z.bottom < t && t < z.top)
        })
        .collect();
    if !nested.contains(&true) {
        return;
    }
    *zones = std::mem::take(zones)
        .into_iter()
        .zip(nested)
        .filter_map(|(z, drop)| (!drop).then_some(z))
        .collect();
}

/// While `len >= cap`, evict the oldest zone.
pub fn evict_oldest(zones: &mut Vec<Zone>, cap: usize) {
    if zones.len() >= cap {
        let excess = zones.len() + 1 - cap;
        zones.drain(..excess);
    }
}

#[derive(Debug, Clone, Default)]
pub struct GapDetector {
    config: GapConfig,
}

impl GapDetector {
    pub fn new(config: GapConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GapConfig {
        &self.config
    }

    pub fn run(&self, bars: &[Bar]) -> Detection {
        let n = bars.len();
        let mut out = Detection::default();
        let Some(last) = n.checked_sub(1) else {
            return out;
        };

        let cfg = &self.config;
        let atr = Atr::new(cfg.atr_period).compute(bars);
        let up = bullish_gap_metric(bars);
        let dn = bearish_gap_metric(bars);
        let up_max = rolling_max(&up, cfg.max_window);
        let dn_max = rolling_max(&dn, cfg.max_window);

        for i in 0..n {
            let scannable = i >= 2 && last - i < cfg.lookback;
            let bull_gap = scannable && is_bullish_gap(bars, i, up[i], cfg.filter_gap);
            let bear_gap = scannable && is_bearish_gap(bars, i, dn[i], cfg.filter_gap);

            if bull_gap {
                if cfg.show_imbalance {
                    out.temporary
                        .push(imbalance_zone(ZoneKind::TemporaryBullish, bars, i, last, up[i]));
                }
                if !atr[i].is_nan() {
                    let top = bars[i - 2].high;
                    let zone =
                        Zone::new(ZoneKind::PermanentBullish, i - 1, last, top, top - atr[i], i)
                            .with_alpha(gap_alpha(up[i], up_max[i]))
                            .with_metric(up[i]);
                    out.bullish.push(zone);
                }
            }
            if bear_gap {
                if cfg.show_imbalance {
                    out.temporary
                        .push(imbalance_zone(ZoneKind::TemporaryBearish, bars, i, last, dn[i]));
                }
                if !atr[i].is_nan() {
                    let bottom = bars[i - 2].low;
                    let top = bottom + atr[i];
                    let zone = Zone::new(ZoneKind::PermanentBearish, i - 1, last, top, bottom, i)
                        .with_alpha(gap_alpha(dn[i], dn_max[i]))
                        .with_metric(dn[i]);
                    out.bearish.push(zone);
                }
            }

            self.update_bullish(&mut out.bullish, bars, i, bull_gap, &mut out.signals);
            prune_nested(&mut out.bullish);
            self.update_bearish(&mut out.bearish, bars, i, bear_gap, &mut out.signals);
            prune_nested(&mut out.bearish);

            evict_oldest(&mut out.bullish, cfg.box_amount);
            evict_oldest(&mut out.bearish, cfg.box_amount);
        }

        for zone in out.bullish.iter_mut().chain(out.bearish.iter_mut()) {
            zone.right = last + FINAL_EXTENSION;
        }
        for zone in &mut out.temporary {
            zone.right = zone.right.min(last);
        }

        tracing::trace!(
            bars = n,
            bullish = out.bullish.len(),
            bearish = out.bearish.len(),
            signals = out.signals.len(),
            "gap pass complete"
        );
        out
    }

    /// Break, then touch. A bar that itself fired a bullish gap never touches.
    fn update_bullish(
        &self,
        zones: &mut Vec<Zone>,
        bars: &[Bar],
        i: usize,
        gap_here: bool,
        signals: &mut Vec<TouchSignal>,
    ) {
        let bar = &bars[i];
        for zone in zones.iter_mut() {
            if bar.high < zone.bottom {
                zone.broken = true;
            }
            if self.config.show_signal && i >= 1 && !gap_here {
                let prev_low = bars[i - 1].low;
                if bar.low > zone.top && zone.top >= prev_low {
                    signals.push(TouchSignal::new(i - 1, prev_low, Direction::Buy, SignalSource::Gap));
                }
            }
        }
        if !self.config.show_broken {
            zones.retain(|z| !z.broken);
        }
    }

    fn update_bearish(
        &self,
        zones: &mut Vec<Zone>,
        bars: &[Bar],
        i: usize,
        gap_here: bool,
        signals: &mut Vec<TouchSignal>,
    ) {
        let bar = &bars[i];
        for zone in zones.iter_mut() {
            if bar.low > zone.top {
                zone.broken = true;
            }
            if self.config.show_signal && i >= 1 && !gap_here {
                let prev_high = bars[i - 1].high;
                if bar.high < zone.bottom && zone.bottom <= prev_high {
                    signals.push(TouchSignal::new(i - 1, prev_high, Direction::Sell, SignalSource::Gap));
                }
            }
        }
        if !self.config.show_broken {
            zones.retain(|z| !z.broken);
        }
    }
}

/// The raw gap between bar i-2 and bar i, alive for a few bars.
fn imbalance_zone(kind: ZoneKind, bars: &[Bar], i: usize, last: usize, metric: f64) -> Zone {
    let (edge_now, edge_then) = match kind.direction() {
        Direction::Buy => (bars[i].low, bars[i - 2].high),
        Direction::Sell => (bars[i].high, bars[i - 2].low),
    };
    let right = (i + TEMPORARY_SPAN).min(last);
    Zone::new(kind, i - 1, right, edge_now.max(edge_then), edge_now.min(edge_then), i)
        .with_alpha(TEMPORARY_ALPHA)
        .with_metric(metric)
}

impl ZoneDetector for GapDetector {
    fn name(&self) -> &str {
        "gap"
    }

    fn run(&self, bars: &[Bar]) -> Detection {
        GapDetector::run(self, bars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_ohlc_bars};

    /// Bullish gap at bar 2, dip into the zone at bar 3, bounce at bar 4.
    fn bullish_setup() -> Vec<Bar> {
        make_ohlc_bars(&[
            (100.0, 101.0, 99.0, 100.5),
            (101.0, 106.0, 100.5, 105.5),
            (105.0, 108.0, 104.0, 107.0),
            (106.0, 107.0, 100.0, 101.0),
            (102.0, 104.0, 102.0, 103.5),
        ])
    }

    fn signalling() -> GapDetector {
        GapDetector::new(GapConfig {
            show_signal: true,
            ..GapConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn detects_bullish_gap_zone() {
        let bars = bullish_setup();
        let out = GapDetector::default().run(&bars);

        assert_eq!(out.bullish.len(), 1);
        let zone = &out.bullish[0];
        assert_eq!(zone.kind, ZoneKind::PermanentBullish);
        assert_eq!(zone.left, 1);
        assert_eq!(zone.created_at, 2);
        assert_approx(zone.top, 101.0, 1e-9);
        // ATR at bar 2 = mean(2.0, 5.5, 4.0)
        assert_approx(zone.bottom, 101.0 - 11.5 / 3.0, 1e-9);
        // Only gap so far: normalized size 1.0 => 0.15 + 0.5
        assert_approx(zone.alpha, 0.65, 1e-9);
        assert_eq!(zone.right, 4 + FINAL_EXTENSION);
        assert!(out.bearish.is_empty());
    }

    #[test]
    fn records_clipped_imbalance_box() {
        let out = GapDetector::default().run(&bullish_setup());
        assert_eq!(out.temporary.len(), 1);
        let tmp = &out.temporary[0];
        assert_eq!(tmp.kind, ZoneKind::TemporaryBullish);
        assert_eq!((tmp.left, tmp.right), (1, 4));
        assert_approx(tmp.top, 104.0, 1e-9);
        assert_approx(tmp.bottom, 101.0, 1e-9);
        assert_approx(tmp.alpha, TEMPORARY_ALPHA, 1e-12);
    }

    #[test]
    fn imbalance_can_be_disabled() {
        let det = GapDetector::new(GapConfig {
            show_imbalance: false,
            ..GapConfig::default()
        })
        .unwrap();
        let out = det.run(&bullish_setup());
        assert!(out.temporary.is_empty());
        assert_eq!(out.bullish.len(), 1);
    }

    #[test]
    fn emits_touch_on_retest() {
        let out = signalling().run(&bullish_setup());
        assert_eq!(
            out.signals,
            vec![TouchSignal::new(3, 100.0, Direction::Buy, SignalSource::Gap)]
        );
    }

    #[test]
    fn signals_off_by_default() {
        let out = GapDetector::default().run(&bullish_setup());
        assert!(out.signals.is_empty());
    }

    #[test]
    fn filter_suppresses_small_gaps() {
        let det = GapDetector::new(GapConfig {
            filter_gap: 5.0,
            ..GapConfig::default()
        })
        .unwrap();
        let out = det.run(&bullish_setup());
        assert!(out.bullish.is_empty());
        assert!(out.temporary.is_empty());
    }

    #[test]
    fn lookback_limits_creation() {
        let det = GapDetector::new(GapConfig {
            lookback: 2,
            ..GapConfig::default()
        })
        .unwrap();
        // Gap bar is index 2 of 5; only bars 3 and 4 are inside the window.
        assert!(det.run(&bullish_setup()).bullish.is_empty());
    }

    #[test]
    fn break_removes_zone_unless_retained() {
        let mut data = vec![
            (100.0, 101.0, 99.0, 100.5),
            (101.0, 106.0, 100.5, 105.5),
            (105.0, 108.0, 104.0, 107.0),
        ];
        data.push((90.0, 92.0, 85.0, 88.0)); // high 92 < bottom
        let bars = make_ohlc_bars(&data);

        assert!(GapDetector::default().run(&bars).bullish.is_empty());

        let keep = GapDetector::new(GapConfig {
            show_broken: true,
            ..GapConfig::default()
        })
        .unwrap();
        let out = keep.run(&bars);
        assert_eq!(out.bullish.len(), 1);
        assert!(out.bullish[0].broken);
    }

    #[test]
    fn detects_bearish_gap_zone() {
        let bars = make_ohlc_bars(&[
            (100.0, 101.0, 99.0, 99.5),
            (99.0, 99.5, 94.0, 94.5),
            (95.0, 96.0, 92.0, 93.0),
        ]);
        let out = GapDetector::default().run(&bars);
        assert!(out.bullish.is_empty());
        assert_eq!(out.bearish.len(), 1);
        let zone = &out.bearish[0];
        assert_eq!(zone.kind, ZoneKind::PermanentBearish);
        assert_approx(zone.bottom, 99.0, 1e-9);
        assert!(zone.top > zone.bottom);
        assert_approx(zone.metric.unwrap(), 300.0 / 99.0, 1e-9);
    }

    #[test]
    fn short_and_empty_series_yield_nothing() {
        let det = signalling();
        assert_eq!(det.run(&[]), Detection::default());
        let two = make_ohlc_bars(&[(1.0, 2.0, 0.5, 1.5), (1.5, 5.0, 1.4, 4.0)]);
        assert_eq!(det.run(&two), Detection::default());
    }

    #[test]
    fn prune_nested_uses_one_snapshot() {
        let mut zones = vec![
            Zone::new(ZoneKind::PermanentBullish, 0, 10, 110.0, 100.0, 1),
            Zone::new(ZoneKind::PermanentBullish, 2, 10, 105.0, 95.0, 3),
            Zone::new(ZoneKind::PermanentBullish, 4, 10, 130.0, 120.0, 5),
        ];
        // Zone 1's top (105) sits inside zone 0's band; zone 0's top (110)
        // is outside zone 1's band. Only zone 0 goes.
        prune_nested(&mut zones);
        let tops: Vec<f64> = zones.iter().map(|z| z.top).collect();
        assert_eq!(tops, vec![105.0, 130.0]);
    }

    #[test]
    fn prune_nested_ignores_shared_edges() {
        let mut zones = vec![
            Zone::new(ZoneKind::PermanentBearish, 0, 10, 110.0, 100.0, 1),
            Zone::new(ZoneKind::PermanentBearish, 2, 10, 110.0, 90.0, 3),
        ];
        prune_nested(&mut zones);
        assert_eq!(zones.len(), 2);
    }

    #[test]
    fn eviction_keeps_room_for_one_more() {
        let mut zones: Vec<Zone> = (0..6)
            .map(|i| Zone::new(ZoneKind::PermanentBullish, i, 10, 1.0, 0.0, i))
            .collect();
        evict_oldest(&mut zones, 6);
        assert_eq!(zones.len(), 5);
        assert_eq!(zones[0].left, 1);

        evict_oldest(&mut zones, 6);
        assert_eq!(zones.len(), 5);
    }

    #[test]
    fn alpha_normalization() {
        assert_approx(gap_alpha(1.0, 2.0), 0.4, 1e-12);
        assert_approx(gap_alpha(3.0, f64::NAN), ALPHA_CEIL, 1e-12);
        assert_approx(gap_alpha(0.2, 0.0), 0.25, 1e-12);
        assert_approx(gap_alpha(-1.0, 2.0), ALPHA_BASE, 1e-12);
    }

    #[test]
    fn validate_rejects_zero_box_amount() {
        let err = GapDetector::new(GapConfig {
            box_amount: 0,
            ..GapConfig::default()
        })
        .unwrap_err();
        assert!(matches!(err, ConfigError::TooSmall { field: "gap.box_amount", .. }));
    }
}
