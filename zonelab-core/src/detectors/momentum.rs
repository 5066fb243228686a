//! Momentum-reversal ("Sonar") detector.
//!
//! Watches the 4-bar percent change of the open. When it crosses below
//! `-sens` a bearish zone is anchored to a recent candle; crossing above
//! `+sens` anchors a bullish one. Zones live until price mitigates them and
//! emit a touch every bar price trades into them.

use super::{Detection, ZoneDetector};
use crate::config::{ensure_non_negative, ConfigError};
use crate::domain::{Bar, Direction, SignalSource, TouchSignal, Zone, ZoneKind};
use crate::indicators::{Indicator, OpenRoc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ROC_PERIOD: usize = 4;
/// A trigger within this many bars of the newest live zone is ignored.
const MIN_CREATION_SPACING: usize = 5;
const ANCHOR_MIN_OFFSET: usize = 4;
const ANCHOR_MAX_OFFSET: usize = 15;

/// Which price invalidates a live zone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MitigationMode {
    /// Previous bar's close, for both directions.
    #[default]
    Close,
    /// Current bar's low (bullish) or high (bearish).
    Wick,
}

impl FromStr for MitigationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "close" => Ok(Self::Close),
            "wick" => Ok(Self::Wick),
            _ => Err(ConfigError::UnknownVariant {
                field: "momentum.mitigation",
                value: s.to_string(),
                expected: "close, wick",
            }),
        }
    }
}

impl fmt::Display for MitigationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Close => "close",
            Self::Wick => "wick",
        })
    }
}

/// Candle color a new zone anchors to, relative to the swing direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnchorCandle {
    /// Bearish zones anchor to the last green candle, bullish to the last red.
    #[default]
    Opposite,
    /// Bearish zones anchor to the last red candle, bullish to the last green.
    Same,
}

impl FromStr for AnchorCandle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "opposite" => Ok(Self::Opposite),
            "same" => Ok(Self::Same),
            _ => Err(ConfigError::UnknownVariant {
                field: "momentum.anchor",
                value: s.to_string(),
                expected: "opposite, same",
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumConfig {
    /// Crossing threshold; the detector compares against `sensitivity_percent / 100`.
    pub sensitivity_percent: f64,
    pub mitigation: MitigationMode,
    pub buy_alert: bool,
    pub sell_alert: bool,
    pub anchor: AnchorCandle,
}

impl Default for MomentumConfig {
    fn default() -> Self {
        Self {
            sensitivity_percent: 28.0,
            mitigation: MitigationMode::Close,
            buy_alert: true,
            sell_alert: true,
            anchor: AnchorCandle::Opposite,
        }
    }
}

impl MomentumConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_non_negative("momentum.sensitivity_percent", self.sensitivity_percent)
    }

    fn threshold(&self) -> f64 {
        self.sensitivity_percent / 100.0
    }
}

/// Live state threaded through the per-bar step.
#[derive(Debug, Default)]
struct MomentumScan {
    bullish: Vec<Zone>,
    bearish: Vec<Zone>,
    signals: Vec<TouchSignal>,
}

impl MomentumScan {
    fn last_created(&self) -> Option<usize> {
        self.bullish
            .iter()
            .chain(&self.bearish)
            .map(|z| z.created_at)
            .max()
    }

    fn may_create_at(&self, i: usize) -> bool {
        self.last_created()
            .map_or(true, |last| i.saturating_sub(last) > MIN_CREATION_SPACING)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MomentumDetector {
    config: MomentumConfig,
}

impl MomentumDetector {
    pub fn new(config: MomentumConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &MomentumConfig {
        &self.config
    }

    pub fn run(&self, bars: &[Bar]) -> Detection {
        let Some(last) = bars.len().checked_sub(1) else {
            return Detection::default();
        };

        let roc = OpenRoc::new(ROC_PERIOD).compute(bars);
        let mut scan = MomentumScan::default();
        for i in 0..bars.len() {
            self.step(&mut scan, bars, &roc, i, last);
        }

        tracing::trace!(
            bars = bars.len(),
            bullish = scan.bullish.len(),
            bearish = scan.bearish.len(),
            signals = scan.signals.len(),
            "momentum pass complete"
        );
        Detection {
            bullish: scan.bullish,
            bearish: scan.bearish,
            temporary: Vec::new(),
            signals: scan.signals,
        }
    }

    fn step(&self, scan: &mut MomentumScan, bars: &[Bar], roc: &[f64], i: usize, last: usize) {
        if i >= 1 {
            let sens = self.config.threshold();
            let (prev, cur) = (roc[i - 1], roc[i]);

            // Bearish first: a bearish creation suppresses a same-bar bullish one.
            if prev >= -sens && cur < -sens && scan.may_create_at(i) {
                if let Some(a) = self.find_anchor(bars, i, Direction::Sell) {
                    let anchor = &bars[a];
                    scan.bearish.push(Zone::new(
                        ZoneKind::MomentumBearish,
                        a,
                        last,
                        anchor.high,
                        anchor.low,
                        i,
                    ));
                }
            }
            if prev <= sens && cur > sens && scan.may_create_at(i) {
                if let Some(a) = self.find_anchor(bars, i, Direction::Buy) {
                    let anchor = &bars[a];
                    scan.bullish.push(Zone::new(
                        ZoneKind::MomentumBullish,
                        a,
                        last,
                        anchor.high,
                        anchor.low,
                        i,
                    ));
                }
            }
        }

        self.mitigate(scan, bars, i);
    }

    /// Most recent candle of the anchor color, 4 to 15 bars back.
    fn find_anchor(&self, bars: &[Bar], i: usize, direction: Direction) -> Option<usize> {
        let wants_green = matches!(
            (direction, self.config.anchor),
            (Direction::Sell, AnchorCandle::Opposite) | (Direction::Buy, AnchorCandle::Same)
        );
        (ANCHOR_MIN_OFFSET..=ANCHOR_MAX_OFFSET)
            .map_while(|offset| i.checked_sub(offset))
            .find(|&j| {
                if wants_green {
                    bars[j].is_bullish()
                } else {
                    bars[j].is_bearish()
                }
            })
    }

    /// Drop mitigated zones, then emit touches from the survivors.
    fn mitigate(&self, scan: &mut MomentumScan, bars: &[Bar], i: usize) {
        let bar = &bars[i];
        let (bull_ref, bear_ref) = match self.config.mitigation {
            MitigationMode::Close => {
                let prev_close = i.checked_sub(1).map(|p| bars[p].close);
                (prev_close, prev_close)
            }
            MitigationMode::Wick => (Some(bar.low), Some(bar.high)),
        };

        if let Some(r) = bear_ref {
            scan.bearish.retain(|z| r <= z.top);
        }
        if let Some(r) = bull_ref {
            scan.bullish.retain(|z| r >= z.bottom);
        }

        if self.config.sell_alert {
            for zone in &scan.bearish {
                if bar.high > zone.bottom {
                    scan.signals.push(TouchSignal::new(
                        i,
                        bar.high,
                        Direction::Sell,
                        SignalSource::Momentum,
                    ));
                }
            }
        }
        if self.config.buy_alert {
            for zone in &scan.bullish {
                if bar.low < zone.top {
                    scan.signals.push(TouchSignal::new(
                        i,
                        bar.low,
                        Direction::Buy,
                        SignalSource::Momentum,
                    ));
                }
            }
        }
    }
}

impl ZoneDetector for MomentumDetector {
    fn name(&self) -> &str {
        "momentum"
    }

    fn run(&self, bars: &[Bar]) -> Detection {
        MomentumDetector::run(self, bars)
    }
}
