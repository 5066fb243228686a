//! Exit scan: forward search for the first bar that reaches target or stop.
//!
//! When one bar's range covers both levels the OHLC data cannot say which was
//! touched first; the tie-break policy decides.

use crate::config::ConfigError;
use crate::domain::{Bar, Outcome, Side};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which level wins when a single bar reaches both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Optimistic: the target fills.
    #[default]
    TargetFirst,
    /// Adverse: the stop fills.
    StopFirst,
}

impl FromStr for TieBreak {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "target_first" => Ok(Self::TargetFirst),
            "stop_first" => Ok(Self::StopFirst),
            _ => Err(ConfigError::UnknownVariant {
                field: "simulation.tie_break",
                value: s.to_string(),
                expected: "target_first, stop_first",
            }),
        }
    }
}

/// Target and stop prices for one entry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitLevels {
    pub target: f64,
    pub stop: f64,
}

impl ExitLevels {
    /// Long: target above, stop below. Short: mirrored.
    pub fn for_entry(side: Side, entry_price: f64, target_pct: f64, stop_pct: f64) -> Self {
        match side {
            Side::Long => Self {
                target: entry_price * (1.0 + target_pct),
                stop: entry_price * (1.0 - stop_pct),
            },
            Side::Short => Self {
                target: entry_price * (1.0 - target_pct),
                stop: entry_price * (1.0 + stop_pct),
            },
        }
    }

    fn reached(&self, side: Side, bar: &Bar) -> (bool, bool) {
        match side {
            Side::Long => (bar.high >= self.target, bar.low <= self.stop),
            Side::Short => (bar.low <= self.target, bar.high >= self.stop),
        }
    }
}

/// First exit found after the entry bar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitHit {
    pub bar_index: usize,
    pub price: f64,
    pub outcome: Outcome,
}

/// Scan bars strictly after `entry_bar`. Exits fill at exactly the level.
pub fn scan_exit(
    bars: &[Bar],
    entry_bar: usize,
    side: Side,
    levels: ExitLevels,
    tie_break: TieBreak,
) -> Option<ExitHit> {
    let target = |bar_index| ExitHit {
        bar_index,
        price: levels.target,
        outcome: Outcome::Win,
    };
    let stop = |bar_index| ExitHit {
        bar_index,
        price: levels.stop,
        outcome: Outcome::Loss,
    };

    bars.iter()
        .enumerate()
        .skip(entry_bar + 1)
        .find_map(|(i, bar)| match (levels.reached(side, bar), tie_break) {
            ((true, true), TieBreak::TargetFirst) => Some(target(i)),
            ((true, true), TieBreak::StopFirst) => Some(stop(i)),
            ((true, false), _) => Some(target(i)),
            ((false, true), _) => Some(stop(i)),
            ((false, false), _) => None,
        })
}
