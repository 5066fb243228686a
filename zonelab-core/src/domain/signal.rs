//! Touch signals: raw detector events and their enriched, strength-scored form.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Trade direction of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Buy,
    Sell,
}

impl Direction {
    pub fn is_buy(self) -> bool {
        matches!(self, Self::Buy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Buy => "buy",
            Self::Sell => "sell",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized direction tag '{0}'")]
pub struct DirectionParseError(pub String);

/// Loose tag parsing for external signal sources.
///
/// Case-insensitive substring match: anything mentioning `bull` or `buy` is a
/// buy, `bear` or `sell` a sell. Buy keywords are checked first.
impl FromStr for Direction {
    type Err = DirectionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.to_ascii_lowercase();
        if tag.contains("bull") || tag.contains("buy") {
            Ok(Self::Buy)
        } else if tag.contains("bear") || tag.contains("sell") {
            Ok(Self::Sell)
        } else {
            Err(DirectionParseError(s.to_string()))
        }
    }
}

/// Which detector emitted a touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalSource {
    Gap,
    Momentum,
}

impl SignalSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gap => "gap",
            Self::Momentum => "momentum",
        }
    }
}

/// Raw touch event from a detector: price re-entered a live zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchSignal {
    pub bar_index: usize,
    pub price: f64,
    pub direction: Direction,
    pub source: SignalSource,
}

impl TouchSignal {
    pub fn new(bar_index: usize, price: f64, direction: Direction, source: SignalSource) -> Self {
        Self {
            bar_index,
            price,
            direction,
            source,
        }
    }
}

/// A touch signal scored against both detectors' zone sets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSignal {
    // ── Identification ──
    pub symbol: String,
    pub timestamp: Option<NaiveDateTime>,
    pub bar_index: usize,
    pub price: f64,
    pub direction: Direction,
    pub source: SignalSource,

    // ── Zone overlap ──
    pub inside_gap_zone: bool,
    pub inside_momentum_zone: bool,
    /// Alpha of the first containing gap zone.
    pub zone_alpha: Option<f64>,

    /// 0..=4; zero means no zone agreed with the touch.
    pub strength: u8,
}

impl EnrichedSignal {
    pub fn is_buy(&self) -> bool {
        self.direction.is_buy()
    }
}
