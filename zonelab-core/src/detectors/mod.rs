//! Zone detectors.
//!
//! Each detector makes one deterministic forward pass over a bar series,
//! maintaining its live zones bar by bar and emitting touch signals when price
//! re-enters one. Detectors are independent of each other and of the order
//! they run in.

pub mod gap;
pub mod momentum;

pub use gap::{GapConfig, GapDetector};
pub use momentum::{AnchorCandle, MitigationMode, MomentumConfig, MomentumDetector};

use crate::domain::{Bar, Direction, TouchSignal, Zone};
use serde::{Deserialize, Serialize};

/// Output of one detector pass.
///
/// `bullish`/`bearish` hold the zones still alive at the end of the series.
/// `temporary` is only populated by the gap detector's imbalance boxes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub bullish: Vec<Zone>,
    pub bearish: Vec<Zone>,
    #[serde(default)]
    pub temporary: Vec<Zone>,
    pub signals: Vec<TouchSignal>,
}

impl Detection {
    /// Live zones pointing in `direction`.
    pub fn zones_for(&self, direction: Direction) -> &[Zone] {
        match direction {
            Direction::Buy => &self.bullish,
            Direction::Sell => &self.bearish,
        }
    }

    pub fn zone_count(&self) -> usize {
        self.bullish.len() + self.bearish.len()
    }
}

/// Shared detector capability.
///
/// Detectors see bars only. They never see positions, cash or other
/// detectors' output.
pub trait ZoneDetector: Send + Sync {
    /// Short identifier (e.g., "gap", "momentum").
    fn name(&self) -> &str;

    /// Run the full forward pass. Empty or short series yield empty output.
    fn run(&self, bars: &[Bar]) -> Detection;
}
