//! Zone: a rectangle in (bar index, price) space produced by a detector.

use super::signal::Direction;
use serde::{Deserialize, Serialize};

/// Which detector rule produced a zone, and in which direction it points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    PermanentBullish,
    PermanentBearish,
    TemporaryBullish,
    TemporaryBearish,
    MomentumBullish,
    MomentumBearish,
}

impl ZoneKind {
    pub fn direction(self) -> Direction {
        match self {
            Self::PermanentBullish | Self::TemporaryBullish | Self::MomentumBullish => {
                Direction::Buy
            }
            Self::PermanentBearish | Self::TemporaryBearish | Self::MomentumBearish => {
                Direction::Sell
            }
        }
    }

    pub fn is_temporary(self) -> bool {
        matches!(self, Self::TemporaryBullish | Self::TemporaryBearish)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::PermanentBullish => "permanent_bullish",
            Self::PermanentBearish => "permanent_bearish",
            Self::TemporaryBullish => "temporary_bullish",
            Self::TemporaryBearish => "temporary_bearish",
            Self::MomentumBullish => "momentum_bullish",
            Self::MomentumBearish => "momentum_bearish",
        }
    }
}

/// A bounded order-block zone.
///
/// Invariants: `top >= bottom`, `right >= left`, `alpha` in `[0, 1]`.
/// `created_at` is the bar whose creation rule fired, which for gap zones is
/// one bar after `left`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub left: usize,
    pub right: usize,
    pub top: f64,
    pub bottom: f64,
    pub kind: ZoneKind,
    pub alpha: f64,
    pub broken: bool,
    pub created_at: usize,
    /// Gap-size percentage that produced the zone, when there is one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<f64>,
}

impl Zone {
    /// Build a live zone. Bounds are normalized so `top >= bottom` and
    /// `right >= left` hold regardless of argument order.
    pub fn new(
        kind: ZoneKind,
        left: usize,
        right: usize,
        top: f64,
        bottom: f64,
        created_at: usize,
    ) -> Self {
        Self {
            left: left.min(right),
            right: left.max(right),
            top: top.max(bottom),
            bottom: top.min(bottom),
            kind,
            alpha: 0.0,
            broken: false,
            created_at,
            metric: None,
        }
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_metric(mut self, metric: f64) -> Self {
        self.metric = Some(metric);
        self
    }

    pub fn direction(&self) -> Direction {
        self.kind.direction()
    }

    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Boundary-inclusive containment in both bar index and price.
    pub fn contains(&self, bar_index: usize, price: f64) -> bool {
        self.left <= bar_index
            && bar_index <= self.right
            && self.bottom <= price
            && price <= self.top
    }
}
