//! Position: an open holding with its precomputed exit, if one was found.

use super::signal::Direction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Long,
    Short,
}

impl From<Direction> for Side {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Buy => Self::Long,
            Direction::Sell => Self::Short,
        }
    }
}

impl Side {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Long => "long",
            Self::Short => "short",
        }
    }
}

/// How a trade ended. `Closed` marks a forced close at the end of the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Closed,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Closed => "closed",
        }
    }
}

/// Exit resolved at entry time (or by a forced close), settled later.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitPlan {
    pub bar_index: usize,
    pub timestamp: NaiveDateTime,
    pub price: f64,
    pub pnl: f64,
    /// Cash returned on settlement. Always zero for shorts.
    pub proceeds: f64,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    // ── Identification ──
    pub security: String,
    pub side: Side,
    pub strength: u8,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_timestamp: Option<NaiveDateTime>,
    pub entry_price: f64,
    pub shares: u64,
    pub capital_allocated: f64,
    pub cash_before: f64,

    // ── Levels ──
    pub target: f64,
    pub stop_loss: f64,

    // ── Exit ──
    pub exit: Option<ExitPlan>,
}

impl Position {
    pub fn is_long(&self) -> bool {
        self.side == Side::Long
    }

    pub fn has_exit(&self) -> bool {
        self.exit.is_some()
    }

    /// Realized P&L for closing every share at `exit_price`.
    pub fn pnl_at(&self, exit_price: f64) -> f64 {
        let shares = self.shares as f64;
        match self.side {
            Side::Long => shares * (exit_price - self.entry_price),
            Side::Short => shares * (self.entry_price - exit_price),
        }
    }

    /// Cash returned when closing at `exit_price`.
    ///
    /// Shorts return nothing: their entry never debited cash, so their
    /// result only shows up in the trade ledger, not in the balance.
    pub fn proceeds_at(&self, exit_price: f64) -> f64 {
        match self.side {
            Side::Long => self.shares as f64 * exit_price,
            Side::Short => 0.0,
        }
    }

    /// Attach an exit, computing pnl and proceeds from the exit price.
    pub fn schedule_exit(
        &mut self,
        bar_index: usize,
        timestamp: NaiveDateTime,
        price: f64,
        outcome: Outcome,
    ) {
        self.exit = Some(ExitPlan {
            bar_index,
            timestamp,
            price,
            pnl: self.pnl_at(price),
            proceeds: self.proceeds_at(price),
            outcome,
        });
    }
}
