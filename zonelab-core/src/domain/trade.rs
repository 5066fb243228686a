//! TradeRecord: a completed round trip, written once when its exit settles.

use super::position::{Outcome, Position, Side};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    // ── Identification ──
    pub security: String,
    pub side: Side,
    pub strength: u8,

    // ── Entry ──
    pub entry_bar: usize,
    pub entry_timestamp: Option<NaiveDateTime>,
    pub entry_price: f64,

    // ── Exit ──
    pub exit_bar: usize,
    pub exit_timestamp: NaiveDateTime,
    pub exit_price: f64,
    pub outcome: Outcome,

    // ── Size ──
    pub shares: u64,
    pub capital_allocated: f64,

    // ── PnL / cash ──
    pub pnl: f64,
    pub cash_before: f64,
    pub cash_after: f64,

    // ── Duration ──
    /// Exit minus entry timestamp, in seconds. Absent without an entry timestamp.
    pub holding_period_secs: Option<i64>,
}

impl TradeRecord {
    /// Freeze a settled position. Returns `None` if the position has no exit.
    pub fn from_settled(position: &Position, cash_after: f64) -> Option<Self> {
        let exit = position.exit.as_ref()?;
        let holding_period_secs = position
            .entry_timestamp
            .map(|entry| (exit.timestamp - entry).num_seconds());
        Some(Self {
            security: position.security.clone(),
            side: position.side,
            strength: position.strength,
            entry_bar: position.entry_bar,
            entry_timestamp: position.entry_timestamp,
            entry_price: position.entry_price,
            exit_bar: exit.bar_index,
            exit_timestamp: exit.timestamp,
            exit_price: exit.price,
            outcome: exit.outcome,
            shares: position.shares,
            capital_allocated: position.shares as f64 * position.entry_price,
            pnl: exit.pnl,
            cash_before: position.cash_before,
            cash_after,
            holding_period_secs,
        })
    }

    pub fn holding_period(&self) -> Option<Duration> {
        self.holding_period_secs.map(Duration::seconds)
    }

    /// Return on the trade as a fraction of entry cost.
    pub fn return_pct(&self) -> f64 {
        if self.entry_price == 0.0 || self.shares == 0 {
            return 0.0;
        }
        self.pnl / (self.entry_price * self.shares as f64)
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    pub fn bars_held(&self) -> usize {
        self.exit_bar.saturating_sub(self.entry_bar)
    }
}
