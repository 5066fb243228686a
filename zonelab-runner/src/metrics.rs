//! Trade statistics: pure functions over the completed-trade ledger.
//!
//! Every metric takes a trade list and returns a scalar. Streaks and the
//! final balance live in the simulator's `TradeSummary`; these cover what a
//! trade tape alone can answer.

use serde::{Deserialize, Serialize};
use zonelab_core::domain::TradeRecord;

/// Aggregate statistics for a batch's completed trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeStats {
    pub trade_count: usize,
    pub total_pnl: f64,
    pub average_pnl: f64,
    /// Total P&L over total capital allocated, in percent.
    pub return_on_allocated_pct: f64,
    pub average_holding_days: f64,
    pub average_bars_held: f64,
    /// Mean per-trade return on entry cost, in percent.
    pub average_return_pct: f64,
    /// Fraction of trades with positive P&L, 0..=1.
    pub win_rate: f64,
    pub profit_factor: f64,
    pub best_trade: f64,
    pub worst_trade: f64,
}

impl TradeStats {
    pub fn compute(trades: &[TradeRecord]) -> Self {
        Self {
            trade_count: trades.len(),
            total_pnl: total_pnl(trades),
            average_pnl: average_pnl(trades),
            return_on_allocated_pct: return_on_allocated_pct(trades),
            average_holding_days: average_holding_days(trades),
            average_bars_held: average_bars_held(trades),
            average_return_pct: average_return_pct(trades),
            win_rate: win_rate(trades),
            profit_factor: profit_factor(trades),
            best_trade: trades.iter().map(|t| t.pnl).fold(0.0, f64::max),
            worst_trade: trades.iter().map(|t| t.pnl).fold(0.0, f64::min),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

pub fn total_pnl(trades: &[TradeRecord]) -> f64 {
    trades.iter().map(|t| t.pnl).sum()
}

pub fn average_pnl(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    total_pnl(trades) / trades.len() as f64
}

/// P&L relative to the capital committed across all trades, in percent.
pub fn return_on_allocated_pct(trades: &[TradeRecord]) -> f64 {
    let allocated: f64 = trades.iter().map(|t| t.capital_allocated).sum();
    if allocated <= 0.0 {
        return 0.0;
    }
    total_pnl(trades) / allocated * 100.0
}

/// Mean holding period in whole days. Trades without an entry timestamp are
/// ignored.
pub fn average_holding_days(trades: &[TradeRecord]) -> f64 {
    let days: Vec<i64> = trades
        .iter()
        .filter_map(|t| t.holding_period())
        .map(|d| d.num_days())
        .collect();
    if days.is_empty() {
        return 0.0;
    }
    days.iter().sum::<i64>() as f64 / days.len() as f64
}

pub fn average_bars_held(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.bars_held()).sum::<usize>() as f64 / trades.len() as f64
}

pub fn average_return_pct(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.return_pct()).sum::<f64>() / trades.len() as f64 * 100.0
}

pub fn win_rate(trades: &[TradeRecord]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64
}

/// Profit factor: gross profits / gross losses.
///
/// Capped at 100.0 when there are no losses.
pub fn profit_factor(trades: &[TradeRecord]) -> f64 {
    let gross_profit: f64 = trades.iter().filter(|t| t.pnl > 0.0).map(|t| t.pnl).sum();
    let gross_loss: f64 = trades
        .iter()
        .filter(|t| t.pnl < 0.0)
        .map(|t| t.pnl.abs())
        .sum();

    if gross_loss < 1e-10 {
        return if gross_profit > 0.0 { 100.0 } else { 0.0 };
    }
    (gross_profit / gross_loss).min(100.0)
}
