//! Cash and win/loss bookkeeping for one simulation run.

use serde::{Deserialize, Serialize};

/// Cash, realized P&L and streak tracker.
#[derive(Debug, Clone)]
pub struct Ledger {
    initial_cash: f64,
    cash: f64,
    realized_pnl: f64,
    wins: usize,
    losses: usize,
    current_winning_streak: usize,
    current_losing_streak: usize,
    max_winning_streak: usize,
    max_losing_streak: usize,
}

impl Ledger {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            initial_cash,
            cash: initial_cash,
            realized_pnl: 0.0,
            wins: 0,
            losses: 0,
            current_winning_streak: 0,
            current_losing_streak: 0,
            max_winning_streak: 0,
            max_losing_streak: 0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.initial_cash);
    }

    pub fn debit(&mut self, amount: f64) {
        self.cash -= amount;
    }

    pub fn credit(&mut self, amount: f64) {
        self.cash += amount;
    }

    /// Count a closed trade. Anything not strictly profitable is a loss.
    pub fn record_close(&mut self, pnl: f64) {
        self.realized_pnl += pnl;
        if pnl > 0.0 {
            self.wins += 1;
            self.current_winning_streak += 1;
            self.current_losing_streak = 0;
            self.max_winning_streak = self.max_winning_streak.max(self.current_winning_streak);
        } else {
            self.losses += 1;
            self.current_losing_streak += 1;
            self.current_winning_streak = 0;
            self.max_losing_streak = self.max_losing_streak.max(self.current_losing_streak);
        }
    }

    pub fn initial_cash(&self) -> f64 {
        self.initial_cash
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Summary given the capital still tied up in open positions.
    pub fn summary(&self, capital_in_positions: f64, num_trades: usize) -> TradeSummary {
        let final_balance = self.cash + capital_in_positions;
        let win_rate = if num_trades == 0 {
            0.0
        } else {
            self.wins as f64 / num_trades as f64 * 100.0
        };
        TradeSummary {
            initial_capital: self.initial_cash,
            final_balance,
            final_pnl: final_balance - self.initial_cash,
            num_trades,
            wins: self.wins,
            losses: self.losses,
            win_rate,
            current_winning_streak: self.current_winning_streak,
            current_losing_streak: self.current_losing_streak,
            max_winning_streak: self.max_winning_streak,
            max_losing_streak: self.max_losing_streak,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeSummary {
    pub initial_capital: f64,
    /// Cash plus capital still allocated to open positions.
    pub final_balance: f64,
    pub final_pnl: f64,
    pub num_trades: usize,
    pub wins: usize,
    pub losses: usize,
    /// Percent, 0 when there are no trades.
    pub win_rate: f64,
    pub current_winning_streak: usize,
    pub current_losing_streak: usize,
    pub max_winning_streak: usize,
    pub max_losing_streak: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ledger_summary() {
        let ledger = Ledger::new(100_000.0);
        let s = ledger.summary(0.0, 0);
        assert_eq!(s.final_balance, 100_000.0);
        assert_eq!(s.final_pnl, 0.0);
        assert_eq!(s.win_rate, 0.0);
        assert_eq!(s.num_trades, 0);
    }

    #[test]
    fn streaks_track_runs() {
        let mut ledger = Ledger::new(1_000.0);
        for pnl in [10.0, 5.0, 0.0, -3.0, -1.0, -2.0, 7.0] {
            ledger.record_close(pnl);
        }
        let s = ledger.summary(0.0, 7);
        assert_eq!(s.wins, 3);
        assert_eq!(s.losses, 4);
        assert_eq!(s.max_winning_streak, 2);
        assert_eq!(s.max_losing_streak, 4);
        assert_eq!(s.current_winning_streak, 1);
        assert_eq!(s.current_losing_streak, 0);
        assert!((s.win_rate - 300.0 / 7.0).abs() < 1e-9);
        assert!((ledger.realized_pnl() - 16.0).abs() < 1e-12);
    }

    #[test]
    fn final_balance_includes_open_capital() {
        let mut ledger = Ledger::new(10_000.0);
        ledger.debit(4_000.0);
        ledger.credit(1_000.0);
        let s = ledger.summary(3_000.0, 0);
        assert_eq!(ledger.cash(), 7_000.0);
        assert_eq!(s.final_balance, 10_000.0);
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut ledger = Ledger::new(500.0);
        ledger.debit(100.0);
        ledger.record_close(-5.0);
        ledger.reset();
        assert_eq!(ledger.cash(), 500.0);
        assert_eq!(ledger.realized_pnl(), 0.0);
        assert_eq!(ledger.summary(0.0, 0).losses, 0);
    }
}
