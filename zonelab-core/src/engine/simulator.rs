//! TradeSimulator: turns enriched signals into a settled trade ledger.

use super::config::SimulatorConfig;
use super::exit_scan::{scan_exit, ExitLevels};
use super::ledger::{Ledger, TradeSummary};
use crate::config::ConfigError;
use crate::domain::{
    EnrichedSignal, MarketData, Outcome, Portfolio, Position, Side, TradeRecord,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a forced close could not price a position. Other securities proceed.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ForceCloseError {
    #[error("no price series for '{0}'")]
    MissingSeries(String),

    #[error("price series for '{0}' is empty")]
    EmptySeries(String),
}

/// Snapshot of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationReport {
    pub trades: Vec<TradeRecord>,
    pub open_positions: Vec<Position>,
    pub summary: TradeSummary,
    pub cash: f64,
    pub force_close_failures: Vec<ForceCloseError>,
}

/// Single-threaded simulator. All state is reset at the start of `run`.
#[derive(Debug, Clone)]
pub struct TradeSimulator {
    config: SimulatorConfig,
    ledger: Ledger,
    portfolio: Portfolio,
    trades: Vec<TradeRecord>,
    force_close_failures: Vec<ForceCloseError>,
}

impl TradeSimulator {
    pub fn new(config: SimulatorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            ledger: Ledger::new(config.initial_capital),
            config,
            portfolio: Portfolio::new(),
            trades: Vec::new(),
            force_close_failures: Vec::new(),
        })
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn reset(&mut self) {
        self.ledger.reset();
        self.portfolio.clear();
        self.trades.clear();
        self.force_close_failures.clear();
    }

    /// Process every signal in timestamp order (`None` first, ties stable).
    pub fn run(&mut self, signals: &[EnrichedSignal], market: &MarketData) {
        self.reset();

        let mut ordered: Vec<&EnrichedSignal> = signals.iter().collect();
        ordered.sort_by_key(|s| s.timestamp);

        for signal in ordered {
            self.process_due_exits(signal.timestamp);
            self.act_on_signal(signal, market);
        }

        if self.config.force_close_at_end {
            let failures = self.force_close_open_positions(market);
            self.force_close_failures.extend(failures);
        }

        tracing::debug!(
            signals = signals.len(),
            trades = self.trades.len(),
            open = self.portfolio.len(),
            cash = self.ledger.cash(),
            "simulation complete"
        );
    }

    /// Settle positions whose exit timestamp is at or before `now`, oldest
    /// exit first (ties by security). `None` settles every resolved exit.
    pub fn process_due_exits(&mut self, now: Option<NaiveDateTime>) {
        let mut due: Vec<(NaiveDateTime, String)> = self
            .portfolio
            .all_positions()
            .filter_map(|p| p.exit.as_ref().map(|e| (e.timestamp, p.security.clone())))
            .filter(|(at, _)| now.map_or(true, |now| *at <= now))
            .collect();
        due.sort();

        for (_, security) in due {
            self.settle(&security);
        }
    }

    /// Settle every position whose exit was already resolved, regardless of time.
    pub fn settle_scheduled_exits(&mut self) {
        self.process_due_exits(None);
    }

    fn settle(&mut self, security: &str) {
        let Some(exit) = self
            .portfolio
            .get_position(security)
            .and_then(|p| p.exit.clone())
        else {
            return;
        };
        let Some(position) = self.portfolio.remove_position(security) else {
            return;
        };

        self.ledger.credit(exit.proceeds);
        self.ledger.record_close(exit.pnl);

        if let Some(trade) = TradeRecord::from_settled(&position, self.ledger.cash()) {
            tracing::debug!(
                security,
                side = position.side.as_str(),
                outcome = trade.outcome.as_str(),
                pnl = trade.pnl,
                cash = trade.cash_after,
                "exit settled"
            );
            self.trades.push(trade);
        }
    }

    /// Open a position for `signal` if it is well-formed and affordable.
    ///
    /// Returns true when a position was opened. Malformed signals are skipped,
    /// never raised.
    pub fn act_on_signal(&mut self, signal: &EnrichedSignal, market: &MarketData) -> bool {
        let symbol = signal.symbol.as_str();
        if signal.strength == 0 {
            tracing::debug!(symbol, bar = signal.bar_index, "skip: zero strength");
            return false;
        }
        if !signal.price.is_finite() || signal.price <= 0.0 {
            tracing::debug!(symbol, price = signal.price, "skip: invalid price");
            return false;
        }
        let Some(series) = market.get(symbol) else {
            tracing::debug!(symbol, "skip: no price series");
            return false;
        };
        if signal.bar_index >= series.len() {
            tracing::debug!(
                symbol,
                bar = signal.bar_index,
                len = series.len(),
                "skip: bar index outside series"
            );
            return false;
        }
        if self.portfolio.has_position(symbol) {
            return false;
        }

        let side = Side::from(signal.direction);
        let price = signal.price;
        let cash = self.ledger.cash();
        let fraction = (self.config.allocation_step * f64::from(signal.strength)).min(1.0);
        let amount = fraction * cash;

        let shares = match side {
            Side::Long => {
                if cash <= 0.0 {
                    return false;
                }
                let shares = whole_shares(amount, price);
                if shares as f64 * price > cash {
                    whole_shares(cash, price)
                } else {
                    shares
                }
            }
            Side::Short => whole_shares(amount, price),
        };
        if shares == 0 {
            return false;
        }

        let levels = ExitLevels::for_entry(
            side,
            price,
            self.config.target_pct,
            self.config.stop_loss_pct,
        );
        let capital = shares as f64 * price;
        let mut position = Position {
            security: signal.symbol.clone(),
            side,
            strength: signal.strength,
            entry_bar: signal.bar_index,
            entry_timestamp: signal
                .timestamp
                .or_else(|| series.timestamp_at(signal.bar_index)),
            entry_price: price,
            shares,
            capital_allocated: capital,
            cash_before: cash,
            target: levels.target,
            stop_loss: levels.stop,
            exit: None,
        };

        if let Some(hit) = scan_exit(
            &series.bars,
            signal.bar_index,
            side,
            levels,
            self.config.tie_break,
        ) {
            if let Some(at) = series.timestamp_at(hit.bar_index) {
                position.schedule_exit(hit.bar_index, at, hit.price, hit.outcome);
            }
        }

        if let Err(err) = self.portfolio.add_position(position) {
            tracing::warn!(%err, "position rejected");
            return false;
        }
        // Shorts are tracked in capital used but never debit cash.
        if side == Side::Long {
            self.ledger.debit(capital);
        }
        tracing::debug!(
            symbol,
            side = side.as_str(),
            shares,
            price,
            strength = signal.strength,
            "position opened"
        );
        true
    }

    /// Give every open-ended position an exit at its series' last close, then
    /// settle everything. Failures are per security.
    pub fn force_close_open_positions(&mut self, market: &MarketData) -> Vec<ForceCloseError> {
        let open_ended: Vec<String> = self
            .portfolio
            .all_positions()
            .filter(|p| !p.has_exit())
            .map(|p| p.security.clone())
            .collect();

        let mut failures = Vec::new();
        for security in open_ended {
            let Some(series) = market.get(&security) else {
                tracing::warn!(%security, "force close: no price series");
                failures.push(ForceCloseError::MissingSeries(security));
                continue;
            };
            let (Some(last_index), Some(last)) = (series.last_index(), series.last()) else {
                tracing::warn!(%security, "force close: empty price series");
                failures.push(ForceCloseError::EmptySeries(security));
                continue;
            };
            if let Some(position) = self.portfolio.get_position_mut(&security) {
                position.schedule_exit(last_index, last.timestamp, last.close, Outcome::Closed);
            }
        }

        self.process_due_exits(None);
        failures
    }

    pub fn cash(&self) -> f64 {
        self.ledger.cash()
    }

    pub fn realized_pnl(&self) -> f64 {
        self.ledger.realized_pnl()
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn trades(&self) -> &[TradeRecord] {
        &self.trades
    }

    pub fn force_close_failures(&self) -> &[ForceCloseError] {
        &self.force_close_failures
    }

    pub fn summary(&self) -> TradeSummary {
        self.ledger
            .summary(self.portfolio.total_capital_used(), self.trades.len())
    }

    /// Cash identity residual: `cash + capital used - (initial + realized)`.
    ///
    /// Zero (up to float error) whenever no short was ever opened.
    pub fn audit(&self) -> f64 {
        self.ledger.cash() + self.portfolio.total_capital_used()
            - (self.ledger.initial_cash() + self.ledger.realized_pnl())
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            trades: self.trades.clone(),
            open_positions: self.portfolio.all_positions().cloned().collect(),
            summary: self.summary(),
            cash: self.ledger.cash(),
            force_close_failures: self.force_close_failures.clone(),
        }
    }
}

/// `floor(amount / price)`, or 0 when that is not a positive finite count.
fn whole_shares(amount: f64, price: f64) -> u64 {
    let raw = (amount / price).floor();
    if raw.is_finite() && raw > 0.0 {
        raw as u64
    } else {
        0
    }
}

/// Build a simulator, run it once and return the report.
pub fn simulate(
    config: SimulatorConfig,
    signals: &[EnrichedSignal],
    market: &MarketData,
) -> Result<SimulationReport, ConfigError> {
    let mut sim = TradeSimulator::new(config)?;
    sim.run(signals, market);
    Ok(sim.report())
}
