//! Trade execution simulator and its supporting pieces.
//!
//! The simulator walks enriched signals in timestamp order. For each signal it
//! first settles every position whose precomputed exit is due, then decides
//! whether to open a new position. Exits are found by a forward scan at entry
//! time and settled later, so cash only moves when the clock reaches them.

pub mod config;
pub mod exit_scan;
pub mod ledger;
pub mod simulator;

pub use config::SimulatorConfig;
pub use exit_scan::{scan_exit, ExitHit, ExitLevels, TieBreak};
pub use ledger::{Ledger, TradeSummary};
pub use simulator::{simulate, ForceCloseError, SimulationReport, TradeSimulator};
