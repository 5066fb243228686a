//! Simulator configuration.

use super::exit_scan::TieBreak;
use crate::config::{ensure_non_negative, ensure_positive, ConfigError};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulatorConfig {
    pub initial_capital: f64,
    /// Take-profit distance as a fraction of entry price.
    pub target_pct: f64,
    /// Stop distance as a fraction of entry price.
    pub stop_loss_pct: f64,
    /// Fraction of cash committed per strength point, capped at 1.0 overall.
    pub allocation_step: f64,
    /// Close whatever is still open at each series' last close.
    pub force_close_at_end: bool,
    pub tie_break: TieBreak,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_capital: 100_000.0,
            target_pct: 0.07,
            stop_loss_pct: 0.03,
            allocation_step: 0.2,
            force_close_at_end: false,
            tie_break: TieBreak::TargetFirst,
        }
    }
}

impl SimulatorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("simulation.initial_capital", self.initial_capital)?;
        ensure_non_negative("simulation.target_pct", self.target_pct)?;
        ensure_non_negative("simulation.stop_loss_pct", self.stop_loss_pct)?;
        ensure_positive("simulation.allocation_step", self.allocation_step)?;
        Ok(())
    }
}
