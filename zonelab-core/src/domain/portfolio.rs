//! Portfolio: open positions per security with capital-used accounting.

use super::position::Position;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PortfolioError {
    #[error("security '{0}' already has an open position")]
    DuplicatePosition(String),
}

/// At most one open position per security.
///
/// `total_capital_used` always equals the sum of `capital_allocated` over the
/// open positions; add and remove are the only mutators.
#[derive(Debug, Clone, Default)]
pub struct Portfolio {
    positions: BTreeMap<String, Position>,
    total_capital_used: f64,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_position(&mut self, position: Position) -> Result<(), PortfolioError> {
        if self.positions.contains_key(&position.security) {
            return Err(PortfolioError::DuplicatePosition(position.security));
        }
        self.total_capital_used += position.capital_allocated;
        self.positions.insert(position.security.clone(), position);
        Ok(())
    }

    pub fn remove_position(&mut self, security: &str) -> Option<Position> {
        let removed = self.positions.remove(security)?;
        self.total_capital_used -= removed.capital_allocated;
        if self.positions.is_empty() {
            // Snap accumulated float error once nothing is held.
            self.total_capital_used = 0.0;
        }
        Some(removed)
    }

    pub fn has_position(&self, security: &str) -> bool {
        self.positions.contains_key(security)
    }

    pub fn get_position(&self, security: &str) -> Option<&Position> {
        self.positions.get(security)
    }

    pub fn get_position_mut(&mut self, security: &str) -> Option<&mut Position> {
        self.positions.get_mut(security)
    }

    /// Open positions ordered by security name.
    pub fn all_positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn total_capital_used(&self) -> f64 {
        self.total_capital_used
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn clear(&mut self) {
        self.positions.clear();
        self.total_capital_used = 0.0;
    }
}
