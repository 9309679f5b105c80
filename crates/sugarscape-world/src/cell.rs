//! A single grid site.

use serde::{Deserialize, Serialize};
use sugarscape_types::AgentId;

/// One site of the grid.
///
/// A cell holds an occupant reference but never owns the agent: the
/// population registry is the sole owner of agent lifetime.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Cell {
    /// Sugar currently available.
    pub sugar: f64,
    /// Spice currently available.
    pub spice: f64,
    /// Sugar capacity; regrowth never exceeds it.
    pub max_sugar: f64,
    /// Spice capacity; regrowth never exceeds it.
    pub max_spice: f64,
    /// Accumulated pollution. Discounts the value agents see in the cell.
    pub pollution: f64,
    occupant: Option<AgentId>,
}

impl Cell {
    /// Create a cell filled to capacity.
    pub const fn new(max_sugar: f64, max_spice: f64) -> Self {
        Self {
            sugar: max_sugar,
            spice: max_spice,
            max_sugar,
            max_spice,
            pollution: 0.0,
            occupant: None,
        }
    }

    /// The agent currently on this cell, if any.
    pub const fn occupant(&self) -> Option<AgentId> {
        self.occupant
    }

    /// Whether an agent is on this cell.
    pub const fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Sugar plus spice currently available.
    pub fn site_wealth(&self) -> f64 {
        self.sugar + self.spice
    }

    /// Sugar plus spice capacity.
    pub fn max_site_wealth(&self) -> f64 {
        self.max_sugar + self.max_spice
    }

    pub(crate) const fn set_occupant(&mut self, agent: Option<AgentId>) -> Option<AgentId> {
        let previous = self.occupant;
        self.occupant = agent;
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cell_is_full_and_empty() {
        let cell = Cell::new(4.0, 2.0);
        assert!((cell.site_wealth() - 6.0).abs() < f64::EPSILON);
        assert!((cell.max_site_wealth() - 6.0).abs() < f64::EPSILON);
        assert!(!cell.is_occupied());
    }

    #[test]
    fn set_occupant_returns_previous() {
        let mut cell = Cell::new(1.0, 1.0);
        assert_eq!(cell.set_occupant(Some(AgentId(1))), None);
        assert_eq!(cell.set_occupant(Some(AgentId(2))), Some(AgentId(1)));
        assert_eq!(cell.occupant(), Some(AgentId(2)));
    }
}
