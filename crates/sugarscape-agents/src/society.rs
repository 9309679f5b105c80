//! The shared context every per-agent protocol runs against.
//!
//! A [`Society`] bundles the grid, the population registry, the global
//! parameters, the current tick, and counters for what happened during the
//! tick. Protocols take `&mut Society` plus the acting agent's ID, so no
//! agent ever holds a reference to another.

use sugarscape_types::{AgentId, Position};
use sugarscape_world::Grid;

use crate::config::SocietyParams;
use crate::death::DeathCause;
use crate::error::AgentError;
use crate::population::Population;

/// Counters for events that occurred during the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickEvents {
    /// Children born.
    pub births: u32,
    /// Deaths from running out of sugar or spice.
    pub starvation_deaths: u32,
    /// Deaths from reaching maximum age.
    pub old_age_deaths: u32,
    /// Deaths from losing a fight.
    pub combat_deaths: u32,
    /// Executed trade iterations.
    pub trades: u32,
    /// Loans originated, re-issued balances included.
    pub loans: u32,
    /// New infections.
    pub infections: u32,
    /// Infections cleared by the immune system.
    pub recoveries: u32,
}

impl TickEvents {
    /// Count one death of the given cause.
    pub const fn record_death(&mut self, cause: DeathCause) {
        match cause {
            DeathCause::Starvation => {
                self.starvation_deaths = self.starvation_deaths.saturating_add(1);
            }
            DeathCause::OldAge => self.old_age_deaths = self.old_age_deaths.saturating_add(1),
            DeathCause::Combat => self.combat_deaths = self.combat_deaths.saturating_add(1),
        }
    }

    /// Total deaths of any cause.
    pub const fn deaths(&self) -> u32 {
        self.starvation_deaths
            .saturating_add(self.old_age_deaths)
            .saturating_add(self.combat_deaths)
    }
}

/// Grid, population, and global parameters for one simulation.
#[derive(Debug, Clone)]
pub struct Society {
    /// The resource grid.
    pub grid: Grid,
    /// Every agent ever born.
    pub population: Population,
    /// Global constants.
    pub params: SocietyParams,
    /// The current tick.
    pub tick: u64,
    /// What has happened so far this tick.
    pub events: TickEvents,
}

impl Society {
    /// Create a society with an empty population.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] if `params` are inconsistent.
    pub fn new(grid: Grid, params: SocietyParams) -> Result<Self, AgentError> {
        params.validate()?;
        Ok(Self {
            grid,
            population: Population::new(),
            params,
            tick: 0,
            events: TickEvents::default(),
        })
    }

    /// Advance to `tick` and reset the event counters, returning the
    /// counters of the tick that just ended.
    pub fn begin_tick(&mut self, tick: u64) -> TickEvents {
        self.tick = tick;
        core::mem::take(&mut self.events)
    }

    /// Where a living agent stands.
    pub fn position_of(&self, id: AgentId) -> Result<Position, AgentError> {
        self.population
            .require(id)?
            .position
            .ok_or(AgentError::AgentNotFound(id))
    }

    /// Living agents on the four cells adjacent to `id`, in direction order.
    ///
    /// On grids narrower than three cells the wrapped directions can meet;
    /// each neighbor is listed once and `id` itself never is.
    pub fn neighbors_of(&self, id: AgentId) -> Result<Vec<AgentId>, AgentError> {
        let position = self.position_of(id)?;
        Ok(self.living_occupants(id, &self.grid.von_neumann(position)))
    }

    /// Living agents on the eight cells surrounding `id`.
    pub fn moore_neighbors_of(&self, id: AgentId) -> Result<Vec<AgentId>, AgentError> {
        let position = self.position_of(id)?;
        Ok(self.living_occupants(id, &self.grid.moore(position)))
    }

    fn living_occupants(&self, id: AgentId, cells: &[Position]) -> Vec<AgentId> {
        let mut found: Vec<AgentId> = Vec::with_capacity(cells.len());
        for other in cells.iter().filter_map(|p| self.grid.occupant(*p)) {
            if other != id && self.population.is_alive(other) && !found.contains(&other) {
                found.push(other);
            }
        }
        found
    }
}


#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod fixtures {
    //! Small hand-built societies shared by the unit tests of this crate.

    use sugarscape_types::{AgentEndowment, AgentId, Position};
    use sugarscape_world::{Grid, ResourceRules};

    use super::Society;
    use crate::config::SocietyParams;

    /// A barren grid with no regrowth and default parameters.
    pub fn society(width: u32, height: u32) -> Society {
        let rules = ResourceRules {
            sugar_regrowth: 0.0,
            spice_regrowth: 0.0,
            ..ResourceRules::default()
        };
        let grid = Grid::new(width, height, rules).unwrap();
        Society::new(grid, SocietyParams::default()).unwrap()
    }

    /// Spawn an agent at `(x, y)`.
    pub fn place(society: &mut Society, endowment: AgentEndowment, x: u32, y: u32) -> AgentId {
        let tick = society.tick;
        society
            .population
            .spawn(
                &mut society.grid,
                endowment,
                Position::new(x, y),
                tick,
                &society.params,
            )
            .unwrap()
    }
}
